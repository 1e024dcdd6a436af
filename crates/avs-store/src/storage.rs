//! Storage trait
//!
//! Every record operation takes the calling [`Actor`]. Non-admin actors only
//! see rows they created; a row the actor cannot see behaves exactly like a
//! row that does not exist (`None` / `false`), so callers cannot probe for
//! other tenants' ids.

use crate::draft::{AssetDraft, NewUser, ProjectFilter, VariantDraft};
use crate::error::StoreError;
use async_trait::async_trait;
use avs_core::{
    Actor, Asset, AssetId, AssetPatch, AssetWithProject, Client, ClientId, ClientPatch,
    DashboardStats, NewClient, NewProject, Project, ProjectId, ProjectPatch, ProjectWithClient,
    User, UserId, Variant, VariantId, VariantPatch, VariantWithAsset,
};
use chrono::Utc;

/// Result alias for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence backend for the studio
#[async_trait]
pub trait Storage: Send + Sync + std::fmt::Debug {
    // Users

    /// Fetch a user by id
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Fetch a user by normalized email
    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Insert a user; fails with [`StoreError::DuplicateEmail`] on conflict
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    /// All users, newest first
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    // Clients

    async fn list_clients(&self, actor: &Actor) -> StoreResult<Vec<Client>>;

    async fn get_client(&self, id: ClientId, actor: &Actor) -> StoreResult<Option<Client>>;

    async fn create_client(&self, input: NewClient, owner: UserId) -> StoreResult<Client>;

    async fn update_client(
        &self,
        id: ClientId,
        patch: ClientPatch,
        actor: &Actor,
    ) -> StoreResult<Option<Client>>;

    /// Delete a client with its projects, assets and variants
    async fn delete_client(&self, id: ClientId, actor: &Actor) -> StoreResult<bool>;

    // Projects

    async fn list_projects(
        &self,
        filter: ProjectFilter,
        actor: &Actor,
    ) -> StoreResult<Vec<ProjectWithClient>>;

    async fn get_project(
        &self,
        id: ProjectId,
        actor: &Actor,
    ) -> StoreResult<Option<ProjectWithClient>>;

    async fn create_project(&self, input: NewProject, owner: UserId) -> StoreResult<Project>;

    async fn update_project(
        &self,
        id: ProjectId,
        patch: ProjectPatch,
        actor: &Actor,
    ) -> StoreResult<Option<Project>>;

    /// Delete a project with its assets and variants
    async fn delete_project(&self, id: ProjectId, actor: &Actor) -> StoreResult<bool>;

    /// Stamp the archive time
    async fn archive_project(&self, id: ProjectId, actor: &Actor) -> StoreResult<Option<Project>> {
        let patch = ProjectPatch {
            archived: Some(Some(Utc::now())),
            ..ProjectPatch::default()
        };
        self.update_project(id, patch, actor).await
    }

    /// Clear the archive time
    async fn unarchive_project(
        &self,
        id: ProjectId,
        actor: &Actor,
    ) -> StoreResult<Option<Project>> {
        let patch = ProjectPatch {
            archived: Some(None),
            ..ProjectPatch::default()
        };
        self.update_project(id, patch, actor).await
    }

    // Assets

    async fn list_assets(
        &self,
        project_id: Option<ProjectId>,
        actor: &Actor,
    ) -> StoreResult<Vec<AssetWithProject>>;

    async fn get_asset(&self, id: AssetId, actor: &Actor) -> StoreResult<Option<AssetWithProject>>;

    async fn create_asset(&self, draft: AssetDraft, owner: UserId) -> StoreResult<Asset>;

    async fn update_asset(
        &self,
        id: AssetId,
        patch: AssetPatch,
        actor: &Actor,
    ) -> StoreResult<Option<Asset>>;

    /// Delete an asset with its variants
    async fn delete_asset(&self, id: AssetId, actor: &Actor) -> StoreResult<bool>;

    // Variants

    async fn list_variants(
        &self,
        asset_id: Option<AssetId>,
        actor: &Actor,
    ) -> StoreResult<Vec<VariantWithAsset>>;

    async fn get_variant(
        &self,
        id: VariantId,
        actor: &Actor,
    ) -> StoreResult<Option<VariantWithAsset>>;

    async fn create_variant(&self, draft: VariantDraft, owner: UserId) -> StoreResult<Variant>;

    async fn update_variant(
        &self,
        id: VariantId,
        patch: VariantPatch,
        actor: &Actor,
    ) -> StoreResult<Option<Variant>>;

    async fn delete_variant(&self, id: VariantId, actor: &Actor) -> StoreResult<bool>;

    // Aggregates

    /// Counters over actor-visible records
    async fn dashboard_stats(&self, actor: &Actor) -> StoreResult<DashboardStats>;
}
