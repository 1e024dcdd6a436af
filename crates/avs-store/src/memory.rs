//! In-memory storage backend
//!
//! All tables live behind one `parking_lot::RwLock`, so every operation
//! (cascading deletes included) is atomic with respect to the others.
//! Insertion order is kept so rows created within the same clock tick still
//! list newest-first.

use crate::draft::{AssetDraft, NewUser, ProjectFilter, VariantDraft};
use crate::error::StoreError;
use crate::storage::{StoreResult, Storage};
use async_trait::async_trait;
use avs_core::input::normalize_email;
use avs_core::{
    Actor, Asset, AssetId, AssetPatch, AssetWithProject, Client, ClientId, ClientPatch,
    DashboardStats, NewClient, NewProject, Project, ProjectId, ProjectPatch, ProjectWithClient,
    User, UserId, Variant, VariantId, VariantPatch, VariantWithAsset,
};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::hash::Hash;
use tracing::debug;

#[derive(Debug, Default)]
struct Tables {
    users: IndexMap<UserId, User>,
    clients: IndexMap<ClientId, Client>,
    projects: IndexMap<ProjectId, Project>,
    assets: IndexMap<AssetId, Asset>,
    variants: IndexMap<VariantId, Variant>,
}

/// Rows of a table ordered by `created_at` descending, later inserts first on ties
fn newest_first<'a, K, V, F>(
    table: &'a IndexMap<K, V>,
    keep: F,
    created: fn(&V) -> DateTime<Utc>,
) -> Vec<&'a V>
where
    K: Hash + Eq,
    F: Fn(&V) -> bool,
{
    let mut rows: Vec<&V> = table.values().rev().filter(|row| keep(*row)).collect();
    rows.sort_by(|a, b| created(b).cmp(&created(a)));
    rows
}

impl Tables {
    fn visible_client(&self, id: ClientId, actor: &Actor) -> Option<&Client> {
        self.clients
            .get(&id)
            .filter(|c| actor.can_access(c.created_by_user_id))
    }

    fn visible_project(&self, id: ProjectId, actor: &Actor) -> Option<&Project> {
        self.projects
            .get(&id)
            .filter(|p| actor.can_access(p.created_by_user_id))
    }

    fn visible_asset(&self, id: AssetId, actor: &Actor) -> Option<&Asset> {
        self.assets
            .get(&id)
            .filter(|a| actor.can_access(a.created_by_user_id))
    }

    fn visible_variant(&self, id: VariantId, actor: &Actor) -> Option<&Variant> {
        self.variants
            .get(&id)
            .filter(|v| actor.can_access(v.created_by_user_id))
    }

    fn project_view(&self, project: &Project) -> Option<ProjectWithClient> {
        let client = self.clients.get(&project.client_id)?;
        Some(ProjectWithClient {
            project: project.clone(),
            client: client.clone(),
        })
    }

    fn asset_view(&self, asset: &Asset) -> Option<AssetWithProject> {
        let project = self.projects.get(&asset.project_id)?;
        Some(AssetWithProject {
            asset: asset.clone(),
            project: self.project_view(project)?,
        })
    }

    fn variant_view(&self, variant: &Variant) -> Option<VariantWithAsset> {
        let asset = self.assets.get(&variant.asset_id)?;
        Some(VariantWithAsset {
            variant: variant.clone(),
            asset: self.asset_view(asset)?,
        })
    }

    fn remove_asset_tree(&mut self, id: AssetId) -> usize {
        let before = self.variants.len();
        self.variants.retain(|_, v| v.asset_id != id);
        self.assets.shift_remove(&id);
        before - self.variants.len()
    }

    fn remove_project_tree(&mut self, id: ProjectId) -> usize {
        let assets: Vec<AssetId> = self
            .assets
            .values()
            .filter(|a| a.project_id == id)
            .map(|a| a.id)
            .collect();
        let mut removed = assets.len();
        for asset in assets {
            removed += self.remove_asset_tree(asset);
        }
        self.projects.shift_remove(&id);
        removed
    }

    fn remove_client_tree(&mut self, id: ClientId) -> usize {
        let projects: Vec<ProjectId> = self
            .projects
            .values()
            .filter(|p| p.client_id == id)
            .map(|p| p.id)
            .collect();
        let mut removed = projects.len();
        for project in projects {
            removed += self.remove_project_tree(project);
        }
        self.clients.shift_remove(&id);
        removed
    }
}

/// Storage backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = normalize_email(email);
        Ok(self
            .tables
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let email = normalize_email(&user.email);
        let mut tables = self.tables.write();
        if tables.users.values().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail(email));
        }

        let now = Utc::now();
        let record = User {
            id: UserId::new(),
            email,
            name: user.name,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let tables = self.tables.read();
        Ok(newest_first(&tables.users, |_| true, |u| u.created_at)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn list_clients(&self, actor: &Actor) -> StoreResult<Vec<Client>> {
        let tables = self.tables.read();
        let rows = newest_first(
            &tables.clients,
            |c| actor.can_access(c.created_by_user_id),
            |c| c.created_at,
        );
        Ok(rows.into_iter().cloned().collect())
    }

    async fn get_client(&self, id: ClientId, actor: &Actor) -> StoreResult<Option<Client>> {
        Ok(self.tables.read().visible_client(id, actor).cloned())
    }

    async fn create_client(&self, input: NewClient, owner: UserId) -> StoreResult<Client> {
        let now = Utc::now();
        let record = Client {
            id: ClientId::new(),
            name: input.name,
            description: input.description,
            created_by_user_id: owner,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().clients.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_client(
        &self,
        id: ClientId,
        patch: ClientPatch,
        actor: &Actor,
    ) -> StoreResult<Option<Client>> {
        let mut tables = self.tables.write();
        if tables.visible_client(id, actor).is_none() {
            return Ok(None);
        }
        let Some(client) = tables.clients.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = patch.name {
            client.name = name;
        }
        if let Some(description) = patch.description {
            client.description = description;
        }
        client.updated_at = Utc::now();
        Ok(Some(client.clone()))
    }

    async fn delete_client(&self, id: ClientId, actor: &Actor) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        if tables.visible_client(id, actor).is_none() {
            return Ok(false);
        }
        let removed = tables.remove_client_tree(id);
        debug!(client = %id, descendants = removed, "Deleted client");
        Ok(true)
    }

    async fn list_projects(
        &self,
        filter: ProjectFilter,
        actor: &Actor,
    ) -> StoreResult<Vec<ProjectWithClient>> {
        let tables = self.tables.read();
        let rows = newest_first(
            &tables.projects,
            |p| {
                actor.can_access(p.created_by_user_id)
                    && filter.client_id.map_or(true, |c| p.client_id == c)
                    && (filter.include_archived || !p.is_archived())
            },
            |p| p.created_at,
        );
        Ok(rows
            .into_iter()
            .filter_map(|p| tables.project_view(p))
            .collect())
    }

    async fn get_project(
        &self,
        id: ProjectId,
        actor: &Actor,
    ) -> StoreResult<Option<ProjectWithClient>> {
        let tables = self.tables.read();
        Ok(tables
            .visible_project(id, actor)
            .and_then(|p| tables.project_view(p)))
    }

    async fn create_project(&self, input: NewProject, owner: UserId) -> StoreResult<Project> {
        let mut tables = self.tables.write();
        if !tables.clients.contains_key(&input.client_id) {
            return Err(StoreError::missing_parent("client", input.client_id));
        }

        let now = Utc::now();
        let record = Project {
            id: ProjectId::new(),
            client_id: input.client_id,
            name: input.name,
            description: input.description,
            brief: input.brief,
            archived: input.archived,
            created_by_user_id: owner,
            created_at: now,
            updated_at: now,
        };
        tables.projects.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_project(
        &self,
        id: ProjectId,
        patch: ProjectPatch,
        actor: &Actor,
    ) -> StoreResult<Option<Project>> {
        let mut tables = self.tables.write();
        if tables.visible_project(id, actor).is_none() {
            return Ok(None);
        }
        if let Some(client_id) = patch.client_id {
            if tables.visible_client(client_id, actor).is_none() {
                return Err(StoreError::missing_parent("client", client_id));
            }
        }
        let Some(project) = tables.projects.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(client_id) = patch.client_id {
            project.client_id = client_id;
        }
        if let Some(name) = patch.name {
            project.name = name;
        }
        if let Some(description) = patch.description {
            project.description = description;
        }
        if let Some(brief) = patch.brief {
            project.brief = brief;
        }
        if let Some(archived) = patch.archived {
            project.archived = archived;
        }
        project.updated_at = Utc::now();
        Ok(Some(project.clone()))
    }

    async fn delete_project(&self, id: ProjectId, actor: &Actor) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        if tables.visible_project(id, actor).is_none() {
            return Ok(false);
        }
        let removed = tables.remove_project_tree(id);
        debug!(project = %id, descendants = removed, "Deleted project");
        Ok(true)
    }

    async fn list_assets(
        &self,
        project_id: Option<ProjectId>,
        actor: &Actor,
    ) -> StoreResult<Vec<AssetWithProject>> {
        let tables = self.tables.read();
        let rows = newest_first(
            &tables.assets,
            |a| {
                actor.can_access(a.created_by_user_id)
                    && project_id.map_or(true, |p| a.project_id == p)
            },
            |a| a.created_at,
        );
        Ok(rows
            .into_iter()
            .filter_map(|a| tables.asset_view(a))
            .collect())
    }

    async fn get_asset(&self, id: AssetId, actor: &Actor) -> StoreResult<Option<AssetWithProject>> {
        let tables = self.tables.read();
        Ok(tables
            .visible_asset(id, actor)
            .and_then(|a| tables.asset_view(a)))
    }

    async fn create_asset(&self, draft: AssetDraft, owner: UserId) -> StoreResult<Asset> {
        let mut tables = self.tables.write();
        if !tables.projects.contains_key(&draft.project_id) {
            return Err(StoreError::missing_parent("project", draft.project_id));
        }

        let now = Utc::now();
        let record = Asset {
            id: AssetId::new(),
            project_id: draft.project_id,
            name: draft.name,
            master_asset_url: draft.master_asset_url,
            template_svg: draft.template_svg,
            template_fonts: draft.template_fonts,
            default_bindings: draft.default_bindings,
            style_hints: draft.style_hints,
            created_by_user_id: owner,
            created_at: now,
            updated_at: now,
        };
        tables.assets.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_asset(
        &self,
        id: AssetId,
        patch: AssetPatch,
        actor: &Actor,
    ) -> StoreResult<Option<Asset>> {
        let mut tables = self.tables.write();
        if tables.visible_asset(id, actor).is_none() {
            return Ok(None);
        }
        if let Some(project_id) = patch.project_id {
            if tables.visible_project(project_id, actor).is_none() {
                return Err(StoreError::missing_parent("project", project_id));
            }
        }
        let Some(asset) = tables.assets.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(project_id) = patch.project_id {
            asset.project_id = project_id;
        }
        if let Some(name) = patch.name {
            asset.name = name;
        }
        if let Some(url) = patch.master_asset_url {
            asset.master_asset_url = url;
        }
        if let Some(svg) = patch.template_svg {
            asset.template_svg = svg;
        }
        if let Some(fonts) = patch.template_fonts {
            asset.template_fonts = fonts;
        }
        if let Some(bindings) = patch.default_bindings {
            asset.default_bindings = bindings;
        }
        if let Some(hints) = patch.style_hints {
            asset.style_hints = hints;
        }
        asset.updated_at = Utc::now();
        Ok(Some(asset.clone()))
    }

    async fn delete_asset(&self, id: AssetId, actor: &Actor) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        if tables.visible_asset(id, actor).is_none() {
            return Ok(false);
        }
        let removed = tables.remove_asset_tree(id);
        debug!(asset = %id, variants = removed, "Deleted asset");
        Ok(true)
    }

    async fn list_variants(
        &self,
        asset_id: Option<AssetId>,
        actor: &Actor,
    ) -> StoreResult<Vec<VariantWithAsset>> {
        let tables = self.tables.read();
        let rows = newest_first(
            &tables.variants,
            |v| {
                actor.can_access(v.created_by_user_id)
                    && asset_id.map_or(true, |a| v.asset_id == a)
            },
            |v| v.created_at,
        );
        Ok(rows
            .into_iter()
            .filter_map(|v| tables.variant_view(v))
            .collect())
    }

    async fn get_variant(
        &self,
        id: VariantId,
        actor: &Actor,
    ) -> StoreResult<Option<VariantWithAsset>> {
        let tables = self.tables.read();
        Ok(tables
            .visible_variant(id, actor)
            .and_then(|v| tables.variant_view(v)))
    }

    async fn create_variant(&self, draft: VariantDraft, owner: UserId) -> StoreResult<Variant> {
        let mut tables = self.tables.write();
        if !tables.assets.contains_key(&draft.asset_id) {
            return Err(StoreError::missing_parent("asset", draft.asset_id));
        }

        let now = Utc::now();
        let record = Variant {
            id: VariantId::new(),
            asset_id: draft.asset_id,
            source: draft.source,
            bindings: draft.bindings,
            render_svg: draft.render_svg,
            render_png_url: draft.render_png_url,
            status: draft.status,
            error_message: draft.error_message,
            created_by_user_id: owner,
            created_at: now,
            updated_at: now,
        };
        tables.variants.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_variant(
        &self,
        id: VariantId,
        patch: VariantPatch,
        actor: &Actor,
    ) -> StoreResult<Option<Variant>> {
        let mut tables = self.tables.write();
        if tables.visible_variant(id, actor).is_none() {
            return Ok(None);
        }
        if let Some(asset_id) = patch.asset_id {
            if tables.visible_asset(asset_id, actor).is_none() {
                return Err(StoreError::missing_parent("asset", asset_id));
            }
        }
        let Some(variant) = tables.variants.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(asset_id) = patch.asset_id {
            variant.asset_id = asset_id;
        }
        if let Some(source) = patch.source {
            variant.source = source;
        }
        if let Some(bindings) = patch.bindings {
            variant.bindings = bindings;
        }
        if let Some(svg) = patch.render_svg {
            variant.render_svg = svg;
        }
        if let Some(url) = patch.render_png_url {
            variant.render_png_url = url;
        }
        if let Some(status) = patch.status {
            variant.status = status;
        }
        if let Some(message) = patch.error_message {
            variant.error_message = message;
        }
        variant.updated_at = Utc::now();
        Ok(Some(variant.clone()))
    }

    async fn delete_variant(&self, id: VariantId, actor: &Actor) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        if tables.visible_variant(id, actor).is_none() {
            return Ok(false);
        }
        tables.variants.shift_remove(&id);
        Ok(true)
    }

    async fn dashboard_stats(&self, actor: &Actor) -> StoreResult<DashboardStats> {
        let tables = self.tables.read();
        let count = |owners: &mut dyn Iterator<Item = UserId>| {
            owners.filter(|owner| actor.can_access(*owner)).count() as u64
        };

        Ok(DashboardStats {
            total_clients: count(&mut tables.clients.values().map(|c| c.created_by_user_id)),
            active_projects: count(
                &mut tables
                    .projects
                    .values()
                    .filter(|p| !p.is_archived())
                    .map(|p| p.created_by_user_id),
            ),
            template_assets: count(&mut tables.assets.values().map(|a| a.created_by_user_id)),
            generated_variants: count(
                &mut tables.variants.values().map(|v| v.created_by_user_id),
            ),
        })
    }
}
