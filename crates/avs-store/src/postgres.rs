//! PostgreSQL storage backend
//!
//! Queries are built at runtime and decoded by column name. Joined selects
//! prefix each table's columns (`u_`, `c_`, `p_`, `a_`, `v_`) so a single row
//! can carry a variant together with its asset, project and client.
//!
//! Enum columns are read back as text and bound as text with an explicit
//! cast; JSON payloads (fonts, bindings, style hints) live in JSONB columns.

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
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

const USER_COLUMNS: &str = "u.id AS u_id, u.email AS u_email, u.name AS u_name, \
    u.password_hash AS u_password_hash, u.role::text AS u_role, \
    u.created_at AS u_created_at, u.updated_at AS u_updated_at";

const CLIENT_COLUMNS: &str = "c.id AS c_id, c.name AS c_name, c.description AS c_description, \
    c.created_by_user_id AS c_created_by_user_id, \
    c.created_at AS c_created_at, c.updated_at AS c_updated_at";

const PROJECT_COLUMNS: &str = "p.id AS p_id, p.client_id AS p_client_id, p.name AS p_name, \
    p.description AS p_description, p.brief AS p_brief, p.archived AS p_archived, \
    p.created_by_user_id AS p_created_by_user_id, \
    p.created_at AS p_created_at, p.updated_at AS p_updated_at";

const ASSET_COLUMNS: &str = "a.id AS a_id, a.project_id AS a_project_id, a.name AS a_name, \
    a.master_asset_url AS a_master_asset_url, a.template_svg AS a_template_svg, \
    a.template_fonts AS a_template_fonts, a.default_bindings AS a_default_bindings, \
    a.style_hints AS a_style_hints, a.created_by_user_id AS a_created_by_user_id, \
    a.created_at AS a_created_at, a.updated_at AS a_updated_at";

const VARIANT_COLUMNS: &str = "v.id AS v_id, v.asset_id AS v_asset_id, \
    v.source::text AS v_source, v.bindings AS v_bindings, v.render_svg AS v_render_svg, \
    v.render_png_url AS v_render_png_url, v.status::text AS v_status, \
    v.error_message AS v_error_message, v.created_by_user_id AS v_created_by_user_id, \
    v.created_at AS v_created_at, v.updated_at AS v_updated_at";

const PROJECT_JOIN: &str = "projects p JOIN clients c ON c.id = p.client_id";

const ASSET_JOIN: &str =
    "assets a JOIN projects p ON p.id = a.project_id JOIN clients c ON c.id = p.client_id";

const VARIANT_JOIN: &str = "variants v JOIN assets a ON a.id = v.asset_id \
    JOIN projects p ON p.id = a.project_id JOIN clients c ON c.id = p.client_id";

const OWNED_CLIENT: &str = "SELECT 1 FROM clients c \
    WHERE c.id = $1 AND ($2::uuid IS NULL OR c.created_by_user_id = $2) FOR UPDATE";

const OWNED_PROJECT: &str = "SELECT 1 FROM projects p \
    WHERE p.id = $1 AND ($2::uuid IS NULL OR p.created_by_user_id = $2) FOR UPDATE";

const OWNED_ASSET: &str = "SELECT 1 FROM assets a \
    WHERE a.id = $1 AND ($2::uuid IS NULL OR a.created_by_user_id = $2) FOR UPDATE";

const OWNED_VARIANT: &str = "SELECT 1 FROM variants v \
    WHERE v.id = $1 AND ($2::uuid IS NULL OR v.created_by_user_id = $2) FOR UPDATE";

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Storage backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    /// Wrap an existing pool
    #[inline]
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `url` with at most `max_connections` pooled connections
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        info!(max_connections, "Connected to PostgreSQL");
        Ok(Self::new(pool))
    }

    /// Apply embedded schema migrations
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database schema is up to date");
        Ok(())
    }

    /// Underlying pool
    #[inline]
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn owner(actor: &Actor) -> Option<Uuid> {
    actor.owner_filter().map(|id| id.as_uuid())
}

/// Lock the row `id` if `actor` may modify it; `sql` is one of the `OWNED_*`
/// queries
async fn lock_owned(
    conn: &mut PgConnection,
    sql: &str,
    id: Uuid,
    actor: &Actor,
) -> StoreResult<bool> {
    let row = sqlx::query(sql)
        .bind(id)
        .bind(owner(actor))
        .fetch_optional(conn)
        .await?;
    Ok(row.is_some())
}

fn sql_code(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.code().map(|code| code.into_owned()),
        _ => None,
    }
}

/// Translate a foreign-key failure on insert into a missing parent
fn parent_error(err: sqlx::Error, kind: &'static str, id: Uuid) -> StoreError {
    if sql_code(&err).as_deref() == Some(FOREIGN_KEY_VIOLATION) {
        StoreError::missing_parent(kind, id)
    } else {
        StoreError::Database(err)
    }
}

fn parse_enum<T: FromStr<Err = String>>(raw: &str) -> StoreResult<T> {
    raw.parse().map_err(StoreError::Corrupt)
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    let role: String = row.try_get("u_role")?;
    Ok(User {
        id: UserId(row.try_get("u_id")?),
        email: row.try_get("u_email")?,
        name: row.try_get("u_name")?,
        password_hash: row.try_get("u_password_hash")?,
        role: parse_enum(&role)?,
        created_at: row.try_get("u_created_at")?,
        updated_at: row.try_get("u_updated_at")?,
    })
}

fn client_from_row(row: &PgRow) -> StoreResult<Client> {
    Ok(Client {
        id: ClientId(row.try_get("c_id")?),
        name: row.try_get("c_name")?,
        description: row.try_get("c_description")?,
        created_by_user_id: UserId(row.try_get("c_created_by_user_id")?),
        created_at: row.try_get("c_created_at")?,
        updated_at: row.try_get("c_updated_at")?,
    })
}

fn project_from_row(row: &PgRow) -> StoreResult<Project> {
    Ok(Project {
        id: ProjectId(row.try_get("p_id")?),
        client_id: ClientId(row.try_get("p_client_id")?),
        name: row.try_get("p_name")?,
        description: row.try_get("p_description")?,
        brief: row.try_get("p_brief")?,
        archived: row.try_get("p_archived")?,
        created_by_user_id: UserId(row.try_get("p_created_by_user_id")?),
        created_at: row.try_get("p_created_at")?,
        updated_at: row.try_get("p_updated_at")?,
    })
}

fn asset_from_row(row: &PgRow) -> StoreResult<Asset> {
    let Json(template_fonts) = row.try_get("a_template_fonts")?;
    let Json(default_bindings) = row.try_get("a_default_bindings")?;
    let Json(style_hints) = row.try_get("a_style_hints")?;
    Ok(Asset {
        id: AssetId(row.try_get("a_id")?),
        project_id: ProjectId(row.try_get("a_project_id")?),
        name: row.try_get("a_name")?,
        master_asset_url: row.try_get("a_master_asset_url")?,
        template_svg: row.try_get("a_template_svg")?,
        template_fonts,
        default_bindings,
        style_hints,
        created_by_user_id: UserId(row.try_get("a_created_by_user_id")?),
        created_at: row.try_get("a_created_at")?,
        updated_at: row.try_get("a_updated_at")?,
    })
}

fn variant_from_row(row: &PgRow) -> StoreResult<Variant> {
    let source: String = row.try_get("v_source")?;
    let status: String = row.try_get("v_status")?;
    let Json(bindings) = row.try_get("v_bindings")?;
    Ok(Variant {
        id: VariantId(row.try_get("v_id")?),
        asset_id: AssetId(row.try_get("v_asset_id")?),
        source: parse_enum(&source)?,
        bindings,
        render_svg: row.try_get("v_render_svg")?,
        render_png_url: row.try_get("v_render_png_url")?,
        status: parse_enum(&status)?,
        error_message: row.try_get("v_error_message")?,
        created_by_user_id: UserId(row.try_get("v_created_by_user_id")?),
        created_at: row.try_get("v_created_at")?,
        updated_at: row.try_get("v_updated_at")?,
    })
}

fn project_view_from_row(row: &PgRow) -> StoreResult<ProjectWithClient> {
    Ok(ProjectWithClient {
        project: project_from_row(row)?,
        client: client_from_row(row)?,
    })
}

fn asset_view_from_row(row: &PgRow) -> StoreResult<AssetWithProject> {
    Ok(AssetWithProject {
        asset: asset_from_row(row)?,
        project: project_view_from_row(row)?,
    })
}

fn variant_view_from_row(row: &PgRow) -> StoreResult<VariantWithAsset> {
    Ok(VariantWithAsset {
        variant: variant_from_row(row)?,
        asset: asset_view_from_row(row)?,
    })
}

/// Split a nullable patch field into (present, value) bind parameters
fn nullable<T>(field: Option<Option<T>>) -> (bool, Option<T>) {
    match field {
        Some(value) => (true, value),
        None => (false, None),
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.email = $1");
        let row = sqlx::query(&sql)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let email = normalize_email(&user.email);
        let sql = format!(
            "INSERT INTO users AS u (id, email, name, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5::user_role) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(&email)
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                if sql_code(&err).as_deref() == Some(UNIQUE_VIOLATION) {
                    StoreError::DuplicateEmail(email.clone())
                } else {
                    StoreError::Database(err)
                }
            })?;
        user_from_row(&row)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u ORDER BY u.created_at DESC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn list_clients(&self, actor: &Actor) -> StoreResult<Vec<Client>> {
        let sql = format!(
            "SELECT {CLIENT_COLUMNS} FROM clients c \
             WHERE ($1::uuid IS NULL OR c.created_by_user_id = $1) \
             ORDER BY c.created_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(owner(actor))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(client_from_row).collect()
    }

    async fn get_client(&self, id: ClientId, actor: &Actor) -> StoreResult<Option<Client>> {
        let sql = format!(
            "SELECT {CLIENT_COLUMNS} FROM clients c \
             WHERE c.id = $1 AND ($2::uuid IS NULL OR c.created_by_user_id = $2)"
        );
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(owner(actor))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(client_from_row).transpose()
    }

    async fn create_client(&self, input: NewClient, owner_id: UserId) -> StoreResult<Client> {
        let sql = format!(
            "INSERT INTO clients AS c (id, name, description, created_by_user_id) \
             VALUES ($1, $2, $3, $4) RETURNING {CLIENT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.name)
            .bind(&input.description)
            .bind(owner_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;
        client_from_row(&row)
    }

    async fn update_client(
        &self,
        id: ClientId,
        patch: ClientPatch,
        actor: &Actor,
    ) -> StoreResult<Option<Client>> {
        let (set_description, description) = nullable(patch.description);
        let sql = format!(
            "UPDATE clients AS c SET \
                name = COALESCE($3, c.name), \
                description = CASE WHEN $4 THEN $5 ELSE c.description END, \
                updated_at = now() \
             WHERE c.id = $1 AND ($2::uuid IS NULL OR c.created_by_user_id = $2) \
             RETURNING {CLIENT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(owner(actor))
            .bind(patch.name)
            .bind(set_description)
            .bind(description)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(client_from_row).transpose()
    }

    async fn delete_client(&self, id: ClientId, actor: &Actor) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        if !lock_owned(&mut tx, OWNED_CLIENT, id.as_uuid(), actor).await? {
            return Ok(false);
        }

        sqlx::query(
            "DELETE FROM variants WHERE asset_id IN \
             (SELECT a.id FROM assets a JOIN projects p ON p.id = a.project_id WHERE p.client_id = $1)",
        )
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "DELETE FROM assets WHERE project_id IN (SELECT id FROM projects WHERE client_id = $1)",
        )
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await?;
        let projects = sqlx::query("DELETE FROM projects WHERE client_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(client = %id, projects = projects.rows_affected(), "Deleted client");
        Ok(true)
    }

    async fn list_projects(
        &self,
        filter: ProjectFilter,
        actor: &Actor,
    ) -> StoreResult<Vec<ProjectWithClient>> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS}, {CLIENT_COLUMNS} FROM {PROJECT_JOIN} \
             WHERE ($1::uuid IS NULL OR p.created_by_user_id = $1) \
               AND ($2::uuid IS NULL OR p.client_id = $2) \
               AND ($3 OR p.archived IS NULL) \
             ORDER BY p.created_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(owner(actor))
            .bind(filter.client_id.map(|c| c.as_uuid()))
            .bind(filter.include_archived)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(project_view_from_row).collect()
    }

    async fn get_project(
        &self,
        id: ProjectId,
        actor: &Actor,
    ) -> StoreResult<Option<ProjectWithClient>> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS}, {CLIENT_COLUMNS} FROM {PROJECT_JOIN} \
             WHERE p.id = $1 AND ($2::uuid IS NULL OR p.created_by_user_id = $2)"
        );
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(owner(actor))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(project_view_from_row).transpose()
    }

    async fn create_project(&self, input: NewProject, owner_id: UserId) -> StoreResult<Project> {
        let sql = format!(
            "INSERT INTO projects AS p \
                (id, client_id, name, description, brief, archived, created_by_user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {PROJECT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(input.client_id.as_uuid())
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.brief)
            .bind(input.archived)
            .bind(owner_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| parent_error(err, "client", input.client_id.as_uuid()))?;
        project_from_row(&row)
    }

    async fn update_project(
        &self,
        id: ProjectId,
        patch: ProjectPatch,
        actor: &Actor,
    ) -> StoreResult<Option<Project>> {
        let mut tx = self.pool.begin().await?;
        if !lock_owned(&mut tx, OWNED_PROJECT, id.as_uuid(), actor).await? {
            return Ok(None);
        }
        if let Some(client_id) = patch.client_id {
            if !lock_owned(&mut tx, OWNED_CLIENT, client_id.as_uuid(), actor).await? {
                return Err(StoreError::missing_parent("client", client_id));
            }
        }

        let (set_description, description) = nullable(patch.description);
        let (set_brief, brief) = nullable(patch.brief);
        let (set_archived, archived) = nullable(patch.archived);
        let sql = format!(
            "UPDATE projects AS p SET \
                client_id = COALESCE($3, p.client_id), \
                name = COALESCE($4, p.name), \
                description = CASE WHEN $5 THEN $6 ELSE p.description END, \
                brief = CASE WHEN $7 THEN $8 ELSE p.brief END, \
                archived = CASE WHEN $9 THEN $10 ELSE p.archived END, \
                updated_at = now() \
             WHERE p.id = $1 AND ($2::uuid IS NULL OR p.created_by_user_id = $2) \
             RETURNING {PROJECT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(owner(actor))
            .bind(patch.client_id.map(|c| c.as_uuid()))
            .bind(patch.name)
            .bind(set_description)
            .bind(description)
            .bind(set_brief)
            .bind(brief)
            .bind(set_archived)
            .bind(archived)
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;
        row.as_ref().map(project_from_row).transpose()
    }

    async fn delete_project(&self, id: ProjectId, actor: &Actor) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        if !lock_owned(&mut tx, OWNED_PROJECT, id.as_uuid(), actor).await? {
            return Ok(false);
        }

        sqlx::query(
            "DELETE FROM variants WHERE asset_id IN (SELECT id FROM assets WHERE project_id = $1)",
        )
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await?;
        let assets = sqlx::query("DELETE FROM assets WHERE project_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(project = %id, assets = assets.rows_affected(), "Deleted project");
        Ok(true)
    }

    async fn list_assets(
        &self,
        project_id: Option<ProjectId>,
        actor: &Actor,
    ) -> StoreResult<Vec<AssetWithProject>> {
        let sql = format!(
            "SELECT {ASSET_COLUMNS}, {PROJECT_COLUMNS}, {CLIENT_COLUMNS} FROM {ASSET_JOIN} \
             WHERE ($1::uuid IS NULL OR a.created_by_user_id = $1) \
               AND ($2::uuid IS NULL OR a.project_id = $2) \
             ORDER BY a.created_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(owner(actor))
            .bind(project_id.map(|p| p.as_uuid()))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(asset_view_from_row).collect()
    }

    async fn get_asset(&self, id: AssetId, actor: &Actor) -> StoreResult<Option<AssetWithProject>> {
        let sql = format!(
            "SELECT {ASSET_COLUMNS}, {PROJECT_COLUMNS}, {CLIENT_COLUMNS} FROM {ASSET_JOIN} \
             WHERE a.id = $1 AND ($2::uuid IS NULL OR a.created_by_user_id = $2)"
        );
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(owner(actor))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(asset_view_from_row).transpose()
    }

    async fn create_asset(&self, draft: AssetDraft, owner_id: UserId) -> StoreResult<Asset> {
        let sql = format!(
            "INSERT INTO assets AS a \
                (id, project_id, name, master_asset_url, template_svg, \
                 template_fonts, default_bindings, style_hints, created_by_user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {ASSET_COLUMNS}"
        );
        let project_id = draft.project_id.as_uuid();
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(project_id)
            .bind(draft.name)
            .bind(draft.master_asset_url)
            .bind(draft.template_svg)
            .bind(Json(draft.template_fonts))
            .bind(Json(draft.default_bindings))
            .bind(Json(draft.style_hints))
            .bind(owner_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| parent_error(err, "project", project_id))?;
        asset_from_row(&row)
    }

    async fn update_asset(
        &self,
        id: AssetId,
        patch: AssetPatch,
        actor: &Actor,
    ) -> StoreResult<Option<Asset>> {
        let mut tx = self.pool.begin().await?;
        if !lock_owned(&mut tx, OWNED_ASSET, id.as_uuid(), actor).await? {
            return Ok(None);
        }
        if let Some(project_id) = patch.project_id {
            if !lock_owned(&mut tx, OWNED_PROJECT, project_id.as_uuid(), actor).await? {
                return Err(StoreError::missing_parent("project", project_id));
            }
        }

        let (set_master, master_asset_url) = nullable(patch.master_asset_url);
        let sql = format!(
            "UPDATE assets AS a SET \
                project_id = COALESCE($3, a.project_id), \
                name = COALESCE($4, a.name), \
                master_asset_url = CASE WHEN $5 THEN $6 ELSE a.master_asset_url END, \
                template_svg = COALESCE($7, a.template_svg), \
                template_fonts = COALESCE($8, a.template_fonts), \
                default_bindings = COALESCE($9, a.default_bindings), \
                style_hints = COALESCE($10, a.style_hints), \
                updated_at = now() \
             WHERE a.id = $1 AND ($2::uuid IS NULL OR a.created_by_user_id = $2) \
             RETURNING {ASSET_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(owner(actor))
            .bind(patch.project_id.map(|p| p.as_uuid()))
            .bind(patch.name)
            .bind(set_master)
            .bind(master_asset_url)
            .bind(patch.template_svg)
            .bind(patch.template_fonts.map(Json))
            .bind(patch.default_bindings.map(Json))
            .bind(patch.style_hints.map(Json))
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;
        row.as_ref().map(asset_from_row).transpose()
    }

    async fn delete_asset(&self, id: AssetId, actor: &Actor) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        if !lock_owned(&mut tx, OWNED_ASSET, id.as_uuid(), actor).await? {
            return Ok(false);
        }

        let variants = sqlx::query("DELETE FROM variants WHERE asset_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM assets WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(asset = %id, variants = variants.rows_affected(), "Deleted asset");
        Ok(true)
    }

    async fn list_variants(
        &self,
        asset_id: Option<AssetId>,
        actor: &Actor,
    ) -> StoreResult<Vec<VariantWithAsset>> {
        let sql = format!(
            "SELECT {VARIANT_COLUMNS}, {ASSET_COLUMNS}, {PROJECT_COLUMNS}, {CLIENT_COLUMNS} \
             FROM {VARIANT_JOIN} \
             WHERE ($1::uuid IS NULL OR v.created_by_user_id = $1) \
               AND ($2::uuid IS NULL OR v.asset_id = $2) \
             ORDER BY v.created_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(owner(actor))
            .bind(asset_id.map(|a| a.as_uuid()))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(variant_view_from_row).collect()
    }

    async fn get_variant(
        &self,
        id: VariantId,
        actor: &Actor,
    ) -> StoreResult<Option<VariantWithAsset>> {
        let sql = format!(
            "SELECT {VARIANT_COLUMNS}, {ASSET_COLUMNS}, {PROJECT_COLUMNS}, {CLIENT_COLUMNS} \
             FROM {VARIANT_JOIN} \
             WHERE v.id = $1 AND ($2::uuid IS NULL OR v.created_by_user_id = $2)"
        );
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(owner(actor))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(variant_view_from_row).transpose()
    }

    async fn create_variant(&self, draft: VariantDraft, owner_id: UserId) -> StoreResult<Variant> {
        let sql = format!(
            "INSERT INTO variants AS v \
                (id, asset_id, source, bindings, render_svg, render_png_url, \
                 status, error_message, created_by_user_id) \
             VALUES ($1, $2, $3::variant_source, $4, $5, $6, $7::variant_status, $8, $9) \
             RETURNING {VARIANT_COLUMNS}"
        );
        let asset_id = draft.asset_id.as_uuid();
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(asset_id)
            .bind(draft.source.as_str())
            .bind(Json(draft.bindings))
            .bind(draft.render_svg)
            .bind(draft.render_png_url)
            .bind(draft.status.as_str())
            .bind(draft.error_message)
            .bind(owner_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| parent_error(err, "asset", asset_id))?;
        variant_from_row(&row)
    }

    async fn update_variant(
        &self,
        id: VariantId,
        patch: VariantPatch,
        actor: &Actor,
    ) -> StoreResult<Option<Variant>> {
        let mut tx = self.pool.begin().await?;
        if !lock_owned(&mut tx, OWNED_VARIANT, id.as_uuid(), actor).await? {
            return Ok(None);
        }
        if let Some(asset_id) = patch.asset_id {
            if !lock_owned(&mut tx, OWNED_ASSET, asset_id.as_uuid(), actor).await? {
                return Err(StoreError::missing_parent("asset", asset_id));
            }
        }

        let (set_png, render_png_url) = nullable(patch.render_png_url);
        let (set_error, error_message) = nullable(patch.error_message);
        let sql = format!(
            "UPDATE variants AS v SET \
                asset_id = COALESCE($3, v.asset_id), \
                source = COALESCE($4::variant_source, v.source), \
                bindings = COALESCE($5, v.bindings), \
                render_svg = COALESCE($6, v.render_svg), \
                render_png_url = CASE WHEN $7 THEN $8 ELSE v.render_png_url END, \
                status = COALESCE($9::variant_status, v.status), \
                error_message = CASE WHEN $10 THEN $11 ELSE v.error_message END, \
                updated_at = now() \
             WHERE v.id = $1 AND ($2::uuid IS NULL OR v.created_by_user_id = $2) \
             RETURNING {VARIANT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(owner(actor))
            .bind(patch.asset_id.map(|a| a.as_uuid()))
            .bind(patch.source.map(|s| s.as_str()))
            .bind(patch.bindings.map(Json))
            .bind(patch.render_svg)
            .bind(set_png)
            .bind(render_png_url)
            .bind(patch.status.map(|s| s.as_str()))
            .bind(set_error)
            .bind(error_message)
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;
        row.as_ref().map(variant_from_row).transpose()
    }

    async fn delete_variant(&self, id: VariantId, actor: &Actor) -> StoreResult<bool> {
        let result = sqlx::query(
            "DELETE FROM variants v \
             WHERE v.id = $1 AND ($2::uuid IS NULL OR v.created_by_user_id = $2)",
        )
        .bind(id.as_uuid())
        .bind(owner(actor))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn dashboard_stats(&self, actor: &Actor) -> StoreResult<DashboardStats> {
        let row = sqlx::query(
            "SELECT \
                (SELECT COUNT(*) FROM clients \
                    WHERE $1::uuid IS NULL OR created_by_user_id = $1) AS total_clients, \
                (SELECT COUNT(*) FROM projects \
                    WHERE archived IS NULL AND ($1::uuid IS NULL OR created_by_user_id = $1)) \
                    AS active_projects, \
                (SELECT COUNT(*) FROM assets \
                    WHERE $1::uuid IS NULL OR created_by_user_id = $1) AS template_assets, \
                (SELECT COUNT(*) FROM variants \
                    WHERE $1::uuid IS NULL OR created_by_user_id = $1) AS generated_variants",
        )
        .bind(owner(actor))
        .fetch_one(&self.pool)
        .await?;

        let count = |column: &str| -> StoreResult<u64> {
            let n: i64 = row.try_get(column)?;
            u64::try_from(n).map_err(|_| StoreError::Corrupt(format!("negative {column}")))
        };
        Ok(DashboardStats {
            total_clients: count("total_clients")?,
            active_projects: count("active_projects")?,
            template_assets: count("template_assets")?,
            generated_variants: count("generated_variants")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullable_splits_presence_from_value() {
        assert_eq!(nullable::<String>(None), (false, None));
        assert_eq!(nullable::<String>(Some(None)), (true, None));
        assert_eq!(nullable(Some(Some(3))), (true, Some(3)));
    }

    #[test]
    fn owner_filter_is_absent_for_admins() {
        let id = UserId::new();
        assert_eq!(owner(&Actor::admin(id)), None);
        assert_eq!(owner(&Actor::user(id)), Some(id.as_uuid()));
    }

    #[test]
    fn column_lists_use_distinct_prefixes() {
        for (columns, prefix) in [
            (USER_COLUMNS, " AS u_"),
            (CLIENT_COLUMNS, " AS c_"),
            (PROJECT_COLUMNS, " AS p_"),
            (ASSET_COLUMNS, " AS a_"),
            (VARIANT_COLUMNS, " AS v_"),
        ] {
            let aliases = columns.matches(" AS ").count();
            assert_eq!(columns.matches(prefix).count(), aliases, "{prefix}");
        }
    }

    #[test]
    fn corrupt_enum_values_are_reported() {
        let err = parse_enum::<avs_core::Role>("ROOT").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
