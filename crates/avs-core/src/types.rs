//! Core records for the studio
//!
//! Defines the persisted shapes of the hierarchy:
//! - Users and their roles
//! - Clients → projects → template assets → variants
//! - Joined views returned by list/detail endpoints
//! - Dashboard aggregates
//!
//! All records serialize with camelCase keys, which is the wire format of
//! the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random id
            #[inline]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Underlying UUID
            #[inline]
            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(
    /// Unique user identifier
    UserId
);
define_id!(
    /// Unique client identifier
    ClientId
);
define_id!(
    /// Unique project identifier
    ProjectId
);
define_id!(
    /// Unique template asset identifier
    AssetId
);
define_id!(
    /// Unique variant identifier
    VariantId
);

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Sees and manages every record
    Admin,
    /// Sees and manages only owned records
    #[default]
    User,
}

impl Role {
    /// Database/wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }

    /// Check whether this is the admin role
    #[inline]
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Who created a variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VariantSource {
    /// Hand-authored
    #[default]
    User,
    /// Produced by the auto-generate flow
    Auto,
}

impl VariantSource {
    /// Database/wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            VariantSource::User => "USER",
            VariantSource::Auto => "AUTO",
        }
    }
}

impl FromStr for VariantSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(VariantSource::User),
            "AUTO" => Ok(VariantSource::Auto),
            other => Err(format!("unknown variant source: {other}")),
        }
    }
}

/// Variant lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VariantStatus {
    /// Not yet reviewed
    #[default]
    Draft,
    /// Approved for use
    Ready,
    /// Rendering or generation failed
    Error,
}

impl VariantStatus {
    /// Database/wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            VariantStatus::Draft => "DRAFT",
            VariantStatus::Ready => "READY",
            VariantStatus::Error => "ERROR",
        }
    }
}

impl FromStr for VariantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(VariantStatus::Draft),
            "READY" => Ok(VariantStatus::Ready),
            "ERROR" => Ok(VariantStatus::Error),
            other => Err(format!("unknown variant status: {other}")),
        }
    }
}

/// Registered account
///
/// The password hash never leaves the server; use [`User::profile`] for
/// anything sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Public profile
    #[inline]
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

/// Public user shape, also stored in the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
}

/// Advertiser account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub description: Option<String>,
    pub created_by_user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Campaign under a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub client_id: ClientId,
    pub name: String,
    pub description: Option<String>,
    pub brief: Option<String>,
    /// Archive timestamp; `None` while active
    pub archived: Option<DateTime<Utc>>,
    pub created_by_user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Whether the project has been archived
    #[inline]
    #[must_use]
    pub fn is_archived(&self) -> bool {
        self.archived.is_some()
    }
}

/// Font used by a template
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FontFace {
    pub family: String,
    pub url: String,
    pub weight: String,
    pub style: String,
}

/// Fallback copy for a template
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultBindings {
    pub headline: String,
    pub subheadline: String,
    pub cta: String,
    pub image: String,
}

/// Brand guidance fed into generation prompts
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleHints {
    pub palette: Vec<String>,
    pub brand: String,
    pub notes: String,
}

/// SVG template with placeholder tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: AssetId,
    pub project_id: ProjectId,
    pub name: String,
    /// Source creative the template was derived from
    pub master_asset_url: Option<String>,
    pub template_svg: String,
    pub template_fonts: Vec<FontFace>,
    pub default_bindings: DefaultBindings,
    pub style_hints: StyleHints,
    pub created_by_user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values substituted into a template
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VariantBindings {
    pub headline: String,
    pub subheadline: String,
    pub cta: String,
    pub image_url: String,
}

impl VariantBindings {
    /// Bindings built from an asset's defaults
    #[must_use]
    pub fn from_defaults(defaults: &DefaultBindings) -> Self {
        Self {
            headline: defaults.headline.clone(),
            subheadline: defaults.subheadline.clone(),
            cta: defaults.cta.clone(),
            image_url: defaults.image.clone(),
        }
    }
}

/// Rendered ad variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: VariantId,
    pub asset_id: AssetId,
    pub source: VariantSource,
    pub bindings: VariantBindings,
    pub render_svg: String,
    pub render_png_url: Option<String>,
    pub status: VariantStatus,
    pub error_message: Option<String>,
    pub created_by_user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Project joined with its client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectWithClient {
    #[serde(flatten)]
    pub project: Project,
    pub client: Client,
}

/// Asset joined with its project and client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetWithProject {
    #[serde(flatten)]
    pub asset: Asset,
    pub project: ProjectWithClient,
}

/// Variant joined with its asset, project and client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantWithAsset {
    #[serde(flatten)]
    pub variant: Variant,
    pub asset: AssetWithProject,
}

/// Dashboard counters, scoped to what the caller can see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_clients: u64,
    pub active_projects: u64,
    pub template_assets: u64,
    pub generated_variants: u64,
}
