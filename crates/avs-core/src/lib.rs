//! Ad Variants Studio - domain core
//!
//! The shared vocabulary of the studio:
//! - Records for users, clients, projects, template assets and variants
//! - Request payloads and their validation
//! - Role-based access rules
//! - SVG template rendering
//!
//! # Example
//!
//! ```rust
//! use avs_core::render::render;
//! use avs_core::VariantBindings;
//!
//! let bindings = VariantBindings {
//!     headline: "Spring Sale".into(),
//!     ..VariantBindings::default()
//! };
//! let out = render("<svg><text>{{headline}}</text></svg>", &bindings);
//! assert_eq!(out.svg, "<svg><text>Spring Sale</text></svg>");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod input;
pub mod rbac;
pub mod render;
pub mod types;

pub use error::{Issue, Issues, ValidationError};
pub use input::{
    AssetPatch, BatchGenerationRequest, ClientPatch, CopyConstraints, ImageGenerationRequest,
    LoginInput, NewAsset, NewClient, NewProject, NewVariant, ProjectPatch, RegisterInput,
    TextGenerationRequest, Tone, Validate, VariantPatch,
};
pub use rbac::{Actor, Permission, Permissions};
pub use types::{
    Asset, AssetId, AssetWithProject, Client, ClientId, DashboardStats, DefaultBindings, FontFace,
    Project, ProjectId, ProjectWithClient, Role, StyleHints, User, UserId, UserProfile, Variant,
    VariantBindings, VariantId, VariantSource, VariantStatus, VariantWithAsset,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the studio domain
    pub use crate::{
        Actor, Asset, AssetId, Client, ClientId, Project, ProjectId, Role, User, UserId,
        Validate, ValidationError, Variant, VariantBindings, VariantId,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
