//! Ad Variants Studio - persistence
//!
//! A single async [`Storage`] trait covers users, the
//! client → project → asset → variant hierarchy and dashboard counters.
//!
//! # Backends
//!
//! - [`MemoryStorage`]: process-local tables, used for development, demos
//!   and tests
//! - `PgStorage` (feature `postgres`): PostgreSQL through sqlx with embedded
//!   migrations
//!
//! # Access scoping
//!
//! Every record operation takes an [`avs_core::Actor`]. Admins see all rows;
//! users see only rows they created. Rows outside an actor's scope are
//! reported as absent.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod draft;
pub mod error;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod storage;

pub use draft::{AssetDraft, NewUser, ProjectFilter, VariantDraft};
pub use error::StoreError;
pub use memory::MemoryStorage;
#[cfg(feature = "postgres")]
pub use postgres::PgStorage;
pub use storage::{Storage, StoreResult};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
