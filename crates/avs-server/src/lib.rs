//! Ad Variants Studio - HTTP API server
//!
//! Wires the studio together:
//! - [`config`]: TOML plus environment configuration
//! - [`session`] and [`auth`]: cookie sessions and bcrypt sign-in
//! - [`routes`]: the warp filter tree under `/api`
//! - [`studio`]: template derivation, variant rendering, auto-generation
//! - [`seed`]: the demo dataset
//!
//! # Example
//!
//! ```rust,no_run
//! use avs_server::{routes, AppState, StudioConfig};
//! use avs_genai::GeminiClient;
//! use avs_objects::LocalObjectStore;
//! use avs_store::MemoryStorage;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StudioConfig::default();
//! let state = AppState::new(
//!     config.clone(),
//!     Arc::new(MemoryStorage::new()),
//!     Arc::new(GeminiClient::new(config.genai.clone())?),
//!     Arc::new(LocalObjectStore::new(&config.objects.root)),
//! );
//! warp::serve(routes::app(&state)).run(config.addr()).await;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod auth;
pub mod config;
pub mod error;
pub mod filters;
pub mod reply;
pub mod routes;
pub mod seed;
pub mod session;
pub mod state;
pub mod studio;

pub use config::{ConfigError, StudioConfig};
pub use error::{ApiError, ApiResult};
pub use seed::{seed, SeedSummary};
pub use session::SessionStore;
pub use state::AppState;
pub use studio::BatchOutcome;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
