//! Ad Variants Studio - generative AI
//!
//! Copy, background images and SVG templates from a generative model.
//!
//! - [`Generator`]: the seam the server depends on (mockable with the
//!   `mock` feature)
//! - [`GeminiClient`]: implementation over the Gemini REST API
//! - [`generate_text_variants`] / [`generate_images`]: request-level helpers
//!   used by the HTTP handlers and the auto-generate flow

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod gemini;
pub mod generator;
pub mod prompt;
pub mod types;

pub use error::{GenAiError, GenAiResult};
pub use gemini::{api_key_from_env, GeminiClient, GeminiConfig};
pub use generator::{generate_images, generate_text_variants, Generator};
#[cfg(any(test, feature = "mock"))]
pub use generator::MockGenerator;
pub use types::{
    AssetContext, CopyPrompt, GeneratedImage, GeneratedTemplate, ImagePrompt, MasterAsset,
    TemplatePrompt, TextVariant,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
