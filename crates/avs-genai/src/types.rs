//! Prompt inputs and generation outputs

use avs_core::{AssetWithProject, CopyConstraints, DefaultBindings, FontFace, StyleHints, VariantBindings};
use serde::{Deserialize, Serialize};

/// Where an asset sits in the hierarchy, for prompting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetContext {
    pub asset_name: String,
    pub project_name: String,
    pub project_brief: Option<String>,
    pub client_name: String,
    pub default_bindings: DefaultBindings,
    pub style_hints: StyleHints,
}

impl From<&AssetWithProject> for AssetContext {
    fn from(view: &AssetWithProject) -> Self {
        Self {
            asset_name: view.asset.name.clone(),
            project_name: view.project.project.name.clone(),
            project_brief: view.project.project.brief.clone(),
            client_name: view.project.client.name.clone(),
            default_bindings: view.asset.default_bindings.clone(),
            style_hints: view.asset.style_hints.clone(),
        }
    }
}

/// Request for ad copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyPrompt {
    pub count: u32,
    pub constraints: Option<CopyConstraints>,
    pub context: AssetContext,
}

/// Request for one background image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePrompt {
    pub context: AssetContext,
    pub seed_image_url: Option<String>,
}

/// Master creative a template is derived from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MasterAsset {
    /// Bytes available locally
    Inline { mime_type: String, data: Vec<u8> },
    /// Only a URL is known
    Remote(String),
}

/// Request for an SVG template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePrompt {
    pub asset_name: String,
    pub project_name: String,
    pub project_brief: Option<String>,
    pub client_name: String,
    pub master_url: String,
    pub master: MasterAsset,
}

/// One generated copy triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextVariant {
    pub headline: String,
    pub subheadline: String,
    pub cta: String,
}

impl TextVariant {
    /// Bindings with this copy and the given image
    #[must_use]
    pub fn into_bindings(self, image_url: String) -> VariantBindings {
        VariantBindings {
            headline: self.headline,
            subheadline: self.subheadline,
            cta: self.cta,
            image_url,
        }
    }
}

/// Decoded image bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl GeneratedImage {
    /// File extension for the mime type
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

/// Template fields derived from a master asset
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTemplate {
    pub template_svg: String,
    #[serde(default)]
    pub template_fonts: Vec<FontFace>,
    #[serde(default)]
    pub default_bindings: DefaultBindings,
    #[serde(default)]
    pub style_hints: StyleHints,
}
