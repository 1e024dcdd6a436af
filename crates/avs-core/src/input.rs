//! Request payloads and their validation
//!
//! Every payload deserializes leniently (unknown keys ignored) and is then
//! checked with [`Validate`]. Patch payloads distinguish an absent key
//! (leave unchanged) from an explicit `null` (clear the field) through
//! [`nullable`].

use crate::error::{Issues, ValidationError};
use crate::render;
use crate::types::{
    AssetId, ClientId, DefaultBindings, FontFace, ProjectId, StyleHints, VariantBindings,
    VariantSource, VariantStatus,
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Minimum password length accepted at login and registration
pub const MIN_PASSWORD_LEN: usize = 6;

/// Allowed range for generated copy variants
pub const TEXT_COUNT_RANGE: std::ops::RangeInclusive<u32> = 1..=10;

/// Allowed range for generated images
pub const IMAGE_COUNT_RANGE: std::ops::RangeInclusive<u32> = 1..=5;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-']+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)+$")
        .expect("email regex is valid")
});

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^\s/?#]+\S*$").expect("url regex is valid"));

/// Payload validation
pub trait Validate {
    /// Check the payload
    ///
    /// # Errors
    /// Returns every problem found as a [`ValidationError`]
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Serde helper for patch fields that may be explicitly nulled
///
/// Use with `#[serde(default, deserialize_with = "nullable::deserialize")]`
/// on an `Option<Option<T>>` field.
pub mod nullable {
    use serde::{Deserialize, Deserializer};

    /// Wrap whatever was present (value or null) in `Some`
    ///
    /// # Errors
    /// Propagates the inner deserializer error
    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// Check an email address shape
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Check an absolute URL shape (`scheme://host...`)
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    URL_RE.is_match(url)
}

/// Canonical form used for email lookups
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_name(issues: &mut Issues, name: &str) {
    issues.check(!name.trim().is_empty(), "name", "Name is required");
}

fn check_password(issues: &mut Issues, password: &str) {
    issues.check(
        password.chars().count() >= MIN_PASSWORD_LEN,
        "password",
        format!("Password must contain at least {MIN_PASSWORD_LEN} character(s)"),
    );
}

fn check_template(issues: &mut Issues, svg: &str) {
    issues.check(
        render::is_svg(svg),
        "templateSvg",
        "Template must be an SVG document",
    );
}

/// Login form
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl Validate for LoginInput {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Issues::new();
        issues.check(is_valid_email(self.email.trim()), "email", "Invalid email");
        check_password(&mut issues, &self.password);
        issues.finish()
    }
}

/// Registration form
///
/// New accounts always get the `USER` role; a `role` key in the body is
/// ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Validate for RegisterInput {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Issues::new();
        issues.check(is_valid_email(self.email.trim()), "email", "Invalid email");
        check_password(&mut issues, &self.password);
        issues.finish()
    }
}

/// Create a client
#[derive(Debug, Clone, Deserialize)]
pub struct NewClient {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Validate for NewClient {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Issues::new();
        check_name(&mut issues, &self.name);
        issues.finish()
    }
}

/// Partial client update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub description: Option<Option<String>>,
}

impl Validate for ClientPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Issues::new();
        if let Some(name) = &self.name {
            check_name(&mut issues, name);
        }
        issues.finish()
    }
}

/// Create a project
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub client_id: ClientId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub brief: Option<String>,
    #[serde(default)]
    pub archived: Option<DateTime<Utc>>,
}

impl Validate for NewProject {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Issues::new();
        check_name(&mut issues, &self.name);
        issues.finish()
    }
}

/// Partial project update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default)]
    pub client_id: Option<ClientId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub brief: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub archived: Option<Option<DateTime<Utc>>>,
}

impl Validate for ProjectPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Issues::new();
        if let Some(name) = &self.name {
            check_name(&mut issues, name);
        }
        issues.finish()
    }
}

/// Create a template asset
///
/// Either `template_svg` or `master_asset_url` must be given; with a master
/// asset the template may be generated before insertion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAsset {
    pub project_id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub master_asset_url: Option<String>,
    #[serde(default)]
    pub template_svg: Option<String>,
    #[serde(default)]
    pub template_fonts: Option<Vec<FontFace>>,
    #[serde(default)]
    pub default_bindings: Option<DefaultBindings>,
    #[serde(default)]
    pub style_hints: Option<StyleHints>,
}

impl Validate for NewAsset {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Issues::new();
        check_name(&mut issues, &self.name);
        if let Some(url) = &self.master_asset_url {
            issues.check(!url.trim().is_empty(), "masterAssetUrl", "Master asset URL is empty");
        }
        match &self.template_svg {
            Some(svg) => check_template(&mut issues, svg),
            None => issues.check(
                self.master_asset_url.is_some(),
                "templateSvg",
                "Template SVG is required without a master asset URL",
            ),
        }
        issues.finish()
    }
}

/// Partial asset update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPatch {
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub master_asset_url: Option<Option<String>>,
    #[serde(default)]
    pub template_svg: Option<String>,
    #[serde(default)]
    pub template_fonts: Option<Vec<FontFace>>,
    #[serde(default)]
    pub default_bindings: Option<DefaultBindings>,
    #[serde(default)]
    pub style_hints: Option<StyleHints>,
}

impl AssetPatch {
    /// The new master asset URL, if this patch sets one
    #[inline]
    #[must_use]
    pub fn new_master_url(&self) -> Option<&str> {
        self.master_asset_url
            .as_ref()
            .and_then(Option::as_deref)
    }
}

impl Validate for AssetPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Issues::new();
        if let Some(name) = &self.name {
            check_name(&mut issues, name);
        }
        if let Some(svg) = &self.template_svg {
            check_template(&mut issues, svg);
        }
        issues.finish()
    }
}

/// Create a variant
///
/// Without `render_svg` the server renders the asset template with the
/// given bindings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVariant {
    pub asset_id: AssetId,
    #[serde(default)]
    pub source: Option<VariantSource>,
    #[serde(default)]
    pub bindings: VariantBindings,
    #[serde(default)]
    pub render_svg: Option<String>,
    #[serde(default)]
    pub render_png_url: Option<String>,
    #[serde(default)]
    pub status: Option<VariantStatus>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl Validate for NewVariant {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Issues::new();
        if let Some(svg) = &self.render_svg {
            issues.check(render::is_svg(svg), "renderSvg", "Render must be an SVG document");
        }
        issues.finish()
    }
}

/// Partial variant update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantPatch {
    #[serde(default)]
    pub asset_id: Option<AssetId>,
    #[serde(default)]
    pub source: Option<VariantSource>,
    #[serde(default)]
    pub bindings: Option<VariantBindings>,
    #[serde(default)]
    pub render_svg: Option<String>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub render_png_url: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<VariantStatus>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub error_message: Option<Option<String>>,
}

impl VariantPatch {
    /// Whether the stored render must be recomputed after this patch
    #[inline]
    #[must_use]
    pub fn needs_render(&self) -> bool {
        self.render_svg.is_none() && (self.bindings.is_some() || self.asset_id.is_some())
    }
}

impl Validate for VariantPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Issues::new();
        if let Some(svg) = &self.render_svg {
            issues.check(render::is_svg(svg), "renderSvg", "Render must be an SVG document");
        }
        issues.finish()
    }
}

/// Voice of generated copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Conversational,
    Direct,
    Playful,
    Formal,
}

impl Tone {
    /// Prompt name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Conversational => "conversational",
            Tone::Direct => "direct",
            Tone::Playful => "playful",
            Tone::Formal => "formal",
        }
    }
}

/// Optional limits on generated copy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyConstraints {
    #[serde(default)]
    pub headline_max_words: Option<u32>,
    #[serde(default)]
    pub subheadline_max_chars: Option<u32>,
    #[serde(default)]
    pub cta_phrases_allowed: Option<Vec<String>>,
    #[serde(default)]
    pub tone: Option<Tone>,
    #[serde(default)]
    pub banned_phrases: Option<Vec<String>>,
}

fn default_text_count() -> u32 {
    3
}

fn default_image_count() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn check_count(
    issues: &mut Issues,
    path: &str,
    count: u32,
    range: &std::ops::RangeInclusive<u32>,
) {
    issues.check(
        range.contains(&count),
        path,
        format!(
            "Number must be between {} and {}",
            range.start(),
            range.end()
        ),
    );
}

/// Request for copy variants
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextGenerationRequest {
    pub asset_id: AssetId,
    #[serde(default = "default_text_count")]
    pub count: u32,
    #[serde(default)]
    pub constraints: Option<CopyConstraints>,
}

impl Validate for TextGenerationRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Issues::new();
        check_count(&mut issues, "count", self.count, &TEXT_COUNT_RANGE);
        issues.finish()
    }
}

/// Request for background images
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageGenerationRequest {
    pub asset_id: AssetId,
    #[serde(default = "default_image_count")]
    pub count: u32,
    #[serde(default)]
    pub seed_image_url: Option<String>,
}

impl Validate for ImageGenerationRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Issues::new();
        check_count(&mut issues, "count", self.count, &IMAGE_COUNT_RANGE);
        if let Some(url) = &self.seed_image_url {
            issues.check(is_valid_url(url), "seedImageUrl", "Invalid url");
        }
        issues.finish()
    }
}

/// Request for the auto-generate flow
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGenerationRequest {
    pub asset_id: AssetId,
    #[serde(default = "default_true")]
    pub generate_text: bool,
    #[serde(default = "default_true")]
    pub generate_images: bool,
    #[serde(default = "default_text_count")]
    pub text_count: u32,
    #[serde(default = "default_image_count")]
    pub image_count: u32,
    #[serde(default)]
    pub constraints: Option<CopyConstraints>,
}

impl BatchGenerationRequest {
    /// Copy request carried by this batch
    #[must_use]
    pub fn text_request(&self) -> TextGenerationRequest {
        TextGenerationRequest {
            asset_id: self.asset_id,
            count: self.text_count,
            constraints: self.constraints.clone(),
        }
    }

    /// Image request carried by this batch
    #[must_use]
    pub fn image_request(&self) -> ImageGenerationRequest {
        ImageGenerationRequest {
            asset_id: self.asset_id,
            count: self.image_count,
            seed_image_url: None,
        }
    }
}

impl Validate for BatchGenerationRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Issues::new();
        check_count(&mut issues, "textCount", self.text_count, &TEXT_COUNT_RANGE);
        check_count(&mut issues, "imageCount", self.image_count, &IMAGE_COUNT_RANGE);
        issues.finish()
    }
}
