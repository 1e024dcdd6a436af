//! Fully-resolved inputs for record creation
//!
//! Request payloads may leave fields for the server to fill (a generated
//! template, a rendered SVG). Drafts are what remains once that is done.

use avs_core::{
    AssetId, DefaultBindings, FontFace, ProjectId, Role, StyleHints, VariantBindings,
    VariantSource, VariantStatus,
};

/// New account with an already-hashed password
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
    pub role: Role,
}

/// Template asset ready for insertion
#[derive(Debug, Clone)]
pub struct AssetDraft {
    pub project_id: ProjectId,
    pub name: String,
    pub master_asset_url: Option<String>,
    pub template_svg: String,
    pub template_fonts: Vec<FontFace>,
    pub default_bindings: DefaultBindings,
    pub style_hints: StyleHints,
}

/// Variant ready for insertion
#[derive(Debug, Clone)]
pub struct VariantDraft {
    pub asset_id: AssetId,
    pub source: VariantSource,
    pub bindings: VariantBindings,
    pub render_svg: String,
    pub render_png_url: Option<String>,
    pub status: VariantStatus,
    pub error_message: Option<String>,
}

impl VariantDraft {
    /// Draft with default source and status
    #[inline]
    #[must_use]
    pub fn new(asset_id: AssetId, bindings: VariantBindings, render_svg: String) -> Self {
        Self {
            asset_id,
            source: VariantSource::User,
            bindings,
            render_svg,
            render_png_url: None,
            status: VariantStatus::Draft,
            error_message: None,
        }
    }

    /// With source
    #[inline]
    #[must_use]
    pub fn with_source(mut self, source: VariantSource) -> Self {
        self.source = source;
        self
    }

    /// With status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: VariantStatus) -> Self {
        self.status = status;
        self
    }
}

/// Project listing filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    /// Restrict to one client
    pub client_id: Option<avs_core::ClientId>,
    /// Include archived projects
    pub include_archived: bool,
}

impl ProjectFilter {
    /// Active projects of every client
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one client
    #[inline]
    #[must_use]
    pub fn for_client(mut self, client_id: avs_core::ClientId) -> Self {
        self.client_id = Some(client_id);
        self
    }

    /// Include archived projects
    #[inline]
    #[must_use]
    pub fn with_archived(mut self, include: bool) -> Self {
        self.include_archived = include;
        self
    }
}
