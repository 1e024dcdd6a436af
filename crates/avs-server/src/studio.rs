//! Studio workflows
//!
//! The parts of the API that do more than pass a payload to storage:
//! - Deriving a template from a master asset on asset create/update
//! - Rendering a variant's SVG when the client did not send one
//! - The auto-generate batch: copy and images zipped into draft variants

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use avs_core::render::{self, render};
use avs_core::{
    Actor, Asset, AssetId, AssetPatch, AssetWithProject, BatchGenerationRequest,
    ImageGenerationRequest, Issue, NewAsset, NewVariant, ProjectWithClient, TextGenerationRequest,
    ValidationError, Variant, VariantBindings, VariantId, VariantPatch, VariantSource,
    VariantStatus,
};
use avs_genai::{
    generate_images, generate_text_variants, AssetContext, GenAiError, GeneratedImage,
    GeneratedTemplate, MasterAsset, TemplatePrompt, TextVariant,
};
use avs_objects::{ObjectPath, ObjectStore, StoredObject};
use avs_store::{AssetDraft, VariantDraft};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Result of an auto-generate batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub variants: Vec<Variant>,
    pub errors: Vec<String>,
}

async fn visible_asset(state: &AppState, id: AssetId, actor: &Actor) -> ApiResult<AssetWithProject> {
    state
        .storage
        .get_asset(id, actor)
        .await?
        .ok_or_else(|| ApiError::not_found("Asset not found"))
}

/// Load a master asset's bytes when it lives in the object store
///
/// # Errors
/// Propagates object store failures other than a missing object
pub async fn resolve_master(objects: &dyn ObjectStore, url: &str) -> ApiResult<MasterAsset> {
    let Some(path) = ObjectPath::from_url(url) else {
        return Ok(MasterAsset::Remote(url.to_string()));
    };
    match objects.get(&path).await? {
        Some(object) => Ok(MasterAsset::Inline {
            mime_type: object.content_type,
            data: object.data.to_vec(),
        }),
        None => {
            warn!(object = %path, "Master asset missing from object store");
            Ok(MasterAsset::Remote(url.to_string()))
        }
    }
}

/// Ask the generator for a template derived from `master_url`
///
/// # Errors
/// [`ApiError::Generation`] when the model fails or returns something
/// that is not an SVG document
#[instrument(skip_all, fields(asset = %asset_name))]
pub async fn derive_template(
    state: &AppState,
    asset_name: &str,
    project: &ProjectWithClient,
    master_url: &str,
) -> ApiResult<GeneratedTemplate> {
    let master = resolve_master(state.objects.as_ref(), master_url).await?;
    let prompt = TemplatePrompt {
        asset_name: asset_name.to_string(),
        project_name: project.project.name.clone(),
        project_brief: project.project.brief.clone(),
        client_name: project.client.name.clone(),
        master_url: master_url.to_string(),
        master,
    };
    let template = state.generator.generate_template(prompt).await?;
    if !render::is_svg(&template.template_svg) {
        return Err(GenAiError::InvalidTemplate.into());
    }
    info!(fonts = template.template_fonts.len(), "Derived template from master asset");
    Ok(template)
}

/// Create an asset, deriving its template from the master asset when given
///
/// A failed derivation falls back to the template in the payload; without
/// either the asset is rejected.
///
/// # Errors
/// `NOT_FOUND` for an invisible project, `VALIDATION_ERROR` without a
/// template
pub async fn create_asset(state: &AppState, actor: &Actor, input: NewAsset) -> ApiResult<Asset> {
    let project = state
        .storage
        .get_project(input.project_id, actor)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    let mut template_svg = input.template_svg;
    let mut template_fonts = input.template_fonts.unwrap_or_default();
    let mut default_bindings = input.default_bindings.unwrap_or_default();
    let mut style_hints = input.style_hints.unwrap_or_default();

    if let Some(url) = input.master_asset_url.as_deref() {
        match derive_template(state, &input.name, &project, url).await {
            Ok(generated) => {
                template_svg = Some(generated.template_svg);
                template_fonts = generated.template_fonts;
                default_bindings = generated.default_bindings;
                style_hints = generated.style_hints;
            }
            Err(err) => warn!(error = %err, "Template generation failed, using supplied template"),
        }
    }

    let Some(template_svg) = template_svg else {
        return Err(ValidationError {
            issues: vec![Issue::new(
                "templateSvg",
                "Template generation failed and no template was supplied",
            )],
        }
        .into());
    };

    let draft = AssetDraft {
        project_id: input.project_id,
        name: input.name,
        master_asset_url: input.master_asset_url,
        template_svg,
        template_fonts,
        default_bindings,
        style_hints,
    };
    Ok(state.storage.create_asset(draft, actor.user_id).await?)
}

fn apply_template(patch: &mut AssetPatch, template: GeneratedTemplate) {
    patch.template_svg = Some(template.template_svg);
    patch.template_fonts = Some(template.template_fonts);
    patch.default_bindings = Some(template.default_bindings);
    patch.style_hints = Some(template.style_hints);
}

/// Update an asset, re-deriving the template when the master URL changes
///
/// A failed derivation is logged; the remaining fields are still applied.
///
/// # Errors
/// `NOT_FOUND` when the asset (or a new parent project) is not visible
pub async fn update_asset(
    state: &AppState,
    actor: &Actor,
    id: AssetId,
    mut patch: AssetPatch,
) -> ApiResult<Asset> {
    let denied = || ApiError::not_found("Asset not found or access denied");
    let existing = state.storage.get_asset(id, actor).await?.ok_or_else(denied)?;

    let changed_url = patch
        .new_master_url()
        .filter(|url| existing.asset.master_asset_url.as_deref() != Some(*url))
        .map(str::to_string);
    if let Some(url) = changed_url {
        let name = patch.name.clone().unwrap_or_else(|| existing.asset.name.clone());
        match derive_template(state, &name, &existing.project, &url).await {
            Ok(template) => apply_template(&mut patch, template),
            Err(err) => warn!(asset = %id, error = %err, "Template regeneration failed"),
        }
    }

    state
        .storage
        .update_asset(id, patch, actor)
        .await?
        .ok_or_else(denied)
}

/// Re-derive an asset's template from its current master asset
///
/// # Errors
/// `INVALID_REQUEST` without a master URL, `GENERATION_FAILED` when the
/// model fails
pub async fn regenerate_template(state: &AppState, actor: &Actor, id: AssetId) -> ApiResult<Asset> {
    let existing = visible_asset(state, id, actor).await?;
    let Some(url) = existing.asset.master_asset_url.as_deref() else {
        return Err(ApiError::InvalidRequest(
            "Asset has no master asset URL".to_string(),
        ));
    };
    let template = derive_template(state, &existing.asset.name, &existing.project, url).await?;

    let mut patch = AssetPatch::default();
    apply_template(&mut patch, template);
    state
        .storage
        .update_asset(id, patch, actor)
        .await?
        .ok_or_else(|| ApiError::internal(format!("asset {id} vanished during regeneration")))
}

/// Create a variant, rendering the template when no SVG is supplied
///
/// # Errors
/// `NOT_FOUND` when the asset is not visible
pub async fn create_variant(state: &AppState, actor: &Actor, input: NewVariant) -> ApiResult<Variant> {
    let asset = visible_asset(state, input.asset_id, actor).await?;
    let render_svg = input
        .render_svg
        .unwrap_or_else(|| render(&asset.asset.template_svg, &input.bindings).svg);

    let mut draft = VariantDraft::new(input.asset_id, input.bindings, render_svg)
        .with_source(input.source.unwrap_or_default())
        .with_status(input.status.unwrap_or_default());
    draft.render_png_url = input.render_png_url;
    draft.error_message = input.error_message;
    Ok(state.storage.create_variant(draft, actor.user_id).await?)
}

/// Update a variant, re-rendering when bindings or asset change
///
/// # Errors
/// `NOT_FOUND` when the variant or a new target asset is not visible
pub async fn update_variant(
    state: &AppState,
    actor: &Actor,
    id: VariantId,
    mut patch: VariantPatch,
) -> ApiResult<Variant> {
    let denied = || ApiError::not_found("Variant not found or access denied");

    if patch.needs_render() {
        let existing = state.storage.get_variant(id, actor).await?.ok_or_else(denied)?;
        let template = match patch.asset_id {
            Some(asset_id) if asset_id != existing.asset.asset.id => {
                visible_asset(state, asset_id, actor).await?.asset.template_svg
            }
            _ => existing.asset.asset.template_svg,
        };
        let bindings = patch.bindings.as_ref().unwrap_or(&existing.variant.bindings);
        patch.render_svg = Some(render(&template, bindings).svg);
    }

    state
        .storage
        .update_variant(id, patch, actor)
        .await?
        .ok_or_else(denied)
}

/// Copy variants for an asset
///
/// # Errors
/// `NOT_FOUND` for an invisible asset, `GENERATION_FAILED` otherwise
pub async fn generate_text(
    state: &AppState,
    actor: &Actor,
    request: &TextGenerationRequest,
) -> ApiResult<Vec<TextVariant>> {
    let asset = visible_asset(state, request.asset_id, actor).await?;
    generate_text_variants(state.generator.as_ref(), request, AssetContext::from(&asset))
        .await
        .map_err(|err| ApiError::Generation(format!("Text generation failed: {err}")))
}

/// Background images for an asset, stored and returned as URLs
///
/// # Errors
/// `NOT_FOUND` for an invisible asset, `GENERATION_FAILED` when no image
/// was produced, internal errors when storing fails
pub async fn generate_image_urls(
    state: &AppState,
    actor: &Actor,
    request: &ImageGenerationRequest,
) -> ApiResult<Vec<String>> {
    let asset = visible_asset(state, request.asset_id, actor).await?;
    let images = generate_images(state.generator.as_ref(), request, AssetContext::from(&asset))
        .await
        .map_err(|err| ApiError::Generation(format!("Image generation failed: {err}")))?;

    let mut urls = Vec::with_capacity(images.len());
    for image in images {
        urls.push(store_image(state.objects.as_ref(), image).await?);
    }
    Ok(urls)
}

/// Write a generated image to the object store, returning its URL
///
/// # Errors
/// Object store failures
pub async fn store_image(objects: &dyn ObjectStore, image: GeneratedImage) -> ApiResult<String> {
    let name = format!("{}.{}", Uuid::new_v4().simple(), image.extension());
    let path = ObjectPath::generated(&name)?;
    objects
        .put(&path, StoredObject::new(image.mime_type, image.data))
        .await?;
    Ok(path.public_url())
}

/// Generate copy and images for an asset and save their pairings as drafts
///
/// Runs sequentially. Every failure becomes an entry in
/// [`BatchOutcome::errors`]; whatever succeeded is kept.
///
/// # Errors
/// Only `NOT_FOUND` for an invisible asset (and storage failures while
/// loading it)
#[instrument(skip_all, fields(asset = %request.asset_id))]
pub async fn auto_generate(
    state: &AppState,
    actor: &Actor,
    request: &BatchGenerationRequest,
) -> ApiResult<BatchOutcome> {
    let view = visible_asset(state, request.asset_id, actor).await?;
    let context = AssetContext::from(&view);
    let mut outcome = BatchOutcome::default();

    let mut texts = Vec::new();
    if request.generate_text {
        match generate_text_variants(state.generator.as_ref(), &request.text_request(), context.clone())
            .await
        {
            Ok(generated) => texts = generated,
            Err(err) => outcome.errors.push(format!("Text generation failed: {err}")),
        }
    }

    let mut images = Vec::new();
    if request.generate_images {
        match generate_images(state.generator.as_ref(), &request.image_request(), context).await {
            Ok(generated) => {
                for (i, image) in generated.into_iter().enumerate() {
                    match store_image(state.objects.as_ref(), image).await {
                        Ok(url) => images.push(url),
                        Err(err) => outcome
                            .errors
                            .push(format!("Failed to store image {}: {}", i + 1, err.message())),
                    }
                }
            }
            Err(err) => outcome.errors.push(format!("Image generation failed: {err}")),
        }
    }

    let count = texts.len().max(images.len());
    for i in 0..count {
        let image_url = if images.is_empty() {
            String::new()
        } else {
            images[i % images.len()].clone()
        };
        let bindings = if texts.is_empty() {
            VariantBindings {
                image_url,
                ..VariantBindings::from_defaults(&view.asset.default_bindings)
            }
        } else {
            texts[i % texts.len()].clone().into_bindings(image_url)
        };
        let render_svg = render(&view.asset.template_svg, &bindings).svg;
        let draft = VariantDraft::new(request.asset_id, bindings, render_svg)
            .with_source(VariantSource::Auto)
            .with_status(VariantStatus::Draft);

        match state.storage.create_variant(draft, actor.user_id).await {
            Ok(variant) => outcome.variants.push(variant),
            Err(err) => outcome
                .errors
                .push(format!("Failed to create variant {}: {err}", i + 1)),
        }
    }

    info!(
        created = outcome.variants.len(),
        errors = outcome.errors.len(),
        "Auto-generated variants"
    );
    Ok(outcome)
}
