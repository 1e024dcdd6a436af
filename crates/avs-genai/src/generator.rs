//! Generator trait and the batch helpers built on it

use crate::error::{GenAiError, GenAiResult};
use crate::types::{
    AssetContext, CopyPrompt, GeneratedImage, GeneratedTemplate, ImagePrompt, TemplatePrompt,
    TextVariant,
};
use async_trait::async_trait;
use avs_core::{ImageGenerationRequest, TextGenerationRequest};
use tracing::{debug, warn};

/// Source of generated copy, images and templates
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait Generator: Send + Sync {
    /// Copy variants for an asset
    async fn generate_copy(&self, prompt: CopyPrompt) -> GenAiResult<Vec<TextVariant>>;

    /// One background image; `None` when the model answered without one
    async fn generate_image(&self, prompt: ImagePrompt) -> GenAiResult<Option<GeneratedImage>>;

    /// SVG template derived from a master asset
    async fn generate_template(&self, prompt: TemplatePrompt) -> GenAiResult<GeneratedTemplate>;
}

/// Generate `request.count` copy variants in a single call
///
/// An empty `variants` list from the model is passed through as is.
pub async fn generate_text_variants(
    generator: &dyn Generator,
    request: &TextGenerationRequest,
    context: AssetContext,
) -> GenAiResult<Vec<TextVariant>> {
    let prompt = CopyPrompt {
        count: request.count,
        constraints: request.constraints.clone(),
        context,
    };
    let variants = generator.generate_copy(prompt).await?;
    if variants.is_empty() {
        warn!(requested = request.count, "Model returned no copy variants");
    }
    debug!(requested = request.count, returned = variants.len(), "Generated copy");
    Ok(variants)
}

/// Generate up to `request.count` images, one call at a time
///
/// Individual failures are logged and skipped; the call fails only when no
/// image was produced at all.
pub async fn generate_images(
    generator: &dyn Generator,
    request: &ImageGenerationRequest,
    context: AssetContext,
) -> GenAiResult<Vec<GeneratedImage>> {
    let prompt = ImagePrompt {
        context,
        seed_image_url: request.seed_image_url.clone(),
    };

    let mut images = Vec::with_capacity(request.count as usize);
    for attempt in 1..=request.count {
        match generator.generate_image(prompt.clone()).await {
            Ok(Some(image)) => images.push(image),
            Ok(None) => warn!(attempt, "Model returned no image"),
            Err(err) => warn!(attempt, error = %err, "Image generation failed"),
        }
    }

    if images.is_empty() {
        return Err(GenAiError::NoImages {
            attempted: request.count,
        });
    }
    debug!(requested = request.count, returned = images.len(), "Generated images");
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use avs_core::AssetId;
    use mockall::Sequence;

    fn image() -> GeneratedImage {
        GeneratedImage {
            mime_type: "image/png".into(),
            data: vec![0x89, b'P', b'N', b'G'],
        }
    }

    fn image_request(count: u32) -> ImageGenerationRequest {
        ImageGenerationRequest {
            asset_id: AssetId::new(),
            count,
            seed_image_url: None,
        }
    }

    #[tokio::test]
    async fn image_failures_are_skipped() {
        let mut generator = MockGenerator::new();
        let mut seq = Sequence::new();
        generator
            .expect_generate_image()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(GenAiError::EmptyResponse));
        generator
            .expect_generate_image()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        generator
            .expect_generate_image()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(image())));

        let images = generate_images(&generator, &image_request(3), AssetContext::default())
            .await
            .unwrap();
        assert_eq!(images, vec![image()]);
    }

    #[tokio::test]
    async fn zero_images_is_an_error() {
        let mut generator = MockGenerator::new();
        generator
            .expect_generate_image()
            .times(2)
            .returning(|_| Ok(None));

        let err = generate_images(&generator, &image_request(2), AssetContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GenAiError::NoImages { attempted: 2 }));
    }

    #[tokio::test]
    async fn copy_request_is_forwarded() {
        let mut generator = MockGenerator::new();
        generator
            .expect_generate_copy()
            .withf(|prompt| prompt.count == 2 && prompt.context.asset_name == "Hero")
            .times(1)
            .returning(|_| {
                Ok(vec![TextVariant {
                    headline: "Go".into(),
                    subheadline: "Now".into(),
                    cta: "Buy".into(),
                }])
            });

        let request = TextGenerationRequest {
            asset_id: AssetId::new(),
            count: 2,
            constraints: None,
        };
        let context = AssetContext {
            asset_name: "Hero".into(),
            ..AssetContext::default()
        };
        let variants = generate_text_variants(&generator, &request, context)
            .await
            .unwrap();
        assert_eq!(variants.len(), 1);
    }

    #[tokio::test]
    async fn empty_copy_is_passed_through() {
        let mut generator = MockGenerator::new();
        generator.expect_generate_copy().returning(|_| Ok(Vec::new()));

        let request = TextGenerationRequest {
            asset_id: AssetId::new(),
            count: 3,
            constraints: None,
        };
        let variants = generate_text_variants(&generator, &request, AssetContext::default())
            .await
            .unwrap();
        assert!(variants.is_empty());
    }
}
