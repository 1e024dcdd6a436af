//! Testing utilities for the Ad Variants Studio workspace
//!
//! Shared fixtures: a sample template, a populated tenant and a scripted
//! generator.

#![allow(missing_docs)]

use async_trait::async_trait;
use avs_core::{
    Actor, Asset, Client, DefaultBindings, NewClient, NewProject, Project, Role, StyleHints,
    UserId,
};
use avs_genai::{
    CopyPrompt, GenAiError, GenAiResult, GeneratedImage, GeneratedTemplate, Generator,
    ImagePrompt, TemplatePrompt, TextVariant,
};
use avs_store::{AssetDraft, MemoryStorage, Storage};
use parking_lot::Mutex;

pub const SAMPLE_TEMPLATE: &str = r#"<svg width="800" height="400" xmlns="http://www.w3.org/2000/svg"><image href="{{imageUrl}}"/><text>{{headline}}</text><text>{{subheadline}}</text><text>{{cta}}</text></svg>"#;

pub const GENERATED_TEMPLATE: &str =
    r#"<svg width="1080" height="1080" xmlns="http://www.w3.org/2000/svg"><text>{{headline}}</text></svg>"#;

/// Smallest payload that passes for a PNG
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

pub fn user_actor() -> Actor {
    Actor::new(UserId::new(), Role::User)
}

pub fn admin_actor() -> Actor {
    Actor::new(UserId::new(), Role::Admin)
}

/// Records owned by one actor
#[derive(Debug, Clone)]
pub struct Tenant {
    pub actor: Actor,
    pub client: Client,
    pub project: Project,
    pub asset: Asset,
}

/// Create a client, project and asset owned by `actor`
pub async fn create_tenant(storage: &dyn Storage, actor: Actor, name: &str) -> Tenant {
    let client = storage
        .create_client(
            NewClient {
                name: format!("{name} Client"),
                description: None,
            },
            actor.user_id,
        )
        .await
        .unwrap();
    let project = storage
        .create_project(
            NewProject {
                client_id: client.id,
                name: format!("{name} Project"),
                description: None,
                brief: Some(format!("Brief for {name}")),
                archived: None,
            },
            actor.user_id,
        )
        .await
        .unwrap();
    let asset = storage
        .create_asset(
            AssetDraft {
                project_id: project.id,
                name: format!("{name} Banner"),
                master_asset_url: None,
                template_svg: SAMPLE_TEMPLATE.to_string(),
                template_fonts: Vec::new(),
                default_bindings: DefaultBindings {
                    headline: format!("{name} default"),
                    subheadline: "Default subheadline".into(),
                    cta: "Learn more".into(),
                    image: String::new(),
                },
                style_hints: StyleHints::default(),
            },
            actor.user_id,
        )
        .await
        .unwrap();
    Tenant {
        actor,
        client,
        project,
        asset,
    }
}

/// Memory storage with one user-owned tenant
pub async fn seeded_storage() -> (MemoryStorage, Tenant) {
    let storage = MemoryStorage::new();
    let tenant = create_tenant(&storage, user_actor(), "Acme").await;
    (storage, tenant)
}

/// Which generator calls should fail
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Failures {
    pub copy: bool,
    pub image: bool,
    pub template: bool,
}

/// Deterministic generator that records the prompts it receives
#[derive(Debug, Default)]
pub struct StubGenerator {
    failures: Failures,
    copy_prompts: Mutex<Vec<CopyPrompt>>,
    template_prompts: Mutex<Vec<TemplatePrompt>>,
    image_calls: Mutex<usize>,
}

impl StubGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(failures: Failures) -> Self {
        Self {
            failures,
            ..Self::default()
        }
    }

    pub fn copy_prompts(&self) -> Vec<CopyPrompt> {
        self.copy_prompts.lock().clone()
    }

    pub fn template_prompts(&self) -> Vec<TemplatePrompt> {
        self.template_prompts.lock().clone()
    }

    pub fn image_calls(&self) -> usize {
        *self.image_calls.lock()
    }
}

#[async_trait]
impl Generator for StubGenerator {
    async fn generate_copy(&self, prompt: CopyPrompt) -> GenAiResult<Vec<TextVariant>> {
        let count = prompt.count;
        self.copy_prompts.lock().push(prompt);
        if self.failures.copy {
            return Err(GenAiError::EmptyResponse);
        }
        Ok((1..=count)
            .map(|i| TextVariant {
                headline: format!("Headline {i}"),
                subheadline: format!("Subheadline {i}"),
                cta: format!("CTA {i}"),
            })
            .collect())
    }

    async fn generate_image(&self, _prompt: ImagePrompt) -> GenAiResult<Option<GeneratedImage>> {
        *self.image_calls.lock() += 1;
        if self.failures.image {
            return Err(GenAiError::Api {
                status: 500,
                body: "stub failure".into(),
            });
        }
        Ok(Some(GeneratedImage {
            mime_type: "image/png".into(),
            data: PNG_BYTES.to_vec(),
        }))
    }

    async fn generate_template(&self, prompt: TemplatePrompt) -> GenAiResult<GeneratedTemplate> {
        self.template_prompts.lock().push(prompt);
        if self.failures.template {
            return Err(GenAiError::MissingApiKey);
        }
        Ok(GeneratedTemplate {
            template_svg: GENERATED_TEMPLATE.to_string(),
            template_fonts: Vec::new(),
            default_bindings: DefaultBindings {
                headline: "Generated headline".into(),
                subheadline: "Generated subheadline".into(),
                cta: "Generated CTA".into(),
                image: String::new(),
            },
            style_hints: StyleHints {
                palette: vec!["#000000".into(), "#FFFFFF".into()],
                brand: "Generated".into(),
                notes: String::new(),
            },
        })
    }
}
