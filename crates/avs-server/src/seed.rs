//! Demo dataset
//!
//! Two accounts (`admin@advariants.com` / `admin123` and `user@example.com`
//! / `user123`), three clients with one project and one template each, and
//! eight rendered variants. Seeding is skipped when the admin account
//! already exists.

use crate::auth::hash_password;
use crate::error::ApiResult;
use avs_core::render::render;
use avs_core::{
    DefaultBindings, FontFace, NewClient, NewProject, Role, StyleHints, UserId, VariantBindings,
    VariantSource, VariantStatus,
};
use avs_store::{AssetDraft, NewUser, Storage, VariantDraft};
use serde::Serialize;
use tracing::info;

/// Admin account email
pub const ADMIN_EMAIL: &str = "admin@advariants.com";
/// Regular account email
pub const USER_EMAIL: &str = "user@example.com";

/// Records inserted by [`seed`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub users: usize,
    pub clients: usize,
    pub projects: usize,
    pub assets: usize,
    pub variants: usize,
}

impl SeedSummary {
    /// Whether anything was inserted
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Copy)]
enum Owner {
    Admin,
    User,
}

struct DemoCopy {
    headline: &'static str,
    subheadline: &'static str,
    cta: &'static str,
}

struct DemoCampaign {
    owner: Owner,
    client: (&'static str, &'static str),
    project: (&'static str, &'static str),
    asset: &'static str,
    template: &'static str,
    palette: [&'static str; 3],
    brand: &'static str,
    notes: &'static str,
    variants: &'static [DemoCopy],
}

const fn copy(headline: &'static str, subheadline: &'static str, cta: &'static str) -> DemoCopy {
    DemoCopy {
        headline,
        subheadline,
        cta,
    }
}

const CAMPAIGNS: [DemoCampaign; 3] = [
    DemoCampaign {
        owner: Owner::User,
        client: (
            "Acme Corporation",
            "Leading technology company specializing in innovative solutions",
        ),
        project: (
            "Spring 2024 Campaign",
            "Seasonal marketing campaign for Q2 product launches",
        ),
        asset: "Spring Banner Template",
        template: include_str!("../seed/banner.svg"),
        palette: ["#4F46E5", "#7C3AED", "#FFFFFF"],
        brand: "Modern, tech-forward, trustworthy",
        notes: "Use bold typography and clean gradients",
        variants: &[
            copy("Spring Into Savings", "Get 30% off all products this season", "Shop Now"),
            copy("Season of Savings", "Exclusive spring deals up to 30% off", "Get Deals"),
            copy("Spring Sale Event", "Limited time offer - save big today", "Save Now"),
        ],
    },
    DemoCampaign {
        owner: Owner::Admin,
        client: ("TechStart Inc", "Fast-growing startup in the fintech space"),
        project: (
            "Product Launch Banners",
            "Digital advertising assets for new mobile app launch",
        ),
        asset: "Product Launch Hero",
        template: include_str!("../seed/hero.svg"),
        palette: ["#059669", "#065F46", "#FFFFFF"],
        brand: "Professional, innovative, reliable",
        notes: "Emphasize product benefits and clean design",
        variants: &[
            copy(
                "Revolutionary App",
                "Transform your workflow with our latest innovation",
                "Download Free",
            ),
            copy(
                "Game-Changing Solution",
                "Boost productivity with cutting-edge technology",
                "Try Free",
            ),
        ],
    },
    DemoCampaign {
        owner: Owner::User,
        client: ("Brand Studios", "Creative agency for lifestyle brands"),
        project: (
            "Social Media Suite",
            "Complete social media advertising package",
        ),
        asset: "Social Media Post",
        template: include_str!("../seed/social.svg"),
        palette: ["#EC4899", "#BE185D", "#FFFFFF"],
        brand: "Trendy, lifestyle-focused, aspirational",
        notes: "Use vibrant colors and lifestyle imagery",
        variants: &[
            copy("Lifestyle Goals", "Discover your perfect style", "Explore"),
            copy("Style Inspiration", "Find your unique fashion voice", "Discover"),
            copy("Fashion Forward", "Trendsetting looks for every occasion", "Shop Style"),
        ],
    },
];

async fn create_account(
    storage: &dyn Storage,
    email: &str,
    password: &str,
    name: &str,
    role: Role,
) -> ApiResult<UserId> {
    let user = storage
        .create_user(NewUser {
            email: email.to_string(),
            name: Some(name.to_string()),
            password_hash: hash_password(password).await?,
            role,
        })
        .await?;
    info!(email = %user.email, role = role.as_str(), "Created demo account");
    Ok(user.id)
}

/// Insert the demo dataset unless it is already present
///
/// # Errors
/// Storage or hashing failures
pub async fn seed(storage: &dyn Storage) -> ApiResult<SeedSummary> {
    if storage.get_user_by_email(ADMIN_EMAIL).await?.is_some() {
        info!("Demo data already present, skipping seed");
        return Ok(SeedSummary::default());
    }

    let mut summary = SeedSummary::default();
    let admin = create_account(storage, ADMIN_EMAIL, "admin123", "System Administrator", Role::Admin)
        .await?;
    let user = create_account(storage, USER_EMAIL, "user123", "John Designer", Role::User).await?;
    summary.users = 2;

    for campaign in &CAMPAIGNS {
        let owner = match campaign.owner {
            Owner::Admin => admin,
            Owner::User => user,
        };

        let client = storage
            .create_client(
                NewClient {
                    name: campaign.client.0.to_string(),
                    description: Some(campaign.client.1.to_string()),
                },
                owner,
            )
            .await?;
        summary.clients += 1;

        let project = storage
            .create_project(
                NewProject {
                    client_id: client.id,
                    name: campaign.project.0.to_string(),
                    description: Some(campaign.project.1.to_string()),
                    brief: None,
                    archived: None,
                },
                owner,
            )
            .await?;
        summary.projects += 1;

        let first = &campaign.variants[0];
        let asset = storage
            .create_asset(
                AssetDraft {
                    project_id: project.id,
                    name: campaign.asset.to_string(),
                    master_asset_url: None,
                    template_svg: campaign.template.to_string(),
                    template_fonts: vec![FontFace {
                        family: "Arial".into(),
                        url: String::new(),
                        weight: "normal".into(),
                        style: "normal".into(),
                    }],
                    default_bindings: DefaultBindings {
                        headline: first.headline.into(),
                        subheadline: first.subheadline.into(),
                        cta: first.cta.into(),
                        image: String::new(),
                    },
                    style_hints: StyleHints {
                        palette: campaign.palette.iter().map(ToString::to_string).collect(),
                        brand: campaign.brand.into(),
                        notes: campaign.notes.into(),
                    },
                },
                owner,
            )
            .await?;
        summary.assets += 1;

        for (i, text) in campaign.variants.iter().enumerate() {
            let bindings = VariantBindings {
                headline: text.headline.into(),
                subheadline: text.subheadline.into(),
                cta: text.cta.into(),
                image_url: String::new(),
            };
            let svg = render(&asset.template_svg, &bindings).svg;
            let source = if i == 0 { VariantSource::User } else { VariantSource::Auto };
            let draft = VariantDraft::new(asset.id, bindings, svg)
                .with_source(source)
                .with_status(VariantStatus::Ready);
            storage.create_variant(draft, owner).await?;
            summary.variants += 1;
        }
    }

    info!(
        clients = summary.clients,
        projects = summary.projects,
        assets = summary.assets,
        variants = summary.variants,
        "Seeded demo data"
    );
    Ok(summary)
}
