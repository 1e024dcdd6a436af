//! `PgStorage` against a live database
//!
//! Run with `DATABASE_URL=postgres://... cargo test -p avs-store
//! --features postgres -- --ignored`. Every test creates its own users, so a
//! shared database is fine.

#![cfg(feature = "postgres")]

use avs_core::{
    Actor, AssetId, ClientId, ClientPatch, DefaultBindings, NewClient, NewProject, ProjectId,
    ProjectPatch, Role, StyleHints, UserId, VariantBindings, VariantId,
};
use avs_store::{AssetDraft, NewUser, PgStorage, ProjectFilter, Storage, VariantDraft};
use pretty_assertions::assert_eq;
use uuid::Uuid;

async fn connect() -> Option<PgStorage> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };
    let store = PgStorage::connect(&url, 2).await.unwrap();
    store.migrate().await.unwrap();
    Some(store)
}

async fn account(store: &PgStorage, role: Role) -> Actor {
    let user = store
        .create_user(NewUser {
            email: format!("{}@example.com", Uuid::new_v4().simple()),
            name: None,
            password_hash: "hash".into(),
            role,
        })
        .await
        .unwrap();
    Actor::new(user.id, role)
}

fn new_client(name: &str, description: Option<&str>) -> NewClient {
    NewClient {
        name: name.into(),
        description: description.map(Into::into),
    }
}

fn new_project(client_id: ClientId, name: &str) -> NewProject {
    NewProject {
        client_id,
        name: name.into(),
        description: None,
        brief: Some("Fresh".into()),
        archived: None,
    }
}

/// Client → project → asset → variant owned by `owner`
async fn tree(store: &PgStorage, owner: UserId) -> (ClientId, ProjectId, AssetId, VariantId) {
    let client = store
        .create_client(new_client("Acme", None), owner)
        .await
        .unwrap();
    let project = store
        .create_project(new_project(client.id, "Spring"), owner)
        .await
        .unwrap();
    let asset = store
        .create_asset(
            AssetDraft {
                project_id: project.id,
                name: "Banner".into(),
                master_asset_url: None,
                template_svg: "<svg>{{headline}}</svg>".into(),
                template_fonts: Vec::new(),
                default_bindings: DefaultBindings::default(),
                style_hints: StyleHints::default(),
            },
            owner,
        )
        .await
        .unwrap();
    let variant = store
        .create_variant(
            VariantDraft::new(asset.id, VariantBindings::default(), "<svg/>".into()),
            owner,
        )
        .await
        .unwrap();
    (client.id, project.id, asset.id, variant.id)
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn deleting_a_client_cascades() {
    let Some(store) = connect().await else { return };
    let alice = account(&store, Role::User).await;
    let admin = account(&store, Role::Admin).await;
    let (client, project, asset, variant) = tree(&store, alice.user_id).await;
    let (_, keep_project, ..) = tree(&store, alice.user_id).await;

    assert!(store.delete_client(client, &alice).await.unwrap());
    assert!(store.get_project(project, &admin).await.unwrap().is_none());
    assert!(store.get_asset(asset, &admin).await.unwrap().is_none());
    assert!(store.get_variant(variant, &admin).await.unwrap().is_none());
    assert!(store.get_project(keep_project, &admin).await.unwrap().is_some());

    let stats = store.dashboard_stats(&alice).await.unwrap();
    assert_eq!(stats.total_clients, 1);
    assert_eq!(stats.active_projects, 1);
    assert_eq!(stats.template_assets, 1);
    assert_eq!(stats.generated_variants, 1);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn explicit_null_clears_optional_fields() {
    let Some(store) = connect().await else { return };
    let alice = account(&store, Role::User).await;
    let client = store
        .create_client(new_client("Acme", Some("Widgets")), alice.user_id)
        .await
        .unwrap();

    let untouched = store
        .update_client(client.id, ClientPatch::default(), &alice)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.description.as_deref(), Some("Widgets"));

    let cleared = store
        .update_client(
            client.id,
            ClientPatch {
                name: None,
                description: Some(None),
            },
            &alice,
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cleared.description, None);
    assert_eq!(cleared.name, "Acme");

    let project = store
        .create_project(new_project(client.id, "Spring"), alice.user_id)
        .await
        .unwrap();
    let patched = store
        .update_project(
            project.id,
            ProjectPatch {
                brief: Some(None),
                ..ProjectPatch::default()
            },
            &alice,
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(patched.brief, None);
    assert_eq!(patched.name, "Spring");
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn archived_projects_are_hidden_and_inactive() {
    let Some(store) = connect().await else { return };
    let alice = account(&store, Role::User).await;
    let (client, project, ..) = tree(&store, alice.user_id).await;

    let archived = store.archive_project(project, &alice).await.unwrap().unwrap();
    assert!(archived.archived.is_some());

    let active = store
        .list_projects(ProjectFilter::new(), &alice)
        .await
        .unwrap();
    assert!(active.is_empty());

    let all = store
        .list_projects(
            ProjectFilter {
                client_id: Some(client),
                include_archived: true,
            },
            &alice,
        )
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].client.id, client);
    assert_eq!(store.dashboard_stats(&alice).await.unwrap().active_projects, 0);

    store.unarchive_project(project, &alice).await.unwrap().unwrap();
    assert_eq!(store.dashboard_stats(&alice).await.unwrap().active_projects, 1);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn foreign_record_is_checked_before_the_target_parent() {
    let Some(store) = connect().await else { return };
    let alice = account(&store, Role::User).await;
    let bob = account(&store, Role::User).await;
    let (_, alice_project, ..) = tree(&store, alice.user_id).await;
    let (bob_client, ..) = tree(&store, bob.user_id).await;

    let mallory = account(&store, Role::User).await;
    let moved = store
        .update_project(
            alice_project,
            ProjectPatch {
                client_id: Some(bob_client),
                ..ProjectPatch::default()
            },
            &mallory,
        )
        .await
        .unwrap();
    assert!(moved.is_none());

    let err = store
        .update_project(
            alice_project,
            ProjectPatch {
                client_id: Some(bob_client),
                ..ProjectPatch::default()
            },
            &alice,
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("client"));
}
