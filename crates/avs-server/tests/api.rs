mod common;

use avs_core::Role;
use avs_test_utils::{Failures, StubGenerator, PNG_BYTES};
use common::TestApp;
use pretty_assertions::assert_eq;
use serde_json::json;
use warp::http::StatusCode;

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = TestApp::new();
    let response = app.send("GET", "/api/clients", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "UNAUTHORIZED");
    assert_eq!(response.error_message(), "Authentication required");

    let forged = app.get("/api/clients", "avs.sid=forged").await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_routes_use_the_error_envelope() {
    let app = TestApp::new();
    let response = app.send("GET", "/api/nope", None, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn register_me_logout() {
    let app = TestApp::new();
    let response = app
        .send(
            "POST",
            "/api/auth/register",
            Some(json!({
                "email": "New@Example.com",
                "password": "secret1",
                "name": "New",
                "role": "ADMIN"
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let user = &response.data()["user"];
    assert_eq!(user["email"], "new@example.com");
    assert_eq!(user["role"], "USER");
    assert!(user.get("passwordHash").is_none());

    let set_cookie = response.headers["set-cookie"].to_str().unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    let cookie = response.session_cookie();

    let me = app.get("/api/me", &cookie).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.data()["user"]["email"], "new@example.com");
    assert_eq!(me.data()["permissions"]["canManageUsers"], false);
    assert_eq!(me.data()["permissions"]["canCreateResources"], true);

    let again = app
        .send(
            "POST",
            "/api/auth/register",
            Some(json!({ "email": "new@example.com", "password": "secret1" })),
            None,
        )
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.error_code(), "USER_EXISTS");

    let logout = app.send("POST", "/api/auth/logout", None, Some(&cookie)).await;
    assert_eq!(logout.data()["message"], "Logged out successfully");
    assert!(logout.headers["set-cookie"]
        .to_str()
        .unwrap()
        .contains("Max-Age=0"));

    let me = app.get("/api/me", &cookie).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    assert_eq!(me.error_message(), "Not authenticated");
}

#[tokio::test]
async fn login_failures() {
    let app = TestApp::new();
    app.user("user@example.com").await;

    let wrong = app
        .send(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "user@example.com", "password": "wrong-password" })),
            None,
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.error_code(), "INVALID_CREDENTIALS");
    assert_eq!(wrong.error_message(), "Invalid email or password");

    let invalid = app
        .send(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "not-an-email", "password": "123" })),
            None,
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.error_code(), "VALIDATION_ERROR");
    assert_eq!(invalid.error_message(), "Invalid input");
    let details = invalid.body["error"]["details"].as_array().unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(details[0]["path"], json!(["email"]));
}

#[tokio::test]
async fn users_listing_is_admin_only() {
    let app = TestApp::new();
    let user = app.user("user@example.com").await;
    let admin = app.admin().await;

    let denied = app.get("/api/users", &user).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(denied.error_message(), "Admin access required");

    let listed = app.get("/api/users", &admin).await;
    let users = listed.data().as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("passwordHash").is_none()));
}

#[tokio::test]
async fn clients_are_scoped_to_their_owner() {
    let app = TestApp::new();
    let alice = app.user("alice@example.com").await;
    let bob = app.user("bob@example.com").await;
    let admin = app.admin().await;

    let created = app
        .post("/api/clients", json!({ "name": "Acme", "description": "Rockets" }), &alice)
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.data()["id"].as_str().unwrap().to_string();
    let path = format!("/api/clients/{id}");

    assert_eq!(app.get(&path, &alice).await.data()["name"], "Acme");
    assert_eq!(app.get("/api/clients", &bob).await.data(), &json!([]));

    let hidden = app.get(&path, &bob).await;
    assert_eq!(hidden.status, StatusCode::NOT_FOUND);
    assert_eq!(hidden.error_message(), "Client not found");

    let patch = app.patch(&path, json!({ "name": "Mine now" }), &bob).await;
    assert_eq!(patch.status, StatusCode::NOT_FOUND);
    assert_eq!(patch.error_message(), "Client not found or access denied");

    assert_eq!(app.delete(&path, &bob).await.status, StatusCode::NOT_FOUND);

    let renamed = app
        .patch(&path, json!({ "name": "Acme Corp", "description": null }), &admin)
        .await;
    assert_eq!(renamed.data()["name"], "Acme Corp");
    assert_eq!(renamed.data()["description"], json!(null));

    let deleted = app.delete(&path, &alice).await;
    assert_eq!(deleted.data()["message"], "Client deleted successfully");
    assert_eq!(app.get(&path, &alice).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn creating_under_a_foreign_parent_is_not_found() {
    let app = TestApp::new();
    let alice = app.user("alice@example.com").await;
    let bob = app.user("bob@example.com").await;
    let (client_id, project_id, asset_id) = app.hierarchy(&alice).await;

    let project = app
        .post("/api/projects", json!({ "clientId": client_id, "name": "X" }), &bob)
        .await;
    assert_eq!(project.status, StatusCode::NOT_FOUND);

    let asset = app
        .post(
            "/api/assets",
            json!({ "projectId": project_id, "name": "X", "templateSvg": "<svg/>" }),
            &bob,
        )
        .await;
    assert_eq!(asset.status, StatusCode::NOT_FOUND);

    let variant = app
        .post("/api/variants", json!({ "assetId": asset_id, "bindings": {} }), &bob)
        .await;
    assert_eq!(variant.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn archive_hides_projects_from_default_listing() {
    let app = TestApp::new();
    let cookie = app.user("user@example.com").await;
    let (client_id, project_id, _) = app.hierarchy(&cookie).await;

    let archived = app
        .send(
            "POST",
            &format!("/api/projects/{project_id}/archive"),
            None,
            Some(&cookie),
        )
        .await;
    assert!(archived.data()["archived"].is_string());

    let active = app.get("/api/projects", &cookie).await;
    assert_eq!(active.data(), &json!([]));

    let all = app
        .get(
            &format!("/api/projects?clientId={client_id}&includeArchived=true"),
            &cookie,
        )
        .await;
    let all = all.data().as_array().unwrap().clone();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["client"]["name"], "Acme");

    let stats = app.get("/api/dashboard/stats", &cookie).await;
    assert_eq!(
        stats.data(),
        &json!({
            "totalClients": 1,
            "activeProjects": 0,
            "templateAssets": 1,
            "generatedVariants": 0
        })
    );

    let restored = app
        .send(
            "POST",
            &format!("/api/projects/{project_id}/unarchive"),
            None,
            Some(&cookie),
        )
        .await;
    assert_eq!(restored.data()["archived"], json!(null));
    assert_eq!(app.get("/api/projects", &cookie).await.data().as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn variants_render_and_cascade() {
    let app = TestApp::new();
    let cookie = app.user("user@example.com").await;
    let (client_id, _, asset_id) = app.hierarchy(&cookie).await;

    let created = app
        .post(
            "/api/variants",
            json!({
                "assetId": asset_id,
                "bindings": { "headline": "Big <Sale>", "cta": "Shop" }
            }),
            &cookie,
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let variant = created.data();
    assert_eq!(variant["source"], "USER");
    assert_eq!(variant["status"], "DRAFT");
    let svg = variant["renderSvg"].as_str().unwrap();
    assert!(svg.contains("Big &lt;Sale&gt;"));
    let variant_id = variant["id"].as_str().unwrap().to_string();

    let updated = app
        .patch(
            &format!("/api/variants/{variant_id}"),
            json!({ "bindings": { "headline": "Changed" }, "status": "READY" }),
            &cookie,
        )
        .await;
    assert_eq!(updated.data()["status"], "READY");
    assert!(updated.data()["renderSvg"].as_str().unwrap().contains("<text>Changed</text>"));

    let listed = app
        .get(&format!("/api/variants?assetId={asset_id}"), &cookie)
        .await;
    let listed = listed.data().as_array().unwrap().clone();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["asset"]["project"]["client"]["name"], "Acme");

    app.delete(&format!("/api/clients/{client_id}"), &cookie).await;
    let stats = app.get("/api/dashboard/stats", &cookie).await;
    assert_eq!(stats.data()["generatedVariants"], 0);
    assert_eq!(stats.data()["templateAssets"], 0);
}

#[tokio::test]
async fn asset_without_template_or_master_is_invalid() {
    let app = TestApp::new();
    let cookie = app.user("user@example.com").await;
    let (_, project_id, _) = app.hierarchy(&cookie).await;

    let response = app
        .post("/api/assets", json!({ "projectId": project_id, "name": "Empty" }), &cookie)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn auto_generate_pairs_copy_with_images() {
    let app = TestApp::new();
    let cookie = app.user("user@example.com").await;
    let (_, _, asset_id) = app.hierarchy(&cookie).await;

    let response = app
        .post(
            "/api/variants/generate",
            json!({ "assetId": asset_id, "textCount": 3, "imageCount": 2 }),
            &cookie,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let data = response.data();
    assert_eq!(data["errors"], json!([]));
    let variants = data["variants"].as_array().unwrap();
    assert_eq!(variants.len(), 3);
    assert_eq!(app.generator.image_calls(), 2);

    let images: Vec<&str> = variants
        .iter()
        .map(|v| v["bindings"]["imageUrl"].as_str().unwrap())
        .collect();
    assert_eq!(images[0], images[2]);
    assert_ne!(images[0], images[1]);
    assert!(variants.iter().all(|v| v["source"] == "AUTO" && v["status"] == "DRAFT"));

    let image = app.send("GET", images[0], None, None).await;
    assert_eq!(image.status, StatusCode::OK);
    assert_eq!(image.headers["content-type"], "image/png");
    assert_eq!(&image.raw[..], PNG_BYTES);

    let prompt = &app.generator.copy_prompts()[0];
    assert_eq!(prompt.count, 3);
    assert_eq!(prompt.context.client_name, "Acme");
    assert_eq!(prompt.context.project_brief.as_deref(), Some("Fresh"));
}

#[tokio::test]
async fn auto_generate_reports_failures() {
    let app = TestApp::with_generator(StubGenerator::failing(Failures {
        copy: true,
        image: true,
        template: false,
    }));
    let cookie = app.user("user@example.com").await;
    let (_, _, asset_id) = app.hierarchy(&cookie).await;

    let response = app
        .post("/api/variants/generate", json!({ "assetId": asset_id }), &cookie)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let data = response.data();
    assert_eq!(data["variants"], json!([]));
    let errors = data["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].as_str().unwrap().starts_with("Text generation failed"));
    assert!(errors[1].as_str().unwrap().starts_with("Image generation failed"));
}

#[tokio::test]
async fn generation_endpoints() {
    let app = TestApp::new();
    let cookie = app.user("user@example.com").await;
    let (_, _, asset_id) = app.hierarchy(&cookie).await;

    let text = app
        .post(
            "/api/generate/text",
            json!({
                "assetId": asset_id,
                "count": 2,
                "constraints": { "tone": "playful", "headlineMaxWords": 5 }
            }),
            &cookie,
        )
        .await;
    assert_eq!(text.data()["variants"].as_array().unwrap().len(), 2);

    let image = app
        .post("/api/generate/image", json!({ "assetId": asset_id }), &cookie)
        .await;
    let urls = image.data()["images"].as_array().unwrap();
    assert_eq!(urls.len(), 1);
    assert!(urls[0].as_str().unwrap().starts_with("/api/objects/generated/"));

    let too_many = app
        .post("/api/generate/text", json!({ "assetId": asset_id, "count": 11 }), &cookie)
        .await;
    assert_eq!(too_many.error_code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn failed_generation_is_bad_gateway() {
    let app = TestApp::with_generator(StubGenerator::failing(Failures {
        copy: true,
        ..Failures::default()
    }));
    let cookie = app.user("user@example.com").await;
    let (_, _, asset_id) = app.hierarchy(&cookie).await;

    let response = app
        .post("/api/generate/text", json!({ "assetId": asset_id }), &cookie)
        .await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.error_code(), "GENERATION_FAILED");
    assert!(response.error_message().starts_with("Text generation failed"));
}

#[tokio::test]
async fn upload_flow_and_template_from_master() {
    let app = TestApp::new();
    let cookie = app.user("user@example.com").await;
    let (_, project_id, _) = app.hierarchy(&cookie).await;

    let ticket = app
        .send("POST", "/api/objects/upload", None, Some(&cookie))
        .await;
    let upload_url = ticket.data()["uploadURL"].as_str().unwrap().to_string();
    assert!(upload_url.starts_with("/api/objects/uploads/"));

    let put = warp::test::request()
        .method("PUT")
        .path(&upload_url)
        .header("content-type", "image/png")
        .body(PNG_BYTES)
        .reply(&avs_server::routes::app(&app.state))
        .await;
    assert_eq!(put.status(), StatusCode::OK);

    let reused = warp::test::request()
        .method("PUT")
        .path(&upload_url)
        .body(PNG_BYTES)
        .reply(&avs_server::routes::app(&app.state))
        .await;
    assert_eq!(reused.status(), StatusCode::NOT_FOUND);

    let served = app.send("GET", &upload_url, None, None).await;
    assert_eq!(served.headers["content-type"], "image/png");
    assert_eq!(&served.raw[..], PNG_BYTES);

    let asset = app
        .post(
            "/api/assets",
            json!({ "projectId": project_id, "name": "From master", "masterAssetUrl": upload_url }),
            &cookie,
        )
        .await;
    assert_eq!(asset.status, StatusCode::CREATED, "{}", asset.body);
    assert_eq!(asset.data()["templateSvg"], avs_test_utils::GENERATED_TEMPLATE);
    assert_eq!(asset.data()["defaultBindings"]["headline"], "Generated headline");

    let prompts = app.generator.template_prompts();
    assert_eq!(prompts.len(), 1);
    assert!(matches!(
        &prompts[0].master,
        avs_genai::MasterAsset::Inline { mime_type, .. } if mime_type == "image/png"
    ));

    let regenerated = app
        .send(
            "POST",
            &format!("/api/assets/{}/generate-template", asset.data()["id"].as_str().unwrap()),
            None,
            Some(&cookie),
        )
        .await;
    assert_eq!(regenerated.status, StatusCode::OK);
    assert_eq!(app.generator.template_prompts().len(), 2);
}

#[tokio::test]
async fn missing_objects_are_not_found() {
    let app = TestApp::new();
    let response = app.send("GET", "/api/objects/uploads/missing", None, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_message(), "File not found");

    let traversal = app.send("GET", "/api/objects/../secret", None, None).await;
    assert_eq!(traversal.status, StatusCode::NOT_FOUND);

    let cookie = app.user("user@example.com").await;
    let ticket = app
        .send("POST", "/api/objects/upload", None, Some(&cookie))
        .await;
    let upload_url = ticket.data()["uploadURL"].as_str().unwrap().to_string();
    let put = warp::test::request()
        .method("PUT")
        .path(&upload_url)
        .header("content-type", "image/png")
        .body(PNG_BYTES)
        .reply(&avs_server::routes::app(&app.state))
        .await;
    assert_eq!(put.status(), StatusCode::OK);

    let folder = app.send("GET", "/api/objects/uploads", None, None).await;
    assert_eq!(folder.status, StatusCode::NOT_FOUND);
    assert_eq!(folder.error_code(), "NOT_FOUND");

    let below_file = app
        .send("GET", &format!("{upload_url}/x"), None, None)
        .await;
    assert_eq!(below_file.status, StatusCode::NOT_FOUND);
    assert_eq!(below_file.error_message(), "File not found");
}

#[tokio::test]
async fn admin_sees_every_tenant() {
    let app = TestApp::new();
    let alice = app.user("alice@example.com").await;
    let bob = app.sign_in_as("bob@example.com", Role::User).await;
    let admin = app.admin().await;
    app.hierarchy(&alice).await;
    app.hierarchy(&bob).await;

    let stats = app.get("/api/dashboard/stats", &admin).await;
    assert_eq!(stats.data()["totalClients"], 2);
    assert_eq!(app.get("/api/assets", &admin).await.data().as_array().unwrap().len(), 2);
    assert_eq!(app.get("/api/assets", &alice).await.data().as_array().unwrap().len(), 1);
}
