//! HTTP API tests over in-memory stores

mod common;

use axum::http::{Method, StatusCode};
use common::{StaticExtractor, TestApp};
use serde_json::json;
use std::sync::Arc;
use teamtask_shared::ai::GeneratedTask;
use uuid::Uuid;

#[tokio::test]
async fn test_health_without_database() {
    let app = TestApp::new();

    let (status, body) = app.request(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "not_configured");
    assert_eq!(body["ai"], "disabled");
    assert!(body.get("pool").is_none());
}

#[tokio::test]
async fn test_signup() {
    let app = TestApp::new();

    let (status, body) = app
        .request(
            Method::POST,
            "/v1/auth/signup",
            None,
            Some(json!({ "username": "alice", "password": "correct horse" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["username"], "alice");
    assert!(body["user"].get("password_hash").is_none());
    assert_eq!(body["organization"]["name"], "alice's organization");
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
}

#[tokio::test]
async fn test_signup_errors() {
    let app = TestApp::new();
    app.signup("alice").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/v1/auth/signup",
            None,
            Some(json!({ "username": "alice", "password": "another password" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, body) = app
        .request(
            Method::POST,
            "/v1/auth/signup",
            None,
            Some(json!({ "username": "bob", "password": "short" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "password must be at least 8 characters");

    let (status, _) = app
        .request(
            Method::POST,
            "/v1/auth/signup",
            None,
            Some(json!({ "username": "x".repeat(51), "password": "long enough" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "correct horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], alice.user_id.to_string());

    for (username, password) in [("alice", "wrong horse"), ("nobody", "correct horse")] {
        let (status, body) = app
            .request(
                Method::POST,
                "/v1/auth/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "invalid username or password");
    }
}

#[tokio::test]
async fn test_protected_routes_require_access_token() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;

    let (status, _) = app.request(Method::GET, "/v1/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/v1/tasks", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A refresh token is not an access token
    let (status, _) = app.get("/v1/organizations", &alice.refresh_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_and_me() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/v1/auth/refresh",
            None,
            Some(json!({ "refresh_token": alice.refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let access_token = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = app.get("/v1/auth/me", &access_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["organizations"].as_array().unwrap().len(), 1);
    assert_eq!(body["organizations"][0]["role"], "owner");

    let (status, _) = app
        .request(
            Method::POST,
            "/v1/auth/refresh",
            None,
            Some(json!({ "refresh_token": alice.token })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_organization_lifecycle() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;

    let (status, org) = app.post("/v1/organizations", &alice.token, json!({ "name": "Acme" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let org_id = org["id"].as_str().unwrap().to_string();
    let invite_code = org["invite_code"].as_str().unwrap().to_string();

    let (status, list) = app.get("/v1/organizations", &alice.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 2);

    // Non-members cannot tell the organization exists
    let (status, body) = app.get(&format!("/v1/organizations/{org_id}"), &bob.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, joined) = app
        .post("/v1/organizations/join", &bob.token, json!({ "invite_code": invite_code }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["id"], org_id.as_str());

    let (status, _) = app
        .post("/v1/organizations/join", &bob.token, json!({ "invite_code": invite_code }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, details) = app.get(&format!("/v1/organizations/{org_id}"), &bob.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["members"].as_array().unwrap().len(), 2);

    // Owner-only actions
    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/v1/organizations/{org_id}"),
            Some(&bob.token),
            Some(json!({ "name": "Bob's now" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, renamed) = app
        .request(
            Method::PUT,
            &format!("/v1/organizations/{org_id}"),
            Some(&alice.token),
            Some(json!({ "name": "Acme Corp" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Acme Corp");

    let (status, rotated) = app
        .post(&format!("/v1/organizations/{org_id}/regenerate-code"), &alice.token, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(rotated["invite_code"], invite_code.as_str());

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/v1/organizations/{org_id}/members/{}", bob.user_id),
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/v1/organizations/{org_id}"), &bob.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(Method::DELETE, &format!("/v1/organizations/{org_id}"), Some(&alice.token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/v1/organizations/{org_id}"), &alice.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_invite_code_and_self_removal() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;

    let (status, _) = app
        .post("/v1/organizations/join", &alice.token, json!({ "invite_code": "0000-0000-0000" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .request(
            Method::DELETE,
            &format!("/v1/organizations/{}/members/{}", alice.organization_id, alice.user_id),
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "cannot remove yourself from the organization");
}

#[tokio::test]
async fn test_task_lifecycle() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    let org = alice.organization_id;

    let (status, created) = app
        .post(
            "/v1/tasks",
            &alice.token,
            json!({ "organization_id": org, "title": "  Ship it  ", "due_date": "2030-01-01T09:00:00Z" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["task"]["title"], "  Ship it  ");
    assert_eq!(created["task"]["status"], "TODO");
    assert_eq!(created["assignees"][0]["id"], alice.user_id.to_string());
    let task_id = created["task"]["id"].as_str().unwrap().to_string();
    let task_uri = format!("/v1/tasks/{task_id}");

    // Outsiders see nothing
    let (status, _) = app.get(&task_uri, &bob.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .post("/v1/tasks", &bob.token, json!({ "organization_id": org, "title": "Sneaky" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.post("/v1/organizations/join", &bob.token, json!({ "invite_code": alice.invite_code }))
        .await;

    let (status, _) = app.get(&task_uri, &bob.token).await;
    assert_eq!(status, StatusCode::OK);

    // Bob is neither creator nor assignee yet
    let (status, _) = app.post(&format!("{task_uri}/toggle"), &bob.token, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, assigned) = app
        .post(&format!("{task_uri}/assign"), &alice.token, json!({ "user_ids": [bob.user_id, bob.user_id] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["assignees"].as_array().unwrap().len(), 2);

    let (status, toggled) = app.post(&format!("{task_uri}/toggle"), &bob.token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["task"]["status"], "DONE");

    let (status, patched) = app
        .request(
            Method::PATCH,
            &task_uri,
            Some(&bob.token),
            Some(json!({ "description": "with notes", "clear_due_date": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["task"]["description"], "with notes");
    assert!(patched["task"]["due_date"].is_null());
    assert_eq!(patched["task"]["title"], "  Ship it  ");

    let (status, _) = app
        .request(Method::PATCH, &task_uri, Some(&bob.token), Some(json!({ "title": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Only the creator deletes and manages assignments
    let (status, _) = app.request(Method::DELETE, &task_uri, Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .post(&format!("{task_uri}/unassign"), &bob.token, json!({ "user_ids": [alice.user_id] }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, unassigned) = app
        .post(&format!("{task_uri}/unassign"), &alice.token, json!({ "user_ids": [bob.user_id] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unassigned["assignees"].as_array().unwrap().len(), 1);

    let (status, _) = app.request(Method::DELETE, &task_uri, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&task_uri, &alice.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_assign_validation() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;
    let outsider = app.signup("outsider").await;
    let task_id = app.create_task(&alice, alice.organization_id, "Plan").await;

    let (status, body) = app
        .post(&format!("/v1/tasks/{task_id}/assign"), &alice.token, json!({ "user_ids": [] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "at least one user ID is required");

    let (status, _) = app
        .post(
            &format!("/v1/tasks/{task_id}/assign"),
            &alice.token,
            json!({ "user_ids": [outsider.user_id] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_task_requires_title() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;

    let (status, body) = app
        .post("/v1/tasks", &alice.token, json!({ "organization_id": alice.organization_id }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "title is required");
}

#[tokio::test]
async fn test_list_tasks() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    app.post("/v1/organizations/join", &bob.token, json!({ "invite_code": alice.invite_code }))
        .await;

    for title in ["one", "two", "three"] {
        app.create_task(&alice, alice.organization_id, title).await;
    }
    let bobs = app.create_task(&bob, alice.organization_id, "bob's").await;
    app.create_task(&bob, bob.organization_id, "private").await;
    app.post(&format!("/v1/tasks/{bobs}/toggle"), &bob.token, json!({})).await;

    let (status, body) = app.get("/v1/tasks", &alice.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 4);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 20);

    let (_, body) = app.get("/v1/tasks?assigned_to_me=true", &bob.token).await;
    assert_eq!(body["total"], 2);

    let (_, body) = app
        .get(&format!("/v1/tasks?organization_id={}&status=DONE", alice.organization_id), &bob.token)
        .await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["tasks"][0]["task"]["title"], "bob's");

    let (_, body) = app.get("/v1/tasks?page=2&page_size=3", &alice.token).await;
    assert_eq!(body["total"], 4);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["tasks"].as_array().unwrap().len(), 1);

    let (status, _) = app.get("/v1/tasks?page_size=101", &alice.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/v1/tasks?page=0", &alice.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .get(&format!("/v1/tasks?organization_id={}", bob.organization_id), &alice.token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_task() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;

    let (status, body) = app.get(&format!("/v1/tasks/{}", Uuid::new_v4()), &alice.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "task not found");
}

#[tokio::test]
async fn test_generate_not_configured() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;

    let (status, body) = app
        .post("/v1/tasks/generate", &alice.token, json!({ "text": "call the bank" }))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "service_unavailable");
}

#[tokio::test]
async fn test_generate_tasks() {
    let extractor = StaticExtractor(vec![
        GeneratedTask {
            title: "Call the bank".to_string(),
            description: " about the loan ".to_string(),
            due_date: None,
        },
        GeneratedTask {
            title: "  ".to_string(),
            description: String::new(),
            due_date: None,
        },
    ]);
    let app = TestApp::with_extractor(Arc::new(extractor));
    let alice = app.signup("alice").await;

    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ai"], "enabled");

    let (status, body) = app
        .post("/v1/tasks/generate", &alice.token, json!({ "text": "call the bank about the loan" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let tasks = body["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "Call the bank");
    assert_eq!(tasks[0]["description"], "about the loan");

    // Nothing was stored
    let (_, body) = app.get("/v1/tasks", &alice.token).await;
    assert_eq!(body["total"], 0);

    let (status, _) = app.post("/v1/tasks/generate", &alice.token, json!({ "text": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_without_usable_output() {
    let app = TestApp::with_extractor(Arc::new(StaticExtractor(Vec::new())));
    let alice = app.signup("alice").await;

    let (status, body) = app
        .post("/v1/tasks/generate", &alice.token, json!({ "text": "nothing here" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "AI did not generate any tasks");
}
