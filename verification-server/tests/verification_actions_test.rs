//! Tests for the approve / reject / unapprove / resubmit endpoints

mod common;

use common::{create_test_server, with_service_token, with_service_token_as};
use serde_json::{json, Value};
use uuid::Uuid;
use verification_core::Role;
use verification_server::VerificationStore;

/// Test: admin approval flips both flags and resolves to approved
#[tokio::test]
async fn test_approve_contractor() {
    let ctx = create_test_server();
    let admin = ctx.create_account("admin@example.com", Role::Admin);
    let contractor = ctx.create_account("vendor@example.com", Role::Contractor);

    let response = ctx
        .server
        .post(&format!("/api/verification/{}/approve", contractor.id))
        .add_cookie(ctx.cookie_for(&admin))
        .json(&json!({ "reason": "documents check out" }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["verification_status"], "approved");
    assert_eq!(body["entry"]["action"], "approve");
    assert_eq!(body["entry"]["status"], "approved");
    assert_eq!(body["entry"]["reason"], "documents check out");
    assert_eq!(body["entry"]["admin_id"], admin.id.to_string());

    let user = ctx.store.get_user(contractor.id).unwrap().unwrap();
    assert!(user.is_verified);
    let business = ctx.store.get_business_profile(contractor.id).unwrap().unwrap();
    assert!(business.is_verified);
    assert!(business.verification_date.is_some());
}

/// Test: approve works without a request body
#[tokio::test]
async fn test_approve_without_body() {
    let ctx = create_test_server();
    let admin = ctx.create_account("admin@example.com", Role::Admin);
    let manager = ctx.create_account("planner@example.com", Role::EventManager);

    let response = ctx
        .server
        .post(&format!("/api/verification/{}/approve", manager.id))
        .add_cookie(ctx.cookie_for(&admin))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["verification_status"], "approved");
    assert!(body["entry"].get("reason").is_none());
}

/// Test: reject without a reason is a 400 with a field error
#[tokio::test]
async fn test_reject_requires_reason() {
    let ctx = create_test_server();
    let admin = ctx.create_account("admin@example.com", Role::Admin);
    let contractor = ctx.create_account("vendor@example.com", Role::Contractor);

    let response = ctx
        .server
        .post(&format!("/api/verification/{}/reject", contractor.id))
        .add_cookie(ctx.cookie_for(&admin))
        .json(&json!({ "reason": "   ", "feedback": "try again" }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["errors"][0]["field"], "reason");

    assert!(ctx.store.list_verification_logs(contractor.id).unwrap().is_empty());
}

/// Test: rejection after approval resolves to rejected and clears the flags
#[tokio::test]
async fn test_reject_after_approve() {
    let ctx = create_test_server();
    let admin = ctx.create_account("admin@example.com", Role::Admin);
    let contractor = ctx.create_account("vendor@example.com", Role::Contractor);
    let cookie = ctx.cookie_for(&admin);

    ctx.server
        .post(&format!("/api/verification/{}/approve", contractor.id))
        .add_cookie(cookie.clone())
        .await
        .assert_status_ok();

    let response = ctx
        .server
        .post(&format!("/api/verification/{}/reject", contractor.id))
        .add_cookie(cookie)
        .json(&json!({
            "reason": "insurance certificate expired",
            "feedback": "Upload a current certificate"
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["verification_status"], "rejected");
    assert_eq!(body["entry"]["feedback"], "Upload a current certificate");

    assert!(!ctx.store.get_user(contractor.id).unwrap().unwrap().is_verified);
    let business = ctx.store.get_business_profile(contractor.id).unwrap().unwrap();
    assert!(!business.is_verified);
}

/// Test: unapproving a previously approved contractor with no onboarding row yields pending
#[tokio::test]
async fn test_unapprove_does_not_regress_to_onboarding() {
    let ctx = create_test_server();
    let admin = ctx.create_account("admin@example.com", Role::Admin);
    let contractor = ctx.create_account("vendor@example.com", Role::Contractor);
    let cookie = ctx.cookie_for(&admin);

    ctx.server
        .post(&format!("/api/verification/{}/approve", contractor.id))
        .add_cookie(cookie.clone())
        .await
        .assert_status_ok();

    let response = ctx
        .server
        .post(&format!("/api/verification/{}/unapprove", contractor.id))
        .add_cookie(cookie)
        .json(&json!({ "reason": "license lapsed" }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["entry"]["action"], "unapprove");
    assert_eq!(body["entry"]["status"], "pending");
    assert_eq!(body["verification_status"], "pending");

    // Approval history is kept
    let logs = ctx.store.list_verification_logs(contractor.id).unwrap();
    assert_eq!(logs.len(), 2);
    assert!(ctx.store.get_onboarding(contractor.id).unwrap().is_none());
}

/// Test: non-admin sessions get 403
#[tokio::test]
async fn test_non_admin_forbidden() {
    let ctx = create_test_server();
    let contractor = ctx.create_account("vendor@example.com", Role::Contractor);
    let other = ctx.create_account("other@example.com", Role::EventManager);

    for action in ["approve", "reject", "unapprove"] {
        let response = ctx
            .server
            .post(&format!("/api/verification/{}/{}", contractor.id, action))
            .add_cookie(ctx.cookie_for(&other))
            .json(&json!({ "reason": "because" }))
            .await;
        assert_eq!(response.status_code(), 403, "action {}", action);
    }
}

/// Test: no session and no token gives 401
#[tokio::test]
async fn test_unauthenticated() {
    let ctx = create_test_server();
    let contractor = ctx.create_account("vendor@example.com", Role::Contractor);

    let response = ctx
        .server
        .post(&format!("/api/verification/{}/approve", contractor.id))
        .await;

    assert_eq!(response.status_code(), 401);
}

/// Test: unknown and malformed user ids give 404
#[tokio::test]
async fn test_unknown_user_not_found() {
    let ctx = create_test_server();
    let admin = ctx.create_account("admin@example.com", Role::Admin);

    for target in [Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
        let response = ctx
            .server
            .post(&format!("/api/verification/{}/approve", target))
            .add_cookie(ctx.cookie_for(&admin))
            .await;
        assert_eq!(response.status_code(), 404);
    }
}

/// Test: admin accounts cannot be reviewed
#[tokio::test]
async fn test_admin_target_rejected() {
    let ctx = create_test_server();
    let admin = ctx.create_account("admin@example.com", Role::Admin);
    let other_admin = ctx.create_account("admin2@example.com", Role::Admin);

    let response = ctx
        .server
        .post(&format!("/api/verification/{}/approve", other_admin.id))
        .add_cookie(ctx.cookie_for(&admin))
        .await;

    assert_eq!(response.status_code(), 400);
}

/// Test: service token actions omit admin_id unless it names a stored admin
#[tokio::test]
async fn test_service_token_admin_id() {
    let ctx = create_test_server();
    let admin = ctx.create_account("admin@example.com", Role::Admin);
    let contractor = ctx.create_account("vendor@example.com", Role::Contractor);
    let path = format!("/api/verification/{}/approve", contractor.id);

    let response = with_service_token(ctx.server.post(&path)).await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert!(body["entry"].get("admin_id").is_none());

    let response = with_service_token_as(ctx.server.post(&path), "dev").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert!(body["entry"].get("admin_id").is_none());

    let response =
        with_service_token_as(ctx.server.post(&path), &Uuid::new_v4().to_string()).await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert!(body["entry"].get("admin_id").is_none());

    let response = with_service_token_as(ctx.server.post(&path), &admin.id.to_string()).await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["entry"]["admin_id"], admin.id.to_string());

    assert_eq!(ctx.store.list_verification_logs(contractor.id).unwrap().len(), 4);
}

/// Test: a bearer token that does not match is refused
#[tokio::test]
async fn test_wrong_bearer_token() {
    let ctx = create_test_server();
    let contractor = ctx.create_account("vendor@example.com", Role::Contractor);

    let response = ctx
        .server
        .post(&format!("/api/verification/{}/approve", contractor.id))
        .add_header(
            axum::http::header::AUTHORIZATION,
            axum::http::HeaderValue::from_static("Bearer nope"),
        )
        .await;

    assert_eq!(response.status_code(), 401);
}

/// Test: contractor resubmits after a rejection; status stays rejected, flags untouched
#[tokio::test]
async fn test_resubmit_after_rejection() {
    let ctx = create_test_server();
    let admin = ctx.create_account("admin@example.com", Role::Admin);
    let contractor = ctx.create_account("vendor@example.com", Role::Contractor);

    ctx.server
        .post(&format!("/api/verification/{}/reject", contractor.id))
        .add_cookie(ctx.cookie_for(&admin))
        .json(&json!({ "reason": "missing tax id" }))
        .await
        .assert_status_ok();

    let response = ctx
        .server
        .post(&format!("/api/verification/{}/resubmit", contractor.id))
        .add_cookie(ctx.cookie_for(&contractor))
        .json(&json!({ "notes": "added tax id" }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["entry"]["action"], "resubmit");
    assert_eq!(body["entry"]["status"], "pending");
    assert_eq!(body["entry"]["reason"], "added tax id");
    assert!(body["entry"].get("admin_id").is_none());
    assert_eq!(body["verification_status"], "rejected");

    assert!(!ctx.store.get_user(contractor.id).unwrap().unwrap().is_verified);
}

/// Test: resubmitting for someone else is forbidden
#[tokio::test]
async fn test_resubmit_for_other_forbidden() {
    let ctx = create_test_server();
    let contractor = ctx.create_account("vendor@example.com", Role::Contractor);
    let other = ctx.create_account("other@example.com", Role::Contractor);

    let response = ctx
        .server
        .post(&format!("/api/verification/{}/resubmit", contractor.id))
        .add_cookie(ctx.cookie_for(&other))
        .await;

    assert_eq!(response.status_code(), 403);
}

/// Test: a malformed body is a 400 and records nothing
#[tokio::test]
async fn test_malformed_action_body() {
    let ctx = create_test_server();
    let admin = ctx.create_account("admin@example.com", Role::Admin);
    let contractor = ctx.create_account("vendor@example.com", Role::Contractor);

    for action in ["approve", "unapprove", "resubmit"] {
        let response = ctx
            .server
            .post(&format!("/api/verification/{}/{}", contractor.id, action))
            .add_cookie(ctx.cookie_for(&admin))
            .text(r#"{"reason": 42"#)
            .content_type("application/json")
            .await;

        assert_eq!(response.status_code(), 400, "action {}", action);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"][0]["field"], "body");
    }

    let response = ctx
        .server
        .post(&format!("/api/verification/{}/approve", contractor.id))
        .add_cookie(ctx.cookie_for(&admin))
        .json(&json!({ "reason": 42 }))
        .await;
    assert_eq!(response.status_code(), 400);

    assert!(ctx.store.list_verification_logs(contractor.id).unwrap().is_empty());
    assert!(!ctx.store.get_user(contractor.id).unwrap().unwrap().is_verified);
}
