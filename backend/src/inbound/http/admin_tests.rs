//! Tests for moderation handlers.

use super::*;
use crate::domain::{ItemStatus, UserAccount};
use crate::inbound::http::test_utils::{TestWorld, body_json, detail_code, login_cookie};
use crate::test_support::fixtures::{account, approved_item};
use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::rstest;
use serde_json::json;

struct Moderation {
    world: TestWorld,
    admin: UserAccount,
    member: UserAccount,
    pending: crate::domain::Item,
}

async fn moderation() -> Moderation {
    let world = TestWorld::new();
    let admin = account("root", Role::Admin, 100);
    let member = account("ada", Role::User, 100);
    world.add_account(&admin).await;
    world.add_account(&member).await;
    let mut pending = approved_item(member.id, "Linen shirt", 40);
    pending.status = ItemStatus::Pending;
    world.add_item(&pending).await;
    world.add_item(&approved_item(member.id, "Wool coat", 150)).await;
    world.add_item(&approved_item(member.id, "Denim jacket", 90)).await;
    Moderation {
        world,
        admin,
        member,
        pending,
    }
}

#[rstest]
#[case("/api/v1/admin/items/pending")]
#[case("/api/v1/admin/stats")]
#[case("/api/v1/admin/users")]
#[case("/api/v1/admin/activity")]
#[actix_web::test]
async fn members_are_forbidden(#[case] uri: &str) {
    let m = moderation().await;
    let app = actix_test::init_service(m.world.app()).await;
    let cookie = login_cookie(&app, "ada").await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri(uri).cookie(cookie).to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn approval_publishes_a_pending_item() {
    let m = moderation().await;
    let app = actix_test::init_service(m.world.app()).await;
    let cookie = login_cookie(&app, "root").await;

    let queue = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/admin/items/pending")
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    let queue = body_json(queue).await;
    assert_eq!(queue[0]["id"], m.pending.id.to_string());

    let approve = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/v1/admin/items/{}/approve", m.pending.id))
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(approve.status(), StatusCode::OK);
    assert_eq!(body_json(approve).await["status"], "approved");

    let again = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/v1/admin/items/{}/reject", m.pending.id))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(again.status(), StatusCode::CONFLICT);
    let body = body_json(again).await;
    assert_eq!(detail_code(&body), Some("invalid_state"));

    let catalogue = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/api/v1/items").to_request(),
    )
    .await;
    assert_eq!(body_json(catalogue).await["total"], 3);
}

#[actix_web::test]
async fn stats_report_rates_to_one_decimal() {
    let m = moderation().await;
    let app = actix_test::init_service(m.world.app()).await;
    let cookie = login_cookie(&app, "root").await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/admin/stats")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body,
        json!({
            "totalUsers": 2,
            "totalItems": 3,
            "pendingItems": 1,
            "approvedItems": 2,
            "totalSwaps": 0,
            "completedSwaps": 0,
            "approvalRate": 66.7,
            "swapSuccessRate": 0.0,
        })
    );
}

#[actix_web::test]
async fn admins_grant_roles_but_cannot_demote_themselves() {
    let m = moderation().await;
    let app = actix_test::init_service(m.world.app()).await;
    let cookie = login_cookie(&app, "root").await;

    let promote = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/v1/admin/users/{}/role", m.member.id))
            .cookie(cookie.clone())
            .set_json(json!({ "role": "admin" }))
            .to_request(),
    )
    .await;
    assert_eq!(promote.status(), StatusCode::OK);
    assert_eq!(body_json(promote).await["role"], "admin");

    let demote_self = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/v1/admin/users/{}/role", m.admin.id))
            .cookie(cookie.clone())
            .set_json(json!({ "role": "user" }))
            .to_request(),
    )
    .await;
    assert_eq!(demote_self.status(), StatusCode::BAD_REQUEST);

    let unknown_role = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/v1/admin/users/{}/role", m.member.id))
            .cookie(cookie)
            .set_json(json!({ "role": "owner" }))
            .to_request(),
    )
    .await;
    assert_eq!(unknown_role.status(), StatusCode::BAD_REQUEST);
    let body = body_json(unknown_role).await;
    assert_eq!(body["details"]["field"], "role");
}

#[actix_web::test]
async fn removal_deletes_any_listing() {
    let m = moderation().await;
    let app = actix_test::init_service(m.world.app()).await;
    let cookie = login_cookie(&app, "root").await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete()
            .uri(&format!("/api/v1/admin/items/{}", m.pending.id))
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let missing = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete()
            .uri(&format!("/api/v1/admin/items/{}", m.pending.id))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn activity_lists_recent_records() {
    let m = moderation().await;
    let app = actix_test::init_service(m.world.app()).await;
    let cookie = login_cookie(&app, "root").await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/admin/activity")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["items"].as_array().map(Vec::len), Some(3));
    assert_eq!(body["users"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["swaps"], json!([]));
}
