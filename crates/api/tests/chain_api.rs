//! HTTP-level tests for approver chain edits and renumbering.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, create_approval, decide, delete_auth, detail, login_as,
    post_json_auth, seed_user, token_for, TestApp,
};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `(step_id, step_order, approver_name)` for every step, in order.
async fn chain(app: &TestApp, token: &str, id: i64) -> Vec<(i64, i64, String)> {
    detail(app, token, id).await["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| {
            (
                s["id"].as_i64().unwrap(),
                s["step_order"].as_i64().unwrap(),
                s["approver_name"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

fn names(chain: &[(i64, i64, String)]) -> Vec<&str> {
    chain.iter().map(|(_, _, n)| n.as_str()).collect()
}

fn orders(chain: &[(i64, i64, String)]) -> Vec<i64> {
    chain.iter().map(|(_, o, _)| *o).collect()
}

async fn reorder(app: &TestApp, token: &str, id: i64, step_ids: &[i64]) -> axum::http::Response<axum::body::Body> {
    post_json_auth(
        &app.router,
        &format!("/api/v1/approvals/{id}/steps/reorder"),
        token,
        json!({ "step_ids": step_ids }),
    )
    .await
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// Delete the last step, then approve the rest to completion.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_then_complete(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let carol = login_as(&app, &pool, "carol").await;
    let alice = login_as(&app, &pool, "alice").await;
    let bob = login_as(&app, &pool, "bob").await;

    let id = create_approval(&app, &carol, "Pool heater", &["Alice", "Bob", "Chris"], "org").await;
    let steps = chain(&app, &carol, id).await;
    let chris = steps[2].0;

    let response = delete_auth(&app.router, &format!("/api/v1/approvals/{id}/steps/{chris}"), &carol).await;
    assert_eq!(response.status(), StatusCode::OK);
    let steps = chain(&app, &carol, id).await;
    assert_eq!(names(&steps), vec!["Alice", "Bob"]);
    assert_eq!(orders(&steps), vec![0, 1]);

    assert_eq!(decide(&app, &alice, id, "approve", Some("ok")).await.status(), StatusCode::OK);
    assert_eq!(detail(&app, &carol, id).await["approval"]["current_step"], 1);

    let response = decide(&app, &bob, id, "approve", Some("ok")).await;
    let outcome = body_json(response).await;
    assert_eq!(outcome["data"]["status"], "approved");
    assert_eq!(outcome["data"]["current_step"], -1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_active_and_decided_steps_cannot_be_deleted(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let carol = login_as(&app, &pool, "carol").await;
    let alice = login_as(&app, &pool, "alice").await;

    let id = create_approval(&app, &carol, "Pool heater", &["Alice", "Bob", "Chris"], "org").await;
    let steps = chain(&app, &carol, id).await;

    let uri = format!("/api/v1/approvals/{id}/steps/{}", steps[0].0);
    let response = delete_auth(&app.router, &uri, &carol).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "cannot_delete_this_step");

    decide(&app, &alice, id, "approve", Some("ok")).await;
    let response = delete_auth(&app.router, &uri, &carol).await;
    assert_eq!(body_json(response).await["code"], "cannot_delete_this_step");

    // Bob is now active.
    let uri = format!("/api/v1/approvals/{id}/steps/{}", steps[1].0);
    let response = delete_auth(&app.router, &uri, &carol).await;
    assert_eq!(body_json(response).await["code"], "cannot_delete_this_step");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_chain_edits_need_requester_or_admin(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let carol = login_as(&app, &pool, "carol").await;
    let bob = login_as(&app, &pool, "bob").await;
    let admin_id = seed_user(&pool, "root", true, false).await;
    let admin = token_for(&app, admin_id);

    let id = create_approval(&app, &carol, "Pool heater", &["Alice", "Bob", "Chris"], "org").await;
    let chris = chain(&app, &carol, id).await[2].0;
    let uri = format!("/api/v1/approvals/{id}/steps/{chris}");

    let response = delete_auth(&app.router, &uri, &bob).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "only_requester_or_admin");

    let response = delete_auth(&app.router, &uri, &admin).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Append
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_add_is_rejected(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let carol = login_as(&app, &pool, "carol").await;
    let id = create_approval(&app, &carol, "Pool heater", &["Alice"], "org").await;
    let uri = format!("/api/v1/approvals/{id}/steps");

    let response = post_json_auth(&app.router, &uri, &carol, json!({ "display_name": "  alice " })).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "duplicated_name");

    let response = post_json_auth(&app.router, &uri, &carol, json!({ "display_name": "   " })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "invalid_display_name");

    let response = post_json_auth(&app.router, &uri, &carol, json!({ "display_name": "Erin" })).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let steps = body_json(response).await["data"].clone();
    assert_eq!(steps.as_array().unwrap().len(), 2);
    assert_eq!(steps[1]["approver_name"], "Erin");
    assert_eq!(steps[1]["step_order"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_chain_is_frozen_once_resolved(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let carol = login_as(&app, &pool, "carol").await;
    let alice = login_as(&app, &pool, "alice").await;
    let id = create_approval(&app, &carol, "Pool heater", &["Alice"], "org").await;
    decide(&app, &alice, id, "reject", Some("no budget")).await;

    let response = post_json_auth(
        &app.router,
        &format!("/api/v1/approvals/{id}/steps"),
        &carol,
        json!({ "display_name": "Erin" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "approval_not_pending");
}

// ---------------------------------------------------------------------------
// Reorder
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reorder_permutes_trailing_steps(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let carol = login_as(&app, &pool, "carol").await;
    let id = create_approval(&app, &carol, "Pool heater", &["Alice", "Bob", "Chris", "Dana"], "org").await;
    let steps = chain(&app, &carol, id).await;
    let (bob, chris, dana) = (steps[1].0, steps[2].0, steps[3].0);

    let response = reorder(&app, &carol, id, &[dana, bob, chris]).await;
    assert_eq!(response.status(), StatusCode::OK);

    let steps = chain(&app, &carol, id).await;
    assert_eq!(names(&steps), vec!["Alice", "Dana", "Bob", "Chris"]);
    assert_eq!(orders(&steps), vec![0, 1, 2, 3]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reorder_scope_is_enforced(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let carol = login_as(&app, &pool, "carol").await;
    let alice = login_as(&app, &pool, "alice").await;
    let id = create_approval(&app, &carol, "Pool heater", &["Alice", "Bob", "Chris", "Dana"], "org").await;
    let steps = chain(&app, &carol, id).await;
    let (a, b, c, d) = (steps[0].0, steps[1].0, steps[2].0, steps[3].0);

    // The active step may not move.
    let response = reorder(&app, &carol, id, &[a, d, c, b]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "invalid_ids");

    // Omissions and duplicates are refused.
    let response = reorder(&app, &carol, id, &[d, c]).await;
    assert_eq!(body_json(response).await["code"], "invalid_ids");
    let response = reorder(&app, &carol, id, &[d, c, c]).await;
    assert_eq!(body_json(response).await["code"], "invalid_ids");

    decide(&app, &alice, id, "approve", Some("ok")).await;

    // Bob is now active; only Chris and Dana remain movable.
    let response = reorder(&app, &carol, id, &[d, b, c]).await;
    assert_eq!(body_json(response).await["code"], "invalid_ids");
    let response = reorder(&app, &carol, id, &[d, c]).await;
    assert_eq!(response.status(), StatusCode::OK);

    let steps = chain(&app, &carol, id).await;
    assert_eq!(names(&steps), vec!["Alice", "Bob", "Dana", "Chris"]);
    assert_eq!(detail(&app, &carol, id).await["approval"]["current_step"], 1);
}

/// A decided step sitting after the active one blocks every plan; the retry
/// renumbers once and then gives up.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_persistent_order_conflict_reports_renumber_conflict(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let carol = login_as(&app, &pool, "carol").await;
    let id = create_approval(&app, &carol, "Pool heater", &["Alice", "Bob", "Chris"], "org").await;
    let steps = chain(&app, &carol, id).await;

    sqlx::query("UPDATE approval_steps SET status = 'approved' WHERE id = $1")
        .bind(steps[1].0)
        .execute(&pool)
        .await
        .unwrap();

    let response = reorder(&app, &carol, id, &[steps[2].0]).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "renumber_conflict");

    // Nothing moved.
    assert_eq!(orders(&chain(&app, &carol, id).await), vec![0, 1, 2]);
}

// ---------------------------------------------------------------------------
// Renumber
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_renumber_heals_gaps_and_is_idempotent(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let carol = login_as(&app, &pool, "carol").await;
    let alice = login_as(&app, &pool, "alice").await;
    let bob = login_as(&app, &pool, "bob").await;
    let admin_id = seed_user(&pool, "root", true, false).await;
    let admin = token_for(&app, admin_id);

    let id = create_approval(&app, &carol, "Pool heater", &["Alice", "Bob", "Chris"], "org").await;
    decide(&app, &alice, id, "approve", Some("ok")).await;

    sqlx::query("UPDATE approval_steps SET step_order = step_order * 10 + 5 WHERE approval_id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("UPDATE approvals SET current_step = 15 WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    let response = post_json_auth(&app.router, "/api/v1/admin/approvals/renumber", &admin, json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await["data"].clone();
    assert_eq!(report["approvals"], 1);
    assert_eq!(report["steps_moved"], 3);

    let steps = chain(&app, &carol, id).await;
    assert_eq!(orders(&steps), vec![0, 1, 2]);
    assert_eq!(detail(&app, &carol, id).await["approval"]["current_step"], 1);

    let response = post_json_auth(&app.router, "/api/v1/admin/approvals/renumber", &admin, json!({})).await;
    assert_eq!(body_json(response).await["data"]["steps_moved"], 0);

    // The healed chain still advances normally.
    let response = decide(&app, &bob, id, "approve", Some("ok")).await;
    assert_eq!(body_json(response).await["data"]["current_step"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_renumber_requires_admin(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let carol = login_as(&app, &pool, "carol").await;
    let response = post_json_auth(&app.router, "/api/v1/admin/approvals/renumber", &carol, json!({})).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
