//! Login, the `/me` view, and the directory picker.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, get, get_auth, login_as, post_json, seed_employee, seed_user,
    token_for, TEST_PASSWORD,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_success(pool: PgPool) {
    let app = build_test_app(pool.clone());
    seed_user(&pool, "carol", false, true).await;

    let response = post_json(
        &app.router,
        "/api/v1/auth/login",
        json!({ "loginname": "carol", "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["access_token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(json["expires_in"], 3600);
    assert_eq!(json["user"]["loginname"], "carol");
    assert_eq!(json["user"]["role"], "user");
    assert_eq!(json["user"]["is_admin"], false);

    // The issued token works.
    let token = json["access_token"].as_str().unwrap();
    let response = get_auth(&app.router, "/api/v1/me", token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_failures(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let id = seed_user(&pool, "carol", false, true).await;

    let response = post_json(
        &app.router,
        "/api/v1/auth/login",
        json!({ "loginname": "carol", "password": "wrong" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_json(
        &app.router,
        "/api/v1/auth/login",
        json!({ "loginname": "nobody", "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    sqlx::query("UPDATE users SET is_active = false WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();
    let response = post_json(
        &app.router,
        "/api/v1/auth/login",
        json!({ "loginname": "carol", "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_protected_routes_need_a_token(pool: PgPool) {
    let app = build_test_app(pool);
    assert_eq!(get(&app.router, "/api/v1/me").await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        get(&app.router, "/api/v1/approvals/inbox").await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        get_auth(&app.router, "/api/v1/me", "not-a-jwt").await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_me_expands_identity_keys_and_filters_navigation(pool: PgPool) {
    let app = build_test_app(pool.clone());
    seed_employee(&pool, "Samuel Huang", "黃金昇", "samuel.huang@hotel.example", "Rooms").await;
    let token = login_as(&app, &pool, "samuel.huang").await;

    let response = get_auth(&app.router, "/api/v1/me", &token).await;
    let me = body_json(response).await["data"].clone();

    let keys: Vec<&str> = me["identity_keys"]
        .as_array()
        .unwrap()
        .iter()
        .map(|k| k.as_str().unwrap())
        .collect();
    assert!(keys.contains(&"samuel.huang"));
    assert!(keys.contains(&"samuel huang"));
    assert!(keys.contains(&"黃金昇"));

    let nav: Vec<&str> = me["navigation"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["key"].as_str().unwrap())
        .collect();
    assert_eq!(nav, vec!["dashboard", "workflow"]);
    assert_eq!(me["navigation"][1]["children"][0]["key"], "approvals");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_sees_full_navigation(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let id = seed_user(&pool, "root", true, false).await;
    let token = token_for(&app, id);

    let response = get_auth(&app.router, "/api/v1/me", &token).await;
    let me = body_json(response).await["data"].clone();
    assert_eq!(me["navigation"].as_array().unwrap().len(), 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_directory_picker(pool: PgPool) {
    let app = build_test_app(pool.clone());
    seed_employee(&pool, "Samuel Huang", "黃金昇", "samuel.huang@hotel.example", "Rooms").await;
    seed_employee(&pool, "Alice Wu", "", "alice@hotel.example", "Rooms").await;
    seed_employee(&pool, "Bob Lin", "林大寶", "bob@hotel.example", "Finance").await;
    let token = login_as(&app, &pool, "carol").await;

    let response = get_auth(&app.router, "/api/v1/directory/departments", &token).await;
    assert_eq!(body_json(response).await["data"], json!(["Finance", "Rooms"]));

    let response = get_auth(&app.router, "/api/v1/directory/approvers?dept=Rooms", &token).await;
    let mut names: Vec<String> = serde_json::from_value(body_json(response).await["data"].clone()).unwrap();
    names.sort();
    assert_eq!(names, vec!["Alice Wu", "Samuel Huang 黃金昇"]);

    let response = get_auth(&app.router, "/api/v1/directory/approvers?dept=%20", &token).await;
    assert_eq!(body_json(response).await["data"], json!([]));

    let response = get_auth(&app.router, "/api/v1/directory/search?q=lin", &token).await;
    let rows = body_json(response).await["data"].clone();
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["english_name"], "Bob Lin");
}
