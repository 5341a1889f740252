//! SqlUserRepository against a migrated in-memory SQLite database.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{NaiveDate, Utc};
use domain_users::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use test_utils::{TestDataBuilder, TestDatabase};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

fn new_user(email: &str) -> NewUser {
    NewUser {
        name: "Ana Silva".to_string(),
        email: email.to_string(),
        password: "secret1".to_string(),
        birth_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
        phone: Some("(11) 98765-4321".to_string()),
        active: true,
        created_at: Utc::now(),
    }
}

async fn insert(repo: &SqlUserRepository, email: &str) -> User {
    let mut session = repo.begin();
    let user = repo.add(&mut session, new_user(email)).await.unwrap();
    assert_eq!(repo.save_changes(session).await.unwrap(), 1);
    user
}

#[tokio::test]
async fn test_add_and_get_by_id() {
    let db = TestDatabase::new().await;
    let repo = SqlUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("sql_add_get");

    let created = insert(&repo, &builder.email("ana")).await;
    assert!(created.id > 0);

    let found = repo
        .get_by_id(&repo.begin(), created.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.email, created.email);
    assert_eq!(found.birth_date, created.birth_date);
    assert_eq!(found.phone, created.phone);
    assert!(found.active);
    assert!(found.updated_at.is_none());
}

#[tokio::test]
async fn test_unsaved_session_is_rolled_back() {
    let db = TestDatabase::new().await;
    let repo = SqlUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("sql_rollback");

    let mut session = repo.begin();
    let user = repo
        .add(&mut session, new_user(&builder.email("ana")))
        .await
        .unwrap();

    // Reads on the session see its own writes
    assert!(repo.get_by_id(&session, user.id).await.unwrap().is_some());
    drop(session);

    assert!(repo.get_all(&repo.begin()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unique_violation_maps_to_duplicate_email() {
    let db = TestDatabase::new().await;
    let repo = SqlUserRepository::new(db.connection());
    let email = TestDataBuilder::from_test_name("sql_unique").email("ana");

    insert(&repo, &email).await;

    let mut session = repo.begin();
    let err = repo
        .add(&mut session, new_user(&email))
        .await
        .unwrap_err();

    assert!(matches!(err, UserError::DuplicateEmail(e) if e == email));
}

#[tokio::test]
async fn test_update_overwrites_and_keeps_created_at() {
    let db = TestDatabase::new().await;
    let repo = SqlUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("sql_update");

    let user = insert(&repo, &builder.email("ana")).await;
    let stored = repo.get_by_id(&repo.begin(), user.id).await.unwrap().unwrap();

    let mut changed = stored.clone();
    changed.name = "Ana Souza".to_string();
    changed.phone = None;
    changed.active = false;
    changed.updated_at = Some(Utc::now());

    let mut session = repo.begin();
    repo.update(&mut session, changed).await.unwrap();
    assert_eq!(repo.save_changes(session).await.unwrap(), 1);

    let reloaded = repo.get_by_id(&repo.begin(), user.id).await.unwrap().unwrap();
    assert_eq!(reloaded.name, "Ana Souza");
    assert_eq!(reloaded.phone, None);
    assert!(!reloaded.active);
    assert!(reloaded.updated_at.is_some());
    assert_eq!(reloaded.created_at, stored.created_at);
}

#[tokio::test]
async fn test_update_missing_row_is_not_found() {
    let db = TestDatabase::new().await;
    let repo = SqlUserRepository::new(db.connection());
    let ghost = new_user(&TestDataBuilder::from_test_name("sql_update_missing").email("ghost"))
        .into_user(999);

    let mut session = repo.begin();
    let err = repo.update(&mut session, ghost).await.unwrap_err();

    assert!(matches!(err, UserError::NotFound(999)));
}

#[tokio::test]
async fn test_update_to_taken_email_is_duplicate() {
    let db = TestDatabase::new().await;
    let repo = SqlUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("sql_update_taken");

    let ana = insert(&repo, &builder.email("ana")).await;
    let mut bia = insert(&repo, &builder.email("bia")).await;
    bia.email = ana.email.clone();

    let mut session = repo.begin();
    let err = repo.update(&mut session, bia).await.unwrap_err();

    assert!(matches!(err, UserError::DuplicateEmail(e) if e == ana.email));
}

#[tokio::test]
async fn test_remove_and_missing_remove() {
    let db = TestDatabase::new().await;
    let repo = SqlUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("sql_remove");

    let user = insert(&repo, &builder.email("ana")).await;

    let mut session = repo.begin();
    repo.remove(&mut session, user.id).await.unwrap();
    assert_eq!(repo.save_changes(session).await.unwrap(), 1);
    assert!(repo.get_by_id(&repo.begin(), user.id).await.unwrap().is_none());

    let mut session = repo.begin();
    let err = repo.remove(&mut session, user.id).await.unwrap_err();
    assert!(matches!(err, UserError::NotFound(_)));
}

#[tokio::test]
async fn test_email_lookups() {
    let db = TestDatabase::new().await;
    let repo = SqlUserRepository::new(db.connection());
    let email = TestDataBuilder::from_test_name("sql_email").email("ana");

    let user = insert(&repo, &email).await;
    let session = repo.begin();

    assert!(repo.email_exists(&session, &email).await.unwrap());
    assert!(!repo.email_exists(&session, "someone@else.com").await.unwrap());
    assert_eq!(
        repo.get_by_email(&session, &email).await.unwrap().map(|u| u.id),
        Some(user.id)
    );
}

#[tokio::test]
async fn test_get_all_orders_by_id() {
    let db = TestDatabase::new().await;
    let repo = SqlUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("sql_order");

    for local in ["c", "a", "b"] {
        insert(&repo, &builder.email(local)).await;
    }

    let ids: Vec<i32> = repo
        .get_all(&repo.begin())
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.id)
        .collect();
    let mut sorted = ids.clone();
    sorted.sort();

    assert_eq!(ids.len(), 3);
    assert_eq!(ids, sorted);
}

#[tokio::test]
async fn test_save_without_writes_returns_zero() {
    let db = TestDatabase::new().await;
    let repo = SqlUserRepository::new(db.connection());

    assert_eq!(repo.save_changes(repo.begin()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_service_soft_delete_on_sql() {
    let db = TestDatabase::new().await;
    let service = UserService::new(SqlUserRepository::new(db.connection()));
    let token = CancellationToken::new();
    let started = Utc::now();

    let created = service
        .create(
            CreateUser {
                name: "Ana Silva".to_string(),
                email: " Ana@Ex.com ".to_string(),
                password: "secret1".to_string(),
                birth_date: NaiveDate::from_ymd_opt(2000, 1, 1),
                phone: None,
            },
            &token,
        )
        .await
        .unwrap();
    assert_eq!(created.email, "ana@ex.com");
    assert!(service.email_taken("ANA@EX.COM", &token).await.unwrap());

    assert!(service.soft_delete(created.id, &token).await.unwrap());
    assert!(!service.soft_delete(created.id + 100, &token).await.unwrap());

    let after = service.get(created.id, &token).await.unwrap().unwrap();
    assert!(!after.active);
    assert_eq!(after.created_at, created.created_at);

    let raw = SqlUserRepository::new(db.connection());
    let stored = raw.get_by_id(&raw.begin(), created.id).await.unwrap().unwrap();
    assert!(stored.updated_at.is_some_and(|ts| ts >= started));
}

#[tokio::test]
async fn test_http_create_and_conflict_on_sql() {
    let db = TestDatabase::new().await;
    let app = handlers::router(UserService::new(SqlUserRepository::new(db.connection())));

    let post = |body: Value| {
        Request::builder()
            .method("POST")
            .uri("/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    };
    let ana = json!({
        "name": "Ana Silva",
        "email": " Ana@Ex.com ",
        "password": "secret1",
        "birthDate": "2000-01-01"
    });

    let response = app.clone().oneshot(post(ana.clone())).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response.headers().get(header::LOCATION).unwrap().clone();

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(location, format!("/users/{}", body["id"]).as_str());

    let mut again = ana;
    again["email"] = json!("ANA@EX.COM");
    let response = app.oneshot(post(again)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_closed_pool_is_service_unavailable() {
    let db = TestDatabase::new().await;
    let app = handlers::router(UserService::new(SqlUserRepository::new(db.connection())));
    db.connection().close().await.unwrap();

    let request = Request::builder().uri("/users").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "Service is temporarily unavailable");
}
