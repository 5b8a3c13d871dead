use actix_web::http::StatusCode;
use actix_web::test;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

#[macro_use]
mod common;

use common::{bearer, context, seed_user, send};

/// Creates a task through the API and returns its JSON.
async fn create(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    >,
    user: &todo_api::models::User,
    payload: Value,
) -> Value {
    let (status, body) = send(
        app,
        test::TestRequest::post()
            .uri("/v1/todo/create")
            .insert_header(bearer(user))
            .set_json(payload),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Task creation failed: {}", body);
    assert_eq!(body["message"], "Task created successfully!");
    body["task"].clone()
}

#[actix_rt::test]
async fn test_task_crud_flow() {
    let ctx = context();
    let user = seed_user(&ctx, "owner@example.com", true).await;
    let app = test_app!(ctx);

    let task = create(
        &app,
        &user,
        json!({ "title": "Test Task", "description": "Test Description" }),
    )
    .await;
    let task_id = task["id"].as_i64().unwrap();
    assert_eq!(task["title"], "Test Task");
    assert_eq!(task["completed"], false);
    assert_eq!(task["userid"], user.id);
    assert!(task["deleted_at"].is_null());

    let (status, body) = send(
        &app,
        test::TestRequest::get()
            .uri(&format!("/v1/todo/get/{}", task_id))
            .insert_header(bearer(&user)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Test Task");

    let (status, body) = send(
        &app,
        test::TestRequest::put()
            .uri(&format!("/v1/todo/update/{}", task_id))
            .insert_header(bearer(&user))
            .set_json(json!({ "title": "Updated Task", "description": "", "completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Update failed: {}", body);
    assert_eq!(body["message"], "Task updated successfully!");
    assert_eq!(body["task"]["title"], "Updated Task");
    assert_eq!(body["task"]["completed"], true);

    let (status, body) = send(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/v1/todo/delete/{}", task_id))
            .insert_header(bearer(&user)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task deleted successfully!");
    assert!(body["task"]["deleted_at"].is_string());

    let (status, body) = send(
        &app,
        test::TestRequest::get()
            .uri(&format!("/v1/todo/get/{}", task_id))
            .insert_header(bearer(&user)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No todo found!");
}

#[actix_rt::test]
async fn test_list_tasks() {
    let ctx = context();
    let user = seed_user(&ctx, "lister@example.com", true).await;
    let other = seed_user(&ctx, "other@example.com", true).await;
    let app = test_app!(ctx);

    let (status, body) = send(
        &app,
        test::TestRequest::get().uri("/v1/todo/all").insert_header(bearer(&user)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "No todo found!", "data": [] }));

    create(&app, &user, json!({ "title": "First" })).await;
    create(&app, &user, json!({ "title": "Second" })).await;
    create(&app, &other, json!({ "title": "Not mine" })).await;

    let (status, body) = send(
        &app,
        test::TestRequest::get().uri("/v1/todo/all").insert_header(bearer(&user)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|task| task["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Second", "First"]);
}

#[actix_rt::test]
async fn test_create_task_validation() {
    let ctx = context();
    let user = seed_user(&ctx, "validator@example.com", true).await;
    let app = test_app!(ctx);

    let cases = [
        (json!({ "description": "no title" }), Some("Missing: title")),
        (json!({ "title": "   " }), Some("Missing: title")),
        (json!({ "title": "a".repeat(201) }), None),
        (json!({ "title": "ok", "description": "b".repeat(1001) }), None),
    ];

    for (payload, message) in cases {
        let (status, body) = send(
            &app,
            test::TestRequest::post()
                .uri("/v1/todo/create")
                .insert_header(bearer(&user))
                .set_json(&payload),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", payload);
        if let Some(message) = message {
            assert_eq!(body["error"], message);
        }
    }
}

#[actix_rt::test]
async fn test_task_routes_require_token() {
    let ctx = context();
    let app = test_app!(ctx);

    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/v1/todo/create")
            .set_json(json!({ "title": "Unauthorized Task" })),
    )
    .await;
    assert_eq!(
        status,
        StatusCode::UNAUTHORIZED,
        "Expected 401 Unauthorized, got {}. Body: {}",
        status,
        body
    );
    assert_eq!(body["message"], "auth header is empty");
}

#[actix_rt::test]
async fn test_task_ownership_is_enforced() {
    let ctx = context();
    let owner = seed_user(&ctx, "owner@example.com", true).await;
    let intruder = seed_user(&ctx, "intruder@example.com", true).await;
    let app = test_app!(ctx);

    let task = create(&app, &owner, json!({ "title": "Private" })).await;
    let task_id = task["id"].as_i64().unwrap();

    let requests = [
        test::TestRequest::get().uri(&format!("/v1/todo/get/{}", task_id)),
        // The body is invalid: ownership must be rejected first.
        test::TestRequest::put()
            .uri(&format!("/v1/todo/update/{}", task_id))
            .set_json(json!({ "title": "" })),
        test::TestRequest::delete().uri(&format!("/v1/todo/delete/{}", task_id)),
    ];

    for req in requests {
        let (status, body) = send(&app, req.insert_header(bearer(&intruder))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "You are not allowed to access this todo");
    }

    let (status, body) = send(
        &app,
        test::TestRequest::get()
            .uri(&format!("/v1/todo/get/{}", task_id))
            .insert_header(bearer(&owner)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Private");
}

#[actix_rt::test]
async fn test_task_id_and_existence_checks() {
    let ctx = context();
    let user = seed_user(&ctx, "checker@example.com", true).await;
    let app = test_app!(ctx);

    for uri in ["/v1/todo/get/abc", "/v1/todo/delete/1.5"] {
        let method = if uri.contains("delete") {
            test::TestRequest::delete()
        } else {
            test::TestRequest::get()
        };
        let (status, body) = send(&app, method.uri(uri).insert_header(bearer(&user))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"], "Invalid todo id");
    }

    let (status, body) = send(
        &app,
        test::TestRequest::put()
            .uri("/v1/todo/update/4242")
            .insert_header(bearer(&user))
            .set_json(json!({ "title": "Ghost" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No todo found!");
}
