use crate::{
    auth::CurrentUser,
    error::AppError,
    messages,
    models::{Task, TaskInput, User},
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;

/// Loads a live task and checks that `user` owns it.
///
/// A non-numeric id is a 400, a missing task a 404 and a task owned by someone else a 403.
async fn owned_task(state: &AppState, user: &User, raw_id: &str) -> Result<Task, AppError> {
    let id: i32 = raw_id
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(messages::TASK_INVALID.into()))?;

    let task = state
        .tasks
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(messages::TASK_NOT_FOUND.into()))?;

    if !task.is_owned_by(user.id) {
        log::warn!("user {} tried to access task {} of user {}", user.id, task.id, task.user_id);
        return Err(AppError::Forbidden(messages::TASK_UNAUTHORIZED.into()));
    }
    Ok(task)
}

/// Creates a new task owned by the authenticated user.
///
/// ## Responses:
/// - `201 Created`: `{"message", "task"}`.
/// - `400 Bad Request`: missing title or field too long.
#[post("/create")]
pub async fn create_task(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    input: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    input.check()?;

    let task = state.tasks.create(user.id, &input).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": messages::TASK_CREATED,
        "task": task,
    })))
}

/// Lists the authenticated user's tasks, newest first.
///
/// An empty list is reported as `404 {"message": "No todo found!", "data": []}`.
#[get("/all")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    let tasks = state.tasks.list_by_user(user.id).await?;

    if tasks.is_empty() {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": messages::TASK_NOT_FOUND,
            "data": [],
        })));
    }
    Ok(HttpResponse::Ok().json(json!({ "data": tasks })))
}

#[get("/get/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let task = owned_task(&state, &user, &path).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Replaces title, description and completion state. Ownership is checked before the body.
#[put("/update/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    path: web::Path<String>,
    input: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    let task = owned_task(&state, &user, &path).await?;
    input.check()?;

    let task = state.tasks.update(task.id, &input).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": messages::TASK_UPDATED,
        "task": task,
    })))
}

/// Soft-deletes a task.
#[delete("/delete/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let task = owned_task(&state, &user, &path).await?;
    let task = state.tasks.soft_delete(task.id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": messages::TASK_DELETED,
        "task": task,
    })))
}
