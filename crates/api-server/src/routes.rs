use application::{
    CommandHandler, CreateUserCommand, GetUserResponse, ServiceError, ServiceErrorKind, UserApp,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub user_app: Arc<UserApp>,
    /// Cancelled on shutdown; every request works on a child of it.
    pub shutdown: CancellationToken,
}

impl AppState {
    fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedUser {
    pub user_id: Uuid,
}

/// HTTP face of a [`ServiceError`].
pub struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ServiceErrorKind::NotFound => StatusCode::NOT_FOUND,
            ServiceErrorKind::EmailExists => StatusCode::CONFLICT,
            ServiceErrorKind::Validation => StatusCode::BAD_REQUEST,
            ServiceErrorKind::Error => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self.0)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Handler functions
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<GetUserResponse>>, ApiError> {
    let users = state
        .user_app
        .user_service
        .get_all_users(&state.request_token())
        .await?;
    Ok(Json(users))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GetUserResponse>, ApiError> {
    let user = state
        .user_app
        .user_service
        .get_user_by_id(id, &state.request_token())
        .await?;
    Ok(Json(user))
}

async fn create_user(
    State(state): State<AppState>,
    Json(command): Json<CreateUserCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = state
        .user_app
        .create_user_handler
        .handle(command, &state.request_token())
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedUser { user_id })))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .user_app
        .user_service
        .update_user(id, &payload.name, &payload.email, &state.request_token())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .user_app
        .user_service
        .delete_user(id, &state.request_token())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use config::DatabaseConfig;
    use rstest::{fixture, rstest};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    #[fixture]
    fn app() -> Router {
        let user_app = UserApp::new(&DatabaseConfig::in_memory()).unwrap();
        router(AppState {
            user_app: Arc::new(user_app),
            shutdown: CancellationToken::new(),
        })
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[rstest]
    #[tokio::test]
    async fn user_lifecycle_over_http(app: Router) {
        let (status, created) = send(
            &app,
            "POST",
            "/api/users",
            Some(json!({ "name": "Alice", "email": "a@x.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["user_id"].as_str().unwrap().to_string();

        let (status, user) = send(&app, "GET", &format!("/api/users/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user, json!({ "user_id": id, "name": "Alice", "email": "a@x.com" }));

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/users/{id}"),
            Some(json!({ "name": "Alicia", "email": "a@x.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, users) = send(&app, "GET", "/api/users", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(users.as_array().unwrap().len(), 1);
        assert_eq!(users[0]["name"], "Alicia");

        let (status, _) = send(&app, "DELETE", &format!("/api/users/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, "GET", &format!("/api/users/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "code": "GetUser.NotFound", "message": "User not found" }));
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_email_maps_to_conflict(app: Router) {
        let alice = json!({ "name": "Alice", "email": "a@x.com" });
        let bob = json!({ "name": "Bob", "email": "a@x.com" });

        let (status, _) = send(&app, "POST", "/api/users", Some(alice)).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, "POST", "/api/users", Some(bob)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CreateUser.EmailExists");
    }

    #[rstest]
    #[tokio::test]
    async fn invalid_input_maps_to_bad_request(app: Router) {
        let (status, body) = send(
            &app,
            "POST",
            "/api/users",
            Some(json!({ "name": "", "email": "a@x.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "CreateUser.Validation");
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_ids_map_to_not_found(app: Router) {
        let uri = format!("/api/users/{}", Uuid::new_v4());

        let (status, body) = send(
            &app,
            "PUT",
            &uri,
            Some(json!({ "name": "Ghost", "email": "ghost@x.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "UpdateUser.NotFound");

        let (status, body) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "DeleteUser.NotFound");
    }

    #[rstest]
    #[tokio::test]
    async fn shutdown_turns_requests_into_server_errors() {
        let user_app = UserApp::new(&DatabaseConfig::in_memory()).unwrap();
        let shutdown = CancellationToken::new();
        let app = router(AppState {
            user_app: Arc::new(user_app),
            shutdown: shutdown.clone(),
        });
        shutdown.cancel();

        let (status, body) = send(&app, "GET", "/api/users", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "GetAllUsers.Error");
    }

    #[rstest]
    #[tokio::test]
    async fn health_check_reports_healthy(app: Router) {
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}
