use axum::body::Body;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;

use crate::server::api;

pub struct HttpResponse {
    pub status_code: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    fn json(body: String) -> Self {
        Self {
            status_code: 200,
            content_type: "application/json",
            body,
        }
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, self.content_type)], Body::from(self.body)).into_response()
    }
}

/// All routes go through one dispatcher so they can be exercised without a listener.
pub fn router() -> Router {
    Router::new().fallback(dispatch)
}

async fn dispatch(method: Method, uri: Uri, body: String) -> HttpResponse {
    log::debug!("{method} {}", uri.path());
    route_request(method.as_str(), uri.path(), &body)
}

pub fn route_request(method: &str, path: &str, body: &str) -> HttpResponse {
    match (method, path) {
        ("GET", "/api/health") => match api::health_payload() {
            Ok(payload) => HttpResponse::json(payload),
            Err(err) => error_response(500, &err.to_string()),
        },
        ("GET", "/api/catalog") => api_result(api::catalog_payload()),
        ("POST", "/api/optimize/player") => api_result(api::optimize_player_payload(body)),
        ("POST", "/api/optimize/team") => api_result(api::optimize_team_payload(body)),
        ("POST", "/api/patterns") => api_result(api::patterns_payload(body)),
        ("POST", "/api/patterns/balanced") => api_result(api::balanced_patterns_payload(body)),
        ("POST", "/api/priority") => api_result(api::priority_payload(body)),
        ("POST", "/api/overview") => api_result(api::overview_payload(body)),
        _ => error_response(404, "Route not found"),
    }
}

fn api_result(result: Result<String, api::ApiError>) -> HttpResponse {
    match result {
        Ok(payload) => HttpResponse::json(payload),
        Err(api::ApiError::Parse(err)) => error_response(400, &format!("Invalid request body: {err}")),
        Err(api::ApiError::Validation(validation)) => validation_error_response(validation),
        Err(err @ (api::ApiError::Catalog(_) | api::ApiError::Encode(_))) => {
            log::warn!("{err}");
            error_response(500, &err.to_string())
        }
    }
}

fn validation_error_response(payload: api::ValidationErrorResponse) -> HttpResponse {
    let fallback = "{\n  \"status\": \"error\",\n  \"message\": \"Validation failed\"\n}".to_string();
    HttpResponse {
        status_code: 400,
        content_type: "application/json",
        body: serde_json::to_string_pretty(&payload).unwrap_or(fallback),
    }
}

fn error_response(status_code: u16, message: &str) -> HttpResponse {
    HttpResponse {
        status_code,
        content_type: "application/json",
        body: format!(
            "{{\n  \"status\": \"error\",\n  \"message\": {}\n}}",
            serde_json::to_string(message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
        ),
    }
}
