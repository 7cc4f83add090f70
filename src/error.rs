use rocket::http::Status;
use rocket::response::{self, Responder, Response};
use rocket::serde::json::Json;
use rocket::Request;

/// Stable error taxonomy for the HTTP boundary. Every route returns
/// `Result<T, ApiError>`; this is the one place status codes and body shape
/// are decided.
#[derive(Debug, Clone)]
pub enum ApiError {
    Validation(String),
    Unauthenticated(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    RateLimited { message: String, retry_after_secs: u64 },
    TooEarly(String),
    DependencyUnavailable(String),
    Internal(String),
}

impl ApiError {
    fn tag(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::RateLimited { .. } => "rate_limited",
            ApiError::TooEarly(_) => "too_early",
            ApiError::DependencyUnavailable(_) => "dependency_unavailable",
            ApiError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> Status {
        match self {
            ApiError::Validation(_) => Status::BadRequest,
            ApiError::Unauthenticated(_) => Status::Unauthorized,
            ApiError::Forbidden(_) => Status::Forbidden,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::Conflict(_) => Status::Conflict,
            ApiError::RateLimited { .. } => Status::TooManyRequests,
            ApiError::TooEarly(_) => Status::BadRequest,
            ApiError::DependencyUnavailable(_) => Status::ServiceUnavailable,
            ApiError::Internal(_) => Status::InternalServerError,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::Validation(m)
            | ApiError::Unauthenticated(m)
            | ApiError::Forbidden(m)
            | ApiError::NotFound(m)
            | ApiError::Conflict(m)
            | ApiError::TooEarly(m)
            | ApiError::DependencyUnavailable(m)
            | ApiError::Internal(m) => m,
            ApiError::RateLimited { message, .. } => message,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        log::warn!(target: "api_error", "{} ({}): {}", self.tag(), self.status().code, self.message());

        let mut body = serde_json::json!({
            "error": self.tag(),
            "message": self.message(),
        });
        let status = self.status();
        if let ApiError::RateLimited { retry_after_secs, .. } = &self {
            body["retry_after_secs"] = serde_json::json!(retry_after_secs);
        }

        let mut response = Response::build_from(Json(body).respond_to(req)?)
            .status(status)
            .finalize();

        if let ApiError::RateLimited { retry_after_secs, .. } = &self {
            response.set_header(rocket::http::Header::new(
                "Retry-After",
                retry_after_secs.to_string(),
            ));
        }

        Ok(response)
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(e: rusqlite::Error) -> Self {
        ApiError::Internal(e.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
