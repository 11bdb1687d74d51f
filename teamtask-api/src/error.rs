/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>`; domain errors convert through
/// `From<DomainError>` so handlers can use `?` on service calls.
///
/// # Example
///
/// ```ignore
/// use teamtask_api::error::ApiResult;
///
/// async fn handler(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<TaskDetails>> {
///     Ok(Json(state.tasks.get_task(id).await?))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use teamtask_shared::auth::jwt::JwtError;
use teamtask_shared::services::DomainError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409), e.g. duplicate username
    Conflict(String),

    /// Request body failed field validation (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Unusable AI output (422)
    UnprocessableEntity(String),

    /// Internal server error (500)
    InternalError(String),

    /// Upstream AI call failed (502)
    BadGateway(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::ValidationError(_) => "validation_error",
            ApiError::UnprocessableEntity(_) => "unprocessable_entity",
            ApiError::InternalError(_) => "internal_error",
            ApiError::BadGateway(_) => "bad_gateway",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::UnprocessableEntity(msg) => write!(f, "Unprocessable: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::BadGateway(msg) => write!(f, "Bad gateway: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.code().to_string();

        let (message, details) = match self {
            ApiError::ValidationError(errors) => ("Request validation failed".to_string(), Some(errors)),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                ("An internal error occurred".to_string(), None)
            }
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::UnprocessableEntity(msg)
            | ApiError::BadGateway(msg)
            | ApiError::ServiceUnavailable(msg) => (msg, None),
        };

        let body = Json(ErrorResponse { error, message, details });

        (status, body).into_response()
    }
}

/// Renders an error with its whole source chain
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

/// Convert domain errors to API errors
impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();

        match err {
            DomainError::TitleRequired
            | DomainError::TitleEmpty
            | DomainError::InvalidOrganizationName
            | DomainError::NoUserIdsProvided
            | DomainError::InvalidTaskAssignee
            | DomainError::InvalidInviteCode
            | DomainError::CannotRemoveYourself
            | DomainError::UsernameRequired
            | DomainError::PasswordTooShort { .. } => ApiError::BadRequest(message),

            DomainError::InvalidCredentials => ApiError::Unauthorized(message),

            DomainError::NotOrganizationMember
            | DomainError::NotOrganizationOwner
            | DomainError::NotTaskCreator
            | DomainError::TaskPermissionDenied => ApiError::Forbidden(message),

            DomainError::OrganizationNotFound
            | DomainError::TaskNotFound
            | DomainError::OrganizationMemberNotFound
            | DomainError::UserNotFound => ApiError::NotFound(message),

            DomainError::UsernameTaken | DomainError::AlreadyOrganizationMember => ApiError::Conflict(message),

            DomainError::AiServiceNotConfigured => ApiError::ServiceUnavailable(message),

            DomainError::AiNoTasksGenerated
            | DomainError::TooManyGeneratedTasks { .. }
            | DomainError::AiNoValidTasks => ApiError::UnprocessableEntity(message),

            DomainError::Extraction(ref source) => {
                tracing::warn!(error = %error_chain(source), "AI extraction failed");
                ApiError::BadGateway(message)
            }

            DomainError::InviteCodeGenerationFailed(_) | DomainError::Storage { .. } | DomainError::Password(_) => {
                ApiError::InternalError(error_chain(&err))
            }
        }
    }
}

/// Convert request validation failures to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer { .. } => ApiError::Unauthorized("Invalid token issuer".to_string()),
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teamtask_shared::ai::ExtractorError;
    use teamtask_shared::store::StoreError;
    use validator::Validate;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Task not found".to_string());
        assert_eq!(err.to_string(), "Not found: Task not found");
    }

    #[test]
    fn test_domain_status_mapping() {
        let cases = [
            (DomainError::TitleEmpty, StatusCode::BAD_REQUEST),
            (DomainError::InvalidTaskAssignee, StatusCode::BAD_REQUEST),
            (DomainError::PasswordTooShort { min: 8 }, StatusCode::BAD_REQUEST),
            (DomainError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (DomainError::NotTaskCreator, StatusCode::FORBIDDEN),
            (DomainError::TaskPermissionDenied, StatusCode::FORBIDDEN),
            (DomainError::NotOrganizationOwner, StatusCode::FORBIDDEN),
            (DomainError::TaskNotFound, StatusCode::NOT_FOUND),
            (DomainError::OrganizationMemberNotFound, StatusCode::NOT_FOUND),
            (DomainError::UsernameTaken, StatusCode::CONFLICT),
            (DomainError::AlreadyOrganizationMember, StatusCode::CONFLICT),
            (DomainError::AiServiceNotConfigured, StatusCode::SERVICE_UNAVAILABLE),
            (DomainError::AiNoValidTasks, StatusCode::UNPROCESSABLE_ENTITY),
            (
                DomainError::TooManyGeneratedTasks { max: 20, actual: 21 },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                DomainError::Extraction(ExtractorError::Timeout(30)),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (domain, expected) in cases {
            let label = domain.to_string();
            assert_eq!(ApiError::from(domain).status(), expected, "{}", label);
        }
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err = DomainError::Storage {
            operation: "fetch task",
            source: StoreError::Unavailable("lock poisoned".to_string()),
        };
        let api = ApiError::from(err);

        match &api {
            ApiError::InternalError(detail) => assert!(detail.contains("lock poisoned")),
            other => panic!("unexpected mapping: {other:?}"),
        }
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validator_details() {
        #[derive(Validate)]
        struct Body {
            #[validate(length(min = 1, message = "Title is required"))]
            title: String,
        }

        let errors = Body { title: String::new() }.validate().unwrap_err();
        match ApiError::from(errors) {
            ApiError::ValidationError(details) => {
                assert_eq!(details.len(), 1);
                assert_eq!(details[0].field, "title");
                assert_eq!(details[0].message, "Title is required");
            }
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[test]
    fn test_jwt_errors_are_unauthorized() {
        assert_eq!(ApiError::from(JwtError::Expired).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(JwtError::ValidationError("bad signature".to_string())).status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
