//! API error handling
//!
//! Every failure of the A2A endpoint is reported as a JSON-RPC error object.
//! Internal details are replaced with a generic message unless exposure is
//! switched on.

use std::sync::atomic::{AtomicBool, Ordering};

use application::ApplicationError;
use protocol_a2a::JsonRpcError;
use thiserror::Error;

static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(false);

const GENERIC_INTERNAL_MESSAGE: &str = "An error occurred processing your request";

/// Configure whether internal error details appear in responses
pub fn set_expose_internal_errors(expose: bool) {
    EXPOSE_INTERNAL_ERRORS.store(expose, Ordering::SeqCst);
}

fn should_expose_details() -> bool {
    EXPOSE_INTERNAL_ERRORS.load(Ordering::SeqCst)
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Task cannot be canceled: {0}")]
    TaskNotCancelable(String),

    #[error("Push notifications are not supported")]
    PushNotSupported,

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// None of the requested output modes is offered by the agent
    #[error("Incompatible content types: {0}")]
    ContentTypeNotSupported(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// The JSON-RPC error object sent to the client
    pub fn to_rpc_error(&self) -> JsonRpcError {
        match self {
            Self::Parse(detail) => JsonRpcError::parse_error(format!("Invalid JSON payload: {detail}")),
            Self::InvalidRequest(detail) => JsonRpcError::invalid_request(detail.clone()),
            Self::MethodNotFound(method) => JsonRpcError::method_not_found(method),
            Self::InvalidParams(detail) => JsonRpcError::invalid_params(detail.clone()),
            Self::TaskNotFound(id) => JsonRpcError::task_not_found(id),
            Self::TaskNotCancelable(id) => JsonRpcError::task_not_cancelable(id),
            Self::PushNotSupported => JsonRpcError::push_notifications_not_supported(),
            Self::Unsupported(detail) => JsonRpcError::unsupported_operation(detail.clone()),
            Self::ContentTypeNotSupported(detail) => {
                JsonRpcError::content_type_not_supported(format!("Incompatible content types: {detail}"))
            },
            Self::Internal(detail) => {
                if should_expose_details() {
                    JsonRpcError::internal(detail.clone())
                } else {
                    JsonRpcError::internal(GENERIC_INTERNAL_MESSAGE)
                }
            },
        }
    }
}

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        match err {
            ApplicationError::TaskNotFound(id) => Self::TaskNotFound(id),
            ApplicationError::TaskNotCancelable(id) => Self::TaskNotCancelable(id),
            ApplicationError::InvalidParams(detail) => Self::InvalidParams(detail),
            ApplicationError::UnsupportedOperation(detail) => Self::Unsupported(detail),
            ApplicationError::Domain(_) | ApplicationError::LocationNotFound(_) => {
                Self::InvalidParams(err.to_string())
            },
            ApplicationError::Inference(_)
            | ApplicationError::ExternalService(_)
            | ApplicationError::RateLimited
            | ApplicationError::Configuration(_)
            | ApplicationError::Internal(_) => Self::Internal(err.to_string()),
        }
    }
}
