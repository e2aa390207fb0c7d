use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::models::proxy::ErrorEnvelope;

// Failures surfaced by the proxy endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum RelayError {
    MissingUrl,
    InvalidUrl,
    // Query string or body could not be read
    BadRequest(String),
    DomainNotAllowed(String),
    // Outbound request failed after every retry
    Upstream { message: String, code: String },
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::MissingUrl => write!(f, "URL parameter is required"),
            RelayError::InvalidUrl => write!(f, "Invalid URL"),
            RelayError::BadRequest(_) => write!(f, "Invalid request"),
            RelayError::DomainNotAllowed(_) => write!(f, "Domain not allowed"),
            RelayError::Upstream { .. } => write!(f, "Request failed"),
        }
    }
}

impl std::error::Error for RelayError {}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MissingUrl | RelayError::InvalidUrl | RelayError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            RelayError::DomainNotAllowed(_) => StatusCode::FORBIDDEN,
            RelayError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut envelope = ErrorEnvelope::new(&self.to_string());
        match self {
            RelayError::Upstream { message, code } => {
                envelope.details = Some(message.clone());
                envelope.code = Some(code.clone());
            }
            RelayError::BadRequest(message) => envelope.details = Some(message.clone()),
            _ => {}
        }

        HttpResponse::build(self.status_code())
            .insert_header(("Access-Control-Allow-Origin", "*"))
            .json(envelope)
    }
}
