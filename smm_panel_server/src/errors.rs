use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use smm_panel_engine::{CatalogApiError, OrderFlowError};
use spg_common::Cents;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("No valid SPG-User-Id header on the request")]
    UnauthenticatedRequest,
    #[error("Insufficient balance. Required: {required}, Available: {available}")]
    InsufficientFunds { required: Cents, available: Cents },
    #[error("Service {0} is not in the catalog")]
    ServiceNotFound(String),
    #[error("The requested order (id {0}) does not exist")]
    OrderNotFound(i64),
    #[error("Order #{0} has already been sent to the panel and can only be refunded")]
    OrderAlreadySubmitted(i64),
    #[error("Order #{0} is already finalized")]
    OrderFinalized(i64),
    #[error("Order #{0} has no refundable balance left")]
    NothingToRefund(i64),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ServiceNotFound(_) => StatusCode::BAD_REQUEST,
            Self::NothingToRefund(_) => StatusCode::BAD_REQUEST,
            Self::UnauthenticatedRequest => StatusCode::UNAUTHORIZED,
            Self::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
            Self::OrderAlreadySubmitted(_) => StatusCode::FORBIDDEN,
            Self::OrderFinalized(_) => StatusCode::FORBIDDEN,
            Self::OrderNotFound(_) => StatusCode::NOT_FOUND,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::ServiceNotFound(id) => Self::ServiceNotFound(id),
            OrderFlowError::InsufficientFunds { required, available } => {
                Self::InsufficientFunds { required, available }
            },
            OrderFlowError::OrderNotFound(id) => Self::OrderNotFound(id),
            OrderFlowError::OrderFinalized(id) => Self::OrderFinalized(id),
            OrderFlowError::OrderAlreadySubmitted(id) => Self::OrderAlreadySubmitted(id),
            OrderFlowError::NothingToRefund(id) => Self::NothingToRefund(id),
            OrderFlowError::CatalogUnavailable(e) => Self::BackendError(e),
            OrderFlowError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<CatalogApiError> for ServerError {
    fn from(e: CatalogApiError) -> Self {
        Self::BackendError(e.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn order_flow_errors_map_to_the_documented_status_codes() {
        let cases: [(OrderFlowError, StatusCode); 6] = [
            (OrderFlowError::ServiceNotFound("panel:404".into()), StatusCode::BAD_REQUEST),
            (
                OrderFlowError::InsufficientFunds { required: Cents::from(250), available: Cents::from(0) },
                StatusCode::PAYMENT_REQUIRED,
            ),
            (OrderFlowError::OrderNotFound(7), StatusCode::NOT_FOUND),
            (OrderFlowError::OrderAlreadySubmitted(7), StatusCode::FORBIDDEN),
            (OrderFlowError::NothingToRefund(7), StatusCode::BAD_REQUEST),
            (OrderFlowError::DatabaseError("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, expected) in cases {
            assert_eq!(ServerError::from(error).status_code(), expected);
        }
    }

    #[test]
    fn responses_carry_json_error_bodies() {
        let response = ServerError::UnauthenticatedRequest.error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let content_type = response.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.starts_with("application/json"));
    }
}
