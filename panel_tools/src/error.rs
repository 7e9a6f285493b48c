use thiserror::Error;

#[derive(Debug, Error)]
pub enum PanelApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Panel request failed: {0}")]
    RequestError(String),
    #[error("Panel returned status {status}. {message}")]
    ResponseError { status: u16, message: String },
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
}
