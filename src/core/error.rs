use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Unexpected cost explorer result: {detail}")]
    MalformedResponse { detail: String },
    #[error("Failed to send message {text} to group {chat_id}. {payload}")]
    DeliveryFailed {
        text: String,
        chat_id: String,
        payload: String,
    },
}

impl ReportError {
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            detail: detail.into(),
        }
    }
}
