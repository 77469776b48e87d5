use thiserror::Error;

/// Reasons a webhook delivery is rejected before any event handling
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),
    #[error("webhook signing secret is empty or not valid base64")]
    InvalidSecret,
    #[error("invalid signature timestamp")]
    InvalidTimestamp,
    #[error("message timestamp too old")]
    TimestampTooOld,
    #[error("message timestamp too new")]
    TimestampTooNew,
    #[error("no matching signature found")]
    NoMatchingSignature,
    #[error("verified payload is not a valid event: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("dynamodb request failed: {0}")]
    Dynamo(#[from] aws_sdk_dynamodb::Error),
    #[error("stored user {0} is missing attribute {1}")]
    MalformedItem(String, &'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} is not a valid number: {1}")]
    InvalidNumber(&'static str, String),
    #[error("{0} must not be negative, got {1}")]
    Negative(&'static str, i64),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("user event data is malformed: {0}")]
    InvalidUserData(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}
