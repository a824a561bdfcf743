use thiserror::Error;

/// Errors returned by the model-serving API client.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The model service returned an application-level error message.
    #[error("model API error: {0}")]
    ApiError(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response parsed but a value violated the endpoint contract.
    /// Out-of-range values are rejected, never clamped.
    #[error("model returned out-of-range {field}: {value}")]
    OutOfRange { field: &'static str, value: i64 },
}
