use thiserror::Error;

/// Failures raised by outbound AI provider integrations. Store failures are
/// not represented here: the session layer degrades to in-memory state and
/// logs instead of surfacing them.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0} integration is disabled or unconfigured")]
    Unavailable(&'static str),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("provider request failed with status {status}: {detail}")]
    Remote { status: u16, detail: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("job did not reach a terminal state within {waited_ms} ms")]
    Timeout { waited_ms: u64 },
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
