use std::fmt;
use thiserror::Error;

/// The four steps of a publish transaction, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStep {
    ResolveBase,
    CreateBranch,
    WriteFile,
    OpenMergeRequest,
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublishStep::ResolveBase => "resolve base",
            PublishStep::CreateBranch => "create branch",
            PublishStep::WriteFile => "write file",
            PublishStep::OpenMergeRequest => "open merge request",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("{step}: unexpected HTTP status {status}")]
    Status {
        step: PublishStep,
        status: reqwest::StatusCode,
    },
    #[error("{step}: response has no `{field}`")]
    MissingField {
        step: PublishStep,
        field: &'static str,
    },
    #[error("{step}: {source}")]
    Transport {
        step: PublishStep,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to serialize comment: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl PublishError {
    /// The step that failed, if the transaction got as far as the network.
    pub fn step(&self) -> Option<PublishStep> {
        match self {
            PublishError::Status { step, .. }
            | PublishError::MissingField { step, .. }
            | PublishError::Transport { step, .. } => Some(*step),
            PublishError::Serialize(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SpamCheckError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("unexpected response body: {0:?}")]
    UnexpectedBody(String),
}

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("missing or empty setting: {0}")]
    Missing(&'static str),
    #[error("invalid private key: {0}")]
    InvalidKey(String),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
