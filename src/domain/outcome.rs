/// Result of a single processor invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    RetryableFailure(String),
    FinalFailure(String),
}

impl Outcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Outcome::Success(message.into())
    }

    pub fn retryable(message: impl Into<String>) -> Self {
        Outcome::RetryableFailure(message.into())
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Outcome::FinalFailure(message.into())
    }

    pub fn message(&self) -> &str {
        match self {
            Outcome::Success(m) | Outcome::RetryableFailure(m) | Outcome::FinalFailure(m) => m,
        }
    }
}
