use thiserror::Error;

/// Failure taxonomy of the orchestration layer.
///
/// `Storage` never crosses the cache boundary: reads degrade to a miss and
/// writes to a no-op, so callers only ever observe the other variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuraError {
    /// Malformed input. A caller bug, never retried.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Transport or HTTP failure talking to the backend.
    #[error("backend unavailable: {0}")]
    RemoteUnavailable(String),

    /// The backend reported a terminal failure for a synthesis job.
    #[error("try-on job failed: {0}")]
    JobFailed(String),

    /// The poll attempt budget ran out without a terminal status.
    #[error("try-on job still pending after {attempts} poll attempts")]
    JobTimeout { attempts: u32 },

    /// Key-value store fault. Absorbed at the cache boundary.
    #[error("storage fault: {0}")]
    Storage(String),

    /// The caller abandoned a poll via its cancel flag.
    #[error("try-on poll cancelled")]
    Cancelled,
}

impl AuraError {
    pub fn is_remote_unavailable(&self) -> bool {
        matches!(self, AuraError::RemoteUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::AuraError;

    #[test]
    fn messages_are_human_readable() {
        let err = AuraError::JobTimeout { attempts: 30 };
        assert_eq!(
            err.to_string(),
            "try-on job still pending after 30 poll attempts"
        );
        let err = AuraError::RemoteUnavailable("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
        assert!(err.is_remote_unavailable());
    }
}
