/// Errors produced while minting, parsing or verifying stamps.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    Argument(String),
    #[error("malformed stamp: {0}")]
    Format(String),
    #[error("incorrect stamp version {0}")]
    Version(u32),
    #[error("stamp is not valid for the given resource(s)")]
    ResourceMismatch,
    #[error("stamp is expired or not yet valid")]
    Expired,
    #[error("not enough zero bits in stamp, {required} required")]
    InsufficientWork { required: u32 },
    #[error("no stamp found within {attempts} attempts")]
    WorkNotFound { attempts: u64 },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the caller can recover by presenting a freshly minted stamp.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Expired | Error::InsufficientWork { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failure() {
        assert_eq!(Error::Version(2).to_string(), "incorrect stamp version 2");
        assert_eq!(
            Error::InsufficientWork { required: 32 }.to_string(),
            "not enough zero bits in stamp, 32 required"
        );
    }

    #[test]
    fn only_time_and_work_failures_are_retryable() {
        assert!(Error::Expired.is_retryable());
        assert!(Error::InsufficientWork { required: 20 }.is_retryable());
        assert!(!Error::ResourceMismatch.is_retryable());
        assert!(!Error::Format("x".into()).is_retryable());
    }
}
