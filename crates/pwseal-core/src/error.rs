use pwseal_crypto::ContainerError;
use thiserror::Error;

pub type PwsealResult<T> = Result<T, PwsealError>;

#[derive(Debug, Error)]
pub enum PwsealError {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_error_is_transparent() {
        let err: PwsealError = ContainerError::WrongPasswordOrCorruptData.into();
        assert!(matches!(
            err,
            PwsealError::Container(ContainerError::WrongPasswordOrCorruptData)
        ));
        assert_eq!(err.to_string(), "wrong password or corrupt data");
    }

    #[test]
    fn test_io_error_conversion() {
        let err: PwsealError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(err.to_string().starts_with("I/O error"));
    }
}
