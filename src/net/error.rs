use std::fmt::Display;
use std::error::Error as StdError;

pub type Result<T> = std::result::Result<T, Error>;

type Source = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The connection could not be set up.
    Initialize,
    /// The transport reported an unrecoverable error.
    Transport,
    /// The connection or the dispatcher on the other end is gone.
    Closed,
    /// An event was raised out of order.
    Contract,
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            ErrorKind::Initialize => "initialize",
            ErrorKind::Transport => "transport",
            ErrorKind::Closed => "closed",
            ErrorKind::Contract => "contract",
            ErrorKind::Other => "other",
        };

        write!(f, "{}", kind)
    }
}

/// Failure descriptor handed to `ConnectionDelegate::connect_fatal`.
#[derive(Debug, thiserror::Error)]
#[error("Error: {{ {kind}: {message} }}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<Source>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), source: None }
    }

    pub fn with_source<E>(kind: ErrorKind, message: impl Into<String>, source: E) -> Self
    where
        E: Into<Source>,
    {
        Self { kind, message: message.into(), source: Some(source.into()) }
    }

    pub fn initialize(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Initialize, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn closed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Closed, message)
    }

    pub fn contract(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Contract, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for Error {
    fn from(value: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Error::closed(value.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::TrySendError<T>> for Error {
    fn from(value: tokio::sync::mpsc::error::TrySendError<T>) -> Self {
        Error::closed(value.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        let message = value.to_string();
        Error::with_source(ErrorKind::Transport, message, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use tokio::sync::mpsc;

    #[test]
    fn io_error_keeps_source() {
        let err: Error = io::Error::new(io::ErrorKind::ConnectionReset, "reset").into();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.message(), "reset");
        assert!(err.source().is_some());
    }

    #[test]
    fn send_error_maps_to_closed() {
        let (tx, rx) = mpsc::channel::<u8>(1);
        drop(rx);
        let err: Error = tx.try_send(1).unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Closed);
        assert!(err.source().is_none());
    }

    #[test]
    fn display_names_kind_and_message() {
        let err = Error::initialize("socket setup failed");
        assert_eq!(err.to_string(), "Error: { initialize: socket setup failed }");
    }
}
