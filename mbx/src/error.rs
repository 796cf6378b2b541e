use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    BackupError(mobilesync::error::Error),
    IoError(std::io::Error),
    InputError(String),
    MaxAttemptsReached,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackupError(err) => write!(f, "{}", err),
            Error::IoError(err) => write!(f, "IO error: {}", err),
            Error::InputError(msg) => write!(f, "Input error: {}", msg),
            Error::MaxAttemptsReached => write!(f, "Maximum attempts reached. Exiting."),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::BackupError(err) => Some(err),
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl std::convert::From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Error {
        Error::IoError(error)
    }
}

impl std::convert::From<mobilesync::error::Error> for Error {
    fn from(error: mobilesync::error::Error) -> Error {
        Error::BackupError(error)
    }
}
