pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    WrongPassword,
    CryptoError,
    CipherError,
    ParseError,
    InvalidFormat(String),
    NotFound(String),
    FileNotFound(String),
    IoError(std::io::Error),
    SqliteError(rusqlite::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::WrongPassword => write!(f, "Incorrect password"),
            Error::CryptoError => write!(f, "Key unwrap failed"),
            Error::CipherError => write!(f, "Cipher error"),
            Error::ParseError => write!(f, "Parse error"),
            Error::InvalidFormat(ref msg) => write!(f, "Invalid format: {msg}"),
            Error::NotFound(ref msg) => write!(f, "{msg}"),
            Error::FileNotFound(ref path) => write!(f, "Not found in backup: {path}"),
            Error::IoError(ref err) => write!(f, "{err}"),
            Error::SqliteError(ref err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::IoError(ref err) => Some(err),
            Error::SqliteError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl std::convert::From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Error {
        Error::IoError(error)
    }
}

impl std::convert::From<plist::Error> for Error {
    fn from(_error: plist::Error) -> Error {
        Error::ParseError
    }
}

impl std::convert::From<rusqlite::Error> for Error {
    fn from(error: rusqlite::Error) -> Error {
        Error::SqliteError(error)
    }
}

impl std::convert::From<aes::cipher::InvalidLength> for Error {
    fn from(_error: aes::cipher::InvalidLength) -> Error {
        Error::CipherError
    }
}

impl std::convert::From<aes::cipher::block_padding::UnpadError> for Error {
    fn from(_: aes::cipher::block_padding::UnpadError) -> Self {
        Error::CipherError
    }
}

impl std::convert::From<aes_kw::Error> for Error {
    fn from(error: aes_kw::Error) -> Error {
        match error {
            aes_kw::Error::IntegrityCheckFailed => Error::WrongPassword,
            _ => Error::CryptoError,
        }
    }
}
