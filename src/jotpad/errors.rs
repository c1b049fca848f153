use std::fmt;
use std::convert::From;
use std::error::Error as StdError;
use std::io::Error as IoError;
use std::string::FromUtf8Error;

pub type Result<T> = ::std::result::Result<T, Error>;

#[derive(Debug)]
pub enum ErrorKind {
    Io(IoError),
    Json,
    Yaml,
    Crypt,
    Generic,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub desc: String,
    pub detail: Option<String>,
}

impl Error {
    pub fn crypt(desc: &str) -> Error {
        Error {
            kind: ErrorKind::Crypt,
            desc: desc.to_string(),
            detail: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.detail {
            Some(ref d) => write!(f, "{} ({})", &self.desc, d),
            None => write!(f, "{}", &self.desc),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self.kind {
            ErrorKind::Io(ref e) => Some(e),
            _ => None,
        }
    }
}

#[macro_export]
macro_rules! specific_fail {
    ($short:expr) => {{
        use $crate::errors::{Error, ErrorKind};
        Err(::std::convert::From::from(
            Error {
                kind: ErrorKind::Generic,
                desc: $short,
                detail: None
            }
        ))
    }}
}

#[macro_export]
macro_rules! specific_fail_str {
    ($s:expr) => {
        $crate::specific_fail!($s.to_string())
    }
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Error {
        Error {
            desc: err.to_string(),
            kind: ErrorKind::Io(err),
            detail: None,
        }
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Error {
        Error::from(err.error)
    }
}

impl From<FromUtf8Error> for Error {
    fn from(err: FromUtf8Error) -> Error {
        Error {
            kind: ErrorKind::Generic,
            desc: format!("UTF-8 error: {}", err),
            detail: None,
        }
    }
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Error {
        Error {
            kind: ErrorKind::Generic,
            desc: "formatting error".to_string(),
            detail: None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error {
            kind: ErrorKind::Json,
            desc: "invalid note data".to_string(),
            detail: Some(err.to_string()),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Error {
        Error {
            kind: ErrorKind::Yaml,
            desc: format!("YAML error: {}", err),
            detail: None,
        }
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Error {
        Error {
            kind: ErrorKind::Crypt,
            desc: "stored value is not valid base64".to_string(),
            detail: Some(err.to_string()),
        }
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Error {
        Error {
            kind: ErrorKind::Generic,
            desc: format!("regex error: {}.", err),
            detail: None,
        }
    }
}

impl From<String> for Error {
    fn from(err: String) -> Error {
        Error {
            kind: ErrorKind::Generic,
            desc: err,
            detail: None,
        }
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Error {
        Error {
            kind: ErrorKind::Generic,
            desc: err.to_string(),
            detail: None,
        }
    }
}
