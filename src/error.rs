use std::fmt;

#[derive(Debug)]
pub enum Error {
    // host environment is broken, the caller decides whether to exit
    Fatal(String),
    NotFound,
    NoInterface,
    Command {
        step: &'static str,
        reason: String,
        output: String,
    },
    InvalidInput(String),
    Store(anyhow::Error),
    Ping,
    PingUnreadable,
}

impl Error {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Fatal(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Fatal(msg) => write!(f, "{}", msg),
            Error::NotFound => write!(f, "DNS name not found"),
            Error::NoInterface => write!(f, "No suitable network interface found"),
            Error::Command {
                step,
                reason,
                output,
            } => write!(f, "{} DNS error: {}\n{}", step, reason, output),
            Error::InvalidInput(msg) => write!(f, "{}", msg),
            Error::Store(err) => write!(f, "{:#}", err),
            Error::Ping => write!(f, "Ping error"),
            Error::PingUnreadable => write!(f, "Could not read ping"),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Store(err)
    }
}
