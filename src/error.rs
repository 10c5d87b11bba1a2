use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConntrackError {
    #[error("output buffer exhausted ({capacity} bytes available)")]
    Truncated { capacity: usize },

    #[error("{what} capacity exceeded (limit {limit})")]
    CapacityExceeded { what: &'static str, limit: usize },

    #[error("unsupported address family: {0}")]
    UnsupportedFamily(&'static str),

    #[error("attribute {0} read before it was set")]
    PresenceViolation(&'static str),

    #[error("attribute {attribute} has no slot in direction {direction}")]
    InvalidAttribute {
        attribute: &'static str,
        direction: &'static str,
    },

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ConntrackError>;
