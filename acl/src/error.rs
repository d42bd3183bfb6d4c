use crate::dal::DalError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Forbidden.")]
    Forbidden,
    #[error("Missing argument: {0}.")]
    MissingArgument(&'static str),
    #[error("Invalid {kind} `{value}`: must be 1 to {max} characters long.")]
    InvalidName {
        kind: &'static str,
        value: String,
        max: usize,
    },
    #[error("Unknown access policy `{0}`.")]
    UnknownPolicy(String),
    #[error("ACL schema not installed.")]
    SchemaNotInstalled,
    #[error("ACL schema version {0} is already installed.")]
    SchemaAlreadyInstalled(String),
    #[error("ACL schema version {expected} expected, {found} found instead.")]
    SchemaVersionMismatch { expected: u32, found: String },
    #[error(
        "Upgrade is only possible from schema version 1, but found installed version {0}."
    )]
    UnsupportedUpgrade(String),
    #[error("Unsupported database connection URI. Expected `mysql:` or `sqlite:`.")]
    UnsupportedDatabase,
    #[error(transparent)]
    Dal(#[from] DalError),
}
