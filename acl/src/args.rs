use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;

use crate::model::{AccessType, ObjectClass, ObjectId, UserId};

#[derive(Parser, Debug)]
#[command(name = "acl", version, about = "ACL operations")]
pub struct Args {
    /// Database holding the ACL tables, as a `mysql://` or `sqlite://` URI
    #[arg(long, env = "ACL_DATABASE_URL", hide_env_values = true)]
    pub db_connection_uri: String,

    /// One of "trace", "debug", "info", "warn" and "error"
    #[arg(short, long, global = true, default_value = "warn")]
    pub log_level: Level,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Full)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Install ACL database schema
    InstallSchema,
    /// Upgrade ACL database schema
    UpgradeSchema,
    /// Get currently installed ACL database schema version
    GetSchemaVersion,
    /// Grant access to an object to a user
    Grant(RuleArgs),
    /// Revoke a user's access to an object
    Revoke(RuleArgs),
    /// Add an access controlled object
    AddAccessCtlObject(ObjectArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct RuleArgs {
    pub object_class: ObjectClass,
    pub object_id: ObjectId,
    pub grantee_id: UserId,
    pub access_type: AccessType,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ObjectArgs {
    pub object_class: ObjectClass,
    pub object_id: ObjectId,
    pub owner_id: UserId,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable lines with timestamps and targets
    Full,
    /// Shorter human readable lines
    Compact,
    /// One JSON object per event
    Json,
}
