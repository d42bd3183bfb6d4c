use std::fmt;

use async_trait::async_trait;
use tracing::error;

use crate::model::{AccessCtlObjectId, AccessType, ObjectClass, ObjectId, UserId};

mod mysql;
mod sqlite;

pub use mysql::MySql;
pub use sqlite::Sqlite;

#[derive(thiserror::Error, Debug)]
pub enum DalError {
    Sqlx(#[from] sqlx::Error),
    ObjectNotFound,
    ObjectExists,
    IdOutOfRange(i64),
}

// Driver errors can leak SQL or connection details, so they only go to the log and the
// caller gets a fixed message.
impl fmt::Display for DalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            DalError::Sqlx(error) => {
                error!(error = error.to_string(), "database request failed");

                "failed to interact with ACL database"
            }
            DalError::ObjectNotFound => "object not found",
            DalError::ObjectExists => "object already has access control",
            DalError::IdOutOfRange(id) => {
                error!(id, "generated id does not fit the id column");

                "access control object id out of range"
            }
        };

        write!(f, "{msg}")
    }
}

// Both backends take positional `?` parameters, so the data queries are shared.
const GET_VERSION: &str = "SELECT value FROM aclMetadata WHERE attribute = 'version'";

const FIND_RULE: &str = r#"
    SELECT accessCtlObjectId
    FROM accessControlObjects, accessControlRules
    WHERE
        objectClass = ? AND
        objectId = ? AND
        accessControlObjects.id = accessCtlObjectId AND
        granteeId = ? AND accessType = ?
"#;

const FIND_OWNERSHIP: &str = r#"
    SELECT accessCtlObjectId
    FROM accessControlObjects, accessControlOwners
    WHERE
        objectClass = ? AND
        objectId = ? AND
        accessControlObjects.id = accessCtlObjectId AND
        ownerId = ?
"#;

const GET_OBJECT: &str =
    "SELECT id FROM accessControlObjects WHERE objectClass = ? AND objectId = ?";

const INSERT_OBJECT: &str =
    "INSERT INTO accessControlObjects (objectClass, objectId) VALUES (?, ?)";

const INSERT_OWNER: &str =
    "INSERT INTO accessControlOwners (accessCtlObjectId, ownerId) VALUES (?, ?)";

const INSERT_RULE: &str =
    "INSERT INTO accessControlRules (accessCtlObjectId, granteeId, accessType) VALUES (?, ?, ?)";

const DELETE_RULE: &str = r#"
    DELETE FROM accessControlRules
    WHERE
        accessCtlObjectId = ? AND
        granteeId = ? AND
        accessType = ?
"#;

/// Unique violations are the only integrity errors callers expect to see.
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(error) if error.is_unique_violation())
}

#[async_trait]
pub trait Dal: Send + Sync {
    /// Get the installed schema version, if any schema is installed
    async fn schema_version(&self) -> Result<Option<String>, DalError>;

    /// Create all ACL tables and record the schema version.
    ///
    /// MySQL commits every DDL statement on its own, so a failed install can leave some
    /// tables behind without a version row. Installing again picks up from there.
    async fn install_schema(&self) -> Result<(), DalError>;

    /// Migrate a version 1 schema to version 2. Like [Dal::install_schema], this can be
    /// retried after a partial failure.
    async fn upgrade_schema_from_v1(&self) -> Result<(), DalError>;

    /// Find the object a grantee holds `access_type` on
    async fn find_rule(
        &self,
        object_class: &ObjectClass,
        object_id: ObjectId,
        grantee_id: UserId,
        access_type: &AccessType,
    ) -> Result<Option<AccessCtlObjectId>, DalError>;

    /// Find the object if it is owned by `owner_id`
    async fn find_ownership(
        &self,
        object_class: &ObjectClass,
        object_id: ObjectId,
        owner_id: UserId,
    ) -> Result<Option<AccessCtlObjectId>, DalError>;

    /// Get the access control object for an application object
    async fn get_access_ctl_object(
        &self,
        object_class: &ObjectClass,
        object_id: ObjectId,
    ) -> Result<AccessCtlObjectId, DalError>;

    /// Grant `access_type` on an object. Granting an existing rule is a no-op.
    async fn grant(
        &self,
        object_class: &ObjectClass,
        object_id: ObjectId,
        grantee_id: UserId,
        access_type: &AccessType,
    ) -> Result<(), DalError>;

    /// Revoke `access_type` on an object. Revoking a missing rule is a no-op.
    async fn revoke(
        &self,
        object_class: &ObjectClass,
        object_id: ObjectId,
        grantee_id: UserId,
        access_type: &AccessType,
    ) -> Result<(), DalError>;

    /// Put an object under access control, owned by `owner_id` who gets read and edit access
    async fn add_access_ctl_object(
        &self,
        object_class: &ObjectClass,
        object_id: ObjectId,
        owner_id: UserId,
    ) -> Result<AccessCtlObjectId, DalError>;
}
