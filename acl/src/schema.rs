//! ACL database schema: table definitions per backend and the version checks
//! run before the plugin starts or the schema is changed.

use tracing::{info, warn};

use crate::{dal::Dal, Error};

/// Schema version this crate reads and writes.
pub const VERSION: u32 = 2;

/// Table holding schema metadata such as the installed version.
pub const METADATA_TABLE: &str = "aclMetadata";

// Every statement commits on its own, so install and upgrade must cope with a partial earlier run.
pub(crate) mod mysql {
    pub const INSTALL: &[&str] = &[
        r#"
        CREATE TABLE IF NOT EXISTS accessControlObjects(
            id INT PRIMARY KEY AUTO_INCREMENT,
            objectClass VARCHAR(30) CHARACTER SET utf8 NOT NULL,
            objectId INT NOT NULL,
            UNIQUE(objectClass, objectId)
        ) ENGINE=INNODB
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS accessControlOwners(
            accessCtlObjectId INT NOT NULL,
            ownerId INT NOT NULL,
            UNIQUE (accessCtlObjectId, ownerId),
            FOREIGN KEY (ownerId) REFERENCES users(id)
                ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY (accessCtlObjectId) REFERENCES accessControlObjects(id)
                ON UPDATE CASCADE ON DELETE CASCADE
        ) ENGINE=INNODB
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS accessControlRules(
            id INT PRIMARY KEY AUTO_INCREMENT,
            accessCtlObjectId INT NOT NULL,
            granteeId INT NOT NULL,
            accessType VARCHAR(30) CHARACTER SET utf8 NOT NULL,
            UNIQUE(accessCtlObjectId, granteeId, accessType),
            FOREIGN KEY (accessCtlObjectId) REFERENCES accessControlObjects(id)
                ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY (granteeId) REFERENCES users(id)
                ON UPDATE CASCADE ON DELETE CASCADE
        ) ENGINE=INNODB
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS aclMetadata(
            attribute VARCHAR(100) CHARACTER SET utf8 UNIQUE NOT NULL,
            value VARCHAR(200) CHARACTER SET utf8 NOT NULL
        ) ENGINE=INNODB
        "#,
        "INSERT INTO aclMetadata VALUES ('version', '2')",
    ];

    /// Name of the constraint added by the v1 to v2 upgrade.
    pub const UNIQUE_OBJECT_INDEX: &str = "uniqueObjClsId";

    pub const ADD_UNIQUE_OBJECT: &str =
        "ALTER TABLE accessControlObjects ADD CONSTRAINT uniqueObjClsId UNIQUE (objectId, objectClass)";

    pub const SET_VERSION_2: &str = "UPDATE aclMetadata SET value = '2' WHERE attribute = 'version'";
}

pub(crate) mod sqlite {
    pub const INSTALL: &[&str] = &[
        r#"
        CREATE TABLE accessControlObjects(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            objectClass VARCHAR(30) NOT NULL,
            objectId INTEGER NOT NULL,
            UNIQUE(objectClass, objectId)
        )
        "#,
        r#"
        CREATE TABLE accessControlOwners(
            accessCtlObjectId INTEGER NOT NULL,
            ownerId INTEGER NOT NULL,
            UNIQUE (accessCtlObjectId, ownerId),
            FOREIGN KEY (ownerId) REFERENCES users(id)
                ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY (accessCtlObjectId) REFERENCES accessControlObjects(id)
                ON UPDATE CASCADE ON DELETE CASCADE
        )
        "#,
        r#"
        CREATE TABLE accessControlRules(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            accessCtlObjectId INTEGER NOT NULL,
            granteeId INTEGER NOT NULL,
            accessType VARCHAR(30) NOT NULL,
            UNIQUE(accessCtlObjectId, granteeId, accessType),
            FOREIGN KEY (accessCtlObjectId) REFERENCES accessControlObjects(id)
                ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY (granteeId) REFERENCES users(id)
                ON UPDATE CASCADE ON DELETE CASCADE
        )
        "#,
        r#"
        CREATE TABLE aclMetadata(
            attribute VARCHAR(100) UNIQUE NOT NULL,
            value VARCHAR(200) NOT NULL
        )
        "#,
        "INSERT INTO aclMetadata VALUES ('version', '2')",
    ];

    // SQLite cannot add constraints to an existing table, a unique index is equivalent.
    pub const UPGRADE_FROM_V1: &[&str] = &[
        "CREATE UNIQUE INDEX IF NOT EXISTS uniqueObjClsId ON accessControlObjects(objectId, objectClass)",
        "UPDATE aclMetadata SET value = '2' WHERE attribute = 'version'",
    ];
}

/// Outcome of [upgrade].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upgrade {
    UpToDate,
    Upgraded,
}

/// Get the currently installed schema version.
pub async fn installed_version(dal: &dyn Dal) -> Result<String, Error> {
    dal.schema_version().await?.ok_or(Error::SchemaNotInstalled)
}

/// Make sure the installed schema is the one this crate expects.
pub async fn check(dal: &dyn Dal) -> Result<(), Error> {
    let found = installed_version(dal).await?;

    if found != VERSION.to_string() {
        return Err(Error::SchemaVersionMismatch {
            expected: VERSION,
            found,
        });
    }

    Ok(())
}

/// Install the schema into a database that has none yet.
pub async fn install(dal: &dyn Dal) -> Result<(), Error> {
    if let Some(version) = dal.schema_version().await? {
        return Err(Error::SchemaAlreadyInstalled(version));
    }

    dal.install_schema().await?;

    info!(version = VERSION, "installed ACL schema");

    Ok(())
}

/// Bring an installed schema up to [VERSION]. Only version 1 can be upgraded.
pub async fn upgrade(dal: &dyn Dal) -> Result<Upgrade, Error> {
    let current = installed_version(dal).await?;

    match current.as_str() {
        "2" => Ok(Upgrade::UpToDate),
        "1" => {
            dal.upgrade_schema_from_v1().await?;

            info!(from = 1, to = VERSION, "upgraded ACL schema");

            Ok(Upgrade::Upgraded)
        }
        _ => {
            warn!(found = %current, "cannot upgrade ACL schema");

            Err(Error::UnsupportedUpgrade(current))
        }
    }
}
