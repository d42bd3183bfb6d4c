mod args;
pub mod dal;
mod error;
pub mod model;
mod plugin;
pub mod policy;
pub mod schema;
#[cfg(test)]
mod test_utils;
mod trace;

use std::sync::Arc;

use tracing::info;

pub use args::{Args, Commands, LogFormat, ObjectArgs, RuleArgs};
pub use dal::{Dal, DalError, MySql, Sqlite};
pub use error::Error;
pub use plugin::{AccessControl, Config, ACL_ACCESS_POLICY, OWNER_ACCESS_POLICY, PLUGIN_ID};
pub use trace::setup_tracing;

/// Connect to the ACL database at `uri`, picking the backend from the URI scheme.
pub async fn dal_init(uri: &str) -> Result<Arc<dyn Dal>, Error> {
    let dal: Arc<dyn Dal> = if uri.starts_with("mysql:") {
        Arc::new(MySql::new(uri).await?)
    } else if uri.starts_with("sqlite:") {
        Arc::new(Sqlite::new(uri).await?)
    } else {
        return Err(Error::UnsupportedDatabase);
    };

    Ok(dal)
}

/// Run a CLI command, returning the line to show the user.
pub async fn run(dal: &dyn Dal, command: Commands) -> Result<String, Error> {
    match command {
        Commands::InstallSchema => {
            schema::install(dal).await?;

            Ok(format!("ACL schema version {} installed.", schema::VERSION))
        }
        Commands::UpgradeSchema => match schema::upgrade(dal).await? {
            schema::Upgrade::UpToDate => Ok("Schema version is up to date.".to_string()),
            schema::Upgrade::Upgraded => Ok(format!(
                "Schema version successfully upgraded to {}.",
                schema::VERSION
            )),
        },
        Commands::GetSchemaVersion => schema::installed_version(dal).await,
        Commands::Grant(rule) => {
            dal.grant(
                &rule.object_class,
                rule.object_id,
                rule.grantee_id,
                &rule.access_type,
            )
            .await?;

            info!(
                object_class = %rule.object_class,
                object_id = rule.object_id,
                grantee_id = rule.grantee_id,
                access_type = %rule.access_type,
                "granted access"
            );

            Ok(format!(
                "Granted {} on {} {} to user {}.",
                rule.access_type, rule.object_class, rule.object_id, rule.grantee_id
            ))
        }
        Commands::Revoke(rule) => {
            dal.revoke(
                &rule.object_class,
                rule.object_id,
                rule.grantee_id,
                &rule.access_type,
            )
            .await?;

            info!(
                object_class = %rule.object_class,
                object_id = rule.object_id,
                grantee_id = rule.grantee_id,
                access_type = %rule.access_type,
                "revoked access"
            );

            Ok(format!(
                "Revoked {} on {} {} from user {}.",
                rule.access_type, rule.object_class, rule.object_id, rule.grantee_id
            ))
        }
        Commands::AddAccessCtlObject(object) => {
            let aco_id = dal
                .add_access_ctl_object(&object.object_class, object.object_id, object.owner_id)
                .await?;

            info!(
                aco_id,
                object_class = %object.object_class,
                object_id = object.object_id,
                owner_id = object.owner_id,
                "added access control object"
            );

            Ok(format!(
                "Added access control object {aco_id} for {} {} owned by user {}.",
                object.object_class, object.object_id, object.owner_id
            ))
        }
    }
}
