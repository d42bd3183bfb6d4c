use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use tracing::{debug, info};

use super::{is_unique_violation, Dal, DalError};
use crate::{
    model::{AccessCtlObjectId, AccessType, ObjectClass, ObjectId, UserId},
    schema::{self, METADATA_TABLE},
};

#[derive(Clone)]
pub struct Sqlite {
    pool: SqlitePool,
}

impl Sqlite {
    /// Connect to the database at `uri`, creating the database file if it does not exist yet.
    pub async fn new(uri: &str) -> Result<Self, DalError> {
        let sqlite_options = SqliteConnectOptions::from_str(uri)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(sqlite_options).await?;

        info!(uri, "connected to ACL database");

        Ok(Self::from_pool(pool))
    }

    /// An in-memory database. It is dropped together with the last connection holding it open,
    /// so the pool keeps exactly one connection and never lets it expire.
    pub async fn new_in_memory() -> Result<Self, DalError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The underlying pool, shared with the host application which owns the `users` table.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn run_statements(&self, statements: &[&str]) -> Result<(), DalError> {
        let mut tx = self.pool.begin().await?;

        for statement in statements {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        tx.commit().await?;

        Ok(())
    }
}

#[async_trait]
impl Dal for Sqlite {
    async fn schema_version(&self) -> Result<Option<String>, DalError> {
        let table = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(METADATA_TABLE)
            .fetch_optional(&self.pool)
            .await?;

        if table.is_none() {
            return Ok(None);
        }

        let version = sqlx::query_scalar(super::GET_VERSION)
            .fetch_optional(&self.pool)
            .await?;

        Ok(version)
    }

    async fn install_schema(&self) -> Result<(), DalError> {
        self.run_statements(schema::sqlite::INSTALL).await
    }

    async fn upgrade_schema_from_v1(&self) -> Result<(), DalError> {
        self.run_statements(schema::sqlite::UPGRADE_FROM_V1).await
    }

    async fn find_rule(
        &self,
        object_class: &ObjectClass,
        object_id: ObjectId,
        grantee_id: UserId,
        access_type: &AccessType,
    ) -> Result<Option<AccessCtlObjectId>, DalError> {
        let id = sqlx::query_scalar(super::FIND_RULE)
            .bind(object_class)
            .bind(object_id)
            .bind(grantee_id)
            .bind(access_type)
            .fetch_optional(&self.pool)
            .await?;

        Ok(id)
    }

    async fn find_ownership(
        &self,
        object_class: &ObjectClass,
        object_id: ObjectId,
        owner_id: UserId,
    ) -> Result<Option<AccessCtlObjectId>, DalError> {
        let id = sqlx::query_scalar(super::FIND_OWNERSHIP)
            .bind(object_class)
            .bind(object_id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(id)
    }

    async fn get_access_ctl_object(
        &self,
        object_class: &ObjectClass,
        object_id: ObjectId,
    ) -> Result<AccessCtlObjectId, DalError> {
        sqlx::query_scalar(super::GET_OBJECT)
            .bind(object_class)
            .bind(object_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DalError::ObjectNotFound)
    }

    async fn grant(
        &self,
        object_class: &ObjectClass,
        object_id: ObjectId,
        grantee_id: UserId,
        access_type: &AccessType,
    ) -> Result<(), DalError> {
        let aco_id = self.get_access_ctl_object(object_class, object_id).await?;

        let result = sqlx::query(super::INSERT_RULE)
            .bind(aco_id)
            .bind(grantee_id)
            .bind(access_type)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(error) if is_unique_violation(&error) => {
                debug!(aco_id, grantee_id, %access_type, "rule already granted");

                Ok(())
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn revoke(
        &self,
        object_class: &ObjectClass,
        object_id: ObjectId,
        grantee_id: UserId,
        access_type: &AccessType,
    ) -> Result<(), DalError> {
        let aco_id = self.get_access_ctl_object(object_class, object_id).await?;

        sqlx::query(super::DELETE_RULE)
            .bind(aco_id)
            .bind(grantee_id)
            .bind(access_type)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn add_access_ctl_object(
        &self,
        object_class: &ObjectClass,
        object_id: ObjectId,
        owner_id: UserId,
    ) -> Result<AccessCtlObjectId, DalError> {
        // Dropping the transaction on any early return rolls it back
        let mut tx = self.pool.begin().await?;

        let rowid = sqlx::query(super::INSERT_OBJECT)
            .bind(object_class)
            .bind(object_id)
            .execute(&mut *tx)
            .await
            .map_err(|error| {
                if is_unique_violation(&error) {
                    DalError::ObjectExists
                } else {
                    error.into()
                }
            })?
            .last_insert_rowid();
        let aco_id =
            AccessCtlObjectId::try_from(rowid).map_err(|_| DalError::IdOutOfRange(rowid))?;

        sqlx::query(super::INSERT_OWNER)
            .bind(aco_id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        for access_type in [AccessType::read(), AccessType::edit()] {
            sqlx::query(super::INSERT_RULE)
                .bind(aco_id)
                .bind(owner_id)
                .bind(access_type)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(aco_id)
    }
}
