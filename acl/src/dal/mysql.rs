use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{mysql::MySqlConnectOptions, MySqlPool};
use tracing::{debug, info};

use super::{is_unique_violation, Dal, DalError};
use crate::{
    model::{AccessCtlObjectId, AccessType, ObjectClass, ObjectId, UserId},
    schema::{self, METADATA_TABLE},
};

/// ACL store on the MySQL database shared with the rest of the application.
#[derive(Clone)]
pub struct MySql {
    pool: MySqlPool,
}

impl MySql {
    pub async fn new(uri: &str) -> Result<Self, DalError> {
        let options = MySqlConnectOptions::from_str(uri)?;
        let pool = MySqlPool::connect_with(options).await?;

        info!("connected to ACL database");

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    // No transaction here: MySQL commits DDL implicitly, so the statements have to be safe to
    // run again instead.
    async fn run_statements(&self, statements: &[&str]) -> Result<(), DalError> {
        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        Ok(())
    }

    async fn has_index(&self, table: &str, index: &str) -> Result<bool, DalError> {
        let found = sqlx::query(
            r#"
            SELECT INDEX_NAME
            FROM information_schema.STATISTICS
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? AND INDEX_NAME = ?
            LIMIT 1
            "#,
        )
        .bind(table)
        .bind(index)
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.is_some())
    }
}

#[async_trait]
impl Dal for MySql {
    async fn schema_version(&self) -> Result<Option<String>, DalError> {
        let table = sqlx::query(
            r#"
            SELECT TABLE_NAME
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
            "#,
        )
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
        self.run_statements(schema::mysql::INSTALL).await
    }

    async fn upgrade_schema_from_v1(&self) -> Result<(), DalError> {
        if !self
            .has_index("accessControlObjects", schema::mysql::UNIQUE_OBJECT_INDEX)
            .await?
        {
            sqlx::query(schema::mysql::ADD_UNIQUE_OBJECT)
                .execute(&self.pool)
                .await?;
        }

        sqlx::query(schema::mysql::SET_VERSION_2)
            .execute(&self.pool)
            .await?;

        Ok(())
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
        let mut tx = self.pool.begin().await?;

        let insert_id = sqlx::query(super::INSERT_OBJECT)
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
            .last_insert_id();
        let aco_id = AccessCtlObjectId::try_from(insert_id)
            .map_err(|_| DalError::IdOutOfRange(insert_id as i64))?;

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
