use crate::{dal::Dal, model::UserId, Sqlite};

/// An in-memory database with a host application `users` table holding `users`.
pub(crate) async fn sqlite_with_users(users: &[UserId]) -> Sqlite {
    let dal = Sqlite::new_in_memory().await.unwrap();

    sqlx::query("CREATE TABLE users (id INTEGER PRIMARY KEY)")
        .execute(dal.pool())
        .await
        .unwrap();

    for id in users {
        sqlx::query("INSERT INTO users (id) VALUES (?)")
            .bind(id)
            .execute(dal.pool())
            .await
            .unwrap();
    }

    dal
}

/// Same as [sqlite_with_users] with the ACL schema installed on top.
pub(crate) async fn sqlite_with_schema(users: &[UserId]) -> Sqlite {
    let dal = sqlite_with_users(users).await;
    dal.install_schema().await.unwrap();

    dal
}

impl Sqlite {
    pub(crate) async fn set_schema_version(&self, version: &str) {
        sqlx::query("UPDATE aclMetadata SET value = ? WHERE attribute = 'version'")
            .bind(version)
            .execute(self.pool())
            .await
            .unwrap();
    }
}
