use async_trait::async_trait;
use sqlx::Row;

use common::account::{AccountError, AccountProvider};
use common::validation::Username;

use super::{is_unique_violation, Database};

#[async_trait]
impl AccountProvider for Database {
    type Error = sqlx::Error;

    async fn account_exists(&self, username: &Username) -> Result<bool, AccountError<Self::Error>> {
        let row = sqlx::query("SELECT 1 FROM accounts WHERE username = ?1")
            .bind(username.as_str())
            .fetch_optional(&**self)
            .await?;

        Ok(row.is_some())
    }

    async fn insert_account(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<(), AccountError<Self::Error>> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (username, password_hash)
            VALUES (?1, ?2)
            "#,
        )
        .bind(username.as_str())
        .bind(password_hash)
        .execute(&**self)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(AccountError::Conflict(username.clone())),
            Err(e) => Err(e.into()),
        }
    }

    async fn password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<String>, AccountError<Self::Error>> {
        let row = sqlx::query("SELECT password_hash FROM accounts WHERE username = ?1")
            .bind(username.as_str())
            .fetch_optional(&**self)
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("password_hash")?)),
            None => Ok(None),
        }
    }
}
