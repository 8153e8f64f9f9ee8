use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use time::OffsetDateTime;

use common::catalog::{CatalogError, CatalogProvider, FileDescriptor};
use common::validation::{Filename, Username};

use super::{decode_error, is_unique_violation, Database};

#[async_trait]
impl CatalogProvider for Database {
    type Error = sqlx::Error;

    async fn exists(
        &self,
        owner: &Username,
        filename: &Filename,
    ) -> Result<bool, CatalogError<Self::Error>> {
        let row = sqlx::query("SELECT 1 FROM files WHERE owner = ?1 AND filename = ?2")
            .bind(owner.as_str())
            .bind(filename.as_str())
            .fetch_optional(&**self)
            .await?;

        Ok(row.is_some())
    }

    async fn insert(&self, descriptor: &FileDescriptor) -> Result<(), CatalogError<Self::Error>> {
        let content_length = i64::try_from(descriptor.content_length)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        let result = sqlx::query(
            r#"
            INSERT INTO files (owner, filename, content_type, content_length, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(descriptor.owner.as_str())
        .bind(descriptor.filename.as_str())
        .bind(&descriptor.content_type)
        .bind(content_length)
        .bind(descriptor.created_at)
        .execute(&**self)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(CatalogError::Conflict(
                descriptor.owner.clone(),
                descriptor.filename.clone(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(
        &self,
        owner: &Username,
        filename: &Filename,
    ) -> Result<(), CatalogError<Self::Error>> {
        let result = sqlx::query("DELETE FROM files WHERE owner = ?1 AND filename = ?2")
            .bind(owner.as_str())
            .bind(filename.as_str())
            .execute(&**self)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(owner.clone(), filename.clone()));
        }
        Ok(())
    }

    async fn get(
        &self,
        owner: &Username,
        filename: &Filename,
    ) -> Result<Option<FileDescriptor>, CatalogError<Self::Error>> {
        let row = sqlx::query(
            r#"
            SELECT owner, filename, content_type, content_length, created_at
            FROM files
            WHERE owner = ?1 AND filename = ?2
            "#,
        )
        .bind(owner.as_str())
        .bind(filename.as_str())
        .fetch_optional(&**self)
        .await?;

        Ok(row.as_ref().map(row_to_descriptor).transpose()?)
    }

    async fn list_by_owner(
        &self,
        owner: &Username,
    ) -> Result<Vec<String>, CatalogError<Self::Error>> {
        let rows = sqlx::query("SELECT filename FROM files WHERE owner = ?1 ORDER BY rowid")
            .bind(owner.as_str())
            .fetch_all(&**self)
            .await?;

        let names = rows
            .iter()
            .map(|row| row.try_get::<String, _>("filename"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    async fn list_all(&self) -> Result<Vec<FileDescriptor>, CatalogError<Self::Error>> {
        let rows = sqlx::query(
            r#"
            SELECT owner, filename, content_type, content_length, created_at
            FROM files
            ORDER BY rowid
            "#,
        )
        .fetch_all(&**self)
        .await?;

        let descriptors = rows
            .iter()
            .map(row_to_descriptor)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(descriptors)
    }
}

fn row_to_descriptor(row: &SqliteRow) -> Result<FileDescriptor, sqlx::Error> {
    let owner: String = row.try_get("owner")?;
    let filename: String = row.try_get("filename")?;
    let content_length: i64 = row.try_get("content_length")?;
    let created_at: OffsetDateTime = row.try_get("created_at")?;

    Ok(FileDescriptor {
        owner: Username::parse(&owner).map_err(decode_error)?,
        filename: Filename::parse(&filename).map_err(decode_error)?,
        content_type: row.try_get("content_type")?,
        content_length: u64::try_from(content_length).map_err(decode_error)?,
        created_at,
    })
}
