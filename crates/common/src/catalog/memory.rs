//! In-memory catalog, for tests and ephemeral setups.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::provider::{CatalogError, CatalogProvider, FileDescriptor};
use crate::validation::{Filename, Username};

#[derive(Debug, thiserror::Error)]
pub enum MemoryCatalogError {
    #[error("catalog lock poisoned")]
    Poisoned,
}

/// Descriptors kept in insertion order, mirroring rowid order in SQL.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    rows: Arc<Mutex<Vec<FileDescriptor>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<FileDescriptor>>, CatalogError<MemoryCatalogError>> {
        self.rows
            .lock()
            .map_err(|_| CatalogError::Provider(MemoryCatalogError::Poisoned))
    }
}

fn matches(row: &FileDescriptor, owner: &Username, filename: &Filename) -> bool {
    &row.owner == owner && &row.filename == filename
}

#[async_trait]
impl CatalogProvider for MemoryCatalog {
    type Error = MemoryCatalogError;

    async fn exists(
        &self,
        owner: &Username,
        filename: &Filename,
    ) -> Result<bool, CatalogError<Self::Error>> {
        Ok(self.lock()?.iter().any(|row| matches(row, owner, filename)))
    }

    async fn insert(&self, descriptor: &FileDescriptor) -> Result<(), CatalogError<Self::Error>> {
        let mut rows = self.lock()?;
        if rows
            .iter()
            .any(|row| matches(row, &descriptor.owner, &descriptor.filename))
        {
            return Err(CatalogError::Conflict(
                descriptor.owner.clone(),
                descriptor.filename.clone(),
            ));
        }
        rows.push(descriptor.clone());
        Ok(())
    }

    async fn delete(
        &self,
        owner: &Username,
        filename: &Filename,
    ) -> Result<(), CatalogError<Self::Error>> {
        let mut rows = self.lock()?;
        match rows.iter().position(|row| matches(row, owner, filename)) {
            Some(index) => {
                rows.remove(index);
                Ok(())
            }
            None => Err(CatalogError::NotFound(owner.clone(), filename.clone())),
        }
    }

    async fn get(
        &self,
        owner: &Username,
        filename: &Filename,
    ) -> Result<Option<FileDescriptor>, CatalogError<Self::Error>> {
        Ok(self
            .lock()?
            .iter()
            .find(|row| matches(row, owner, filename))
            .cloned())
    }

    async fn list_by_owner(
        &self,
        owner: &Username,
    ) -> Result<Vec<String>, CatalogError<Self::Error>> {
        Ok(self
            .lock()?
            .iter()
            .filter(|row| &row.owner == owner)
            .map(|row| row.filename.to_string())
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<FileDescriptor>, CatalogError<Self::Error>> {
        Ok(self.lock()?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(owner: &str, filename: &str) -> (Username, Filename) {
        (
            Username::parse(owner).unwrap(),
            Filename::parse(filename).unwrap(),
        )
    }

    fn descriptor(owner: &str, filename: &str) -> FileDescriptor {
        let (owner, filename) = key(owner, filename);
        FileDescriptor::new(owner, filename, "text/plain", 5)
    }

    #[tokio::test]
    async fn test_insert_get_delete() {
        let catalog = MemoryCatalog::new();
        let (owner, filename) = key("alice", "a.txt");

        assert!(!catalog.exists(&owner, &filename).await.unwrap());
        catalog.insert(&descriptor("alice", "a.txt")).await.unwrap();
        assert!(catalog.exists(&owner, &filename).await.unwrap());

        let got = catalog.get(&owner, &filename).await.unwrap().unwrap();
        assert_eq!(got.content_type, "text/plain");
        assert_eq!(got.content_length, 5);

        catalog.delete(&owner, &filename).await.unwrap();
        assert!(catalog.get(&owner, &filename).await.unwrap().is_none());
        assert!(matches!(
            catalog.delete(&owner, &filename).await,
            Err(CatalogError::NotFound(_, _))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts() {
        let catalog = MemoryCatalog::new();
        catalog.insert(&descriptor("alice", "a.txt")).await.unwrap();

        assert!(matches!(
            catalog.insert(&descriptor("alice", "a.txt")).await,
            Err(CatalogError::Conflict(_, _))
        ));
        // same filename, different owner is a different key
        catalog.insert(&descriptor("bob", "a.txt")).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_by_owner_keeps_insertion_order() {
        let catalog = MemoryCatalog::new();
        for name in ["zeta", "alpha", "mid"] {
            catalog.insert(&descriptor("alice", name)).await.unwrap();
        }
        catalog.insert(&descriptor("bob", "other")).await.unwrap();

        let (alice, _) = key("alice", "x");
        assert_eq!(
            catalog.list_by_owner(&alice).await.unwrap(),
            vec!["zeta", "alpha", "mid"]
        );
        assert_eq!(catalog.list_all().await.unwrap().len(), 4);
    }
}
