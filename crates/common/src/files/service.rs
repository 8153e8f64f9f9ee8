use std::fmt::Display;

use blobs_store::{BlobReader, BlobStore};
use bytes::Bytes;
use futures::Stream;

use super::error::FileError;
use crate::catalog::{CatalogProvider, FileDescriptor};
use crate::validation::{Filename, Username};

/// A file opened for download: its descriptor and a reader over the blob.
#[derive(Debug)]
pub struct StoredFile {
    pub descriptor: FileDescriptor,
    pub reader: BlobReader,
}

/// Coordinates the metadata catalog and the blob store.
///
/// The two stores are written without a shared transaction. Uploads register
/// the descriptor first and write the blob second, so a crash between the
/// two leaves a row without a blob rather than an unreferenced blob. Such
/// rows are reported as corrupt on read and surfaced by
/// [`FileService::reconcile`].
#[derive(Debug, Clone)]
pub struct FileService<C: CatalogProvider> {
    catalog: C,
    blobs: BlobStore,
}

impl<C: CatalogProvider> FileService<C> {
    pub fn new(catalog: C, blobs: BlobStore) -> Self {
        Self { catalog, blobs }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    /// Store a new file for `owner`.
    ///
    /// Fails with `Conflict` if the key is already registered, including when
    /// a concurrent upload of the same key registers first. If the blob write
    /// fails or the body length disagrees with `content_length`, the error is
    /// returned and the descriptor stays registered for reconciliation.
    pub async fn put<S, E>(
        &self,
        owner: &Username,
        filename: &str,
        content_type: &str,
        content_length: u64,
        body: S,
    ) -> Result<FileDescriptor, FileError<C::Error>>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: Display + Send,
    {
        let filename = Filename::parse(filename)?;

        if self.catalog.exists(owner, &filename).await? {
            return Err(FileError::Conflict(owner.clone(), filename));
        }

        let descriptor =
            FileDescriptor::new(owner.clone(), filename, content_type, content_length);
        self.catalog.insert(&descriptor).await?;

        let received = match self.blobs.write(owner, &descriptor.filename, body).await {
            Ok(received) => received,
            Err(e) => {
                tracing::error!(
                    owner = %owner,
                    filename = %descriptor.filename,
                    error = %e,
                    "blob write failed after registration"
                );
                return Err(e.into());
            }
        };

        if received != content_length {
            tracing::warn!(
                owner = %owner,
                filename = %descriptor.filename,
                declared = content_length,
                received,
                "upload length mismatch"
            );
            return Err(FileError::LengthMismatch {
                declared: content_length,
                received,
            });
        }

        tracing::info!(
            owner = %owner,
            filename = %descriptor.filename,
            size = received,
            "file stored"
        );
        Ok(descriptor)
    }

    /// Open one of `owner`'s files.
    pub async fn get(
        &self,
        owner: &Username,
        filename: &str,
    ) -> Result<StoredFile, FileError<C::Error>> {
        let filename = Filename::parse(filename)?;

        let Some(descriptor) = self.catalog.get(owner, &filename).await? else {
            return Err(FileError::NotFound(owner.clone(), filename));
        };

        let reader = match self.blobs.read(owner, &filename).await {
            Ok(reader) => reader,
            Err(e) if e.is_not_found() => {
                return Err(corrupt(owner, &filename, "blob is missing".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if reader.size() != descriptor.content_length {
            return Err(corrupt(
                owner,
                &filename,
                format!(
                    "blob holds {} bytes, expected {}",
                    reader.size(),
                    descriptor.content_length
                ),
            ));
        }

        Ok(StoredFile { descriptor, reader })
    }

    /// Delete one of `owner`'s files.
    ///
    /// The descriptor goes first. Removing the blob afterwards is best
    /// effort: a failure is logged and leaves an orphan for reconciliation.
    pub async fn delete(&self, owner: &Username, filename: &str) -> Result<(), FileError<C::Error>> {
        let filename = Filename::parse(filename)?;

        self.catalog.delete(owner, &filename).await?;

        if let Err(e) = self.blobs.remove(owner, &filename).await {
            tracing::warn!(
                owner = %owner,
                filename = %filename,
                error = %e,
                "failed to remove blob after deleting descriptor"
            );
        }

        tracing::info!(owner = %owner, filename = %filename, "file deleted");
        Ok(())
    }

    /// Filenames registered to `owner`. Comes from the catalog alone.
    pub async fn list(&self, owner: &Username) -> Result<Vec<String>, FileError<C::Error>> {
        Ok(self.catalog.list_by_owner(owner).await?)
    }
}

fn corrupt<E>(owner: &Username, filename: &Filename, reason: String) -> FileError<E> {
    tracing::error!(owner = %owner, filename = %filename, reason = %reason, "corrupt file");
    FileError::Corrupt {
        key: format!("{owner}/{filename}"),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;

    type Service = FileService<MemoryCatalog>;

    async fn service() -> Service {
        FileService::new(MemoryCatalog::new(), BlobStore::new_ephemeral().await.unwrap())
    }

    fn user(name: &str) -> Username {
        Username::parse(name).unwrap()
    }

    fn body(data: &'static [u8]) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
        futures::stream::iter(vec![Ok(Bytes::from_static(data))])
    }

    async fn put(service: &Service, owner: &str, filename: &str, data: &'static [u8]) {
        service
            .put(&user(owner), filename, "text/plain", data.len() as u64, body(data))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let service = service().await;
        let alice = user("alice");

        let descriptor = service
            .put(&alice, "notes.txt", "text/markdown", 5, body(b"hello"))
            .await
            .unwrap();
        assert_eq!(descriptor.content_length, 5);

        let file = service.get(&alice, "notes.txt").await.unwrap();
        assert_eq!(file.descriptor.content_type, "text/markdown");
        assert_eq!(file.descriptor.content_length, 5);
        assert_eq!(file.reader.bytes().await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_put_chunked_body() {
        let service = service().await;
        let alice = user("alice");
        let chunks = futures::stream::iter(vec![
            Ok::<_, std::io::Error>(Bytes::from_static(b"hel")),
            Ok(Bytes::from_static(b"lo ")),
            Ok(Bytes::from_static(b"world")),
        ]);

        service
            .put(&alice, "greeting", "text/plain", 11, chunks)
            .await
            .unwrap();

        let file = service.get(&alice, "greeting").await.unwrap();
        assert_eq!(file.reader.bytes().await.unwrap(), "hello world");
    }

    #[tokio::test]
    async fn test_owners_are_isolated() {
        let service = service().await;
        put(&service, "alice", "secret.txt", b"alice only").await;

        let err = service.get(&user("bob"), "secret.txt").await.unwrap_err();
        assert!(matches!(err, FileError::NotFound(_, _)));

        // bob may use the same name independently
        put(&service, "bob", "secret.txt", b"bob's").await;
        let file = service.get(&user("alice"), "secret.txt").await.unwrap();
        assert_eq!(file.reader.bytes().await.unwrap(), "alice only");
    }

    #[tokio::test]
    async fn test_put_existing_conflicts() {
        let service = service().await;
        put(&service, "alice", "a.txt", b"first").await;

        let err = service
            .put(&user("alice"), "a.txt", "text/plain", 6, body(b"second"))
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::Conflict(_, _)));

        let file = service.get(&user("alice"), "a.txt").await.unwrap();
        assert_eq!(file.reader.bytes().await.unwrap(), "first");
    }

    #[tokio::test]
    async fn test_concurrent_put_exactly_one_wins() {
        let service = service().await;
        let alice = user("alice");

        let (a, b) = tokio::join!(
            service.put(&alice, "race.bin", "application/octet-stream", 1, body(b"a")),
            service.put(&alice, "race.bin", "application/octet-stream", 1, body(b"b")),
        );

        let outcomes = [a.is_ok(), b.is_ok()];
        assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
        let loser = if a.is_err() { a } else { b };
        assert!(matches!(loser, Err(FileError::Conflict(_, _))));
    }

    #[tokio::test]
    async fn test_invalid_filename_touches_nothing() {
        let service = service().await;
        let alice = user("alice");

        for bad in ["", "..", "../escape", "a/b"] {
            let err = service
                .put(&alice, bad, "text/plain", 1, body(b"x"))
                .await
                .unwrap_err();
            assert!(matches!(err, FileError::Validation(_)), "{bad:?}");
        }

        assert!(service.list(&alice).await.unwrap().is_empty());
        assert!(service.blobs().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let service = service().await;
        let alice = user("alice");
        put(&service, "alice", "a.txt", b"bytes").await;

        service.delete(&alice, "a.txt").await.unwrap();
        let err = service.delete(&alice, "a.txt").await.unwrap_err();
        assert!(matches!(err, FileError::NotFound(_, _)));

        assert!(service.blobs().size("alice", "a.txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_after_puts_and_delete() {
        let service = service().await;
        let alice = user("alice");
        put(&service, "alice", "one", b"1").await;
        put(&service, "alice", "two", b"2").await;
        put(&service, "bob", "three", b"3").await;

        service.delete(&alice, "one").await.unwrap();

        assert_eq!(service.list(&alice).await.unwrap(), vec!["two"]);
        assert!(service.list(&user("carol")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_blob_is_corrupt() {
        let service = service().await;
        let alice = user("alice");
        put(&service, "alice", "gone.txt", b"bytes").await;

        service.blobs().remove("alice", "gone.txt").await.unwrap();

        let err = service.get(&alice, "gone.txt").await.unwrap_err();
        assert!(matches!(err, FileError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_length_mismatch_leaves_row_registered() {
        let service = service().await;
        let alice = user("alice");

        let err = service
            .put(&alice, "short.bin", "application/octet-stream", 10, body(b"four"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FileError::LengthMismatch {
                declared: 10,
                received: 4
            }
        ));

        assert_eq!(service.list(&alice).await.unwrap(), vec!["short.bin"]);
        let err = service.get(&alice, "short.bin").await.unwrap_err();
        assert!(matches!(err, FileError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_failed_body_leaves_row_without_blob() {
        let service = service().await;
        let alice = user("alice");
        let failing = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::other("client went away")),
        ]);

        let err = service
            .put(&alice, "broken", "text/plain", 100, failing)
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::Blob(_)));

        assert!(service.blobs().size("alice", "broken").await.unwrap().is_none());
        let err = service.get(&alice, "broken").await.unwrap_err();
        assert!(matches!(err, FileError::Corrupt { .. }));
    }
}
