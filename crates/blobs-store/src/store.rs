//! Main BlobStore API: raw bytes keyed by (owner, filename).

use std::fmt;
use std::path::Path;
use std::time::SystemTime;

use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use futures::{Stream, StreamExt, TryStreamExt};
use object_store::path::{Path as ObjectPath, PathPart};
use object_store::WriteMultipart;
use tracing::{debug, info, warn};

use crate::error::{BlobStoreError, Result};
use crate::storage::{BlobStoreConfig, Storage};

/// Upper bound on multipart parts buffered while streaming an upload.
const MAX_IN_FLIGHT_PARTS: usize = 4;

/// Identifies one blob: the owner namespace plus the filename inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobKey {
    pub owner: String,
    pub filename: String,
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.filename)
    }
}

/// One blob as seen by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobEntry {
    pub key: BlobKey,
    pub size: u64,
    pub last_modified: SystemTime,
}

/// A blob opened for reading.
pub struct BlobReader {
    size: u64,
    stream: BoxStream<'static, Result<Bytes>>,
}

impl BlobReader {
    /// Size of the stored object in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn into_stream(self) -> BoxStream<'static, Result<Bytes>> {
        self.stream
    }

    /// Buffer the whole blob into memory.
    pub async fn bytes(self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.size as usize);
        let mut stream = self.stream;
        while let Some(chunk) = stream.try_next().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }
}

impl fmt::Debug for BlobReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobReader")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// BlobStore keeps file bytes under a per-owner namespace on an
/// object storage backend (local filesystem or memory).
///
/// Objects live at `<owner>/<filename>`. Owner namespaces are never created
/// explicitly: the first write under an owner brings the namespace into
/// existence.
#[derive(Debug, Clone)]
pub struct BlobStore {
    storage: Storage,
}

impl BlobStore {
    pub async fn new(config: BlobStoreConfig) -> Result<Self> {
        let storage = Storage::new(config).await?;
        Ok(Self { storage })
    }

    /// Create a BlobStore rooted at a local directory.
    pub async fn new_local(path: &Path) -> Result<Self> {
        Self::new(BlobStoreConfig::Local {
            path: path.to_path_buf(),
        })
        .await
    }

    /// Create a fully ephemeral BlobStore.
    /// Data will be lost when the BlobStore is dropped.
    pub async fn new_ephemeral() -> Result<Self> {
        Self::new(BlobStoreConfig::Memory).await
    }

    /// Stream `body` into the blob for (owner, filename), replacing any
    /// existing object. Returns the number of bytes written.
    ///
    /// Bytes go through a multipart upload, so a body that fails half way
    /// never becomes visible at the final location.
    pub async fn write<S, E>(&self, owner: &str, filename: &str, body: S) -> Result<u64>
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send,
        E: fmt::Display + Send,
    {
        let path = object_path(owner, filename)?;
        debug!(path = %path, "writing blob");

        let upload = self.storage.inner().put_multipart(&path).await?;
        let mut writer = WriteMultipart::new(upload);
        let mut written: u64 = 0;
        let mut body = std::pin::pin!(body);

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let reason = e.to_string();
                    if let Err(abort_err) = writer.abort().await {
                        warn!(path = %path, error = %abort_err, "failed to abort blob upload");
                    }
                    return Err(BlobStoreError::Body(reason));
                }
            };
            writer.wait_for_capacity(MAX_IN_FLIGHT_PARTS).await?;
            written += chunk.len() as u64;
            writer.write(&chunk);
        }

        writer.finish().await?;

        info!(path = %path, size = written, "blob stored successfully");
        Ok(written)
    }

    /// Open the blob for (owner, filename).
    pub async fn read(&self, owner: &str, filename: &str) -> Result<BlobReader> {
        let path = object_path(owner, filename)?;
        let result = self
            .storage
            .inner()
            .get(&path)
            .await
            .map_err(|e| not_found_or(e, &path))?;

        let size = result.meta.size as u64;
        let stream = result
            .into_stream()
            .map_err(BlobStoreError::from)
            .boxed();

        Ok(BlobReader { size, stream })
    }

    /// Size of the blob, or `None` if there is no such object.
    pub async fn size(&self, owner: &str, filename: &str) -> Result<Option<u64>> {
        let path = object_path(owner, filename)?;
        match self.storage.inner().head(&path).await {
            Ok(meta) => Ok(Some(meta.size as u64)),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the blob. Removing a blob that does not exist succeeds.
    pub async fn remove(&self, owner: &str, filename: &str) -> Result<()> {
        let path = object_path(owner, filename)?;
        match self.storage.inner().delete(&path).await {
            Ok(()) => {
                info!(path = %path, "blob deleted");
                Ok(())
            }
            Err(object_store::Error::NotFound { .. }) => {
                debug!(path = %path, "blob already absent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// List every blob in the store with its size and modification time.
    ///
    /// Objects that do not sit exactly one level below an owner namespace
    /// are skipped with a warning.
    pub async fn list_all(&self) -> Result<Vec<BlobEntry>> {
        let mut stream = self.storage.inner().list(None);
        let mut blobs = Vec::new();

        while let Some(meta) = stream.try_next().await? {
            let parts: Vec<PathPart<'_>> = meta.location.parts().collect();
            match parts.as_slice() {
                [owner, filename] => blobs.push(BlobEntry {
                    key: BlobKey {
                        owner: owner.as_ref().to_string(),
                        filename: filename.as_ref().to_string(),
                    },
                    size: meta.size as u64,
                    last_modified: meta.last_modified.into(),
                }),
                _ => warn!(path = %meta.location, "unexpected object in blob storage, skipping"),
            }
        }

        Ok(blobs)
    }
}

/// Build `<owner>/<filename>`, refusing any segment that object storage
/// would have to escape. This keeps the mapping between keys and object
/// paths one-to-one.
fn object_path(owner: &str, filename: &str) -> Result<ObjectPath> {
    for segment in [owner, filename] {
        let part = PathPart::from(segment);
        if segment.is_empty() || part.as_ref() != segment {
            return Err(BlobStoreError::InvalidKey(format!("{owner}/{filename}")));
        }
    }
    Ok(ObjectPath::from_iter([owner, filename]))
}

fn not_found_or(e: object_store::Error, path: &ObjectPath) -> BlobStoreError {
    match e {
        object_store::Error::NotFound { .. } => BlobStoreError::NotFound(path.to_string()),
        other => other.into(),
    }
}
