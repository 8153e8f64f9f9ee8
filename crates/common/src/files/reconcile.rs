//! Reconciliation between the catalog and the blob store.
//!
//! Uploads and deletes touch the two stores without a shared transaction,
//! so a crash can leave a descriptor without a blob (or with a short one),
//! or a blob nobody references. A reconciliation pass finds these and can
//! optionally repair them by dropping the broken half.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, SystemTime};

use blobs_store::{BlobEntry, BlobKey};
use time::OffsetDateTime;

use super::error::FileError;
use super::service::FileService;
use crate::catalog::{CatalogError, CatalogProvider};
use crate::validation::{Filename, Username};

/// Rows and blobs younger than this are assumed to belong to an upload or
/// delete still in flight and are left alone.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Delete broken descriptors and orphan blobs instead of only reporting
    pub repair: bool,
    pub grace: Duration,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            repair: false,
            grace: DEFAULT_GRACE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    /// A descriptor whose blob does not exist
    MissingBlob { key: BlobKey },
    /// A descriptor whose blob size disagrees with the declared length
    SizeMismatch {
        key: BlobKey,
        expected: u64,
        actual: u64,
    },
    /// A blob with no descriptor
    OrphanBlob { key: BlobKey, size: u64 },
}

impl Anomaly {
    pub fn key(&self) -> &BlobKey {
        match self {
            Anomaly::MissingBlob { key }
            | Anomaly::SizeMismatch { key, .. }
            | Anomaly::OrphanBlob { key, .. } => key,
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::MissingBlob { key } => write!(f, "missing blob: {key}"),
            Anomaly::SizeMismatch {
                key,
                expected,
                actual,
            } => write!(
                f,
                "size mismatch: {key} (expected {expected} bytes, found {actual})"
            ),
            Anomaly::OrphanBlob { key, size } => write!(f, "orphan blob: {key} ({size} bytes)"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Descriptors examined
    pub checked: usize,
    /// Descriptors and unreferenced blobs skipped because they are inside
    /// the grace period
    pub skipped_in_flight: usize,
    pub anomalies: Vec<Anomaly>,
    /// Anomalies fixed, only non-zero when repairing
    pub repaired: usize,
    /// Repairs that failed, as human readable messages
    pub errors: Vec<String>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }
}

impl<C: CatalogProvider> FileService<C> {
    /// Compare every descriptor against the blob store.
    ///
    /// Blobs are listed before descriptors. Uploads register their row
    /// before writing the blob, so every blob in the listing already has a
    /// row by the time the rows are read; an upload finishing between the
    /// two reads is never taken for an orphan.
    ///
    /// Listing errors abort the pass. Individual repair failures are
    /// collected in the report and do not stop the remaining repairs.
    pub async fn reconcile(
        &self,
        options: ReconcileOptions,
    ) -> Result<ReconcileReport, FileError<C::Error>> {
        let mut blobs: BTreeMap<BlobKey, BlobEntry> = self
            .blobs()
            .list_all()
            .await?
            .into_iter()
            .map(|entry| (entry.key.clone(), entry))
            .collect();
        let rows = self.catalog().list_all().await?;

        let row_cutoff = time::Duration::try_from(options.grace)
            .ok()
            .and_then(|grace| OffsetDateTime::now_utc().checked_sub(grace))
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);
        let blob_cutoff = SystemTime::now()
            .checked_sub(options.grace)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let mut report = ReconcileReport::default();

        for row in rows {
            let key = BlobKey {
                owner: row.owner.to_string(),
                filename: row.filename.to_string(),
            };
            let blob = blobs.remove(&key);

            if row.created_at > row_cutoff {
                report.skipped_in_flight += 1;
                continue;
            }
            report.checked += 1;

            let anomaly = match blob {
                None => Anomaly::MissingBlob { key },
                Some(entry) if entry.size != row.content_length => Anomaly::SizeMismatch {
                    key,
                    expected: row.content_length,
                    actual: entry.size,
                },
                Some(_) => continue,
            };
            tracing::warn!(%anomaly, "catalog and blob store disagree");

            if options.repair {
                match self.drop_descriptor(&row.owner, &row.filename).await {
                    Ok(()) => report.repaired += 1,
                    Err(e) => report.errors.push(format!("{anomaly}: {e}")),
                }
            }
            report.anomalies.push(anomaly);
        }

        for (key, entry) in blobs {
            if entry.last_modified > blob_cutoff {
                report.skipped_in_flight += 1;
                continue;
            }
            let anomaly = Anomaly::OrphanBlob {
                key,
                size: entry.size,
            };
            tracing::warn!(%anomaly, "catalog and blob store disagree");

            if options.repair {
                let key = anomaly.key();
                match self.blobs().remove(&key.owner, &key.filename).await {
                    Ok(()) => report.repaired += 1,
                    Err(e) => report.errors.push(format!("{anomaly}: {e}")),
                }
            }
            report.anomalies.push(anomaly);
        }

        tracing::info!(
            checked = report.checked,
            skipped_in_flight = report.skipped_in_flight,
            anomalies = report.anomalies.len(),
            repaired = report.repaired,
            "reconciliation finished"
        );
        Ok(report)
    }

    /// Remove a broken descriptor together with whatever blob it has.
    async fn drop_descriptor(
        &self,
        owner: &Username,
        filename: &Filename,
    ) -> Result<(), FileError<C::Error>> {
        match self.catalog().delete(owner, filename).await {
            Ok(()) | Err(CatalogError::NotFound(_, _)) => {}
            Err(e) => return Err(e.into()),
        }
        self.blobs().remove(owner, filename).await?;
        Ok(())
    }
}
