use common::prelude::{CredentialStore, FileService, PasswordHasher, SessionManager};
use common::blobs_store::{BlobStore, BlobStoreError};
use common::account::HashParamsError;
use common::session::SessionError;
use url::Url;

use crate::database::{Database, DatabaseSetupError};
use crate::service_config::Config;

/// Shared service state handed to every request handler.
#[derive(Clone, Debug)]
pub struct State {
    database: Database,
    credentials: CredentialStore<Database>,
    sessions: SessionManager,
    files: FileService<Database>,
    max_upload_size: u64,
    max_credential_body: usize,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Setup database
        let sqlite_database_url = match config.sqlite_path {
            Some(ref path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        return Err(StateSetupError::DatabasePathDoesNotExist);
                    }
                }
                Url::parse(&format!("sqlite://{}", path.display()))
                    .map_err(|_| StateSetupError::InvalidDatabaseUrl)
            }
            // otherwise just set up an in-memory database
            None => Url::parse("sqlite::memory:").map_err(|_| StateSetupError::InvalidDatabaseUrl),
        }?;
        tracing::info!(url = %sqlite_database_url, "opening database");
        let database = Database::connect(&sqlite_database_url).await?;

        // 2. Setup blob store
        tracing::debug!(config = ?config.blob_store, "opening blob store");
        let blobs = BlobStore::new(config.blob_store.clone()).await?;

        // 3. Credentials and sessions
        let hasher = PasswordHasher::new(config.hash_params)?;
        let credentials = CredentialStore::new(database.clone(), hasher);
        let sessions = SessionManager::new(config.session_secret.as_bytes(), config.session_ttl)?;

        // 4. File service over both stores
        let files = FileService::new(database.clone(), blobs);

        Ok(Self {
            database,
            credentials,
            sessions,
            files,
            max_upload_size: config.max_upload_size,
            max_credential_body: config.max_credential_body,
        })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn credentials(&self) -> &CredentialStore<Database> {
        &self.credentials
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn files(&self) -> &FileService<Database> {
        &self.files
    }

    pub fn max_upload_size(&self) -> u64 {
        self.max_upload_size
    }

    pub fn max_credential_body(&self) -> usize {
        self.max_credential_body
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Database path does not exist")]
    DatabasePathDoesNotExist,
    #[error("Database setup error: {0}")]
    DatabaseSetupError(#[from] DatabaseSetupError),
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,
    #[error("Blob store error: {0}")]
    BlobStoreError(#[from] BlobStoreError),
    #[error("Invalid password hash parameters: {0}")]
    HashParams(#[from] HashParamsError),
    #[error("Session setup error: {0}")]
    Session(#[from] SessionError),
}
