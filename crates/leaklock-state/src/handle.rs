//! SurrealDB connection handle and target-table operations.
//!
//! [`DbLocation`] decides where the registry lives (in-memory, local
//! SurrealKV directory, plain URL or SurrealDB Cloud). [`SurrealHandle`]
//! opens it, makes sure the schema exists and runs the queries behind
//! [`crate::SurrealTargetRegistry`].

use std::path::{Path, PathBuf};

use surrealdb::engine::any::Any;
use surrealdb::opt::auth::{Database, Root};
use surrealdb::Surreal;
use tracing::{debug, info, instrument, warn};

use crate::error::{StateError, StorageError};
use crate::schema::TargetRecord;
use crate::storage_traits::{DeliveryTarget, OwnerId, StorageResult, TargetId};
use crate::Result;

const DEFAULT_NAMESPACE: &str = "leaklock";
const DEFAULT_DATABASE: &str = "main";
const LOCAL_DB_PATH: &str = ".leaklock/db";

/// How to sign in to a remote SurrealDB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudCredentials {
    Root { username: String, password: String },
    Database { username: String, password: String },
}

/// SurrealDB Cloud (or any remote WebSocket server) with credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudConfig {
    /// e.g. "wss://leaklock-0123.aws-euw1.surrealdb.cloud"
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    pub credentials: CloudCredentials,
}

impl CloudConfig {
    /// Database-user login against the default namespace and database.
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            credentials: CloudCredentials::Database {
                username: username.into(),
                password: password.into(),
            },
        }
    }

    pub fn scoped(mut self, namespace: impl Into<String>, database: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self.database = database.into();
        self
    }

    /// Sign in as a root user instead of a database user.
    pub fn as_root(mut self) -> Self {
        if let CloudCredentials::Database { username, password } = self.credentials {
            self.credentials = CloudCredentials::Root { username, password };
        }
        self
    }

    /// `None` unless endpoint, username and password are all present.
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Option<Self> {
        let endpoint = lookup("SURREALDB_ENDPOINT")?;
        let username = lookup("SURREALDB_USERNAME")?;
        let password = lookup("SURREALDB_PASSWORD")?;

        let mut config = CloudConfig::new(endpoint, username, password).scoped(
            lookup("SURREALDB_NAMESPACE").unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            lookup("SURREALDB_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
        );
        if lookup("SURREALDB_ROOT").is_some_and(|v| v.eq_ignore_ascii_case("true")) {
            config = config.as_root();
        }
        Some(config)
    }
}

/// Where the target registry is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    Memory,
    Local(PathBuf),
    Url(String),
    Cloud(CloudConfig),
}

impl DbLocation {
    /// Resolve from the environment, first match wins:
    ///
    /// 1. SURREALDB_ENDPOINT + SURREALDB_USERNAME + SURREALDB_PASSWORD
    ///    (plus optional SURREALDB_NAMESPACE, SURREALDB_DATABASE, SURREALDB_ROOT)
    /// 2. SURREALDB_URL, e.g. `mem://` or `ws://localhost:8000`
    /// 3. local SurrealKV under `.leaklock/db`
    pub fn from_env() -> Self {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        if let Some(cloud) = CloudConfig::from_lookup(lookup) {
            return DbLocation::Cloud(cloud);
        }
        if let Some(url) = lookup("SURREALDB_URL") {
            return DbLocation::Url(url);
        }
        DbLocation::Local(PathBuf::from(LOCAL_DB_PATH))
    }
}

/// SurrealDB connection handle for LeakLock
#[derive(Clone)]
pub struct SurrealHandle {
    db: Surreal<Any>,
}

fn backend(err: surrealdb::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

fn connection(context: &str) -> impl Fn(surrealdb::Error) -> StateError + '_ {
    move |e| StateError::Connection(format!("{context}: {e}"))
}

impl SurrealHandle {
    /// Fresh in-memory database, mostly for tests
    pub async fn setup_db() -> Result<Self> {
        Self::open(DbLocation::Memory).await
    }

    /// SurrealKV database stored under `path`
    pub async fn setup_local(path: &Path) -> Result<Self> {
        Self::open(DbLocation::Local(path.to_path_buf())).await
    }

    /// Open whatever [`DbLocation::from_env`] resolves to
    pub async fn setup_from_env() -> Result<Self> {
        Self::open(DbLocation::from_env()).await
    }

    /// Connect, sign in if needed, select namespace/database and ensure the schema.
    #[instrument(skip_all)]
    pub async fn open(location: DbLocation) -> Result<Self> {
        let (url, cloud) = match location {
            DbLocation::Memory => ("mem://".to_string(), None),
            DbLocation::Local(path) => {
                std::fs::create_dir_all(&path).map_err(|e| {
                    StateError::Connection(format!(
                        "cannot create database directory {}: {e}",
                        path.display()
                    ))
                })?;
                (format!("surrealkv://{}", path.display()), None)
            }
            DbLocation::Url(url) => (url, None),
            DbLocation::Cloud(config) => (config.endpoint.clone(), Some(config)),
        };

        info!(url = %url, "Opening target registry database");
        let db = surrealdb::engine::any::connect(url.as_str())
            .await
            .map_err(connection(&format!("cannot connect to {url}")))?;

        let (namespace, database) = match &cloud {
            Some(config) => {
                Self::sign_in(&db, config).await?;
                (config.namespace.as_str(), config.database.as_str())
            }
            None => (DEFAULT_NAMESPACE, DEFAULT_DATABASE),
        };

        db.use_ns(namespace)
            .use_db(database)
            .await
            .map_err(connection("cannot select namespace/database"))?;

        let handle = SurrealHandle { db };
        handle.init_schema().await?;
        debug!("SurrealDB connected and schema initialized");
        Ok(handle)
    }

    async fn sign_in(db: &Surreal<Any>, config: &CloudConfig) -> Result<()> {
        match &config.credentials {
            CloudCredentials::Root { username, password } => {
                db.signin(Root { username, password })
                    .await
                    .map_err(connection("root sign-in failed"))?;
            }
            CloudCredentials::Database { username, password } => {
                db.signin(Database {
                    namespace: &config.namespace,
                    database: &config.database,
                    username,
                    password,
                })
                .await
                .map_err(connection("database sign-in failed"))?;
            }
        }
        Ok(())
    }

    /// Create the target table and its indexes if missing
    async fn init_schema(&self) -> Result<()> {
        let schema = r#"
            DEFINE TABLE IF NOT EXISTS delivery_targets SCHEMALESS;
            DEFINE INDEX IF NOT EXISTS idx_target_id ON TABLE delivery_targets COLUMNS target_id UNIQUE;
            DEFINE INDEX IF NOT EXISTS idx_target_owner ON TABLE delivery_targets COLUMNS owner;
            DEFINE INDEX IF NOT EXISTS idx_target_lookup ON TABLE delivery_targets COLUMNS owner, event_type, enabled;
        "#;

        self.db
            .query(schema)
            .await
            .map_err(|e| StateError::SchemaSetup(e.to_string()))?
            .check()
            .map_err(|e| StateError::SchemaSetup(e.to_string()))?;
        Ok(())
    }

    // ========== Target Operations ==========

    /// Store a new target row
    #[instrument(skip(self, target), fields(target_id = %target.id, event_type = %target.event_type))]
    pub async fn insert_target(&self, target: &DeliveryTarget) -> StorageResult<DeliveryTarget> {
        debug!("Inserting delivery target");

        let record = TargetRecord::from_target(target);
        let created: Option<TargetRecord> = self
            .db
            .create("delivery_targets")
            .content(record)
            .await
            .map_err(backend)?;

        created
            .and_then(TargetRecord::into_target)
            .ok_or_else(|| StorageError::Backend("failed to create delivery target".to_string()))
    }

    /// Select the enabled targets matching owner and event type exactly
    #[instrument(skip(self, owner), fields(owner = %owner))]
    pub async fn select_enabled_targets(
        &self,
        owner: &OwnerId,
        event_type: &str,
    ) -> StorageResult<Vec<DeliveryTarget>> {
        let mut res = self
            .db
            .query(
                "SELECT * FROM delivery_targets \
                 WHERE owner = $owner AND event_type = $event_type AND enabled = true \
                 ORDER BY created_at ASC",
            )
            .bind(("owner", owner.as_str().to_string()))
            .bind(("event_type", event_type.to_string()))
            .await
            .map_err(backend)?;

        let rows: Vec<TargetRecord> = res.take(0).map_err(backend)?;
        Ok(Self::rows_to_targets(rows))
    }

    /// Select every target registered by an owner
    #[instrument(skip(self, owner), fields(owner = %owner))]
    pub async fn select_owner_targets(&self, owner: &OwnerId) -> StorageResult<Vec<DeliveryTarget>> {
        let mut res = self
            .db
            .query("SELECT * FROM delivery_targets WHERE owner = $owner ORDER BY created_at ASC")
            .bind(("owner", owner.as_str().to_string()))
            .await
            .map_err(backend)?;

        let rows: Vec<TargetRecord> = res.take(0).map_err(backend)?;
        Ok(Self::rows_to_targets(rows))
    }

    /// Flip the enabled flag of a target
    #[instrument(skip(self), fields(target_id = %id))]
    pub async fn update_target_enabled(
        &self,
        id: &TargetId,
        enabled: bool,
    ) -> StorageResult<DeliveryTarget> {
        let mut res = self
            .db
            .query("UPDATE delivery_targets SET enabled = $enabled WHERE target_id = $tid RETURN AFTER")
            .bind(("enabled", enabled))
            .bind(("tid", id.0.clone()))
            .await
            .map_err(backend)?;

        let rows: Vec<TargetRecord> = res.take(0).map_err(backend)?;
        Self::rows_to_targets(rows)
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::TargetNotFound {
                target_id: id.0.clone(),
            })
    }

    /// Delete a target row
    #[instrument(skip(self), fields(target_id = %id))]
    pub async fn delete_target(&self, id: &TargetId) -> StorageResult<()> {
        let mut res = self
            .db
            .query("DELETE delivery_targets WHERE target_id = $tid RETURN BEFORE")
            .bind(("tid", id.0.clone()))
            .await
            .map_err(backend)?;

        let rows: Vec<TargetRecord> = res.take(0).map_err(backend)?;
        if rows.is_empty() {
            return Err(StorageError::TargetNotFound {
                target_id: id.0.clone(),
            });
        }
        Ok(())
    }

    fn rows_to_targets(rows: Vec<TargetRecord>) -> Vec<DeliveryTarget> {
        rows.into_iter()
            .filter_map(|row| {
                let target_id = row.target_id.clone();
                let target = row.into_target();
                if target.is_none() {
                    warn!(target_id = %target_id, "skipping delivery target with blank owner");
                }
                target
            })
            .collect()
    }
}
