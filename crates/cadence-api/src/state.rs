//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! The in-memory stores are authoritative at runtime. When a database pool
//! is configured, every write is also persisted and the stores are loaded
//! from Postgres at startup ([`AppState::hydrate_from_db`]).

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;

use cadence_client::mock::MockPublisher;
use cadence_client::{Collaborators, PublisherCredentials};
use cadence_core::{AssetId, AssetType, CampaignId, FindingId, PostId, PostStatus};
use cadence_pipeline::PipelineOptions;

use crate::config::AppConfig;
use crate::middleware::metrics::ApiMetrics;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory table with its own id sequence.
///
/// The lock is `parking_lot` and is never held across `.await` points.
#[derive(Debug)]
pub struct Store<K, T> {
    data: Arc<RwLock<HashMap<K, T>>>,
    last_id: Arc<AtomicI64>,
}

impl<K, T> Clone for Store<K, T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            last_id: Arc::clone(&self.last_id),
        }
    }
}

impl<K, T> Store<K, T>
where
    K: Copy + Eq + Hash + From<i64> + Into<i64>,
    T: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            last_id: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Allocate the next identifier. Ids start at 1 and never repeat.
    pub fn next_id(&self) -> K {
        K::from(self.last_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Insert a record, returning the previous value if the key existed.
    /// The id sequence moves past `id` so loaded rows are never reissued.
    pub fn insert(&self, id: K, value: T) -> Option<T> {
        self.last_id.fetch_max(id.into(), Ordering::SeqCst);
        self.data.write().insert(id, value)
    }

    pub fn get(&self, id: &K) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// All records, in no particular order.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Records matching a predicate.
    pub fn filter(&self, f: impl Fn(&T) -> bool) -> Vec<T> {
        self.data.read().values().filter(|v| f(v)).cloned().collect()
    }

    /// Update a record in place. Returns the updated record, or `None` if not found.
    pub fn update(&self, id: &K, f: impl FnOnce(&mut T)) -> Option<T> {
        let mut guard = self.data.write();
        let entry = guard.get_mut(id)?;
        f(entry);
        Some(entry.clone())
    }

    /// Apply `f` to every record matching `pred`; returns how many changed.
    pub fn update_where(&self, pred: impl Fn(&T) -> bool, f: impl Fn(&mut T)) -> usize {
        let mut guard = self.data.write();
        let mut n = 0;
        for v in guard.values_mut().filter(|v| pred(v)) {
            f(v);
            n += 1;
        }
        n
    }

    pub fn remove(&self, id: &K) -> Option<T> {
        self.data.write().remove(id)
    }

    /// Remove every record matching `pred`, returning them.
    pub fn remove_where(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        let mut guard = self.data.write();
        let keys: Vec<K> = guard
            .iter()
            .filter(|(_, v)| pred(v))
            .map(|(k, _)| *k)
            .collect();
        keys.iter().filter_map(|k| guard.remove(k)).collect()
    }

    pub fn contains(&self, id: &K) -> bool {
        self.data.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, T> Default for Store<K, T>
where
    K: Copy + Eq + Hash + From<i64> + Into<i64>,
    T: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

// -- Records ------------------------------------------------------------------

/// Default campaign colour.
pub const DEFAULT_CAMPAIGN_COLOR: &str = "#31748E";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CampaignRecord {
    #[schema(value_type = i64)]
    pub id: CampaignId,
    pub name: String,
    pub description: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostRecord {
    #[schema(value_type = i64)]
    pub id: PostId,
    #[schema(value_type = Option<i64>)]
    pub campaign_id: Option<CampaignId>,
    pub title: String,
    pub body: String,
    pub hashtags: String,
    pub scheduled_at: DateTime<Utc>,
    /// `scheduled`, `posted` or `failed`.
    #[schema(value_type = String)]
    pub status: PostStatus,
    pub auto_scheduled: bool,
    pub auto_image: bool,
    pub auto_hashtags: bool,
    pub external_post_id: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssetRecord {
    #[schema(value_type = i64)]
    pub id: AssetId,
    #[schema(value_type = i64)]
    pub post_id: PostId,
    /// `image`, `document` or `other`.
    #[schema(value_type = String)]
    pub asset_type: AssetType,
    /// Name of the file inside the uploads directory.
    pub filename: String,
    pub original_name: String,
    pub file_size: i64,
    /// Prompt used when the image was generated.
    pub image_prompt: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One row of the compliance audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FindingRecord {
    #[schema(value_type = i64)]
    pub id: FindingId,
    #[schema(value_type = i64)]
    pub post_id: PostId,
    pub rule_id: String,
    pub description: String,
    pub auto_fixed: bool,
    pub created_at: DateTime<Utc>,
}

/// Stored publisher credentials. Never serialized.
#[derive(Clone)]
pub struct PublisherCredentialsRecord {
    pub access_token: String,
    pub person_urn: String,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for PublisherCredentialsRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublisherCredentialsRecord")
            .field("access_token", &"[REDACTED]")
            .field("person_urn", &self.person_urn)
            .field("token_expires_at", &self.token_expires_at)
            .finish()
    }
}

impl PublisherCredentialsRecord {
    pub fn credentials(&self) -> PublisherCredentials {
        PublisherCredentials {
            access_token: self.access_token.clone(),
            person_urn: self.person_urn.clone(),
        }
    }
}

/// Automation toggles. All default to on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AutomationSettings {
    pub auto_schedule: bool,
    pub auto_image: bool,
    pub auto_hashtags: bool,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            auto_schedule: true,
            auto_image: true,
            auto_hashtags: true,
        }
    }
}

impl AutomationSettings {
    /// Storage key/value pairs.
    pub fn entries(&self) -> [(&'static str, bool); 3] {
        [
            ("auto_schedule", self.auto_schedule),
            ("auto_image", self.auto_image),
            ("auto_hashtags", self.auto_hashtags),
        ]
    }

    /// Apply one stored key. Unknown keys are ignored.
    pub fn set(&mut self, key: &str, value: bool) {
        match key {
            "auto_schedule" => self.auto_schedule = value,
            "auto_image" => self.auto_image = value,
            "auto_hashtags" => self.auto_hashtags = value,
            other => tracing::warn!(key = other, "ignoring unknown automation setting"),
        }
    }
}

// -- Application State --------------------------------------------------------

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,

    pub campaigns: Store<CampaignId, CampaignRecord>,
    pub posts: Store<PostId, PostRecord>,
    pub assets: Store<AssetId, AssetRecord>,
    pub findings: Store<FindingId, FindingRecord>,
    pub settings: Arc<RwLock<AutomationSettings>>,
    pub publisher: Arc<RwLock<Option<PublisherCredentialsRecord>>>,

    pub collaborators: Collaborators,
    pub metrics: ApiMetrics,

    /// When `Some`, writes go through to Postgres.
    pub db_pool: Option<PgPool>,
}

/// A table that could not be loaded at startup.
#[derive(Debug, thiserror::Error)]
#[error("failed to load {table}")]
pub struct HydrateError {
    pub table: &'static str,
    #[source]
    pub source: sqlx::Error,
}

impl HydrateError {
    fn loading(table: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self { table, source }
    }
}

impl AppState {
    /// Default configuration, no database, no judgment collaborators, and
    /// an in-process publisher that records instead of posting.
    pub fn new() -> Self {
        Self::with_config(
            AppConfig::default(),
            Collaborators::offline(Arc::new(MockPublisher::new())),
            None,
        )
    }

    pub fn with_config(
        config: AppConfig,
        collaborators: Collaborators,
        db_pool: Option<PgPool>,
    ) -> Self {
        Self {
            config,
            campaigns: Store::new(),
            posts: Store::new(),
            assets: Store::new(),
            findings: Store::new(),
            settings: Arc::new(RwLock::new(AutomationSettings::default())),
            publisher: Arc::new(RwLock::new(None)),
            collaborators,
            metrics: ApiMetrics::new(),
            db_pool,
        }
    }

    /// Assets of one post, oldest first.
    pub fn assets_for(&self, post_id: PostId) -> Vec<AssetRecord> {
        let mut assets = self.assets.filter(|a| a.post_id == post_id);
        assets.sort_by_key(|a| a.id);
        assets
    }

    /// Publish times of scheduled posts not matched by `exclude`.
    pub fn occupied_slots(&self, exclude: impl Fn(&PostRecord) -> bool) -> Vec<DateTime<Utc>> {
        self.posts
            .filter(|p| p.status == PostStatus::Scheduled && !exclude(p))
            .into_iter()
            .map(|p| p.scheduled_at)
            .collect()
    }

    /// Pipeline options from the current toggles and configuration.
    pub fn pipeline_options(&self, now: DateTime<Utc>) -> PipelineOptions {
        let settings = *self.settings.read();
        PipelineOptions {
            auto_tag: settings.auto_hashtags,
            auto_image: settings.auto_image,
            auto_schedule: settings.auto_schedule,
            uploads_dir: Some(self.config.uploads_dir.clone()),
            slots: self.config.slots.clone(),
            now,
        }
    }

    /// Credentials usable for publishing, if any are stored.
    pub fn publisher_credentials(&self) -> Option<PublisherCredentials> {
        self.publisher.read().as_ref().map(PublisherCredentialsRecord::credentials)
    }

    /// Load every table from the database into the in-memory stores.
    pub async fn hydrate_from_db(&self) -> Result<(), HydrateError> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let campaigns = crate::db::campaigns::load_all(pool)
            .await
            .map_err(HydrateError::loading("campaigns"))?;
        let campaign_count = campaigns.len();
        for record in campaigns {
            self.campaigns.insert(record.id, record);
        }

        let posts = crate::db::posts::load_all(pool)
            .await
            .map_err(HydrateError::loading("posts"))?;
        let post_count = posts.len();
        for record in posts {
            self.posts.insert(record.id, record);
        }

        let assets = crate::db::assets::load_all(pool)
            .await
            .map_err(HydrateError::loading("assets"))?;
        let asset_count = assets.len();
        for record in assets {
            self.assets.insert(record.id, record);
        }

        let findings = crate::db::findings::load_all(pool)
            .await
            .map_err(HydrateError::loading("compliance findings"))?;
        let finding_count = findings.len();
        for record in findings {
            self.findings.insert(record.id, record);
        }

        let stored = crate::db::settings::load_all(pool)
            .await
            .map_err(HydrateError::loading("automation settings"))?;
        {
            let mut settings = self.settings.write();
            for (key, value) in stored {
                settings.set(&key, value);
            }
        }

        let credentials = crate::db::publisher::load(pool)
            .await
            .map_err(HydrateError::loading("publisher credentials"))?;
        let connected = credentials.is_some();
        *self.publisher.write() = credentials;

        tracing::info!(
            campaigns = campaign_count,
            posts = post_count,
            assets = asset_count,
            findings = finding_count,
            publisher_connected = connected,
            "Hydrated in-memory stores from database"
        );

        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
