//! # Storage Management Module
//!
//! ## Purpose
//! Handles persistent storage of case records using an embedded database,
//! with the category-scoped query surface the similarity ranker builds its
//! candidate pools from.
//!
//! ## Input/Output Specification
//! - **Input**: Case records, case IDs, category queries with caps
//! - **Output**: Persistent storage, retrieval operations, storage statistics
//! - **Storage**: Sled embedded database; record metadata and full text in
//!   separate trees, full text optionally gzip-compressed
//!
//! Full text is immutable once stored: records are inserted and deleted
//! whole, never patched, so the ranker always compares against the text the
//! case was created with.

use crate::config::StorageConfig;
use crate::errors::{MatchError, Result};
use crate::utils::TextUtils;
use crate::{CaseId, CaseRecord, CaseType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Words kept when deriving a summary from full text
const SUMMARY_PREVIEW_WORDS: usize = 40;

/// Persistent case record store
pub struct CaseStore {
    config: StorageConfig,
    db: Arc<sled::Db>,
    record_tree: Arc<sled::Tree>,
    text_tree: Arc<sled::Tree>,
    health_tree: Arc<sled::Tree>,
    stats: Arc<RwLock<StorageStats>>,
}

/// Storage statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageStats {
    pub total_cases: usize,
    pub database_size_bytes: u64,
}

/// Record metadata as persisted: everything except the full text, which
/// lives in its own tree so category scans stay cheap.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    id: CaseId,
    title: String,
    case_type: CaseType,
    court: String,
    year: Option<i32>,
    outcome: String,
    summary: String,
    relevant_laws: Vec<String>,
    cited_cases: Vec<String>,
    key_points: Vec<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl StoredRecord {
    fn from_record(record: &CaseRecord) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            case_type: record.case_type,
            court: record.court.clone(),
            year: record.year,
            outcome: record.outcome.clone(),
            summary: record.summary.clone(),
            relevant_laws: record.relevant_laws.clone(),
            cited_cases: record.cited_cases.clone(),
            key_points: record.key_points.clone(),
            created_at: record.created_at,
        }
    }

    fn into_record(self, full_text: String) -> CaseRecord {
        CaseRecord {
            id: self.id,
            title: self.title,
            case_type: self.case_type,
            court: self.court,
            year: self.year,
            outcome: self.outcome,
            summary: self.summary,
            full_text,
            relevant_laws: self.relevant_laws,
            cited_cases: self.cited_cases,
            key_points: self.key_points,
            created_at: self.created_at,
        }
    }
}

impl CaseStore {
    /// Open the store at the configured path
    pub fn open(config: StorageConfig) -> Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = sled::open(&config.db_path).map_err(|e| MatchError::StoreUnavailable {
            db_path: config.db_path.to_string_lossy().to_string(),
            reason: e.to_string(),
        })?;

        let record_tree = db
            .open_tree("case_records")
            .map_err(|e| MatchError::StoreUnavailable {
                db_path: config.db_path.to_string_lossy().to_string(),
                reason: format!("Failed to open record tree: {}", e),
            })?;

        let text_tree = db
            .open_tree("case_text")
            .map_err(|e| MatchError::StoreUnavailable {
                db_path: config.db_path.to_string_lossy().to_string(),
                reason: format!("Failed to open text tree: {}", e),
            })?;

        // Dedicated tree for health probes so the record tree only ever
        // holds bincode-encoded records.
        let health_tree = db
            .open_tree("health")
            .map_err(|e| MatchError::StoreUnavailable {
                db_path: config.db_path.to_string_lossy().to_string(),
                reason: format!("Failed to open health tree: {}", e),
            })?;

        let stats = Arc::new(RwLock::new(StorageStats {
            total_cases: record_tree.len(),
            database_size_bytes: 0,
        }));

        let store = Self {
            config,
            db: Arc::new(db),
            record_tree: Arc::new(record_tree),
            text_tree: Arc::new(text_tree),
            health_tree: Arc::new(health_tree),
            stats,
        };

        tracing::info!(
            "Case store opened with {} cases",
            store.record_tree.len()
        );

        Ok(store)
    }

    /// Insert a case record.
    ///
    /// Derives the summary from the full text when none was supplied. The
    /// full text itself is stored as-is and never rewritten.
    pub async fn insert(&self, mut record: CaseRecord) -> Result<CaseRecord> {
        if record.summary.trim().is_empty() {
            record.summary = TextUtils::extract_preview(&record.full_text, SUMMARY_PREVIEW_WORDS);
        }

        let key = record.id.to_string();
        let stored = StoredRecord::from_record(&record);
        let value = bincode::serialize(&stored)?;

        let text_data = if self.config.enable_compression {
            self.compress_text(&record.full_text)?
        } else {
            record.full_text.as_bytes().to_vec()
        };

        self.record_tree.insert(key.as_bytes(), value)?;
        self.text_tree.insert(key.as_bytes(), text_data)?;

        let mut stats = self.stats.write().await;
        stats.total_cases = self.record_tree.len();

        tracing::debug!(
            "Stored case '{}' ({}, {} chars)",
            record.title,
            record.case_type,
            record.full_text.len()
        );
        Ok(record)
    }

    /// Retrieve a case by ID
    pub fn get(&self, case_id: &CaseId) -> Result<Option<CaseRecord>> {
        let key = case_id.to_string();

        let Some(value) = self.record_tree.get(key.as_bytes())? else {
            return Ok(None);
        };

        let stored: StoredRecord = bincode::deserialize(&value)?;
        let full_text = self.load_text(&key)?;
        Ok(Some(stored.into_record(full_text)))
    }

    /// Delete a case by ID. Returns false when the case did not exist.
    pub fn delete(&self, case_id: &CaseId) -> Result<bool> {
        let key = case_id.to_string();

        let existed = self.record_tree.remove(key.as_bytes())?.is_some();
        self.text_tree.remove(key.as_bytes())?;

        if existed {
            tracing::info!("Deleted case: {}", case_id);
        }
        Ok(existed)
    }

    /// Number of stored cases
    pub fn count(&self) -> usize {
        self.record_tree.len()
    }

    /// Fetch up to `cap` records of the given type, in tree iteration order
    pub fn find_by_type(&self, case_type: CaseType, cap: usize) -> Result<Vec<CaseRecord>> {
        self.scan(cap, |stored| stored.case_type == case_type)
    }

    /// Fetch up to `cap` records of any *other* type, in tree iteration order
    pub fn find_excluding_type(&self, case_type: CaseType, cap: usize) -> Result<Vec<CaseRecord>> {
        self.scan(cap, |stored| stored.case_type != case_type)
    }

    fn scan<F>(&self, cap: usize, keep: F) -> Result<Vec<CaseRecord>>
    where
        F: Fn(&StoredRecord) -> bool,
    {
        let mut records = Vec::new();

        for entry in self.record_tree.iter() {
            if records.len() >= cap {
                break;
            }

            let (key, value) = entry?;
            let stored: StoredRecord = bincode::deserialize(&value)?;
            if !keep(&stored) {
                continue;
            }

            let key_str = String::from_utf8(key.to_vec()).map_err(|e| MatchError::Internal {
                message: format!("Invalid record key: {}", e),
            })?;
            let full_text = self.load_text(&key_str)?;
            records.push(stored.into_record(full_text));
        }

        Ok(records)
    }

    fn load_text(&self, key: &str) -> Result<String> {
        let Some(data) = self.text_tree.get(key.as_bytes())? else {
            return Ok(String::new());
        };

        if self.config.enable_compression {
            self.decompress_text(&data)
        } else {
            String::from_utf8(data.to_vec()).map_err(|e| MatchError::Internal {
                message: format!("Stored text is not valid UTF-8: {}", e),
            })
        }
    }

    fn compress_text(&self, text: &str) -> Result<Vec<u8>> {
        use std::io::Write;

        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(text.as_bytes())?;
        Ok(encoder.finish()?)
    }

    fn decompress_text(&self, data: &[u8]) -> Result<String> {
        use std::io::Read;

        let mut decoder = flate2::read::GzDecoder::new(data);
        let mut decompressed = String::new();
        decoder.read_to_string(&mut decompressed)?;
        Ok(decompressed)
    }

    /// Get storage statistics
    pub async fn stats(&self) -> Result<StorageStats> {
        let mut stats = self.stats.write().await;
        stats.total_cases = self.record_tree.len();
        stats.database_size_bytes = self.db.size_on_disk()?;
        Ok(stats.clone())
    }

    /// Health check: exercises a write/read/delete round trip against a
    /// dedicated tree, leaving the record tree untouched
    pub fn health_check(&self) -> Result<()> {
        let test_key = b"health_check";

        self.health_tree.insert(test_key, b"ok")?;
        let result = self.health_tree.get(test_key)?;
        if result.is_none() {
            return Err(MatchError::StoreUnavailable {
                db_path: self.config.db_path.to_string_lossy().to_string(),
                reason: "Health check value not found".to_string(),
            });
        }
        self.health_tree.remove(test_key)?;

        Ok(())
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn temp_store() -> (CaseStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = CaseStore::open(StorageConfig {
            db_path: dir.path().join("cases.db"),
            enable_compression: true,
        })
        .unwrap();
        (store, dir)
    }

    fn record(title: &str, case_type: CaseType, full_text: &str) -> CaseRecord {
        CaseRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
            case_type,
            court: "High Court".to_string(),
            year: Some(2021),
            outcome: String::new(),
            summary: String::new(),
            full_text: full_text.to_string(),
            relevant_laws: vec!["Act 1 s. 2".to_string()],
            cited_cases: vec![],
            key_points: vec![],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_get_delete_round_trip() {
        let (store, _dir) = temp_store();
        let rec = record("Breach claim", CaseType::Civil, "contract dispute breach of terms");
        let id = rec.id;

        store.insert(rec).await.unwrap();
        assert_eq!(store.count(), 1);

        let loaded = store.get(&id).unwrap().unwrap();
        assert_eq!(loaded.title, "Breach claim");
        assert_eq!(loaded.case_type, CaseType::Civil);
        assert_eq!(loaded.full_text, "contract dispute breach of terms");
        assert_eq!(loaded.relevant_laws, vec!["Act 1 s. 2".to_string()]);

        assert!(store.delete(&id).unwrap());
        assert!(store.get(&id).unwrap().is_none());
        assert!(!store.delete(&id).unwrap());
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn summary_is_derived_when_missing() {
        let (store, _dir) = temp_store();
        let rec = record("T", CaseType::Family, "custody of the minor child was awarded");
        let id = rec.id;

        store.insert(rec).await.unwrap();
        let loaded = store.get(&id).unwrap().unwrap();
        assert!(loaded.summary.starts_with("custody of the minor"));
    }

    #[tokio::test]
    async fn supplied_summary_is_preserved() {
        let (store, _dir) = temp_store();
        let mut rec = record("T", CaseType::Family, "full body text");
        rec.summary = "hand-written summary".to_string();
        let id = rec.id;

        store.insert(rec).await.unwrap();
        let loaded = store.get(&id).unwrap().unwrap();
        assert_eq!(loaded.summary, "hand-written summary");
    }

    #[tokio::test]
    async fn type_queries_respect_caps_and_exclusion() {
        let (store, _dir) = temp_store();
        for i in 0..5 {
            store
                .insert(record(&format!("L{i}"), CaseType::Labour, "wage dismissal"))
                .await
                .unwrap();
        }
        for i in 0..3 {
            store
                .insert(record(&format!("C{i}"), CaseType::Criminal, "theft accused"))
                .await
                .unwrap();
        }

        let labour = store.find_by_type(CaseType::Labour, 100).unwrap();
        assert_eq!(labour.len(), 5);
        assert!(labour.iter().all(|r| r.case_type == CaseType::Labour));

        let capped = store.find_by_type(CaseType::Labour, 2).unwrap();
        assert_eq!(capped.len(), 2);

        let others = store.find_excluding_type(CaseType::Labour, 50).unwrap();
        assert_eq!(others.len(), 3);
        assert!(others.iter().all(|r| r.case_type != CaseType::Labour));
    }

    #[tokio::test]
    async fn compressed_text_survives_round_trip() {
        let (store, _dir) = temp_store();
        let long_text = "industrial dispute adjudication ".repeat(500);
        let rec = record("Long", CaseType::Labour, &long_text);
        let id = rec.id;

        store.insert(rec).await.unwrap();
        let loaded = store.get(&id).unwrap().unwrap();
        assert_eq!(loaded.full_text, long_text);
    }

    #[tokio::test]
    async fn health_check_passes_on_fresh_store() {
        let (store, _dir) = temp_store();
        store.health_check().unwrap();
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_cases, 0);
    }

    #[tokio::test]
    async fn health_check_never_touches_case_records() {
        let (store, _dir) = temp_store();
        store
            .insert(record("Only", CaseType::Criminal, "theft accused"))
            .await
            .unwrap();

        // Record scans must keep decoding cleanly no matter how often the
        // health probe runs alongside them.
        for _ in 0..50 {
            store.health_check().unwrap();
            let all = store.find_excluding_type(CaseType::Civil, 100).unwrap();
            assert_eq!(all.len(), 1);
            assert_eq!(store.count(), 1);
        }
        assert!(store.record_tree.get(b"health_check").unwrap().is_none());
    }
}
