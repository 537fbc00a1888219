use std::{future::Future, ops::Deref, path::PathBuf};

use anyhow::Result;
use tracing::{debug, warn};

use crate::fs::operations::{read_if_exists, write_atomically};

use super::entities::TrackerState;

/// Name of the slot holding the whole application state.
pub const STATE_FILE_NAME: &str = "timeio_state_v2.json";

/// Interface for abstracting the persisted slot. The slot holds a single serialized blob that is
/// always overwritten as a whole.
pub trait StateStorage {
    /// Returns the stored blob, or [None] if nothing was saved yet.
    fn read_blob(&self) -> impl Future<Output = Result<Option<String>>>;

    fn write_blob(&self, blob: String) -> impl Future<Output = Result<()>>;
}

impl<T: Deref> StateStorage for T
where
    T::Target: StateStorage,
{
    fn read_blob(&self) -> impl Future<Output = Result<Option<String>>> {
        self.deref().read_blob()
    }

    fn write_blob(&self, blob: String) -> impl Future<Output = Result<()>> {
        self.deref().write_blob(blob)
    }
}

/// Loads the state, falling back to defaults when nothing is stored or the stored blob can't be
/// parsed. Fields absent from the blob take their default values.
pub async fn load_state(storage: &impl StateStorage) -> Result<TrackerState> {
    let Some(blob) = storage.read_blob().await? else {
        debug!("No stored state, using defaults");
        return Ok(TrackerState::default());
    };
    Ok(parse_state(&blob))
}

fn parse_state(blob: &str) -> TrackerState {
    match serde_json::from_str::<TrackerState>(blob) {
        Ok(state) => state,
        Err(e) => {
            warn!("Stored state is malformed, falling back to defaults: {e}");
            TrackerState::default()
        }
    }
}

pub async fn save_state(storage: &impl StateStorage, state: &TrackerState) -> Result<()> {
    let blob = serde_json::to_string(state)?;
    storage.write_blob(blob).await
}

/// The main realization of [StateStorage], backed by a json file in the application directory.
pub struct StateFileStorage {
    path: PathBuf,
}

impl StateFileStorage {
    pub fn new(app_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&app_dir)?;

        Ok(Self {
            path: app_dir.join(STATE_FILE_NAME),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl StateStorage for StateFileStorage {
    async fn read_blob(&self) -> Result<Option<String>> {
        read_if_exists(&self.path).await
    }

    async fn write_blob(&self, blob: String) -> Result<()> {
        write_atomically(&self.path, blob.as_bytes()).await
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use chrono::{NaiveDate, TimeZone, Utc};
    use tempfile::tempdir;

    use crate::tracking::storage::entities::{
        ActivityKind, ActivitySegmentEntity, OngoingActivityEntity, TrackerState,
    };

    use super::{
        load_state, memory::MemoryStateStorage, save_state, StateFileStorage, STATE_FILE_NAME,
    };

    fn sample_state() -> TrackerState {
        let start = Utc.with_ymd_and_hms(2018, 7, 4, 8, 0, 0).unwrap();
        TrackerState {
            total_balance_minutes: -190,
            projects: vec!["Main Project".into(), "Ops".into()],
            current_activity: Some(OngoingActivityEntity {
                kind: ActivityKind::Break,
                name: "Coffee / Lunch".into(),
                start: Utc.with_ymd_and_hms(2018, 7, 4, 12, 0, 0).unwrap(),
            }),
            daily_logs: vec![ActivitySegmentEntity {
                kind: ActivityKind::Project,
                name: "Ops".into(),
                start,
                end: Utc.with_ymd_and_hms(2018, 7, 4, 12, 0, 0).unwrap(),
            }],
            last_log_date: NaiveDate::from_ymd_opt(2018, 7, 4),
            current_project: Some("Ops".into()),
            history: vec![],
        }
    }

    #[tokio::test]
    async fn test_load_without_blob_gives_defaults() -> Result<()> {
        let storage = MemoryStateStorage::default();

        assert_eq!(load_state(&storage).await?, TrackerState::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_load_malformed_gives_defaults() -> Result<()> {
        for blob in ["{not json", "[]", r#"{"totalBalanceMinutes": "lots"}"#] {
            let storage = MemoryStateStorage::with_blob(blob);
            assert_eq!(load_state(&storage).await?, TrackerState::default());
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_save_then_load_is_equal() -> Result<()> {
        let storage = MemoryStateStorage::default();
        let state = sample_state();

        save_state(&storage, &state).await?;

        assert_eq!(load_state(&storage).await?, state);
        assert_eq!(storage.writes(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_file_storage_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let storage = Arc::new(StateFileStorage::new(dir.path().join("nested"))?);
        let state = sample_state();

        save_state(&storage, &state).await?;

        assert!(dir.path().join("nested").join(STATE_FILE_NAME).exists());
        assert_eq!(load_state(&storage).await?, state);
        Ok(())
    }
}
