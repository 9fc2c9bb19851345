//! Bounded, dated history storage
//!
//! Repositories keep at most `retention` distinct dates. Every `put` evicts the oldest
//! dates beyond that limit, so the retention policy holds after each write rather than
//! depending on a later cleanup.

use chrono::{Days, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::error::{HistoryError, Result};

/// Mineral intake for one day, as consumed by deficit streak checks (mg)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MineralSnapshot {
    pub na: f64,
    pub k: f64,
    pub mg: f64,
}

/// Day-level flags kept alongside the mineral history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayFlags {
    /// Dinner digestive load was classified heavy
    pub heavy_dinner: bool,
}

/// Storage for dated records with an explicit keep-last-N retention contract
pub trait HistoryRepository {
    type Record: Clone;

    /// Records whose date falls in `range`, oldest first
    fn get(&self, range: RangeInclusive<NaiveDate>) -> Vec<(NaiveDate, Self::Record)>;

    /// Insert or replace the record for `date`, then evict beyond retention
    fn put(&mut self, date: NaiveDate, record: Self::Record) -> Result<()>;

    /// Maximum number of dates kept
    fn retention(&self) -> usize;
}

/// History kept in memory only
#[derive(Debug, Clone)]
pub struct InMemoryHistory<T> {
    entries: BTreeMap<NaiveDate, T>,
    retention: usize,
}

impl<T> InMemoryHistory<T> {
    pub fn new(retention: usize) -> Result<Self> {
        if retention == 0 {
            return Err(HistoryError::InvalidRetention { retention }.into());
        }
        Ok(Self {
            entries: BTreeMap::new(),
            retention,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn evict_oldest<T>(entries: &mut BTreeMap<NaiveDate, T>, retention: usize) {
    while entries.len() > retention {
        if let Some((date, _)) = entries.pop_first() {
            tracing::debug!(%date, retention, "Evicted history entry");
        }
    }
}

fn collect_range<T: Clone>(
    entries: &BTreeMap<NaiveDate, T>,
    range: RangeInclusive<NaiveDate>,
) -> Vec<(NaiveDate, T)> {
    if range.start() > range.end() {
        return Vec::new();
    }
    entries
        .range(range)
        .map(|(date, record)| (*date, record.clone()))
        .collect()
}

impl<T: Clone> HistoryRepository for InMemoryHistory<T> {
    type Record = T;

    fn get(&self, range: RangeInclusive<NaiveDate>) -> Vec<(NaiveDate, T)> {
        collect_range(&self.entries, range)
    }

    fn put(&mut self, date: NaiveDate, record: T) -> Result<()> {
        self.entries.insert(date, record);
        evict_oldest(&mut self.entries, self.retention);
        Ok(())
    }

    fn retention(&self) -> usize {
        self.retention
    }
}

/// History persisted as a JSON object keyed by ISO date
#[derive(Debug, Clone)]
pub struct JsonFileHistory<T> {
    path: PathBuf,
    entries: BTreeMap<NaiveDate, T>,
    retention: usize,
}

impl<T> JsonFileHistory<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    /// Open a history file, starting empty when it does not exist yet
    pub fn open(path: impl AsRef<Path>, retention: usize) -> Result<Self> {
        if retention == 0 {
            return Err(HistoryError::InvalidRetention { retention }.into());
        }
        let path = path.as_ref().to_path_buf();

        let mut entries: BTreeMap<NaiveDate, T> = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content).map_err(|e| HistoryError::Unreadable {
                path: path.clone(),
                reason: e.to_string(),
            })?
        } else {
            BTreeMap::new()
        };
        evict_oldest(&mut entries, retention);

        tracing::debug!(path = %path.display(), entries = entries.len(), "Opened history file");
        Ok(Self {
            path,
            entries,
            retention,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        let write_failed = |reason: String| HistoryError::WriteFailed {
            path: self.path.clone(),
            reason,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_failed(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json).map_err(|e| write_failed(e.to_string()))?;
        Ok(())
    }
}

impl<T> HistoryRepository for JsonFileHistory<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    type Record = T;

    fn get(&self, range: RangeInclusive<NaiveDate>) -> Vec<(NaiveDate, T)> {
        collect_range(&self.entries, range)
    }

    fn put(&mut self, date: NaiveDate, record: T) -> Result<()> {
        self.entries.insert(date, record);
        evict_oldest(&mut self.entries, self.retention);
        self.flush()
    }

    fn retention(&self) -> usize {
        self.retention
    }
}

/// Snapshot of the days before `today` covered by the repository's retention,
/// in the shape consumed by [`crate::ratios::deficit_streak`].
pub fn mineral_window<R>(repo: &R, today: NaiveDate) -> BTreeMap<NaiveDate, MineralSnapshot>
where
    R: HistoryRepository<Record = MineralSnapshot>,
{
    let Some(end) = today.pred_opt() else {
        return BTreeMap::new();
    };
    let start = end
        .checked_sub_days(Days::new(repo.retention().saturating_sub(1) as u64))
        .unwrap_or(NaiveDate::MIN);

    repo.get(start..=end).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn snapshot(k: f64) -> MineralSnapshot {
        MineralSnapshot {
            na: 2000.0,
            k,
            mg: 400.0,
        }
    }

    #[test]
    fn test_zero_retention_rejected() {
        assert!(InMemoryHistory::<MineralSnapshot>::new(0).is_err());
    }

    #[test]
    fn test_retention_keeps_last_n_dates() {
        let mut repo = InMemoryHistory::new(7).unwrap();
        for day in 1..=10 {
            repo.put(date(day), snapshot(f64::from(day))).unwrap();
        }

        assert_eq!(repo.len(), 7);
        let all = repo.get(date(1)..=date(30));
        assert_eq!(all.first().map(|(d, _)| *d), Some(date(4)));
        assert_eq!(all.last().map(|(d, _)| *d), Some(date(10)));
    }

    #[test]
    fn test_put_replaces_same_date() {
        let mut repo = InMemoryHistory::new(3).unwrap();
        repo.put(date(1), DayFlags { heavy_dinner: false }).unwrap();
        repo.put(date(1), DayFlags { heavy_dinner: true }).unwrap();

        let flags = repo.get(date(1)..=date(1));
        assert_eq!(flags, vec![(date(1), DayFlags { heavy_dinner: true })]);
    }

    #[test]
    fn test_mineral_window_excludes_today() {
        let mut repo = InMemoryHistory::new(7).unwrap();
        repo.put(date(8), snapshot(3000.0)).unwrap();
        repo.put(date(9), snapshot(3100.0)).unwrap();
        repo.put(date(10), snapshot(3200.0)).unwrap();

        let window = mineral_window(&repo, date(10));
        assert_eq!(window.len(), 2);
        assert!(!window.contains_key(&date(10)));
    }

    #[test]
    fn test_json_history_persists_and_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history").join("minerals.json");

        {
            let mut repo = JsonFileHistory::open(&path, 2).unwrap();
            repo.put(date(1), snapshot(3000.0)).unwrap();
            repo.put(date(2), snapshot(3100.0)).unwrap();
            repo.put(date(3), snapshot(3200.0)).unwrap();
        }

        let repo: JsonFileHistory<MineralSnapshot> = JsonFileHistory::open(&path, 2).unwrap();
        let entries = repo.get(date(1)..=date(3));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], (date(2), snapshot(3100.0)));
    }

    #[test]
    fn test_json_history_rejects_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("minerals.json");
        fs::write(&path, "{ not json").unwrap();

        let result = JsonFileHistory::<MineralSnapshot>::open(&path, 7);
        assert!(matches!(
            result,
            Err(crate::error::VitalError::History(HistoryError::Unreadable { .. }))
        ));
    }
}
