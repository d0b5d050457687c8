//! Persistence of run results
//!
//! Every run writes versioned tables, then publishes them under stable names
//! that always point at the latest complete run.

use crate::data::RunId;
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Maps a stable read name to the versioned table it exposes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    pub stable_name: String,
    pub table: String,
}

impl Publication {
    pub fn new(stable_name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            stable_name: stable_name.into(),
            table: table.into(),
        }
    }
}

/// Destination for result tables
pub trait ResultSink {
    /// Replace the whole contents of a table
    fn replace_table<T: Serialize>(&mut self, name: &str, rows: &[T]) -> Result<()>;

    /// Point each stable name at its table; readers must never see a partial run
    fn publish_latest(&mut self, run_id: &RunId, publications: &[Publication]) -> Result<()>;
}

/// Record of the latest published run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub published_at: DateTime<Utc>,
    /// Stable name to versioned table
    pub tables: BTreeMap<String, String>,
}

/// Writes tables as CSV files in one directory
///
/// Each file is written to a temporary name and renamed into place. Publishing
/// stages every stable copy and the `latest_run.json` manifest first, then
/// swaps them in; a failed swap restores the files of the previous run.
#[derive(Debug, Clone)]
pub struct CsvDirectorySink {
    dir: PathBuf,
}

pub const MANIFEST_FILE: &str = "latest_run.json";

/// A staged file waiting to replace `target`
#[derive(Debug)]
struct Swap {
    staged: PathBuf,
    target: PathBuf,
    backup: PathBuf,
}

impl Swap {
    /// Move the current target aside and the staged file into place.
    /// Returns whether a previous target was kept as backup.
    fn apply(&self) -> Result<bool> {
        let had_previous = self.target.is_file();
        if had_previous {
            fs::rename(&self.target, &self.backup).map_err(|e| {
                ForecastError::SinkError(format!(
                    "Cannot move {} aside: {}",
                    self.target.display(),
                    e
                ))
            })?;
        }

        if let Err(e) = fs::rename(&self.staged, &self.target) {
            if had_previous {
                self.restore(true);
            }
            return Err(ForecastError::SinkError(format!(
                "Cannot move {} into place: {}",
                self.target.display(),
                e
            )));
        }
        Ok(had_previous)
    }

    fn restore(&self, had_previous: bool) {
        let restored = if had_previous {
            fs::rename(&self.backup, &self.target)
        } else {
            fs::remove_file(&self.target)
        };
        if let Err(e) = restored {
            warn!(path = %self.target.display(), error = %e, "cannot restore previous file");
        }
    }
}

impl CsvDirectorySink {
    /// Use `dir` as output directory, creating it if needed
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn table_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }

    fn temp_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!(".{}.tmp", name))
    }

    fn backup_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!(".{}.bak", name))
    }

    /// Read the manifest of the latest published run
    pub fn read_manifest(&self) -> Result<RunManifest> {
        let text = fs::read_to_string(self.dir.join(MANIFEST_FILE))?;
        Ok(serde_json::from_str(&text)?)
    }

    fn rename_into_place(&self, temp: &Path, target: &Path) -> Result<()> {
        fs::rename(temp, target).map_err(|e| {
            ForecastError::SinkError(format!("Cannot move {} into place: {}", target.display(), e))
        })
    }

    fn swap_for(&self, name: &str, target: PathBuf) -> Result<Swap> {
        if target.exists() && !target.is_file() {
            return Err(ForecastError::SinkError(format!(
                "Cannot replace {}: not a regular file",
                target.display()
            )));
        }
        Ok(Swap {
            staged: self.temp_path(name),
            target,
            backup: self.backup_path(name),
        })
    }

    /// Write every stable copy and the manifest to temporary files
    fn stage(
        &self,
        run_id: &RunId,
        publications: &[Publication],
        swaps: &mut Vec<Swap>,
    ) -> Result<()> {
        let mut tables = BTreeMap::new();

        for publication in publications {
            let source = self.table_path(&publication.table);
            if !source.is_file() {
                return Err(ForecastError::SinkError(format!(
                    "Cannot publish missing table '{}'",
                    publication.table
                )));
            }
            let swap = self.swap_for(
                &publication.stable_name,
                self.table_path(&publication.stable_name),
            )?;
            let staged = swap.staged.clone();
            swaps.push(swap);
            fs::copy(&source, &staged)?;
            tables.insert(publication.stable_name.clone(), publication.table.clone());
        }

        let manifest = RunManifest {
            run_id: run_id.clone(),
            published_at: Utc::now(),
            tables,
        };
        let swap = self.swap_for(MANIFEST_FILE, self.dir.join(MANIFEST_FILE))?;
        let staged = swap.staged.clone();
        swaps.push(swap);
        fs::write(&staged, serde_json::to_string_pretty(&manifest)?)?;
        Ok(())
    }

    /// Swap every staged file in, or none of them
    fn commit(swaps: &[Swap]) -> Result<()> {
        let mut applied: Vec<(&Swap, bool)> = Vec::with_capacity(swaps.len());

        for swap in swaps {
            match swap.apply() {
                Ok(had_previous) => applied.push((swap, had_previous)),
                Err(e) => {
                    for (done, had_previous) in applied.iter().rev() {
                        done.restore(*had_previous);
                    }
                    return Err(e);
                }
            }
        }

        for (swap, had_previous) in applied {
            if had_previous {
                if let Err(e) = fs::remove_file(&swap.backup) {
                    debug!(backup = %swap.backup.display(), error = %e, "stale backup left");
                }
            }
        }
        Ok(())
    }
}

/// Remove staged files that were never swapped in
fn discard(swaps: &[Swap]) {
    for swap in swaps.iter().filter(|s| s.staged.exists()) {
        if let Err(e) = fs::remove_file(&swap.staged) {
            debug!(staged = %swap.staged.display(), error = %e, "staged file left");
        }
    }
}

impl ResultSink for CsvDirectorySink {
    fn replace_table<T: Serialize>(&mut self, name: &str, rows: &[T]) -> Result<()> {
        let temp = self.temp_path(name);
        {
            let mut writer = csv::Writer::from_path(&temp)?;
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        self.rename_into_place(&temp, &self.table_path(name))?;

        debug!(table = name, rows = rows.len(), "table written");
        Ok(())
    }

    fn publish_latest(&mut self, run_id: &RunId, publications: &[Publication]) -> Result<()> {
        let mut swaps = Vec::with_capacity(publications.len() + 1);

        let published = self
            .stage(run_id, publications, &mut swaps)
            .and_then(|()| Self::commit(&swaps));
        if let Err(e) = published {
            discard(&swaps);
            warn!(run_id = %run_id, error = %e, "publication rolled back");
            return Err(e);
        }

        info!(run_id = %run_id, dir = %self.dir.display(), "published latest run");
        Ok(())
    }
}

/// In-memory sink holding rows as JSON values
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    tables: BTreeMap<String, Vec<serde_json::Value>>,
    latest: BTreeMap<String, String>,
    latest_run: Option<RunId>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&[serde_json::Value]> {
        self.tables.get(name).map(Vec::as_slice)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Rows behind a stable name
    pub fn latest(&self, stable_name: &str) -> Option<&[serde_json::Value]> {
        self.latest
            .get(stable_name)
            .and_then(|table| self.table(table))
    }

    pub fn latest_run(&self) -> Option<&RunId> {
        self.latest_run.as_ref()
    }
}

impl ResultSink for MemorySink {
    fn replace_table<T: Serialize>(&mut self, name: &str, rows: &[T]) -> Result<()> {
        let values = rows
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.tables.insert(name.to_string(), values);
        Ok(())
    }

    fn publish_latest(&mut self, run_id: &RunId, publications: &[Publication]) -> Result<()> {
        if let Some(missing) = publications
            .iter()
            .find(|p| !self.tables.contains_key(&p.table))
        {
            return Err(ForecastError::SinkError(format!(
                "Cannot publish missing table '{}'",
                missing.table
            )));
        }

        for publication in publications {
            self.latest
                .insert(publication.stable_name.clone(), publication.table.clone());
        }
        self.latest_run = Some(run_id.clone());
        Ok(())
    }
}
