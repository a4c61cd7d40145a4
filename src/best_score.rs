use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::app_dirs::AppDirs;

/// Persisted best score. Reads never fail: anything unreadable is 0.
pub trait BestScoreStore {
    fn get(&self) -> u32;
    fn set(&mut self, score: u32) -> io::Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BestScoreRecord {
    pub best_score: u32,
    pub achieved_at: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct FileBestScoreStore {
    path: PathBuf,
}

impl FileBestScoreStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::best_score_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn record(&self) -> Option<BestScoreRecord> {
        let bytes = fs::read(&self.path).ok()?;
        serde_json::from_slice::<BestScoreRecord>(&bytes).ok()
    }
}

impl Default for FileBestScoreStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BestScoreStore for FileBestScoreStore {
    fn get(&self) -> u32 {
        self.record().map_or(0, |r| r.best_score)
    }

    fn set(&mut self, score: u32) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let record = BestScoreRecord {
            best_score: score,
            achieved_at: Local::now(),
        };
        let data = serde_json::to_vec_pretty(&record)?;
        fs::write(&self.path, data)
    }
}

/// In-memory store; clones share the value
#[derive(Debug, Clone, Default)]
pub struct MemoryBestScoreStore {
    value: Rc<Cell<u32>>,
}

impl MemoryBestScoreStore {
    pub fn new(initial: u32) -> Self {
        Self {
            value: Rc::new(Cell::new(initial)),
        }
    }
}

impl BestScoreStore for MemoryBestScoreStore {
    fn get(&self) -> u32 {
        self.value.get()
    }

    fn set(&mut self, score: u32) -> io::Result<()> {
        self.value.set(score);
        Ok(())
    }
}
