//! In-memory verse corpus.
//!
//! Loaded once at startup and never mutated. Handlers share it through an
//! `Arc<VerseStore>` in application state.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::graph::{self, DeityGraph};
use super::record::{LocatorPart, VerseRecord};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read corpus {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse corpus {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Search requires a 'q' query parameter (e.g., /search?q=Agni).")]
    EmptyQuery,
}

/// Verses naming one deity, as served by `/api/hymns/deity/{name}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeitySummary<'a> {
    /// The name as requested, not as spelled in the corpus.
    pub deity: String,
    pub hymn_count: usize,
    pub hymns: Vec<VerseSummary<'a>>,
}

/// Locator and text of a verse, without its index lists.
#[derive(Debug, Serialize)]
pub struct VerseSummary<'a> {
    pub mandala: &'a LocatorPart,
    pub hymn: &'a LocatorPart,
    pub verse: &'a LocatorPart,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sanskrit: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<&'a str>,
}

impl<'a> From<&'a VerseRecord> for VerseSummary<'a> {
    fn from(r: &'a VerseRecord) -> Self {
        Self {
            mandala: &r.mandala,
            hymn: &r.hymn,
            verse: &r.verse,
            sanskrit: r.sanskrit.as_deref(),
            translation: r.translation.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VerseStore {
    records: Vec<VerseRecord>,
}

impl VerseStore {
    #[must_use]
    pub fn from_records(records: Vec<VerseRecord>) -> Self {
        Self { records }
    }

    /// Read a JSON array of verse records from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let txt = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let records = serde_json::from_str(&txt).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_records(records))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Entire corpus, in load order.
    #[must_use]
    pub fn all(&self) -> &[VerseRecord] {
        &self.records
    }

    #[must_use]
    pub fn by_mandala(&self, mandala: &str) -> Vec<&VerseRecord> {
        self.records
            .iter()
            .filter(|r| r.mandala.matches(mandala))
            .collect()
    }

    /// Case-insensitive substring match over keywords, deities, and themes.
    pub fn search(&self, query: &str) -> Result<Vec<&VerseRecord>, StoreError> {
        if query.is_empty() {
            return Err(StoreError::EmptyQuery);
        }
        let needle = query.to_lowercase();
        Ok(self.records.iter().filter(|r| r.mentions(&needle)).collect())
    }

    /// First record at the given locator.
    #[must_use]
    pub fn verse(&self, mandala: &str, hymn: &str, verse: &str) -> Option<&VerseRecord> {
        self.records.iter().find(|r| r.is_at(mandala, hymn, verse))
    }

    /// Exact, case-insensitive theme match.
    #[must_use]
    pub fn by_theme(&self, name: &str) -> Vec<&VerseRecord> {
        let lowered = name.to_lowercase();
        self.records.iter().filter(|r| r.has_theme(&lowered)).collect()
    }

    /// Exact, case-insensitive deity match; `None` if no verse names it.
    #[must_use]
    pub fn by_deity(&self, name: &str) -> Option<DeitySummary<'_>> {
        let lowered = name.to_lowercase();
        let hymns: Vec<VerseSummary<'_>> = self
            .records
            .iter()
            .filter(|r| r.has_deity(&lowered))
            .map(VerseSummary::from)
            .collect();

        (!hymns.is_empty()).then(|| DeitySummary {
            deity: name.to_string(),
            hymn_count: hymns.len(),
            hymns,
        })
    }

    /// Deity/verse graph over the whole corpus, rebuilt on every call.
    #[must_use]
    pub fn deity_graph(&self) -> DeityGraph {
        graph::build(&self.records)
    }
}
