//! Task sources that trigger key rolls.
use serde::{Deserialize, Serialize};

const DEFAULT_SOURCE_DATA: &str = include_str!("../assets/data/sources.json");

/// An activity whose completion rolls for a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSource {
    pub id: String,
    /// Label written to the history log.
    pub label: String,
    /// Success chance in percent, used directly as the roll threshold.
    pub chance: u32,
}

/// Table of all task sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TaskSources {
    pub sources: Vec<TaskSource>,
}

impl TaskSources {
    /// Load task source data from JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a source table.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Source table shipped with the crate; empty if the asset is unreadable.
    #[must_use]
    pub fn bundled() -> Self {
        Self::from_json(DEFAULT_SOURCE_DATA).unwrap_or_else(|err| {
            log::error!("bundled task sources failed to parse: {err}");
            Self::default()
        })
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&TaskSource> {
        self.sources.iter().find(|source| source.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskSource> {
        self.sources.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
