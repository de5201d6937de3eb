//! Calculation history and user settings.

use serde::{Deserialize, Serialize};

use super::{HISTORY_KEY, KeyValueStore, SETTINGS_KEY, load_json, save_json};

/// Most entries kept in the history log.
pub const HISTORY_LIMIT: usize = 20;

pub const DEFAULT_PRECISION: u8 = 14;
pub const MAX_PRECISION: u8 = 14;

/// One past calculation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    /// What the user typed, before normalization.
    #[serde(rename = "expression")]
    pub input: String,
    pub result: String,
}

impl HistoryItem {
    pub fn new(input: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            result: result.into(),
        }
    }
}

/// Most-recent-first log capped at [`HISTORY_LIMIT`] entries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    items: Vec<HistoryItem>,
}

impl History {
    pub fn record(&mut self, item: HistoryItem) {
        self.items.insert(0, item);
        self.items.truncate(HISTORY_LIMIT);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn latest(&self) -> Option<&HistoryItem> {
        self.items.first()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Significant digits in formatted results, `0..=14`.
    pub precision: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
        }
    }
}

/// History and settings, loaded once and written back on every change.
pub struct HistoryStore<S> {
    store: S,
    history: History,
    settings: Settings,
}

impl<S: KeyValueStore> HistoryStore<S> {
    /// Load both values from `store`. Absent keys give an empty history
    /// and the default precision.
    pub fn load(store: S) -> Self {
        let mut history: History = load_json(&store, HISTORY_KEY).unwrap_or_default();
        history.items.truncate(HISTORY_LIMIT);

        let mut settings: Settings = load_json(&store, SETTINGS_KEY).unwrap_or_default();
        settings.precision = settings.precision.min(MAX_PRECISION);

        Self {
            store,
            history,
            settings,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn record(&mut self, item: HistoryItem) {
        self.history.record(item);
        save_json(&self.store, HISTORY_KEY, &self.history);
    }

    pub fn clear(&mut self) {
        self.history.clear();
        save_json(&self.store, HISTORY_KEY, &self.history);
    }

    /// Values above [`MAX_PRECISION`] are clamped.
    pub fn set_precision(&mut self, precision: u8) {
        self.settings.precision = precision.min(MAX_PRECISION);
        save_json(&self.store, SETTINGS_KEY, &self.settings);
    }
}
