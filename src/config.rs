//! Construction-time configuration: grid size, kind set, score table and timers.
use crate::engine::TokenKind;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

/// Maps a match-group size to the points it is worth.
///
/// Sizes without an entry use the entry of the largest smaller size, so a group of six
/// scores like a group of five under the default table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreTable(BTreeMap<usize, u32>);

impl ScoreTable {
    pub fn new(entries: impl IntoIterator<Item = (usize, u32)>) -> Self {
        ScoreTable(entries.into_iter().collect())
    }

    /// Points for a group of `size` tiles; 0 when `size` is below every entry.
    ///
    /// # Examples
    /// ```
    /// use match3_engine::config::ScoreTable;
    /// let table = ScoreTable::new([(3, 100), (4, 200), (5, 500)]);
    /// assert_eq!(table.score_for(4), 200);
    /// assert_eq!(table.score_for(7), 500);
    /// assert_eq!(table.score_for(2), 0);
    /// ```
    pub fn score_for(&self, size: usize) -> u32 {
        self.0
            .range(..=size)
            .next_back()
            .map(|(_, &points)| points)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ScoreTable {
    fn default() -> Self {
        ScoreTable::new([(3, 100), (4, 200), (5, 500)])
    }
}

/// Everything the engine consumes from the outside, injected at construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub width: usize,
    pub height: usize,
    /// Kinds used for every random draw (initial fill, refill, reshuffle).
    pub kinds: Vec<TokenKind>,
    pub score_table: ScoreTable,
    /// Idle time before a hint search runs.
    pub hint_delay_ms: u64,
    /// Random reshuffle attempts before the fixed fallback layout is used.
    pub max_reshuffle_attempts: u32,
    /// Score step between levels. Each level reached triggers a reshuffle.
    pub milestone: Option<u32>,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            width: 8,
            height: 8,
            kinds: (0..6).map(TokenKind).collect(),
            score_table: ScoreTable::default(),
            hint_delay_ms: 3000,
            max_reshuffle_attempts: 100,
            milestone: Some(3000),
        }
    }
}

impl GameConfig {
    pub fn hint_delay(&self) -> Duration {
        Duration::from_millis(self.hint_delay_ms)
    }

    /// Parses a JSON configuration; missing fields take their default value. The result is
    /// validated.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: GameConfig =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the engine relies on.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.width == 0 || self.height == 0 {
            return Err(EngineError::InvalidConfig(format!(
                "board must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        if self.kinds.len() < 3 {
            return Err(EngineError::InvalidConfig(format!(
                "at least 3 token kinds are required, got {}",
                self.kinds.len()
            )));
        }
        let unique: HashSet<TokenKind> = self.kinds.iter().copied().collect();
        if unique.len() != self.kinds.len() {
            return Err(EngineError::InvalidConfig(
                "token kinds must be distinct".to_string(),
            ));
        }
        if self.score_table.is_empty() {
            return Err(EngineError::InvalidConfig(
                "score table has no entries".to_string(),
            ));
        }
        if self.milestone == Some(0) {
            return Err(EngineError::InvalidConfig(
                "milestone must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
