//! Race selection
//!
//! The selection key (a race id carried in the page query) is the single
//! source of truth for which race is shown. It is read once into a
//! [`SelectionCoordinator`] and only changes through [`SelectionCoordinator::choose`]
//! (user interaction) or [`SelectionCoordinator::apply_query`] (the location
//! changed underneath us, e.g. back/forward or a shared link).
//!
//! ```text
//!   NoSelection ──(non-empty manifest)──▶ Selected(first)
//!   Selected(a) ──(choose / apply_query)──▶ Selected(b)
//! ```

pub mod query;

use serde::Serialize;
use thiserror::Error;

use crate::models::{Manifest, RaceRecord};

pub use query::QueryState;

/// Default query parameter carrying the race id
pub const DEFAULT_QUERY_PARAM: &str = "raceId";

/// Selection errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// The chosen id is not in the manifest
    #[error("Unknown race: {0}")]
    UnknownRace(String),

    /// Nothing can be chosen from an empty manifest
    #[error("No races available")]
    NoRaces,
}

/// Active race for `key`: exact match, else the first race, else none
pub fn select<'a>(manifest: &'a Manifest, key: Option<&str>) -> Option<&'a RaceRecord> {
    key.and_then(|k| manifest.find(k))
        .or_else(|| manifest.first())
}

/// Current selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionState {
    /// The manifest is empty
    NoSelection,
    /// Race with this id is active
    Selected(String),
}

impl SelectionState {
    fn from_manifest(manifest: &Manifest, key: Option<&str>) -> Self {
        match select(manifest, key) {
            Some(race) => Self::Selected(race.id.clone()),
            None => Self::NoSelection,
        }
    }

    /// Active race id, if any
    pub fn race_id(&self) -> Option<&str> {
        match self {
            Self::Selected(id) => Some(id),
            Self::NoSelection => None,
        }
    }
}

/// One entry of the race picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaceOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Location update produced by a user selection
///
/// Applied in place (history replace), never as a full page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub race_id: String,
    pub query: QueryState,
    /// False when the chosen race was already active
    pub changed: bool,
}

impl Navigation {
    /// Query with leading `?`
    pub fn search(&self) -> String {
        self.query.to_search()
    }

    /// `path` followed by the new query
    pub fn href(&self, path: &str) -> String {
        format!("{path}{}", self.query.to_search())
    }
}

/// Tracks the selected race for one page view
#[derive(Debug, Clone)]
pub struct SelectionCoordinator {
    manifest: Manifest,
    query: QueryState,
    param: String,
    state: SelectionState,
}

impl SelectionCoordinator {
    /// Create a coordinator reading the key from `param` in `query`
    pub fn new(manifest: Manifest, query: QueryState, param: impl Into<String>) -> Self {
        let param = param.into();
        let state = SelectionState::from_manifest(&manifest, query.get(&param));
        Self {
            manifest,
            query,
            param,
            state,
        }
    }

    /// Create a coordinator using the default `raceId` parameter
    pub fn with_default_param(manifest: Manifest, query: QueryState) -> Self {
        Self::new(manifest, query, DEFAULT_QUERY_PARAM)
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn param(&self) -> &str {
        &self.param
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Raw key from the query; may name a race that does not exist
    pub fn key(&self) -> Option<&str> {
        self.query.get(&self.param)
    }

    /// Active race, `None` only for an empty manifest
    pub fn active(&self) -> Option<&RaceRecord> {
        self.state.race_id().and_then(|id| self.manifest.find(id))
    }

    /// Picker entries in manifest order
    pub fn options(&self) -> Vec<RaceOption> {
        let active = self.state.race_id();
        self.manifest
            .iter()
            .map(|race| RaceOption {
                value: race.id.clone(),
                label: race.label().to_string(),
                selected: active == Some(race.id.as_str()),
            })
            .collect()
    }

    /// User picked `race_id` from the control
    ///
    /// Sets the query parameter to `race_id`, keeping every other parameter
    /// and its position, and returns the navigation to apply.
    ///
    /// # Errors
    ///
    /// `SelectionError::NoRaces` for an empty manifest and
    /// `SelectionError::UnknownRace` when `race_id` is not in the manifest
    pub fn choose(&mut self, race_id: &str) -> Result<Navigation, SelectionError> {
        if self.manifest.is_empty() {
            return Err(SelectionError::NoRaces);
        }
        if self.manifest.find(race_id).is_none() {
            return Err(SelectionError::UnknownRace(race_id.to_string()));
        }

        let changed = self.state.race_id() != Some(race_id);
        self.query = self.query.with_param(&self.param, race_id);
        self.state = SelectionState::Selected(race_id.to_string());

        tracing::debug!(race_id, changed, "Race selected");

        Ok(Navigation {
            race_id: race_id.to_string(),
            query: self.query.clone(),
            changed,
        })
    }

    /// The location changed; re-read the key from `query`
    ///
    /// Unknown keys fall back to the first race without error.
    pub fn apply_query(&mut self, query: QueryState) -> &SelectionState {
        self.state = SelectionState::from_manifest(&self.manifest, query.get(&self.param));
        self.query = query;
        &self.state
    }

    /// Set or clear the key directly
    pub fn apply_key(&mut self, key: Option<&str>) -> &SelectionState {
        let query = match key {
            Some(key) => self.query.with_param(&self.param, key),
            None => self.query.without_param(&self.param),
        };
        self.apply_query(query)
    }

    /// A fresh manifest arrived; keep the current key
    pub fn replace_manifest(&mut self, manifest: Manifest) -> &SelectionState {
        self.state = SelectionState::from_manifest(&manifest, self.key());
        self.manifest = manifest;
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_races() -> Manifest {
        Manifest::from_races(vec![RaceRecord::new("r1", "A"), RaceRecord::new("r2", "B")]).unwrap()
    }

    #[test]
    fn test_select_law() {
        let manifest = two_races();
        assert_eq!(select(&manifest, None).unwrap().id, "r1");
        assert_eq!(select(&manifest, Some("r2")).unwrap().id, "r2");
        assert_eq!(select(&manifest, Some("missing")).unwrap().id, "r1");
        assert!(select(&Manifest::empty(), Some("r1")).is_none());
    }

    #[test]
    fn test_coordinator_reads_key_from_query() {
        let coordinator =
            SelectionCoordinator::with_default_param(two_races(), QueryState::parse("raceId=r2"));
        assert_eq!(coordinator.state(), &SelectionState::Selected("r2".to_string()));
        assert_eq!(coordinator.active().unwrap().title, "B");
    }

    #[test]
    fn test_empty_manifest_has_no_selection() {
        let mut coordinator = SelectionCoordinator::with_default_param(
            Manifest::empty(),
            QueryState::parse("raceId=r1"),
        );
        assert_eq!(coordinator.state(), &SelectionState::NoSelection);
        assert!(coordinator.active().is_none());
        assert!(coordinator.options().is_empty());
        assert_eq!(coordinator.choose("r1"), Err(SelectionError::NoRaces));
    }

    #[test]
    fn test_options_mark_active_race() {
        let coordinator =
            SelectionCoordinator::with_default_param(two_races(), QueryState::parse("raceId=r2"));
        let options = coordinator.options();

        assert_eq!(options.len(), 2);
        assert_eq!(options[0].value, "r1");
        assert_eq!(options[0].label, "A");
        assert!(!options[0].selected);
        assert!(options[1].selected);
    }

    #[test]
    fn test_choose_updates_query_and_state() {
        let mut coordinator = SelectionCoordinator::with_default_param(
            two_races(),
            QueryState::parse("raceId=r1&foo=bar"),
        );

        let navigation = coordinator.choose("r2").unwrap();

        assert!(navigation.changed);
        assert_eq!(navigation.search(), "?raceId=r2&foo=bar");
        assert_eq!(navigation.href("/"), "/?raceId=r2&foo=bar");
        assert_eq!(coordinator.active().unwrap().id, "r2");
        assert_eq!(coordinator.key(), Some("r2"));
    }

    #[test]
    fn test_choose_same_race_is_unchanged() {
        let mut coordinator =
            SelectionCoordinator::with_default_param(two_races(), QueryState::new());
        let navigation = coordinator.choose("r1").unwrap();
        assert!(!navigation.changed);
        assert_eq!(navigation.search(), "?raceId=r1");
    }

    #[test]
    fn test_choose_unknown_race_rejected() {
        let mut coordinator =
            SelectionCoordinator::with_default_param(two_races(), QueryState::parse("raceId=r2"));
        let result = coordinator.choose("r9");

        assert_eq!(result, Err(SelectionError::UnknownRace("r9".to_string())));
        // Previous selection stays
        assert_eq!(coordinator.active().unwrap().id, "r2");
    }

    #[test]
    fn test_apply_key_unknown_falls_back() {
        let mut coordinator =
            SelectionCoordinator::with_default_param(two_races(), QueryState::parse("raceId=r2"));

        let state = coordinator.apply_key(Some("missing")).clone();
        assert_eq!(state, SelectionState::Selected("r1".to_string()));
        assert_eq!(coordinator.key(), Some("missing"));

        coordinator.apply_key(None);
        assert_eq!(coordinator.active().unwrap().id, "r1");
        assert_eq!(coordinator.key(), None);
    }

    #[test]
    fn test_replace_manifest_leaves_no_selection() {
        let mut coordinator = SelectionCoordinator::with_default_param(
            Manifest::empty(),
            QueryState::parse("raceId=r2"),
        );
        assert_eq!(coordinator.state(), &SelectionState::NoSelection);

        let state = coordinator.replace_manifest(two_races()).clone();
        assert_eq!(state, SelectionState::Selected("r2".to_string()));
    }

    #[test]
    fn test_custom_param_name() {
        let coordinator =
            SelectionCoordinator::new(two_races(), QueryState::parse("race=r2&raceId=r1"), "race");
        assert_eq!(coordinator.active().unwrap().id, "r2");
    }
}
