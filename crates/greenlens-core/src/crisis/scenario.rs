//! Scenario result types
//!
//! `Scenarios` is a year-keyed map that keeps insertion order, so the JSON
//! object returned to clients and stored in `crisis_sims.scenarios` lists
//! years in the order they appeared in the generated document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One year's scenario: the text and the URL of its illustration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioEntry {
    pub text: String,
    pub image_url: String,
}

impl ScenarioEntry {
    pub fn new(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image_url: image_url.into(),
        }
    }
}

/// Year label -> scenario, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scenarios(IndexMap<String, ScenarioEntry>);

impl Scenarios {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a replaced year keeps its position
    pub fn insert(&mut self, year: impl Into<String>, entry: ScenarioEntry) {
        self.0.insert(year.into(), entry);
    }

    pub fn get(&self, year: &str) -> Option<&ScenarioEntry> {
        self.0.get(year)
    }

    pub fn years(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScenarioEntry)> {
        self.0.iter().map(|(y, e)| (y.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ScenarioEntry)> for Scenarios {
    fn from_iter<I: IntoIterator<Item = (String, ScenarioEntry)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
