//! Scenario and image-prompt generation
//!
//! Wraps a `TextGenerator` with the two prompts the crisis pipeline sends:
//! the multi-year scenario document and, per year, an image prompt.

use std::sync::Arc;

use tracing::debug;

use crate::config::CrisisConfig;
use crate::error::Result;
use crate::llm::TextGenerator;

use super::parser::YEAR_MARKER;

/// Writes scenario documents and image prompts through a text provider
#[derive(Clone)]
pub struct ScenarioWriter {
    generator: Arc<dyn TextGenerator>,
    years: Vec<String>,
    min_words: u32,
}

impl std::fmt::Debug for ScenarioWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioWriter")
            .field("years", &self.years)
            .field("min_words", &self.min_words)
            .finish()
    }
}

impl ScenarioWriter {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &CrisisConfig) -> Self {
        Self {
            generator,
            years: config.years.clone(),
            min_words: config.min_words,
        }
    }

    /// Years the scenario prompt asks for, in heading order
    pub fn years(&self) -> &[String] {
        &self.years
    }

    /// Generate the full multi-year document for a topic
    pub async fn generate_scenario_document(&self, topic: &str) -> Result<String> {
        let prompt = scenario_prompt(topic, &self.years, self.min_words);
        debug!(topic, years = ?self.years, "Requesting scenario document");
        Ok(self.generator.generate_text(&prompt).await?.text)
    }

    /// Generate an English, photorealistic image prompt for one year
    pub async fn generate_image_prompt(&self, topic: &str, year: &str, year_text: &str) -> Result<String> {
        let prompt = image_prompt(topic, year, year_text);
        debug!(topic, year, "Requesting image prompt");
        Ok(self.generator.generate_text(&prompt).await?.text)
    }
}

/// Prompt for the scenario document
pub fn scenario_prompt(topic: &str, years: &[String], min_words: u32) -> String {
    let headings = years
        .iter()
        .map(|year| format!("{}{}\n...", YEAR_MARKER, year))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "For {topic}, write a separate, sustainability-focused, awareness-raising scenario \
         for each of the years {years}, each at least {min_words} words long. \
         Give the output with exactly the following headings:\n\n{headings}",
        topic = topic,
        years = join_years(years),
        min_words = min_words,
        headings = headings,
    )
}

/// Prompt asking for an image-generation prompt for one year's scenario
pub fn image_prompt(topic: &str, year: &str, year_text: &str) -> String {
    format!(
        "{topic}, {year} scenario: {year_text}\n\n\
         Write an English, photorealistic image-generation prompt suitable for DALL-E 3 \
         that depicts this scenario. Reply with the prompt only, starting with its main subject.",
    )
}

/// "2030", "2030 and 2050", "2030, 2050 and 2100"
fn join_years(years: &[String]) -> String {
    match years {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}
