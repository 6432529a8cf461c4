//! Crisis simulation pipeline
//!
//! One simulation runs as:
//!
//! 1. one text call for the full multi-year document
//! 2. parse into year blocks
//! 3. concurrent image-prompt calls, one per block
//! 4. concurrent image calls, one per prompt
//! 5. join text and image URL by year label, then persist
//!
//! Every concurrent task returns its year label with its output, so results
//! are joined by label rather than by position. The first failure in a stage
//! drops the rest of that stage and nothing is stored.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures_util::future::try_join_all;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::auth::User;
use crate::config::CrisisConfig;
use crate::error::{Error, Result};
use crate::image::ImageGenerator;
use crate::llm::TextGenerator;
use crate::storage::Database;

use super::parser::{YearBlock, block_years, parse_year_blocks};
use super::repository::SimulationRepository;
use super::scenario::{ScenarioEntry, Scenarios};
use super::writer::ScenarioWriter;

/// A completed, persisted simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Simulation {
    pub sim_id: i64,
    pub scenarios: Scenarios,
}

/// Orchestrates scenario text, image prompts, images and persistence
#[derive(Clone)]
pub struct CrisisSimulator {
    writer: ScenarioWriter,
    images: Arc<dyn ImageGenerator>,
    db: Database,
    strict_years: bool,
}

impl std::fmt::Debug for CrisisSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrisisSimulator")
            .field("writer", &self.writer)
            .field("strict_years", &self.strict_years)
            .finish()
    }
}

impl CrisisSimulator {
    pub fn new(
        text: Arc<dyn TextGenerator>,
        images: Arc<dyn ImageGenerator>,
        db: Database,
        config: &CrisisConfig,
    ) -> Self {
        Self {
            writer: ScenarioWriter::new(text, config),
            images,
            db,
            strict_years: config.strict_years,
        }
    }

    /// Run a simulation for `topic` on behalf of `user` and store the result
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn simulate(&self, topic: &str, user: &User) -> Result<Simulation> {
        if topic.trim().is_empty() {
            return Err(Error::InvalidInput("crisis must not be empty".to_string()));
        }

        let document = self.writer.generate_scenario_document(topic).await?;
        let blocks = parse_year_blocks(&document);
        self.check_years(&blocks)?;

        let prompts = try_join_all(blocks.iter().map(|block| async move {
            let prompt = self
                .writer
                .generate_image_prompt(topic, &block.year, &block.text)
                .await?;
            Ok::<_, Error>((block.year.clone(), prompt))
        }))
        .await?;

        let images = try_join_all(prompts.into_iter().map(|(year, prompt)| async move {
            let image = self.images.generate_image(&prompt).await?;
            Ok::<_, Error>((year, image.url))
        }))
        .await?;

        let scenarios = assemble(blocks, images)?;

        let sim_id = SimulationRepository::new(&self.db)
            .insert(topic, &scenarios, user.id)
            .await?;

        info!(
            sim_id,
            years = scenarios.len(),
            "Crisis simulation completed"
        );

        Ok(Simulation { sim_id, scenarios })
    }

    /// Compare parsed years against the configured set, ignoring order
    fn check_years(&self, blocks: &[YearBlock]) -> Result<()> {
        let found = block_years(blocks);
        let expected = self.writer.years();
        let found_set: HashSet<&str> = found.iter().map(String::as_str).collect();
        let expected_set: HashSet<&str> = expected.iter().map(String::as_str).collect();
        if found.len() == expected.len() && found_set == expected_set {
            return Ok(());
        }

        warn!(
            expected = ?expected,
            found = ?found,
            strict = self.strict_years,
            "Scenario document does not match the requested years"
        );

        if self.strict_years {
            return Err(Error::IncompleteScenario {
                expected: expected.join(", "),
                found: found.join(", "),
            });
        }
        Ok(())
    }
}

/// Join each block's text with the image URL carried under the same year
fn assemble(blocks: Vec<YearBlock>, images: Vec<(String, String)>) -> Result<Scenarios> {
    let mut urls: HashMap<String, String> = images.into_iter().collect();

    let mut scenarios = Scenarios::new();
    for block in blocks {
        let image_url = urls
            .remove(&block.year)
            .ok_or_else(|| Error::Other(format!("No image generated for year {}", block.year)))?;
        scenarios.insert(block.year, ScenarioEntry::new(block.text, image_url));
    }
    Ok(scenarios)
}
