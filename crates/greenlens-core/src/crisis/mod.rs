//! Crisis scenario simulation
//!
//! Turns a crisis topic ("su krizi", "heatwaves in the Po valley") into a
//! set of illustrated future scenarios, one per configured year.
//!
//! # Architecture
//!
//! - `parser`: splits the generated document into year blocks
//! - `writer`: scenario and image-prompt prompts over a `TextGenerator`
//! - `simulator`: the fan-out/fan-in pipeline and persistence
//! - `scenario`: the ordered year -> scenario map returned to clients
//! - `repository`: `crisis_sims` table access

pub mod parser;
pub mod repository;
pub mod scenario;
pub mod simulator;
pub mod writer;

pub use parser::{YEAR_MARKER, YearBlock, block_years, parse_year_blocks};
pub use repository::{SimulationRepository, StoredSimulation};
pub use scenario::{ScenarioEntry, Scenarios};
pub use simulator::{CrisisSimulator, Simulation};
pub use writer::ScenarioWriter;
