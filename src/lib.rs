//! # hepce
//!
//! A discrete-time microsimulation of lifetime clinical and economic
//! trajectories for persons at risk of, or living with, HCV and HIV.
//!
//! ## Architecture
//!
//! A [`person::Person`] carries all clinical, behavioral, screening,
//! linkage, treatment, and pregnancy substate for one simulated
//! individual, plus its cost ([`cost::CostAccumulator`]) and utility
//! ([`utility::UtilityAccumulator`]) accumulators. An [`engine::Engine`]
//! advances every Person through a fixed, ordered pipeline of
//! [`events::Event`] implementations, one calendar month per timestep, for
//! a configured duration. Each event is constructed once against a
//! [`config::Config`] and a [`config::TableSource`] and is otherwise
//! stateless; all per-Person mutation happens through [`person::Person`]'s
//! semantically-named mutators, never direct field writes, so invariants
//! like fibrosis monotonicity and absorbing death live in one place.
//!
//! Randomness flows through [`sampler::Sampler`]: each worker derives its
//! own stream from the run's master seed and the Person's id
//! (`Sampler::for_stream`), so results are independent of thread count.
//!
//! [`population::PopulationLoader`] builds the initial Person vector,
//! either from a short "initial cohort" table or from a full "population
//! snapshot" table that round-trips with [`output::person_row`]. The
//! `hepce` binary (`src/bin/hepce.rs`) drives batches of runs end to end,
//! reading one `input<i>` directory per run and writing one `output<i>`
//! directory of population CSV.
//!
//! ## Usage
//!
//! ```rust
//! use hepce::config::{Config, InMemoryTables};
//! use hepce::engine::Engine;
//! use hepce::person::types::{Behavior, Sex};
//! use hepce::person::Person;
//! use std::sync::Arc;
//!
//! let mut config = Config::new();
//! config.set("simulation.duration", "12");
//! config.set("simulation.seed", "1");
//! config.set("cost.discounting_rate", "0.03");
//! config.set("simulation.events", "Aging");
//!
//! let engine = Engine::new(&config, Arc::new(InMemoryTables::new())).unwrap();
//! let mut people = vec![Person::new(1, Sex::Male, 360, Behavior::Never, false)];
//! engine.run(&mut people).unwrap();
//! assert_eq!(people[0].age, 372);
//! ```

pub mod config;
pub mod cost;
pub mod econ;
pub mod engine;
pub mod error;
pub mod events;
pub mod output;
pub mod person;
pub mod population;
pub mod sampler;
pub mod utility;

pub use config::Config;
pub use engine::Engine;
pub use error::{HepceError, Result};
pub use person::Person;
pub use population::PopulationLoader;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
