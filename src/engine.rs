//! The simulation driver (C7): builds the ordered event pipeline once and
//! runs it, in parallel across Persons, for a fixed number of monthly
//! timesteps.

use crate::config::{Config, TableSource};
use crate::error::Result;
use crate::events::{create_events, Event};
use crate::person::Person;
use crate::sampler::Sampler;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

pub struct Engine {
    duration: i64,
    seed: u64,
    discount_rate: f64,
    events: Vec<Box<dyn Event>>,
}

impl Engine {
    /// Builds the event pipeline named by `simulation.events`. A
    /// non-positive `simulation.seed` is replaced with the current
    /// millisecond clock ("seed <= 0 means pick one").
    pub fn new(config: &Config, tables: Arc<dyn TableSource>) -> Result<Self> {
        let duration = config.get_i64("simulation.duration")?;
        let discount_rate = config.get_f64("cost.discounting_rate")?;
        let configured_seed = config.get_i64("simulation.seed").unwrap_or(0);
        let seed = if configured_seed > 0 {
            configured_seed as u64
        } else {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(1)
        };
        let events = create_events(config, tables)?;
        Ok(Self {
            duration,
            seed,
            discount_rate,
            events,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Runs every Person to completion, in parallel. Each Person owns a
    /// worker-local Sampler derived from `(seed, person.id)`, so the
    /// result is independent of how many threads actually execute it.
    /// An individual event's recoverable error is logged and skipped for
    /// that Person's timestep rather than aborting the whole run (§7).
    pub fn run(&self, people: &mut [Person]) -> Result<()> {
        people.par_iter_mut().for_each(|person| self.run_one(person));
        Ok(())
    }

    fn run_one(&self, person: &mut Person) {
        let mut sampler = Sampler::for_stream(self.seed, person.id);
        for timestep in 0..self.duration {
            for event in &self.events {
                if !person.alive {
                    break;
                }
                if let Err(err) = event.execute(person, &mut sampler) {
                    warn!(
                        person_id = person.id,
                        timestep,
                        event = event.name(),
                        error = %err,
                        "event skipped for this timestep"
                    );
                }
            }
            if !person.alive {
                break;
            }
            person.accumulate_total_utility(self.discount_rate);
        }
    }
}
