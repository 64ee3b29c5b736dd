pub use crate::config::*;

/// A builder for assembling a roster and a scenario.
///
/// Entities are kept in insertion order, which is the order in which they
/// vote in the simulations.
///
/// ```
/// pub use power_index::builder::Builder;
/// pub use power_index::{Outcome, SimulationRules};
/// # use power_index::PowerErrors;
///
/// let rules = SimulationRules { trials: 1_000, seed: Some(7) };
/// let mut builder = Builder::new(&rules)?
///     .entities(&[("IA", 40), ("NH", 22), ("NV", 26)])?;
///
/// builder.add_entity("SC", 50)?;
/// builder.force("SC", Outcome::SideA)?;
///
/// let report = builder.simulate_scenario(70)?;
/// assert_eq!(report.trials, 1_000);
///
/// # Ok::<(), PowerErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: SimulationRules,
    pub(crate) _entities: Vec<Entity>,
    pub(crate) _scenario: Scenario,
}

impl Builder {
    pub fn new(rules: &SimulationRules) -> Result<Builder, PowerErrors> {
        if rules.trials == 0 {
            return Err(PowerErrors::NoTrials);
        }
        Ok(Builder {
            _rules: *rules,
            _entities: Vec::new(),
            _scenario: Scenario::new(),
        })
    }

    /// Replaces the roster. Any scenario set before is dropped.
    pub fn entities(self, ents: &[(&str, u32)]) -> Result<Builder, PowerErrors> {
        let mut builder = Builder {
            _rules: self._rules,
            _entities: Vec::new(),
            _scenario: Scenario::new(),
        };
        for (id, weight) in ents.iter() {
            builder.add_entity(id, *weight)?;
        }
        Ok(builder)
    }

    /// Appends an entity at the end of the voting order.
    pub fn add_entity(&mut self, id: &str, weight: u32) -> Result<(), PowerErrors> {
        if weight == 0 {
            return Err(PowerErrors::NonPositiveWeight(id.to_string()));
        }
        if self._entities.iter().any(|e| e.id == id) {
            return Err(PowerErrors::DuplicateEntity(id.to_string()));
        }
        self._entities.push(Entity::new(id, weight));
        Ok(())
    }

    /// Forces the outcome of an entity already in the roster.
    pub fn force(&mut self, id: &str, outcome: Outcome) -> Result<(), PowerErrors> {
        if !self._entities.iter().any(|e| e.id == id) {
            return Err(PowerErrors::UnknownEntity(id.to_string()));
        }
        self._scenario.overrides.push((id.to_string(), outcome));
        Ok(())
    }

    pub fn roster(&self) -> &[Entity] {
        &self._entities
    }

    pub fn simulate(&self, quota: u32) -> Result<CoalitionReport, PowerErrors> {
        crate::simulate(&self._entities, quota, &self._rules)
    }

    pub fn simulate_scenario(&self, quota: u32) -> Result<ScenarioReport, PowerErrors> {
        crate::simulate_scenario(&self._entities, quota, &self._scenario, &self._rules)
    }

    pub fn banzhaf(&self, quota: u32) -> Result<BanzhafReport, PowerErrors> {
        crate::banzhaf_report(&self._entities, quota)
    }
}
