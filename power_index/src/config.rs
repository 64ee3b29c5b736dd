// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// A voting unit: a state, a territory, or any body that casts all of its
/// weight for one side.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Entity {
    /// Stable identifier, for example a two-letter state code.
    pub id: String,
    /// Delegate count or electoral-vote count. Must be positive.
    pub weight: u32,
}

impl Entity {
    pub fn new(id: &str, weight: u32) -> Entity {
        Entity {
            id: id.to_string(),
            weight,
        }
    }
}

/// The forced outcome of an entity in a scenario.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Outcome {
    /// The entity always gives its weight to side A.
    SideA,
    /// The entity always gives its weight to side B.
    SideB,
    /// The entity is decided by a fair coin flip at each trial.
    Unconstrained,
}

/// A set of per-entity overrides, applied on top of the fair coin flip.
///
/// Overrides are kept in insertion order. If the same entity is forced twice,
/// the last override wins.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Scenario {
    pub overrides: Vec<(String, Outcome)>,
}

impl Scenario {
    pub fn new() -> Scenario {
        Scenario::default()
    }

    pub fn force(mut self, id: &str, outcome: Outcome) -> Scenario {
        self.overrides.push((id.to_string(), outcome));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

// ******** Output data structures *********

/// One row of the plain simulation report.
#[derive(PartialEq, Debug, Clone)]
pub struct CoalitionRow {
    pub id: String,
    pub weight: u32,
    /// Number of trials in which the entity belonged to side A's winning coalition.
    pub count: u64,
    /// `count / trials`, between 0 and 1.
    pub percentage: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct CoalitionReport {
    pub trials: u64,
    pub quota: u32,
    pub side_a_wins: u64,
    /// Sorted by count, descending. Ties keep the roster order.
    pub rows: Vec<CoalitionRow>,
}

/// One row of the scenario report.
#[derive(PartialEq, Debug, Clone)]
pub struct ScenarioRow {
    pub id: String,
    pub weight: u32,
    pub count: u64,
    pub percentage: f64,
    /// The count normalized by the sum of the counts of all the entities.
    /// This is a sampled estimate, distinct from the exact Banzhaf index.
    pub power: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ScenarioReport {
    pub trials: u64,
    pub quota: u32,
    pub side_a_wins: u64,
    pub side_b_wins: u64,
    /// Trials in which neither side reached the quota.
    pub undecided: u64,
    pub side_a_win_probability: f64,
    pub side_b_win_probability: f64,
    pub rows: Vec<ScenarioRow>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct BanzhafRow {
    pub id: String,
    pub weight: u32,
    /// Number of coalitions in which this entity is a swing vote.
    pub swings: u128,
    pub power: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct BanzhafReport {
    pub quota: u32,
    pub total_weight: u64,
    pub total_swings: u128,
    /// Sorted by power, descending. Ties keep the roster order.
    pub rows: Vec<BanzhafRow>,
}

/// Errors that prevent a computation from starting.
///
/// All of them except `DegenerateIndex` describe invalid input. None of them
/// is transient: retrying with the same input fails the same way.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum PowerErrors {
    EmptyRoster,
    NonPositiveWeight(String),
    DuplicateEntity(String),
    InvalidQuota { quota: u32, total_weight: u64 },
    NoTrials,
    /// An override refers to an entity that is not in the roster.
    UnknownEntity(String),
    /// The exact index counts subsets with 128-bit integers.
    RosterTooLarge(usize),
    /// The exact index allocates one coefficient per unit of total weight.
    RosterTooHeavy(u64),
    /// Two tallies over rosters of different sizes cannot be merged.
    MismatchedTallies { left: usize, right: usize },
    /// No entity is ever a swing vote.
    DegenerateIndex,
}

impl PowerErrors {
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, PowerErrors::DegenerateIndex)
    }
}

impl Error for PowerErrors {}

impl Display for PowerErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PowerErrors::EmptyRoster => write!(f, "invalid input: the roster is empty"),
            PowerErrors::NonPositiveWeight(id) => {
                write!(f, "invalid input: entity {} has a weight of zero", id)
            }
            PowerErrors::DuplicateEntity(id) => {
                write!(f, "invalid input: entity {} appears more than once", id)
            }
            PowerErrors::InvalidQuota {
                quota,
                total_weight,
            } => write!(
                f,
                "invalid input: quota {} must be within 1..={}",
                quota, total_weight
            ),
            PowerErrors::NoTrials => write!(f, "invalid input: the number of trials must be positive"),
            PowerErrors::UnknownEntity(id) => {
                write!(f, "invalid input: scenario refers to unknown entity {}", id)
            }
            PowerErrors::RosterTooLarge(n) => {
                write!(f, "invalid input: {} entities is more than the supported 127", n)
            }
            PowerErrors::RosterTooHeavy(w) => write!(
                f,
                "invalid input: total weight {} is more than the supported {}",
                w,
                crate::banzhaf::MAX_TOTAL_WEIGHT
            ),
            PowerErrors::MismatchedTallies { left, right } => write!(
                f,
                "invalid input: cannot merge tallies over {} and {} entities",
                left, right
            ),
            PowerErrors::DegenerateIndex => write!(f, "no entity is ever a swing vote"),
        }
    }
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct SimulationRules {
    /// Number of trials. Must be positive.
    pub trials: u64,
    /// If provided, the trials are reproducible. Otherwise the random source
    /// is seeded from the operating system.
    pub seed: Option<u64>,
}

impl SimulationRules {
    pub const DEFAULT_RULES: SimulationRules = SimulationRules {
        trials: 10_000,
        seed: None,
    };
}
