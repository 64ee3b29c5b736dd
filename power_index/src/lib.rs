mod banzhaf;
pub mod builder;
mod config;
pub mod manual;
pub mod rosters;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use std::{
    collections::{HashMap, HashSet},
    ops::{Add, AddAssign},
};

pub use crate::banzhaf::{banzhaf, banzhaf_report};
pub use crate::config::*;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
pub(crate) struct Weight(pub(crate) u64);

impl Weight {
    pub(crate) const EMPTY: Weight = Weight(0);
}

impl std::iter::Sum for Weight {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Weight(iter.map(|w| w.0).sum())
    }
}

impl AddAssign for Weight {
    fn add_assign(&mut self, rhs: Weight) {
        self.0 += rhs.0;
    }
}

impl Add for Weight {
    type Output = Weight;
    fn add(self: Weight, rhs: Weight) -> Weight {
        Weight(self.0 + rhs.0)
    }
}

/// A roster that passed validation, in calendar order.
#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) struct CheckedRoster {
    pub(crate) ids: Vec<String>,
    pub(crate) weights: Vec<Weight>,
    pub(crate) total_weight: Weight,
    pub(crate) quota: Weight,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum TrialWinner {
    SideA,
    SideB,
    Undecided,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
struct TrialOutcome {
    side_a: Weight,
    side_b: Weight,
    // Number of entities that received a side before a winner was known.
    allocated: usize,
}

impl TrialOutcome {
    fn winner(&self, quota: Weight) -> TrialWinner {
        if self.side_a >= quota {
            TrialWinner::SideA
        } else if self.side_b >= quota {
            TrialWinner::SideB
        } else {
            TrialWinner::Undecided
        }
    }
}

/// Raw counters accumulated over a batch of trials.
///
/// Batches over the same roster are independent and can be run on separate
/// threads, then combined with `merge`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CoalitionTally {
    counts: Vec<u64>,
    trials: u64,
    side_a_wins: u64,
    side_b_wins: u64,
    undecided: u64,
}

impl CoalitionTally {
    fn empty(num_entities: usize) -> CoalitionTally {
        CoalitionTally {
            counts: vec![0; num_entities],
            trials: 0,
            side_a_wins: 0,
            side_b_wins: 0,
            undecided: 0,
        }
    }

    /// Winning coalition counts, in roster order.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn side_a_wins(&self) -> u64 {
        self.side_a_wins
    }

    pub fn side_b_wins(&self) -> u64 {
        self.side_b_wins
    }

    pub fn undecided(&self) -> u64 {
        self.undecided
    }

    /// Adds the counters of another batch run over the same roster.
    ///
    /// Fails if the two tallies do not count the same number of entities.
    pub fn merge(mut self, other: &CoalitionTally) -> Result<CoalitionTally, PowerErrors> {
        if self.counts.len() != other.counts.len() {
            return Err(PowerErrors::MismatchedTallies {
                left: self.counts.len(),
                right: other.counts.len(),
            });
        }
        for (c, o) in self.counts.iter_mut().zip(other.counts.iter()) {
            *c += *o;
        }
        self.trials += other.trials;
        self.side_a_wins += other.side_a_wins;
        self.side_b_wins += other.side_b_wins;
        self.undecided += other.undecided;
        Ok(self)
    }

    fn record(&mut self, outcome: &TrialOutcome, quota: Weight, sided_with_a: &[bool]) {
        debug_assert!(outcome.allocated <= sided_with_a.len());
        self.trials += 1;
        match outcome.winner(quota) {
            TrialWinner::SideA => {
                self.side_a_wins += 1;
                for (c, flag) in self.counts.iter_mut().zip(sided_with_a.iter()) {
                    if *flag {
                        *c += 1;
                    }
                }
            }
            TrialWinner::SideB => {
                self.side_b_wins += 1;
            }
            TrialWinner::Undecided => {
                self.undecided += 1;
            }
        }
    }
}

/// Runs the plain coalition simulation.
///
/// Every entity is decided by a fair coin flip, in roster order, until one
/// side reaches the quota. The report credits the entities that sided with
/// side A in the trials that side A won.
///
/// Arguments:
/// * `roster` the entities, in the order in which they vote
/// * `quota` the weight a side must reach to win a trial
/// * `rules` the number of trials and the optional seed
pub fn simulate(
    roster: &[Entity],
    quota: u32,
    rules: &SimulationRules,
) -> Result<CoalitionReport, PowerErrors> {
    info!(
        "simulate: {} trials over {} entities, quota {}",
        rules.trials,
        roster.len(),
        quota
    );
    let mut rng = make_rng(rules.seed);
    let tally = run_trials(roster, quota, &Scenario::new(), rules.trials, &mut rng)?;
    let trials = tally.trials;

    let mut rows: Vec<CoalitionRow> = roster
        .iter()
        .zip(tally.counts.iter())
        .map(|(e, count)| CoalitionRow {
            id: e.id.clone(),
            weight: e.weight,
            count: *count,
            percentage: *count as f64 / trials as f64,
        })
        .collect();
    // Stable sort: ties keep the roster order.
    rows.sort_by(|r1, r2| r2.count.cmp(&r1.count));

    info!(
        "simulate: side A won {} of {} trials",
        tally.side_a_wins, trials
    );
    Ok(CoalitionReport {
        trials,
        quota,
        side_a_wins: tally.side_a_wins,
        rows,
    })
}

/// Runs the coalition simulation under a scenario of forced outcomes.
///
/// Forced entities take their side without consuming a random draw. Both
/// sides' wins are tracked, and each entity gets a sampled power figure:
/// its winning coalition count over the sum of all the counts.
pub fn simulate_scenario(
    roster: &[Entity],
    quota: u32,
    scenario: &Scenario,
    rules: &SimulationRules,
) -> Result<ScenarioReport, PowerErrors> {
    info!(
        "simulate_scenario: {} trials over {} entities, quota {}, {} overrides",
        rules.trials,
        roster.len(),
        quota,
        scenario.overrides.len()
    );
    let mut rng = make_rng(rules.seed);
    let tally = run_trials(roster, quota, scenario, rules.trials, &mut rng)?;
    let trials = tally.trials;
    let total_count: u64 = tally.counts.iter().sum();

    let mut rows: Vec<ScenarioRow> = roster
        .iter()
        .zip(tally.counts.iter())
        .map(|(e, count)| ScenarioRow {
            id: e.id.clone(),
            weight: e.weight,
            count: *count,
            percentage: *count as f64 / trials as f64,
            power: if total_count == 0 {
                0.0
            } else {
                *count as f64 / total_count as f64
            },
        })
        .collect();
    rows.sort_by(|r1, r2| r2.count.cmp(&r1.count));

    let report = ScenarioReport {
        trials,
        quota,
        side_a_wins: tally.side_a_wins,
        side_b_wins: tally.side_b_wins,
        undecided: tally.undecided,
        side_a_win_probability: tally.side_a_wins as f64 / trials as f64,
        side_b_win_probability: tally.side_b_wins as f64 / trials as f64,
        rows,
    };
    info!(
        "simulate_scenario: side A {} / side B {} / undecided {}",
        report.side_a_wins, report.side_b_wins, report.undecided
    );
    Ok(report)
}

/// Runs one batch of trials and returns the raw counters.
///
/// The roster and the scenario are validated once, before the first trial.
pub fn run_trials<R: Rng>(
    roster: &[Entity],
    quota: u32,
    scenario: &Scenario,
    trials: u64,
    rng: &mut R,
) -> Result<CoalitionTally, PowerErrors> {
    if trials == 0 {
        return Err(PowerErrors::NoTrials);
    }
    let checked = check_roster(roster, quota)?;
    let forced = check_scenario(&checked, scenario)?;

    let mut tally = CoalitionTally::empty(checked.ids.len());
    let mut sided_with_a: Vec<bool> = vec![false; checked.ids.len()];
    for _ in 0..trials {
        let outcome = run_one_trial(&checked, &forced, rng, &mut sided_with_a);
        tally.record(&outcome, checked.quota, &sided_with_a);
    }
    debug!(
        "run_trials: {} trials, side A {}, side B {}, undecided {}",
        tally.trials, tally.side_a_wins, tally.side_b_wins, tally.undecided
    );
    Ok(tally)
}

fn run_one_trial<R: Rng>(
    roster: &CheckedRoster,
    forced: &[Outcome],
    rng: &mut R,
    sided_with_a: &mut [bool],
) -> TrialOutcome {
    sided_with_a.iter_mut().for_each(|f| *f = false);
    let mut outcome = TrialOutcome {
        side_a: Weight::EMPTY,
        side_b: Weight::EMPTY,
        allocated: 0,
    };
    for (idx, w) in roster.weights.iter().enumerate() {
        // The winner is known: later entities do not get a side.
        if outcome.side_a >= roster.quota || outcome.side_b >= roster.quota {
            break;
        }
        let to_side_a = match forced[idx] {
            Outcome::SideA => true,
            Outcome::SideB => false,
            Outcome::Unconstrained => rng.gen::<bool>(),
        };
        if to_side_a {
            outcome.side_a += *w;
            sided_with_a[idx] = true;
        } else {
            outcome.side_b += *w;
        }
        outcome.allocated += 1;
    }
    outcome
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => {
            debug!("make_rng: using seed {}", s);
            StdRng::seed_from_u64(s)
        }
        None => StdRng::from_entropy(),
    }
}

// Entities are returned in the same order.
pub(crate) fn check_roster(roster: &[Entity], quota: u32) -> Result<CheckedRoster, PowerErrors> {
    debug!("check_roster: {} entities, quota {}", roster.len(), quota);
    if roster.is_empty() {
        return Err(PowerErrors::EmptyRoster);
    }
    let mut seen: HashSet<&str> = HashSet::new();
    for e in roster.iter() {
        if e.weight == 0 {
            return Err(PowerErrors::NonPositiveWeight(e.id.clone()));
        }
        if !seen.insert(e.id.as_str()) {
            return Err(PowerErrors::DuplicateEntity(e.id.clone()));
        }
    }
    let weights: Vec<Weight> = roster.iter().map(|e| Weight(e.weight as u64)).collect();
    let total_weight: Weight = weights.iter().cloned().sum();
    if quota == 0 || Weight(quota as u64) > total_weight {
        return Err(PowerErrors::InvalidQuota {
            quota,
            total_weight: total_weight.0,
        });
    }
    Ok(CheckedRoster {
        ids: roster.iter().map(|e| e.id.clone()).collect(),
        weights,
        total_weight,
        quota: Weight(quota as u64),
    })
}

// The outcome of each entity, in roster order.
fn check_scenario(roster: &CheckedRoster, scenario: &Scenario) -> Result<Vec<Outcome>, PowerErrors> {
    let positions: HashMap<&str, usize> = roster
        .ids
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.as_str(), idx))
        .collect();
    let mut forced: Vec<Outcome> = vec![Outcome::Unconstrained; roster.ids.len()];
    for (id, outcome) in scenario.overrides.iter() {
        let idx = positions
            .get(id.as_str())
            .ok_or_else(|| PowerErrors::UnknownEntity(id.clone()))?;
        forced[*idx] = *outcome;
    }
    debug!("check_scenario: outcomes {:?}", forced);
    Ok(forced)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn roster(weights: &[(&str, u32)]) -> Vec<Entity> {
        weights.iter().map(|(id, w)| Entity::new(id, *w)).collect()
    }

    fn seeded(trials: u64, seed: u64) -> SimulationRules {
        SimulationRules {
            trials,
            seed: Some(seed),
        }
    }

    #[test]
    fn rejects_invalid_input() {
        init();
        let r = roster(&[("A", 3), ("B", 2)]);
        assert_eq!(simulate(&r, 3, &seeded(0, 1)), Err(PowerErrors::NoTrials));
        assert_eq!(
            simulate(&r, 0, &seeded(10, 1)),
            Err(PowerErrors::InvalidQuota {
                quota: 0,
                total_weight: 5
            })
        );
        assert_eq!(
            simulate(&r, 6, &seeded(10, 1)),
            Err(PowerErrors::InvalidQuota {
                quota: 6,
                total_weight: 5
            })
        );
        assert_eq!(simulate(&[], 1, &seeded(10, 1)), Err(PowerErrors::EmptyRoster));
        assert_eq!(
            simulate(&roster(&[("A", 3), ("B", 0)]), 2, &seeded(10, 1)),
            Err(PowerErrors::NonPositiveWeight("B".to_string()))
        );
        assert_eq!(
            simulate(&roster(&[("A", 3), ("A", 1)]), 2, &seeded(10, 1)),
            Err(PowerErrors::DuplicateEntity("A".to_string()))
        );
        let scenario = Scenario::new().force("Z", Outcome::SideA);
        let err = simulate_scenario(&r, 3, &scenario, &seeded(10, 1)).unwrap_err();
        assert_eq!(err, PowerErrors::UnknownEntity("Z".to_string()));
        assert!(err.is_invalid_input());
    }

    #[test]
    fn quota_equal_to_total_weight_is_valid() {
        let r = roster(&[("A", 3), ("B", 2)]);
        let report = simulate(&r, 5, &seeded(100, 3)).unwrap();
        assert_eq!(report.trials, 100);
    }

    #[test]
    fn forced_side_a_is_flagged_in_every_trial() {
        let r = roster(&[("A", 4), ("B", 3), ("C", 2), ("D", 1)]);
        let checked = check_roster(&r, 6).unwrap();
        let scenario = Scenario::new().force("A", Outcome::SideA);
        let forced = check_scenario(&checked, &scenario).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let mut flags = vec![false; 4];
        for _ in 0..1000 {
            run_one_trial(&checked, &forced, &mut rng, &mut flags);
            assert!(flags[0]);
        }
    }

    #[test]
    fn credited_entities_sided_with_the_winner() {
        let r = roster(&[("A", 5), ("B", 4), ("C", 3), ("D", 2), ("E", 1)]);
        let checked = check_roster(&r, 8).unwrap();
        let forced = vec![Outcome::Unconstrained; 5];
        let mut rng = StdRng::seed_from_u64(7);
        let mut flags = vec![false; 5];
        for _ in 0..1000 {
            let mut tally = CoalitionTally::empty(5);
            let outcome = run_one_trial(&checked, &forced, &mut rng, &mut flags);
            tally.record(&outcome, checked.quota, &flags);
            for (idx, count) in tally.counts().iter().enumerate() {
                if *count > 0 {
                    assert!(flags[idx]);
                    assert!(outcome.side_a >= checked.quota);
                }
            }
            // Flags and the side A sum agree.
            let flagged: Weight = checked
                .weights
                .iter()
                .zip(flags.iter())
                .filter(|(_, f)| **f)
                .map(|(w, _)| *w)
                .sum();
            assert_eq!(flagged, outcome.side_a);
        }
    }

    #[test]
    fn both_entities_are_allocated_when_quota_is_total_weight() {
        let r = roster(&[("A", 5), ("B", 5)]);
        let checked = check_roster(&r, 10).unwrap();
        let forced = vec![Outcome::Unconstrained; 2];
        let mut rng = StdRng::seed_from_u64(11);
        let mut flags = vec![false; 2];
        let mut tally = CoalitionTally::empty(2);
        for _ in 0..500 {
            let outcome = run_one_trial(&checked, &forced, &mut rng, &mut flags);
            assert_eq!(outcome.allocated, 2);
            assert_eq!(outcome.side_a + outcome.side_b, Weight(10));
            match outcome.winner(checked.quota) {
                TrialWinner::SideA => assert!(outcome.side_b <= Weight(5)),
                TrialWinner::SideB => assert!(outcome.side_a <= Weight(5)),
                TrialWinner::Undecided => {
                    assert_eq!(outcome.side_a, Weight(5));
                    assert_eq!(outcome.side_b, Weight(5));
                }
            }
            tally.record(&outcome, checked.quota, &flags);
        }
        assert_eq!(
            tally.side_a_wins() + tally.side_b_wins() + tally.undecided(),
            500
        );
        // A split trial credits nobody.
        assert_eq!(tally.counts(), &[tally.side_a_wins(), tally.side_a_wins()]);
        assert!(tally.undecided() > 0);
    }

    #[test]
    fn percentages_are_bounded_and_follow_counts() {
        let r = rosters::primary_calendar();
        let report = simulate(&r, rosters::PRIMARY_QUOTA, &seeded(2_000, 5)).unwrap();
        assert_eq!(report.rows.len(), r.len());
        for row in report.rows.iter() {
            assert!((0.0..=1.0).contains(&row.percentage));
            assert!(row.count <= report.side_a_wins);
        }
        for pair in report.rows.windows(2) {
            assert!(pair[0].count >= pair[1].count);
            assert!(pair[0].percentage >= pair[1].percentage);
        }
    }

    #[test]
    fn side_b_wins_credit_nobody() {
        let r = roster(&[("A", 2), ("B", 2), ("C", 2)]);
        let scenario = Scenario::new()
            .force("A", Outcome::SideB)
            .force("B", Outcome::SideB);
        let report = simulate_scenario(&r, 4, &scenario, &seeded(200, 9)).unwrap();
        assert_eq!(report.side_b_wins, 200);
        assert_eq!(report.side_a_win_probability, 0.0);
        assert!(report.rows.iter().all(|row| row.count == 0 && row.power == 0.0));
    }

    #[test]
    fn forced_scenario_is_deterministic() {
        let r = roster(&[("A", 3), ("B", 2), ("C", 1)]);
        let scenario = Scenario::new()
            .force("A", Outcome::SideA)
            .force("B", Outcome::SideB)
            .force("C", Outcome::SideA);
        let report = simulate_scenario(&r, 4, &scenario, &seeded(50, 0)).unwrap();
        let ids: Vec<&str> = report.rows.iter().map(|row| row.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C", "B"]);
        assert_eq!(report.side_a_wins, 50);
        assert_eq!(report.side_a_win_probability, 1.0);
        assert_eq!(report.rows[0].power, 0.5);
        assert_eq!(report.rows[1].power, 0.5);
        assert_eq!(report.rows[2].power, 0.0);
    }

    #[test]
    fn later_override_replaces_earlier_one() {
        let r = roster(&[("A", 3), ("B", 3)]);
        let scenario = Scenario::new()
            .force("A", Outcome::SideB)
            .force("A", Outcome::SideA)
            .force("B", Outcome::SideA);
        let report = simulate_scenario(&r, 4, &scenario, &seeded(10, 0)).unwrap();
        assert_eq!(report.side_a_wins, 10);
    }

    #[test]
    fn same_seed_same_report() {
        let r = rosters::electoral_college();
        let rules = seeded(500, 2024);
        let r1 = simulate(&r, rosters::ELECTORAL_QUOTA, &rules).unwrap();
        let r2 = simulate(&r, rosters::ELECTORAL_QUOTA, &rules).unwrap();
        assert_eq!(r1, r2);
    }

    #[test]
    fn five_equal_entities_converge() {
        init();
        let r = roster(&[("A", 1), ("B", 1), ("C", 1), ("D", 1), ("E", 1)]);
        let report = simulate(&r, 3, &seeded(10_000, 1234)).unwrap();
        let pct = |id: &str| {
            report
                .rows
                .iter()
                .find(|row| row.id == id)
                .map(|row| row.percentage)
                .unwrap()
        };
        // The first three entities are always allocated and are symmetric.
        for id in ["A", "B", "C"] {
            assert!((pct(id) - 11.0 / 32.0).abs() < 0.02, "{} {}", id, pct(id));
        }
        // Later entities only vote when the race is still open.
        assert!((pct("D") - 9.0 / 32.0).abs() < 0.02);
        assert!((pct("E") - 6.0 / 32.0).abs() < 0.02);
        let side_a = report.side_a_wins as f64 / report.trials as f64;
        assert!((side_a - 0.5).abs() < 0.02);
    }

    #[test]
    fn merged_batches_add_up() {
        let r = rosters::electoral_college();
        let scenario = Scenario::new().force("CA", Outcome::SideB);
        let (t1, t2) = std::thread::scope(|s| {
            let h1 = s.spawn(|| {
                let mut rng = StdRng::seed_from_u64(1);
                run_trials(&r, 270, &scenario, 300, &mut rng)
            });
            let h2 = s.spawn(|| {
                let mut rng = StdRng::seed_from_u64(2);
                run_trials(&r, 270, &scenario, 200, &mut rng)
            });
            (h1.join().unwrap().unwrap(), h2.join().unwrap().unwrap())
        });
        let merged = t1.clone().merge(&t2).unwrap();
        assert_eq!(merged.trials(), 500);
        assert_eq!(merged.side_a_wins(), t1.side_a_wins() + t2.side_a_wins());
        assert_eq!(
            merged.side_a_wins() + merged.side_b_wins() + merged.undecided(),
            500
        );
        for (idx, c) in merged.counts().iter().enumerate() {
            assert_eq!(*c, t1.counts()[idx] + t2.counts()[idx]);
        }
        // California is forced to side B and never credited.
        let ca = r.iter().position(|e| e.id == "CA").unwrap();
        assert_eq!(merged.counts()[ca], 0);
    }

    #[test]
    fn merging_different_rosters_fails() {
        let mut rng = StdRng::seed_from_u64(4);
        let small = roster(&[("A", 1), ("B", 1)]);
        let large = roster(&[("A", 1), ("B", 1), ("C", 1)]);
        let t1 = run_trials(&small, 2, &Scenario::new(), 10, &mut rng).unwrap();
        let t2 = run_trials(&large, 2, &Scenario::new(), 10, &mut rng).unwrap();
        assert_eq!(
            t1.merge(&t2),
            Err(PowerErrors::MismatchedTallies { left: 2, right: 3 })
        );
    }
}
