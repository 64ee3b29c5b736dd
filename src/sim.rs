use log::{debug, info, warn};

use power_index::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::PathBuf;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::sim::config_reader::*;

pub mod config_reader;

#[derive(Debug, Snafu)]
pub enum SimError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a non-negative integer"))]
    ParsingJsonNumber {},
    #[snafu(display("Error writing summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Unknown roster preset {name:?} (expected primary or electoral)"))]
    UnknownPreset { name: String },
    #[snafu(display("Unknown mode {mode:?} (expected banzhaf, simulate or scenario)"))]
    UnknownMode { mode: String },
    #[snafu(display("Unknown outcome {outcome:?} for {id} (expected sideA, sideB or unconstrained)"))]
    UnknownOutcome { id: String, outcome: String },
    #[snafu(display("No roster: provide a preset or a list of entities"))]
    MissingRoster {},
    #[snafu(display("No quota: provide one in the rules or use a preset"))]
    MissingQuota {},
    #[snafu(display("{source}"))]
    Power { source: PowerErrors },
    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SimResult<T> = Result<T, SimError>;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum Mode {
    Banzhaf,
    Simulate,
    Scenario,
}

impl Mode {
    fn name(&self) -> &'static str {
        match self {
            Mode::Banzhaf => "banzhaf",
            Mode::Simulate => "simulate",
            Mode::Scenario => "scenario",
        }
    }
}

/// Everything needed for one run, after merging the configuration file and
/// the command line.
#[derive(Debug, Clone)]
struct RunPlan {
    contest: String,
    date: Option<String>,
    output_directory: Option<String>,
    mode: Mode,
    roster: Vec<Entity>,
    quota: u32,
    rules: SimulationRules,
    scenario: Scenario,
}

fn validate_mode(mode: &str) -> SimResult<Mode> {
    match mode {
        "banzhaf" => Ok(Mode::Banzhaf),
        "simulate" => Ok(Mode::Simulate),
        "scenario" => Ok(Mode::Scenario),
        x => UnknownModeSnafu { mode: x }.fail(),
    }
}

fn validate_outcome(id: &str, outcome: &str) -> SimResult<Outcome> {
    match outcome {
        "sideA" | "A" | "a" => Ok(Outcome::SideA),
        "sideB" | "B" | "b" => Ok(Outcome::SideB),
        "unconstrained" | "" => Ok(Outcome::Unconstrained),
        x => UnknownOutcomeSnafu { id, outcome: x }.fail(),
    }
}

fn read_preset(name: &str) -> SimResult<(Vec<Entity>, u32)> {
    rosters::preset(name).context(UnknownPresetSnafu { name })
}

// Flags given on the command line take precedence over the configuration file.
fn build_plan(config: Option<&SimConfig>, args: &Args) -> SimResult<RunPlan> {
    let (roster, preset_quota): (Vec<Entity>, Option<u32>) = if let Some(name) = &args.preset {
        let (r, q) = read_preset(name)?;
        (r, Some(q))
    } else {
        match config.map(|c| &c.roster) {
            Some(RosterSource {
                entities: Some(entities),
                ..
            }) => {
                let mut r: Vec<Entity> = Vec::new();
                for e in entities.iter() {
                    r.push(Entity::new(&e.id, e.weight()?));
                }
                (r, None)
            }
            Some(RosterSource {
                preset: Some(name), ..
            }) => {
                let (r, q) = read_preset(name)?;
                (r, Some(q))
            }
            _ => return MissingRosterSnafu {}.fail(),
        }
    };

    let config_quota = match config {
        Some(c) => c.rules.quota()?,
        None => None,
    };
    // A preset chosen on the command line brings its own quota, which
    // replaces the one written for the configuration file's roster.
    let quota = if args.preset.is_some() {
        args.quota.or(preset_quota)
    } else {
        args.quota.or(config_quota).or(preset_quota)
    }
    .context(MissingQuotaSnafu {})?;

    let mode = match (&args.mode, config) {
        (Some(m), _) => validate_mode(m)?,
        (None, Some(c)) => validate_mode(&c.rules.mode)?,
        (None, None) => Mode::Banzhaf,
    };

    let config_trials = match config {
        Some(c) => c.rules.trials()?,
        None => None,
    };
    let config_seed = match config {
        Some(c) => c.rules.seed()?,
        None => None,
    };
    let rules = SimulationRules {
        trials: args
            .trials
            .or(config_trials)
            .unwrap_or(SimulationRules::DEFAULT_RULES.trials),
        seed: args.seed.or(config_seed),
    };

    let mut scenario = Scenario::new();
    if let Some(entries) = config.and_then(|c| c.scenario.as_ref()) {
        for entry in entries.iter() {
            scenario = scenario.force(&entry.id, validate_outcome(&entry.id, &entry.outcome)?);
        }
    }
    for f in args.force.iter() {
        let (id, outcome) = match f.split_once('=') {
            Some(p) => p,
            None => whatever!("Cannot understand --force {:?}, expected ID=A or ID=B", f),
        };
        scenario = scenario.force(id, validate_outcome(id, outcome)?);
    }
    if mode != Mode::Scenario && !scenario.is_empty() {
        warn!(
            "{} forced outcomes are ignored in mode {}",
            scenario.overrides.len(),
            mode.name()
        );
    }

    let (contest, date, output_directory) = match config {
        Some(c) => (
            c.output_settings.contest_name.clone(),
            c.output_settings.contest_date.clone(),
            c.output_settings.output_directory.clone(),
        ),
        None => (
            args.preset.clone().unwrap_or_else(|| "unnamed".to_string()),
            None,
            None,
        ),
    };

    Ok(RunPlan {
        contest,
        date,
        output_directory,
        mode,
        roster,
        quota,
        rules,
        scenario,
    })
}

fn build_summary_js(plan: &RunPlan) -> SimResult<JSValue> {
    let total_weight: u64 = plan.roster.iter().map(|e| e.weight as u64).sum();
    let is_simulation = plan.mode != Mode::Banzhaf;
    let c = OutputConfig {
        contest: plan.contest.clone(),
        date: plan.date.clone(),
        mode: plan.mode.name().to_string(),
        quota: plan.quota.to_string(),
        total_weight: total_weight.to_string(),
        trials: if is_simulation {
            Some(plan.rules.trials.to_string())
        } else {
            None
        },
        seed: if is_simulation {
            plan.rules.seed.map(|s| s.to_string())
        } else {
            None
        },
    };

    let js = match plan.mode {
        Mode::Banzhaf => {
            let report = banzhaf_report(&plan.roster, plan.quota).context(PowerSnafu {})?;
            let mut results: Vec<JSValue> = Vec::new();
            for row in report.rows.iter() {
                info!("{:>6} {:>5} {:>12} {:.4}", row.id, row.weight, row.swings, row.power);
                results.push(json!({
                    "entity": row.id,
                    "weight": row.weight.to_string(),
                    "swings": row.swings.to_string(),
                    "power": row.power
                }));
            }
            json!({ "config": c, "results": results })
        }
        Mode::Simulate => {
            let report = simulate(&plan.roster, plan.quota, &plan.rules).context(PowerSnafu {})?;
            let mut results: Vec<JSValue> = Vec::new();
            for row in report.rows.iter() {
                info!(
                    "{:>6} {:>5} {:>10} {:.4}",
                    row.id, row.weight, row.count, row.percentage
                );
                results.push(json!({
                    "entity": row.id,
                    "weight": row.weight.to_string(),
                    "winningCoalitionCount": row.count.to_string(),
                    "winningCoalitionPct": row.percentage
                }));
            }
            json!({
                "config": c,
                "sideAWins": report.side_a_wins.to_string(),
                "results": results
            })
        }
        Mode::Scenario => {
            let report = simulate_scenario(&plan.roster, plan.quota, &plan.scenario, &plan.rules)
                .context(PowerSnafu {})?;
            let mut results: Vec<JSValue> = Vec::new();
            for row in report.rows.iter() {
                info!(
                    "{:>6} {:>5} {:>10} {:.4} {:.4}",
                    row.id, row.weight, row.count, row.percentage, row.power
                );
                results.push(json!({
                    "entity": row.id,
                    "weight": row.weight.to_string(),
                    "winningCoalitionCount": row.count.to_string(),
                    "winningCoalitionPct": row.percentage,
                    "power": row.power
                }));
            }
            info!(
                "Side A wins {:.2}% of the trials",
                report.side_a_win_probability * 100.0
            );
            json!({
                "config": c,
                "sideAWinProbability": report.side_a_win_probability,
                "sideBWinProbability": report.side_b_win_probability,
                "results": results
            })
        }
    };
    Ok(js)
}

fn write_summary(pretty_js: &str, out: Option<&String>, plan: &RunPlan) -> SimResult<()> {
    let path: Option<String> = match (out, &plan.output_directory) {
        (Some(o), _) if o == "stdout" || o.is_empty() => None,
        (Some(o), _) => Some(o.clone()),
        (None, Some(dir)) => {
            let p: PathBuf = [dir.as_str(), "summary.json"].iter().collect();
            Some(p.as_path().display().to_string())
        }
        (None, None) => None,
    };
    match path {
        Some(p) => {
            info!("Writing summary to {:?}", p);
            fs::write(&p, pretty_js).context(WritingSummarySnafu { path: p.clone() })
        }
        None => {
            println!("{}", pretty_js);
            Ok(())
        }
    }
}

fn check_reference(pretty_js_stats: &str, summary_path: &str) -> SimResult<()> {
    let summary_ref = read_summary(summary_path)?;
    debug!("summary: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference string");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        return ReferenceMismatchSnafu {}.fail();
    }
    Ok(())
}

/// Runs one report as described by the command line, and optionally by a
/// configuration file.
pub fn run(args: &Args) -> SimResult<()> {
    let config = match &args.config {
        Some(p) => Some(read_config(p)?),
        None => None,
    };
    let plan = build_plan(config.as_ref(), args)?;
    info!(
        "Running {} over {} entities (quota {})",
        plan.mode.name(),
        plan.roster.len(),
        plan.quota
    );

    let result_js = build_summary_js(&plan)?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    write_summary(&pretty_js_stats, args.out.as_ref(), &plan)?;

    if let Some(summary_p) = &args.reference {
        check_reference(&pretty_js_stats, summary_p)?;
    }
    Ok(())
}

#[cfg(test)]
fn run_simulation_test(test_name: &str) -> SimResult<()> {
    let test_dir = format!("{}/testdata/{}", env!("CARGO_MANIFEST_DIR"), test_name);
    info!("Running test {}", test_name);
    let config = read_config(&format!("{}/{}_config.json", test_dir, test_name))?;
    let args = Args::default();
    let plan = build_plan(Some(&config), &args)?;
    let result_js = build_summary_js(&plan)?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    check_reference(
        &pretty_js_stats,
        &format!("{}/{}_expected_summary.json", test_dir, test_name),
    )
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str) {
    let res = run_simulation_test(test_name);
    if let Err(e) = &res {
        eprintln!("An error occured {}", e);
    }
    assert!(res.is_ok(), "test {} failed", test_name);
}
