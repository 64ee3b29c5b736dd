// Exact Banzhaf power index, computed with the generating polynomial of the
// coalition weights.

use log::{debug, info};

use crate::config::*;
use crate::{check_roster, CheckedRoster};

// Coefficients count subsets of the roster, so they fit in 128 bits as long
// as there are fewer than 128 entities.
const MAX_ENTITIES: usize = 127;

// The polynomial holds one coefficient per unit of total weight.
pub(crate) const MAX_TOTAL_WEIGHT: u64 = 1_000_000;

/// Computes the normalized Banzhaf power index of each weight.
///
/// The output is aligned with the input and sums to 1.
///
/// ```
/// let power = power_index::banzhaf(&[1, 1, 1], 2)?;
/// assert_eq!(power, vec![1.0 / 3.0; 3]);
/// # Ok::<(), power_index::PowerErrors>(())
/// ```
pub fn banzhaf(weights: &[u32], quota: u32) -> Result<Vec<f64>, PowerErrors> {
    let roster: Vec<Entity> = weights
        .iter()
        .enumerate()
        .map(|(idx, w)| Entity {
            id: format!("#{}", idx + 1),
            weight: *w,
        })
        .collect();
    let checked = check_banzhaf_roster(&roster, quota)?;
    let swings = swing_counts(&checked);
    normalize(&swings)
}

/// Computes the Banzhaf report of a roster: the swing count and the power of
/// each entity, sorted by decreasing power.
pub fn banzhaf_report(roster: &[Entity], quota: u32) -> Result<BanzhafReport, PowerErrors> {
    let checked = check_banzhaf_roster(roster, quota)?;
    info!(
        "banzhaf_report: {} entities, total weight {}, quota {}",
        roster.len(),
        checked.total_weight.0,
        quota
    );
    let swings = swing_counts(&checked);
    let power = normalize(&swings)?;
    let total_swings: u128 = swings.iter().sum();

    let mut rows: Vec<BanzhafRow> = roster
        .iter()
        .zip(swings.iter().zip(power.iter()))
        .map(|(e, (s, p))| BanzhafRow {
            id: e.id.clone(),
            weight: e.weight,
            swings: *s,
            power: *p,
        })
        .collect();
    // Same order as sorting by power, without comparing floats.
    rows.sort_by(|r1, r2| r2.swings.cmp(&r1.swings));
    for r in rows.iter() {
        debug!("banzhaf_report: {} ({}) -> {}", r.id, r.weight, r.power);
    }

    Ok(BanzhafReport {
        quota,
        total_weight: checked.total_weight.0,
        total_swings,
        rows,
    })
}

fn check_banzhaf_roster(roster: &[Entity], quota: u32) -> Result<CheckedRoster, PowerErrors> {
    let checked = check_roster(roster, quota)?;
    if checked.weights.len() > MAX_ENTITIES {
        return Err(PowerErrors::RosterTooLarge(checked.weights.len()));
    }
    if checked.total_weight.0 > MAX_TOTAL_WEIGHT {
        return Err(PowerErrors::RosterTooHeavy(checked.total_weight.0));
    }
    Ok(checked)
}

// Number of coalitions in which each entity is a swing vote, in roster order.
fn swing_counts(roster: &CheckedRoster) -> Vec<u128> {
    let weights: Vec<usize> = roster.weights.iter().map(|w| w.0 as usize).collect();
    let quota = roster.quota.0 as usize;
    let poly = generating_polynomial(&weights, roster.total_weight.0 as usize);

    weights
        .iter()
        .map(|w| {
            let without = remove_entity(&poly, *w, quota);
            // Coalitions that are short of the quota by less than w.
            let lowest = quota.saturating_sub(*w);
            without[lowest..quota].iter().sum()
        })
        .collect()
}

/// The coefficient at position k counts the subsets of the roster of total
/// weight k. This is the product of (1 + x^w) over all the weights.
fn generating_polynomial(weights: &[usize], total_weight: usize) -> Vec<u128> {
    let mut poly: Vec<u128> = vec![0; total_weight + 1];
    poly[0] = 1;
    let mut reach = 0;
    for w in weights.iter() {
        reach += *w;
        // Descending, so that poly[j - w] still holds the value from before
        // this entity was added.
        for j in (*w..=reach).rev() {
            poly[j] += poly[j - *w];
        }
    }
    poly
}

/// Divides the polynomial by (1 + x^w), keeping only the degrees below the quota.
fn remove_entity(poly: &[u128], w: usize, quota: usize) -> Vec<u128> {
    let mut without: Vec<u128> = vec![0; quota];
    for j in 0..quota {
        let shifted = if j >= w { without[j - w] } else { 0 };
        without[j] = poly[j] - shifted;
    }
    without
}

fn normalize(swings: &[u128]) -> Result<Vec<f64>, PowerErrors> {
    let total: u128 = swings.iter().sum();
    if total == 0 {
        return Err(PowerErrors::DegenerateIndex);
    }
    Ok(swings
        .iter()
        .map(|s| *s as f64 / total as f64)
        .collect())
}
