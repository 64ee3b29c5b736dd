//! Rosters of the 2024 US presidential race.
//!
//! The primary calendar follows the order in which the states vote, which
//! matters for the simulator. The electoral college is listed alphabetically
//! by state name.

use crate::config::Entity;

/// Delegates needed to win the nomination.
pub const PRIMARY_QUOTA: u32 = 1234;

/// Electoral votes needed to win the general election.
pub const ELECTORAL_QUOTA: u32 = 270;

const PRIMARY_CALENDAR: [(&str, u32); 56] = [
    ("IA", 40), ("NH", 22), ("NV", 26), ("SC", 50), ("MI", 55), ("ID", 32), ("VI", 9),
    ("DC", 19), ("AK", 28), ("AR", 40), ("MN", 39), ("TN", 58), ("AL", 49), ("CA", 169),
    ("CO", 37), ("ME", 20), ("MA", 40), ("NC", 75), ("OK", 43), ("TX", 162), ("UT", 40),
    ("VT", 17), ("VA", 48), ("GU", 9), ("ND", 29), ("WY", 29), ("PR", 23), ("MP", 9),
    ("GA", 59), ("HI", 19), ("MS", 39), ("WA", 43), ("MO", 54), ("AZ", 43), ("FL", 125),
    ("IL", 64), ("OH", 78), ("KS", 39), ("AS", 9), ("LA", 46), ("NY", 91), ("RI", 19),
    ("WI", 41), ("DE", 16), ("PA", 67), ("CT", 28), ("IN", 58), ("MD", 37), ("NE", 36),
    ("WV", 31), ("KY", 46), ("OR", 31), ("MT", 31), ("NJ", 49), ("NM", 22), ("SD", 29),
];

const ELECTORAL_VOTES: [(&str, u32); 51] = [
    ("AL", 9), ("AK", 3), ("AZ", 11), ("AR", 6), ("CA", 54), ("CO", 10), ("CT", 7), ("DE", 3),
    ("DC", 3), ("FL", 30), ("GA", 16), ("HI", 4), ("ID", 4), ("IL", 19), ("IN", 11), ("IA", 6),
    ("KS", 6), ("KY", 8), ("LA", 8), ("ME", 4), ("MD", 10), ("MA", 11), ("MI", 15), ("MN", 10),
    ("MS", 6), ("MO", 10), ("MT", 4), ("NE", 5), ("NV", 6), ("NH", 4), ("NJ", 14), ("NM", 5),
    ("NY", 28), ("NC", 16), ("ND", 3), ("OH", 17), ("OK", 7), ("OR", 8), ("PA", 19), ("RI", 4),
    ("SC", 9), ("SD", 3), ("TN", 11), ("TX", 40), ("UT", 6), ("VT", 3), ("VA", 13), ("WA", 12),
    ("WV", 4), ("WI", 10), ("WY", 3),
];

/// Republican primary contests with their delegate counts, in calendar order.
pub fn primary_calendar() -> Vec<Entity> {
    to_roster(&PRIMARY_CALENDAR)
}

/// The 50 states and the District of Columbia with their electoral votes.
pub fn electoral_college() -> Vec<Entity> {
    to_roster(&ELECTORAL_VOTES)
}

/// Looks up a built-in roster by name, along with its default quota.
pub fn preset(name: &str) -> Option<(Vec<Entity>, u32)> {
    match name {
        "primary" => Some((primary_calendar(), PRIMARY_QUOTA)),
        "electoral" => Some((electoral_college(), ELECTORAL_QUOTA)),
        _ => None,
    }
}

fn to_roster(pairs: &[(&str, u32)]) -> Vec<Entity> {
    pairs.iter().map(|(id, w)| Entity::new(id, *w)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(roster: &[Entity]) -> u32 {
        roster.iter().map(|e| e.weight).sum()
    }

    #[test]
    fn quotas_are_majorities() {
        let primary = primary_calendar();
        assert_eq!(primary.len(), 56);
        assert_eq!(total(&primary), 2467);
        assert_eq!(PRIMARY_QUOTA, total(&primary) / 2 + 1);

        let electoral = electoral_college();
        assert_eq!(electoral.len(), 51);
        assert_eq!(total(&electoral), 538);
        assert_eq!(ELECTORAL_QUOTA, total(&electoral) / 2 + 1);
    }

    #[test]
    fn calendar_starts_with_iowa() {
        let ids: Vec<String> = primary_calendar().into_iter().take(3).map(|e| e.id).collect();
        assert_eq!(ids, vec!["IA", "NH", "NV"]);
    }

    #[test]
    fn presets_by_name() {
        assert_eq!(preset("electoral").map(|(_, q)| q), Some(270));
        assert_eq!(preset("primary").map(|(r, _)| r.len()), Some(56));
        assert!(preset("senate").is_none());
    }
}
