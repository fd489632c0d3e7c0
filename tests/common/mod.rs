//! Shared test helpers.
//!
//! Factory functions for transfer records and CSV fixtures with sensible
//! defaults, so individual tests only spell out what they care about.

#![allow(dead_code)]

use tfn_data::{Direction, TransferRecord};

/// Creates a transfer record.
///
/// # Example
/// ```ignore
/// let r = record("Arsenal", "Chelsea", Direction::In, 5e6);
/// ```
pub fn record(team: &str, counter_team: &str, dir: Direction, fee: f64) -> TransferRecord {
    TransferRecord {
        team: team.to_string(),
        counter_team: counter_team.to_string(),
        dir,
        fee,
    }
}

/// The three-record scenario used throughout the acceptance checks:
///
/// - A sells to B twice (5M, 3M): edge A→B, count 2, total 8M, avg 4M.
/// - C buys from A once (10M, recorded from C's side as inbound), so the
///   counter-party A is the source: edge A→C, count 1.
pub fn acceptance_scenario() -> Vec<TransferRecord> {
    vec![
        record("A", "B", Direction::Out, 5e6),
        record("A", "B", Direction::Out, 3e6),
        record("C", "A", Direction::In, 10e6),
    ]
}

/// CSV text for [`acceptance_scenario`], header included.
pub fn acceptance_scenario_csv() -> String {
    "team_name,counter_team_name,dir,transfer_fee_amnt\n\
     A,B,left,5000000\n\
     A,B,left,3000000\n\
     C,A,in,10000000\n"
        .to_string()
}
