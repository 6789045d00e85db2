//! Compact encodings of ballots and decisions.
//!
//! A decision crosses some boundaries as a single string: a one-digit kind
//! marker followed by the free-text reason, with no escaping. The digit
//! assignment is fixed:
//!
//! | marker | kind    |
//! |--------|---------|
//! | `0`    | unknown / unset |
//! | `1`    | pending |
//! | `2`    | commit  |
//! | `3`    | abort   |
//!
//! Ballots use `0` (unset), `1` (commit) and `2` (abort). These numbers are
//! only meaningful at serialization boundaries; everything else works with
//! [`Ballot`] and [`DecisionKind`].

use crate::decision::{Ballot, Decision, DecisionKind};

/// The stored form of a decision that has not been resolved yet.
pub const UNSET: &str = "0";

pub fn kind_to_wire(kind: DecisionKind) -> i32 {
    match kind {
        DecisionKind::Unknown => 0,
        DecisionKind::Pending => 1,
        DecisionKind::Commit => 2,
        DecisionKind::Abort => 3,
    }
}

/// Out-of-range values map to `Unknown`, never to an error.
pub fn kind_from_wire(value: i32) -> DecisionKind {
    match value {
        1 => DecisionKind::Pending,
        2 => DecisionKind::Commit,
        3 => DecisionKind::Abort,
        _ => DecisionKind::Unknown,
    }
}

pub fn ballot_to_wire(ballot: Ballot) -> i32 {
    match ballot {
        Ballot::Commit => 1,
        Ballot::Abort => 2,
    }
}

/// Returns `None` for the unset marker and for anything unrecognized.
pub fn ballot_from_wire(value: i32) -> Option<Ballot> {
    match value {
        1 => Some(Ballot::Commit),
        2 => Some(Ballot::Abort),
        _ => None,
    }
}

/// Encodes a decision as `<digit><reason>`.
pub fn encode(decision: &Decision) -> String {
    let marker = kind_to_wire(decision.kind);
    let mut encoded = String::with_capacity(1 + decision.reason.len());
    encoded.push(char::from(b'0' + marker as u8));
    encoded.push_str(&decision.reason);
    encoded
}

/// Decodes a `<digit><reason>` string.
///
/// The first character selects the kind and everything after it is the
/// reason, verbatim. An empty string or an unrecognized marker decodes to
/// [`DecisionKind::Unknown`].
pub fn decode(encoded: &str) -> Decision {
    let mut chars = encoded.chars();
    let Some(marker) = chars.next() else {
        return Decision::unknown();
    };
    let kind = match marker.to_digit(10) {
        Some(digit) => kind_from_wire(digit as i32),
        None => DecisionKind::Unknown,
    };
    Decision::new(kind, chars.as_str())
}
