use chrono::{DateTime, Utc};
use game_types::{Player, PlayerId};

/// A player is connected while their last heartbeat is strictly younger than
/// this many seconds.
pub const CONNECTED_WINDOW_SECS: i64 = 65;
/// A host or describer whose heartbeat is strictly older than this is treated
/// as failed and eligible for reassignment.
pub const ROLE_FAILOVER_SECS: i64 = 120;

pub fn is_connected(now: DateTime<Utc>, last_seen: DateTime<Utc>) -> bool {
    now.signed_duration_since(last_seen).num_seconds() < CONNECTED_WINDOW_SECS
}

pub fn is_role_failed(now: DateTime<Utc>, last_seen: DateTime<Utc>) -> bool {
    now.signed_duration_since(last_seen).num_seconds() > ROLE_FAILOVER_SECS
}

/// Earliest-joined connected player, with the id as tiebreaker so the result
/// is stable under identical join timestamps.
pub fn earliest_connected(players: &[Player], now: DateTime<Utc>) -> Option<&Player> {
    players
        .iter()
        .filter(|p| is_connected(now, p.last_seen))
        .min_by_key(|p| (p.joined_at, p.id))
}

/// Role reassignment performed by a presence sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailoverAction {
    HostReassigned {
        previous: PlayerId,
        new_host: PlayerId,
    },
    DescriberReassigned {
        previous: PlayerId,
        new_describer: PlayerId,
    },
}
