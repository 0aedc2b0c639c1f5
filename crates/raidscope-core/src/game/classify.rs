//! Entity category rules.
//!
//! Classification is a pure function of the facts read from memory, so the
//! rules can be tested without a foreign process.

use super::enums::{PlayerType, Side};
use super::names::NameTables;
use super::watchlist::Watchlist;

/// Category of a locally controlled record from its game version string.
///
/// Offline AI records carry no version.
pub fn classify_local(game_version: &str) -> PlayerType {
    if game_version.is_empty() {
        PlayerType::AIOfflineScav
    } else {
        PlayerType::LocalPlayer
    }
}

/// Category of an observed record.
///
/// `name` is the display name (already translated). Combinations that do
/// not correspond to a known faction stay [`PlayerType::Default`].
pub fn classify_observed(side: i32, is_ai: bool, name: &str, names: &NameTables) -> PlayerType {
    match (Side::from_repr(side), is_ai) {
        (Some(Side::Usec), false) => PlayerType::Usec,
        (Some(Side::Bear), false) => PlayerType::Bear,
        (Some(Side::Savage), false) => PlayerType::PScav,
        (Some(Side::Savage), true) if names.is_boss_name(name) => PlayerType::AIBoss,
        (Some(Side::Savage), true) if names.is_elite_name(name) => PlayerType::AIRaider,
        (Some(Side::Savage), true) => PlayerType::AIScav,
        _ => PlayerType::Default,
    }
}

/// Promote watched hostile humans to [`PlayerType::SpecialPlayer`].
///
/// Returns the final category and the watchlist reason, if any.
pub fn promote(
    player_type: PlayerType,
    account_id: &str,
    watchlist: &Watchlist,
) -> (PlayerType, Option<String>) {
    if !player_type.is_human_hostile() || account_id.is_empty() {
        return (player_type, None);
    }
    match watchlist.reason(account_id) {
        Some(reason) => (PlayerType::SpecialPlayer, Some(reason.to_string())),
        None => (player_type, None),
    }
}
