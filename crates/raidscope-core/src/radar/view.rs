use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use arc_swap::{ArcSwap, ArcSwapOption};

use crate::game::{Player, PlayerType, Session, SessionStatus};

/// Read side of a running session.
///
/// The poll worker republishes the whole view after every tick. Readers
/// never block the worker and never observe a half-updated entity set.
pub struct SessionView {
    status: AtomicU8,
    map_name: ArcSwapOption<String>,
    players: ArcSwap<Vec<Arc<Player>>>,
    ticks: AtomicU64,
}

impl SessionView {
    pub fn new() -> Self {
        Self {
            status: AtomicU8::new(SessionStatus::NotFound as u8),
            map_name: ArcSwapOption::empty(),
            players: ArcSwap::from_pointee(Vec::new()),
            ticks: AtomicU64::new(0),
        }
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus::from_u8(self.status.load(Ordering::Acquire)).unwrap_or_default()
    }

    pub fn map_name(&self) -> Option<Arc<String>> {
        self.map_name.load_full()
    }

    /// Entity set as of the last tick, ordered by base address.
    pub fn players(&self) -> Arc<Vec<Arc<Player>>> {
        self.players.load_full()
    }

    pub fn local_player(&self) -> Option<Arc<Player>> {
        self.players
            .load()
            .iter()
            .find(|p| p.player_type() == PlayerType::LocalPlayer)
            .cloned()
    }

    /// Number of ticks published so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn publish(&self, session: &Session) {
        let players = session
            .players()
            .map(|players| players.snapshot())
            .unwrap_or_default();
        self.players.store(Arc::new(players));
        self.map_name
            .store(session.map_name().map(|name| Arc::new(name.to_string())));
        self.status.store(session.status() as u8, Ordering::Release);
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for SessionView {
    fn default() -> Self {
        Self::new()
    }
}
