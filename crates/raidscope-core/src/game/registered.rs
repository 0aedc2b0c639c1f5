//! The registered-players list of a match and the entity set built from it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::player::{BuildContext, GroupRegistry, Player, reconstruct_players};
use super::tables::ClassificationTables;
use crate::error::{Error, Result};
use crate::memory::layout::{limits, timing};
use crate::memory::{ReadMemory, ScatterBatch, Vec2, Vec3};
use crate::offset::{ListOffsets, Offsets};

/// Entity-set maintenance thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListSettings {
    /// Consecutive refresh failures before an entity is rebuilt
    pub max_errors: u32,
    /// Ticks an entity may be absent from the list before it is dropped
    pub max_missing_ticks: u32,
    pub position_cooldown: Duration,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            max_errors: 50,
            max_missing_ticks: 50,
            position_cooldown: Duration::from_millis(timing::TRANSFORM_REFRESH_COOLDOWN_MS),
        }
    }
}

/// What one list update changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListUpdate {
    /// Entities built this tick, including re-allocated ones
    pub added: usize,
    pub removed: usize,
    pub reallocated: usize,
    /// Entries that could not be built this tick
    pub failed: usize,
}

/// Outcome of one live-field refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub refreshed: usize,
    pub failed: usize,
}

fn is_unknown_class(e: &Error) -> bool {
    match e {
        Error::UnknownClass(_) => true,
        Error::Reconstruction { source, .. } => is_unknown_class(source),
        _ => false,
    }
}

/// Entity set keyed by foreign base address
#[derive(Debug)]
pub struct RegisteredPlayers {
    list_addr: u64,
    players: HashMap<u64, Arc<Player>>,
    groups: GroupRegistry,
    settings: ListSettings,
}

impl RegisteredPlayers {
    pub fn new(list_addr: u64, settings: ListSettings) -> Self {
        Self {
            list_addr,
            players: HashMap::new(),
            groups: GroupRegistry::default(),
            settings,
        }
    }

    pub fn list_addr(&self) -> u64 {
        self.list_addr
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, base: u64) -> Option<&Arc<Player>> {
        self.players.get(&base)
    }

    pub fn players(&self) -> impl Iterator<Item = &Arc<Player>> {
        self.players.values()
    }

    /// All entities ordered by base address.
    pub fn snapshot(&self) -> Vec<Arc<Player>> {
        let mut players: Vec<Arc<Player>> = self.players.values().cloned().collect();
        players.sort_by_key(|p| p.base());
        players
    }

    /// Read the base addresses currently stored in the list at `list_addr`.
    ///
    /// Null entries are skipped. The element array is fetched in one read.
    pub fn read_list<R: ReadMemory + ?Sized>(
        reader: &R,
        list_addr: u64,
        layout: &ListOffsets,
    ) -> Result<Vec<u64>> {
        let items = reader.read_ptr(list_addr.wrapping_add(layout.items))?;
        let count_addr = list_addr.wrapping_add(layout.count);
        let count = reader.read_i32(count_addr)?;
        if count < 0 || count as usize > limits::MAX_ENTITY_COUNT {
            return Err(Error::corrupt(
                count_addr,
                format!("implausible player count {}", count),
            ));
        }
        if count == 0 {
            return Ok(Vec::new());
        }
        let bytes = reader.read_bytes(items.wrapping_add(layout.first_element), count as usize * 8)?;
        Ok(bytes
            .chunks_exact(8)
            .filter_map(|chunk| <[u8; 8]>::try_from(chunk).ok())
            .map(u64::from_le_bytes)
            .filter(|&base| base != 0)
            .collect())
    }

    /// Re-read the list and reconcile the entity set with it.
    ///
    /// New entries are built, entities over the error threshold are rebuilt
    /// keeping their last position, and absent entities are marked inactive
    /// and eventually dropped. Fails with [`Error::Classification`] when no
    /// entity exists and every entry had an unrecognized runtime class.
    pub fn update_list<R: ReadMemory + ?Sized>(
        &mut self,
        reader: &R,
        offsets: &Offsets,
        tables: &ClassificationTables,
    ) -> Result<ListUpdate> {
        let bases = Self::read_list(reader, self.list_addr, &offsets.list)?;
        let mut update = ListUpdate::default();
        let mut seen = HashSet::with_capacity(bases.len());
        let mut pending: Vec<(u64, Option<Vec3>)> = Vec::new();

        for base in bases {
            if !seen.insert(base) {
                continue;
            }
            match self.players.get(&base) {
                Some(player) if player.error_count() >= self.settings.max_errors => {
                    warn!(
                        "'{}' failed {} refreshes in a row, re-allocating",
                        player.name(),
                        player.error_count()
                    );
                    pending.push((base, Some(player.position())));
                    self.players.remove(&base);
                    update.reallocated += 1;
                }
                Some(player) => player.mark_seen(),
                None => pending.push((base, None)),
            }
        }

        if !pending.is_empty() {
            let mut ctx = BuildContext {
                offsets,
                tables,
                groups: &mut self.groups,
                position_cooldown: self.settings.position_cooldown,
            };
            let built = reconstruct_players(reader, &pending, &mut ctx)?;
            update.failed = built.failures.len();
            let all_unknown = !built.failures.is_empty()
                && built.players.is_empty()
                && built.failures.iter().all(|(_, e)| is_unknown_class(e));
            for player in built.players {
                self.players.insert(player.base(), Arc::new(player));
                update.added += 1;
            }
            if all_unknown && self.players.is_empty() {
                return Err(Error::Classification(format!(
                    "none of {} list entries has a known player class",
                    update.failed
                )));
            }
        }

        let max_missing = self.settings.max_missing_ticks;
        self.players.retain(|base, player| {
            if seen.contains(base) {
                return true;
            }
            if player.mark_missing() > max_missing {
                debug!("Dropping '{}' after {} missing ticks", player.name(), max_missing);
                update.removed += 1;
                return false;
            }
            true
        });

        Ok(update)
    }

    /// Refresh position, rotation and health of every live entity with a
    /// single scatter batch.
    pub fn refresh_live<R: ReadMemory + ?Sized>(
        &self,
        reader: &R,
        offsets: &Offsets,
        now: Instant,
    ) -> Result<RefreshStats> {
        let mut batch = ScatterBatch::new();
        let mut slots = Vec::with_capacity(self.players.len());
        for player in self.players.values() {
            if !player.is_active() || !player.is_alive() {
                continue;
            }
            let position = player
                .transform()
                .map(|t| batch.add_value::<Vec3>(t.position_addr, 0));
            let rotation =
                batch.add_value::<Vec2>(player.variant().rotation_addr(&offsets.movement), 0);
            let health = player
                .variant()
                .health_addr(&offsets.health)
                .map(|addr| batch.add_value::<i32>(addr, 0));
            slots.push((player, position, rotation, health));
        }

        let mut stats = RefreshStats::default();
        if slots.is_empty() {
            return Ok(stats);
        }
        reader.scatter(&mut batch)?;

        for (player, position, rotation, health) in slots {
            let sample = position.and_then(|id| batch.value::<Vec3>(id));
            let ok = player.apply_position(sample, reader, &offsets.transform, now)?;
            player.apply_rotation(batch.value::<Vec2>(rotation));
            if let Some(id) = health {
                player.apply_health_tag(batch.value::<i32>(id));
            }
            if ok {
                stats.refreshed += 1;
            } else {
                stats.failed += 1;
            }
            player.record_refresh(ok);
        }
        Ok(stats)
    }
}
