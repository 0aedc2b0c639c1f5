//! Entity reconstruction and live-field state.
//!
//! A [`Player`] is built once from a foreign record; its identity never
//! changes afterwards. Live fields (position, rotation, health, flags) are
//! updated in place by the poll worker while readers hold `Arc<Player>`
//! snapshots, so each field is either an atomic or behind its own lock.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::classify::{classify_local, classify_observed, promote};
use super::enums::{LayoutKind, PlayerClass, PlayerType};
use super::tables::ClassificationTables;
use super::transform::Transform;
use crate::error::{Error, Result};
use crate::memory::layout::{limits, timing};
use crate::memory::{ReadMemory, Vec2, Vec3};
use crate::offset::{
    ClassOffsets, HealthOffsets, InventoryOffsets, MovementOffsets, Offsets, StringOffsets,
    TransformOffsets,
};

/// Health value when the status tag is unknown
pub const HEALTH_UNKNOWN: i32 = -1;

/// Status tag of a dead entity
const TAG_DEAD: i32 = 8192;

/// Map a health status tag to a coarse health percentage.
pub fn health_from_tag(tag: i32) -> i32 {
    match tag {
        1024 => 100,
        2048 => 50,
        4096 => 10,
        TAG_DEAD => 0,
        _ => HEALTH_UNKNOWN,
    }
}

fn wrap_degrees(value: f32) -> f32 {
    let wrapped = value.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Normalize a raw `(yaw, pitch)` pair for a north-up map.
pub fn normalize_rotation(raw: Vec2) -> Vec2 {
    Vec2::new(wrap_degrees(raw.x - 90.0), wrap_degrees(raw.y))
}

/// Rate limiter for transform re-acquisition
#[derive(Debug, Clone)]
pub struct RefreshCooldown {
    period: Duration,
    last_attempt: Option<Instant>,
}

impl RefreshCooldown {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last_attempt: None,
        }
    }

    /// Start an attempt at `now` unless the previous one is too recent.
    pub fn try_begin(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_attempt
            && now.saturating_duration_since(last) < self.period
        {
            return false;
        }
        self.last_attempt = Some(now);
        true
    }
}

impl Default for RefreshCooldown {
    fn default() -> Self {
        Self::new(Duration::from_millis(timing::TRANSFORM_REFRESH_COOLDOWN_MS))
    }
}

/// Interns group strings into small per-session integers
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    ids: HashMap<String, i32>,
}

impl GroupRegistry {
    /// Id for `group`; empty strings are solo (-1).
    pub fn intern(&mut self, group: &str) -> i32 {
        if group.is_empty() {
            return -1;
        }
        let next = self.ids.len() as i32;
        *self.ids.entry(group.to_lowercase()).or_insert(next)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Sub-object addresses, by record layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerVariant {
    Local {
        info: u64,
        movement_context: u64,
        inventory_slots: u64,
        player_body: u64,
    },
    Observed {
        movement_context: u64,
        inventory_slots: u64,
        player_body: u64,
        health_controller: u64,
    },
}

impl PlayerVariant {
    pub fn layout(&self) -> LayoutKind {
        match self {
            Self::Local { .. } => LayoutKind::Local,
            Self::Observed { .. } => LayoutKind::Observed,
        }
    }

    pub fn rotation_addr(&self, layout: &MovementOffsets) -> u64 {
        match self {
            Self::Local {
                movement_context, ..
            } => movement_context.wrapping_add(layout.local_rotation),
            Self::Observed {
                movement_context, ..
            } => movement_context.wrapping_add(layout.observed_rotation),
        }
    }

    /// Only observed records expose a health controller.
    pub fn health_addr(&self, layout: &HealthOffsets) -> Option<u64> {
        match self {
            Self::Local { .. } => None,
            Self::Observed {
                health_controller, ..
            } => Some(health_controller.wrapping_add(layout.tag_status)),
        }
    }

    pub fn inventory_slots(&self) -> u64 {
        match self {
            Self::Local {
                inventory_slots, ..
            }
            | Self::Observed {
                inventory_slots, ..
            } => *inventory_slots,
        }
    }
}

/// Runtime class name of the object at `base`.
pub fn read_class_name<R: ReadMemory + ?Sized>(
    reader: &R,
    base: u64,
    layout: &ClassOffsets,
) -> Result<String> {
    let name_ptr = reader.read_ptr_chain(base, &layout.to_name)?;
    reader.read_string(name_ptr, limits::OBJECT_NAME_SIZE)
}

/// Everything needed to build a [`Player`] from one list entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSource {
    pub base: u64,
    /// Profile record; zero for observed records
    pub profile: u64,
    pub class: PlayerClass,
    /// Position carried over when an entity is re-allocated
    pub last_position: Option<Vec3>,
}

impl PlayerSource {
    /// Determine the runtime class of the record at `base`.
    pub fn resolve<R: ReadMemory + ?Sized>(
        reader: &R,
        base: u64,
        offsets: &Offsets,
        last_position: Option<Vec3>,
    ) -> Result<Self> {
        let class_name = read_class_name(reader, base, &offsets.class)?;
        let class =
            PlayerClass::from_str(&class_name).map_err(|_| Error::UnknownClass(class_name))?;
        let profile = match class.layout() {
            LayoutKind::Local => reader.read_ptr(base.wrapping_add(offsets.player.profile))?,
            LayoutKind::Observed => 0,
        };
        Ok(Self {
            base,
            profile,
            class,
            last_position,
        })
    }
}

/// Shared inputs for building players during one tick
pub struct BuildContext<'a> {
    pub offsets: &'a Offsets,
    pub tables: &'a ClassificationTables,
    pub groups: &'a mut GroupRegistry,
    pub position_cooldown: Duration,
}

fn read_string_at<R: ReadMemory + ?Sized>(
    reader: &R,
    slot: u64,
    layout: &StringOffsets,
) -> Result<String> {
    let ptr = reader.read_ptr(slot)?;
    reader.read_managed_string(ptr, layout)
}

/// Like [`read_string_at`], but any failure other than shutdown is `None`.
fn read_optional_string<R: ReadMemory + ?Sized>(
    reader: &R,
    slot: u64,
    layout: &StringOffsets,
) -> Result<Option<String>> {
    match read_string_at(reader, slot, layout) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.is_shutdown() => Err(e),
        Err(e) => {
            debug!("Optional string at 0x{:X} unavailable: {}", slot, e);
            Ok(None)
        }
    }
}

fn resolve_inventory_slots<R: ReadMemory + ?Sized>(
    reader: &R,
    controller: u64,
    layout: &InventoryOffsets,
) -> Result<u64> {
    let inventory = reader.read_ptr(controller.wrapping_add(layout.inventory))?;
    let equipment = reader.read_ptr(inventory.wrapping_add(layout.equipment))?;
    reader.read_ptr(equipment.wrapping_add(layout.slots))
}

/// Identity fields shared by both layouts
struct Identity {
    variant: PlayerVariant,
    transform: Transform,
    account_id: String,
    name: String,
    group_id: i32,
    player_type: PlayerType,
}

/// One reconstructed entity
#[derive(Debug)]
pub struct Player {
    base: u64,
    profile: u64,
    class: PlayerClass,
    variant: PlayerVariant,
    account_id: String,
    name: String,
    group_id: i32,
    player_type: PlayerType,
    watch_reason: Option<String>,
    transform_internal: u64,
    transform: Mutex<Option<Transform>>,
    position: Mutex<Vec3>,
    rotation: AtomicU64,
    health: AtomicI32,
    alive: AtomicBool,
    active: AtomicBool,
    error_count: AtomicU32,
    missing_ticks: AtomicU32,
    position_cooldown: Mutex<RefreshCooldown>,
    reacquire_attempts: AtomicU32,
}

impl Player {
    /// Build an entity from its record.
    ///
    /// Any failure other than shutdown is reported as
    /// [`Error::Reconstruction`] for this base address.
    pub fn build<R: ReadMemory + ?Sized>(
        reader: &R,
        source: &PlayerSource,
        ctx: &mut BuildContext<'_>,
    ) -> Result<Self> {
        let identity = match source.class.layout() {
            LayoutKind::Local => Self::read_local(reader, source, ctx),
            LayoutKind::Observed => Self::read_observed(reader, source, ctx),
        }
        .map_err(|e| wrap_reconstruction(source.base, e))?;

        let (player_type, watch_reason) = promote(
            identity.player_type,
            &identity.account_id,
            &ctx.tables.watchlist,
        );

        let player = Self {
            base: source.base,
            profile: source.profile,
            class: source.class,
            variant: identity.variant,
            account_id: identity.account_id,
            name: identity.name,
            group_id: identity.group_id,
            player_type,
            watch_reason,
            transform_internal: identity.transform.internal,
            transform: Mutex::new(Some(identity.transform)),
            position: Mutex::new(source.last_position.unwrap_or_default()),
            rotation: AtomicU64::new(Vec2::default().to_bits()),
            health: AtomicI32::new(HEALTH_UNKNOWN),
            alive: AtomicBool::new(true),
            active: AtomicBool::new(true),
            error_count: AtomicU32::new(0),
            missing_ticks: AtomicU32::new(0),
            position_cooldown: Mutex::new(RefreshCooldown::new(ctx.position_cooldown)),
            reacquire_attempts: AtomicU32::new(0),
        };
        player.log_allocation();
        Ok(player)
    }

    fn read_local<R: ReadMemory + ?Sized>(
        reader: &R,
        source: &PlayerSource,
        ctx: &mut BuildContext<'_>,
    ) -> Result<Identity> {
        let o = ctx.offsets;
        let base = source.base;

        let info = reader.read_ptr(source.profile.wrapping_add(o.profile.player_info))?;
        let movement_context = reader.read_ptr(base.wrapping_add(o.player.movement_context))?;
        let transform_internal = reader.read_ptr_chain(base, &o.player.to_transform)?;
        let transform = Transform::acquire(reader, transform_internal, &o.transform)?;
        let raw_name = read_string_at(reader, info.wrapping_add(o.player_info.nickname), &o.string)?;
        let controller = reader.read_ptr(base.wrapping_add(o.player.inventory_controller))?;
        let inventory_slots = resolve_inventory_slots(reader, controller, &o.inventory)?;
        let player_body = reader.read_ptr(base.wrapping_add(o.player.player_body))?;

        let account_id = read_optional_string(
            reader,
            source.profile.wrapping_add(o.profile.account_id),
            &o.string,
        )?
        .unwrap_or_default();
        let group_id = read_optional_string(
            reader,
            info.wrapping_add(o.player_info.group_id),
            &o.string,
        )?
        .map_or(-1, |group| ctx.groups.intern(&group));
        let game_version = read_optional_string(
            reader,
            info.wrapping_add(o.player_info.game_version),
            &o.string,
        )?;

        let player_type = match game_version.as_deref() {
            Some(version) => classify_local(version),
            None => PlayerType::Default,
        };
        let name = if player_type == PlayerType::AIOfflineScav {
            ctx.tables.names.display_name(&raw_name)
        } else {
            raw_name
        };

        Ok(Identity {
            variant: PlayerVariant::Local {
                info,
                movement_context,
                inventory_slots,
                player_body,
            },
            transform,
            account_id,
            name,
            group_id,
            player_type,
        })
    }

    fn read_observed<R: ReadMemory + ?Sized>(
        reader: &R,
        source: &PlayerSource,
        ctx: &mut BuildContext<'_>,
    ) -> Result<Identity> {
        let o = ctx.offsets;
        let base = source.base;

        let movement_context = reader.read_ptr_chain(base, &o.observed.to_movement_context)?;
        let transform_internal = reader.read_ptr_chain(base, &o.observed.to_transform)?;
        let transform = Transform::acquire(reader, transform_internal, &o.transform)?;
        let raw_name = read_string_at(reader, base.wrapping_add(o.observed.nickname), &o.string)?;
        let side = reader.read_i32(base.wrapping_add(o.observed.side))?;
        let is_ai = reader.read_bool(base.wrapping_add(o.observed.is_ai))?;
        let player_body = reader.read_ptr(base.wrapping_add(o.observed.player_body))?;
        let controller = reader.read_ptr_chain(base, &o.observed.to_inventory_controller)?;
        let inventory_slots = resolve_inventory_slots(reader, controller, &o.inventory)?;
        let account_id = read_optional_string(
            reader,
            base.wrapping_add(o.observed.account_id),
            &o.string,
        )?
        .unwrap_or_default();
        let group_id = read_optional_string(
            reader,
            base.wrapping_add(o.observed.group_id),
            &o.string,
        )?
        .map_or(-1, |group| ctx.groups.intern(&group));
        let health_controller = reader.read_ptr_chain(base, &o.observed.to_health_controller)?;

        let name = ctx.tables.names.display_name(&raw_name);
        let player_type = classify_observed(side, is_ai, &name, &ctx.tables.names);
        if player_type == PlayerType::Default {
            debug!(
                "Unrecognized side {} (ai: {}) for '{}' at 0x{:X}",
                side, is_ai, name, base
            );
        }

        Ok(Identity {
            variant: PlayerVariant::Observed {
                movement_context,
                inventory_slots,
                player_body,
                health_controller,
            },
            transform,
            account_id,
            name,
            group_id,
            player_type,
        })
    }

    fn log_allocation(&self) {
        if self.player_type.is_human_hostile() {
            let group = if self.group_id != -1 {
                format!(", G:{}", self.group_id)
            } else {
                String::new()
            };
            let watched = match &self.watch_reason {
                Some(reason) => format!(", watched: {}", reason),
                None => String::new(),
            };
            info!("{} ({}){}{}", self.name, self.player_type, group, watched);
        } else {
            debug!(
                "Allocated {} ({}) at 0x{:X}",
                self.name, self.player_type, self.base
            );
        }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn profile(&self) -> u64 {
        self.profile
    }

    pub fn class(&self) -> PlayerClass {
        self.class
    }

    pub fn variant(&self) -> &PlayerVariant {
        &self.variant
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group_id(&self) -> i32 {
        self.group_id
    }

    pub fn player_type(&self) -> PlayerType {
        self.player_type
    }

    pub fn watch_reason(&self) -> Option<&str> {
        self.watch_reason.as_deref()
    }

    pub fn transform(&self) -> Option<Transform> {
        *self.transform.lock()
    }

    pub fn position(&self) -> Vec3 {
        *self.position.lock()
    }

    pub fn rotation(&self) -> Vec2 {
        Vec2::from_bits(self.rotation.load(Ordering::Relaxed))
    }

    pub fn health(&self) -> i32 {
        self.health.load(Ordering::Relaxed)
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Left the match while alive.
    pub fn has_exfiltrated(&self) -> bool {
        !self.is_active() && self.is_alive()
    }

    pub fn error_count(&self) -> u32 {
        self.error_count.load(Ordering::Relaxed)
    }

    pub fn missing_ticks(&self) -> u32 {
        self.missing_ticks.load(Ordering::Relaxed)
    }

    /// Number of transform re-acquisition attempts so far.
    pub fn reacquire_attempts(&self) -> u32 {
        self.reacquire_attempts.load(Ordering::Relaxed)
    }

    /// Apply a position sample from this tick's batch.
    ///
    /// A missing or garbage sample triggers a rate-limited transform
    /// re-acquisition. Returns whether the position was updated; only
    /// shutdown is an error.
    pub fn apply_position<R: ReadMemory + ?Sized>(
        &self,
        sample: Option<Vec3>,
        reader: &R,
        layout: &TransformOffsets,
        now: Instant,
    ) -> Result<bool> {
        if let Some(position) = sample
            && position.is_finite()
        {
            *self.position.lock() = position;
            return Ok(true);
        }

        if !self.position_cooldown.lock().try_begin(now) {
            return Ok(false);
        }
        self.reacquire_attempts.fetch_add(1, Ordering::Relaxed);
        debug!("Re-acquiring transform for '{}'", self.name);
        match Transform::acquire(reader, self.transform_internal, layout) {
            Ok(transform) => {
                *self.transform.lock() = Some(transform);
                debug!("'{}' obtained a new transform", self.name);
            }
            Err(e) if e.is_shutdown() => return Err(e),
            Err(e) => {
                warn!("Failed to re-acquire transform for '{}': {}", self.name, e);
            }
        }
        Ok(false)
    }

    pub fn apply_rotation(&self, sample: Option<Vec2>) -> bool {
        match sample {
            Some(raw) if raw.is_finite() => {
                let rotation = normalize_rotation(raw);
                self.rotation.store(rotation.to_bits(), Ordering::Relaxed);
                true
            }
            _ => false,
        }
    }

    pub fn apply_health_tag(&self, sample: Option<i32>) -> bool {
        let Some(tag) = sample else {
            return false;
        };
        self.health.store(health_from_tag(tag), Ordering::Relaxed);
        if tag == TAG_DEAD && self.alive.swap(false, Ordering::Relaxed) {
            info!("{} ({}) died", self.name, self.player_type);
        }
        true
    }

    /// Record the outcome of this tick's refresh; returns the error streak.
    pub fn record_refresh(&self, ok: bool) -> u32 {
        if ok {
            self.error_count.store(0, Ordering::Relaxed);
            0
        } else {
            self.error_count.fetch_add(1, Ordering::Relaxed) + 1
        }
    }

    /// The entity is present in this tick's list.
    pub fn mark_seen(&self) {
        self.missing_ticks.store(0, Ordering::Relaxed);
        self.active.store(true, Ordering::Relaxed);
    }

    /// The entity is absent from this tick's list; returns the missing streak.
    pub fn mark_missing(&self) -> u32 {
        if self.active.swap(false, Ordering::Relaxed) && self.is_alive() {
            info!("{} ({}) left the match", self.name, self.player_type);
        }
        self.missing_ticks.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn state(&self) -> PlayerState {
        PlayerState {
            base: self.base,
            name: self.name.clone(),
            account_id: self.account_id.clone(),
            player_type: self.player_type,
            group_id: self.group_id,
            watch_reason: self.watch_reason.clone(),
            position: self.position(),
            rotation: self.rotation(),
            health: self.health(),
            alive: self.is_alive(),
            active: self.is_active(),
        }
    }
}

fn wrap_reconstruction(base: u64, e: Error) -> Error {
    match e {
        Error::Reconstruction { .. } => e,
        e if e.is_shutdown() => e,
        e => Error::Reconstruction {
            base,
            source: Box::new(e),
        },
    }
}

/// Plain copy of an entity's fields for display and export
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub base: u64,
    pub name: String,
    pub account_id: String,
    pub player_type: PlayerType,
    pub group_id: i32,
    pub watch_reason: Option<String>,
    pub position: Vec3,
    pub rotation: Vec2,
    pub health: i32,
    pub alive: bool,
    pub active: bool,
}

/// Outcome of building a batch of entities
#[derive(Debug, Default)]
pub struct Reconstructed {
    pub players: Vec<Player>,
    /// Base address and error of every entity that could not be built
    pub failures: Vec<(u64, Error)>,
}

/// Build one entity per input, isolating failures.
///
/// A failing entity is dropped for this tick and reported in `failures`;
/// only transport shutdown aborts the whole batch.
pub fn reconstruct_players<R: ReadMemory + ?Sized>(
    reader: &R,
    inputs: &[(u64, Option<Vec3>)],
    ctx: &mut BuildContext<'_>,
) -> Result<Reconstructed> {
    let mut out = Reconstructed::default();
    for &(base, last_position) in inputs {
        let built = PlayerSource::resolve(reader, base, ctx.offsets, last_position)
            .map_err(|e| wrap_reconstruction(base, e))
            .and_then(|source| Player::build(reader, &source, ctx));
        match built {
            Ok(player) => out.players.push(player),
            Err(e) if e.is_shutdown() => return Err(e),
            Err(e) => {
                warn!("Skipping entity: {}", e);
                out.failures.push((base, e));
            }
        }
    }
    Ok(out)
}
