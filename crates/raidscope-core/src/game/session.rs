//! Per-tick session state machine.
//!
//! A [`Session`] attaches to the main module, walks the object registry for
//! the world root, follows the match through its lifecycle and keeps the
//! entity set current. Every fault is turned into a status transition here;
//! only transport shutdown escapes [`Session::tick`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use strum::{Display, IntoStaticStr};
use tracing::{debug, error, info, warn};

use super::registered::{ListSettings, ListUpdate, RegisteredPlayers};
use super::state::SessionStatus;
use super::tables::SharedTables;
use crate::error::{Error, Result};
use crate::memory::{MemoryReader, ReadMemory};
use crate::offset::Offsets;
use crate::registry::{ObjectGraphWalker, RegistryHeads, WalkOptions};

/// Name of the main runtime module
pub const DEFAULT_MODULE_NAME: &str = "UnityPlayer.dll";

/// Registry object holding the world root
pub const WORLD_OBJECT_NAME: &str = "GameWorld";

pub const HIDEOUT_MAP_ID: &str = "hideout";

/// Placeholder when no map name can be read
pub const DEFAULT_MAP_NAME: &str = "bigmap";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub module_name: String,
    pub world_object_name: String,
    pub hideout_map_id: String,
    pub default_map_name: String,
    pub walk: WalkOptions,
    pub list: ListSettings,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            module_name: DEFAULT_MODULE_NAME.to_string(),
            world_object_name: WORLD_OBJECT_NAME.to_string(),
            hideout_map_id: HIDEOUT_MAP_ID.to_string(),
            default_map_name: DEFAULT_MAP_NAME.to_string(),
            walk: WalkOptions::default(),
            list: ListSettings::default(),
        }
    }
}

/// Where the current map name came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum MapSource {
    /// Location string of the main player
    Player,
    /// Map name pointer on the world root
    World,
    /// Hardcoded placeholder
    Default,
}

pub struct Session {
    reader: MemoryReader,
    offsets: Arc<Offsets>,
    tables: Arc<SharedTables>,
    settings: SessionSettings,
    status: SessionStatus,
    module_base: Option<u64>,
    world: Option<u64>,
    map_name: Option<String>,
    map_source: Option<MapSource>,
    players: Option<RegisteredPlayers>,
    started_at: Option<DateTime<Local>>,
}

impl Session {
    pub fn new(
        reader: MemoryReader,
        offsets: Arc<Offsets>,
        tables: Arc<SharedTables>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            reader,
            offsets,
            tables,
            settings,
            status: SessionStatus::NotFound,
            module_base: None,
            world: None,
            map_name: None,
            map_source: None,
            players: None,
            started_at: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn reader(&self) -> &MemoryReader {
        &self.reader
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn module_base(&self) -> Option<u64> {
        self.module_base
    }

    pub fn world(&self) -> Option<u64> {
        self.world
    }

    pub fn map_name(&self) -> Option<&str> {
        self.map_name.as_deref()
    }

    pub fn map_source(&self) -> Option<MapSource> {
        self.map_source
    }

    pub fn players(&self) -> Option<&RegisteredPlayers> {
        self.players.as_ref()
    }

    /// Local time the current match was first seen in progress.
    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    /// Time since the current match started.
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at
            .and_then(|start| (Local::now() - start).to_std().ok())
    }

    /// Run one poll step.
    ///
    /// Returns the status after the step. The only error is
    /// [`Error::TransportShutdown`], after which the session is `NotFound`.
    pub fn tick(&mut self) -> Result<SessionStatus> {
        match self.step() {
            Ok(()) => Ok(self.status),
            Err(e) => self.handle_error(e),
        }
    }

    /// Forget everything and start over from `NotFound`.
    pub fn reset(&mut self) {
        self.module_base = None;
        self.end_raid();
        self.set_status(SessionStatus::NotFound);
    }

    fn step(&mut self) -> Result<()> {
        // Stays put until reset
        if self.status == SessionStatus::Error {
            return Ok(());
        }
        if self.module_base.is_none() {
            return self.attach();
        }
        match self.world {
            None => self.find_world(),
            Some(world) => self.refresh_world(world),
        }
    }

    fn attach(&mut self) -> Result<()> {
        match self.reader.module_base(&self.settings.module_name) {
            Ok(base) => {
                info!("{} found at 0x{:X}", self.settings.module_name, base);
                self.module_base = Some(base);
                self.set_status(SessionStatus::Found);
                Ok(())
            }
            Err(Error::ModuleNotFound(name)) => {
                debug!("{} not loaded yet", name);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn find_world(&mut self) -> Result<()> {
        // The process may have restarted since the last match
        let module_base = self.reader.module_base(&self.settings.module_name)?;
        self.module_base = Some(module_base);

        let heads = match RegistryHeads::locate(&self.reader, module_base, &self.offsets) {
            Ok(heads) => heads,
            Err(e) if e.is_shutdown() => return Err(e),
            Err(e) => {
                warn!("Object registry not available: {}", e);
                return Ok(());
            }
        };

        let walker = ObjectGraphWalker::new(
            &self.reader,
            &self.offsets,
            self.reader.shutdown_signal(),
        )
        .with_options(self.settings.walk.clone());
        let outcome = walker.find(heads, &self.settings.world_object_name)?;
        if !outcome.is_found() {
            debug!(
                "{} not found after {} objects",
                self.settings.world_object_name, outcome.visited
            );
            self.set_status(SessionStatus::Menu);
            return Ok(());
        }

        match self
            .reader
            .read_ptr_chain(outcome.object, &self.offsets.object.to_world)
        {
            Ok(world) => {
                info!("World root at 0x{:X}", world);
                self.world = Some(world);
                self.set_status(SessionStatus::Matching);
                Ok(())
            }
            Err(e) if e.is_shutdown() => Err(e),
            Err(e) => {
                debug!("World object not ready: {}", e);
                self.set_status(SessionStatus::Menu);
                Ok(())
            }
        }
    }

    fn refresh_world(&mut self, world: u64) -> Result<()> {
        let started = match self
            .reader
            .read_bool(world.wrapping_add(self.offsets.world.raid_started))
        {
            Ok(started) => started,
            Err(e) if e.is_shutdown() => return Err(e),
            Err(e) => {
                debug!("World root no longer readable: {}", e);
                return Err(Error::RaidEnded);
            }
        };

        let map = self.resolve_map_name(world)?;
        if map.eq_ignore_ascii_case(&self.settings.hideout_map_id) {
            self.map_name = None;
            self.players = None;
            self.set_status(SessionStatus::Hideout);
            return Ok(());
        }
        self.map_name = Some(map);

        let list_addr = self
            .reader
            .read_ptr_nullable(world.wrapping_add(self.offsets.world.registered_players))?;

        if let Some(players) = self.players.as_mut() {
            if !started || list_addr == 0 || list_addr != players.list_addr() {
                return Err(Error::RaidEnded);
            }
            let tables = self.tables.load();
            let update = players.update_list(&self.reader, &self.offsets, &tables)?;
            if update != ListUpdate::default() {
                debug!("Player list update: {:?}", update);
            }
            players.refresh_live(&self.reader, &self.offsets, Instant::now())?;
            return Ok(());
        }

        if !started || list_addr == 0 {
            return Ok(());
        }
        let mut players = RegisteredPlayers::new(list_addr, self.settings.list);
        let tables = self.tables.load();
        players.update_list(&self.reader, &self.offsets, &tables)?;
        players.refresh_live(&self.reader, &self.offsets, Instant::now())?;
        info!(
            "Raid started on {} with {} players",
            self.map_name.as_deref().unwrap_or_default(),
            players.len()
        );
        self.players = Some(players);
        self.started_at = Some(Local::now());
        self.set_status(SessionStatus::InGame);
        Ok(())
    }

    /// Map name by fallback chain: main player location, then the world's
    /// map name pointer, then the placeholder.
    fn resolve_map_name(&mut self, world: u64) -> Result<String> {
        let (name, source) = match self.map_from_player(world) {
            Ok(name) if !name.is_empty() => (name, MapSource::Player),
            Err(e) if e.is_shutdown() => return Err(e),
            _ => match self.map_from_world(world) {
                Ok(name) if !name.is_empty() => (name, MapSource::World),
                Err(e) if e.is_shutdown() => return Err(e),
                _ => (self.settings.default_map_name.clone(), MapSource::Default),
            },
        };
        if self.map_source != Some(source) {
            match source {
                MapSource::Player => debug!("Map name: {}", name),
                _ => warn!("Map name read from {} fallback: {}", source, name),
            }
            self.map_source = Some(source);
        }
        Ok(name)
    }

    fn map_from_player(&self, world: u64) -> Result<String> {
        let main = self
            .reader
            .read_ptr(world.wrapping_add(self.offsets.world.main_player))?;
        let location = self
            .reader
            .read_ptr(main.wrapping_add(self.offsets.player.location))?;
        self.reader
            .read_managed_string(location, &self.offsets.string)
    }

    fn map_from_world(&self, world: u64) -> Result<String> {
        let ptr = self
            .reader
            .read_ptr(world.wrapping_add(self.offsets.world.map_name))?;
        self.reader.read_managed_string(ptr, &self.offsets.string)
    }

    fn handle_error(&mut self, e: Error) -> Result<SessionStatus> {
        if e.is_shutdown() {
            info!("Transport shut down, detaching");
            self.reset();
            return Err(e);
        }
        match e {
            Error::RaidEnded => {
                info!("Raid has ended");
                self.end_raid();
                self.set_status(SessionStatus::Menu);
            }
            Error::ModuleNotFound(name) => {
                warn!("{} is gone, detaching", name);
                self.reset();
            }
            Error::Classification(_) | Error::InvalidOffset(_) => {
                error!("Unrecoverable session fault: {}", e);
                self.end_raid();
                self.set_status(SessionStatus::Error);
            }
            e => {
                error!("Unhandled fault, treating the raid as ended: {}", e);
                self.end_raid();
                self.set_status(SessionStatus::Menu);
            }
        }
        Ok(self.status)
    }

    fn end_raid(&mut self) {
        self.world = None;
        self.map_name = None;
        self.map_source = None;
        self.players = None;
        self.started_at = None;
    }

    fn set_status(&mut self, status: SessionStatus) {
        if self.status != status {
            info!("Session status: {} -> {}", self.status, status);
            self.status = status;
        }
    }
}
