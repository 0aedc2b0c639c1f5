//! Live session mode.
//!
//! Drives a [`Session`] on the background worker and prints its status and
//! entity table from the shared view until Esc, q or Ctrl+C.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use raidscope_core::{
    ClassificationTables, Config, Offsets, Player, PlayerState, PlayerType, Session,
    SessionStatus, SessionView, SharedTables, ShutdownSignal, Vec3, Watchlist, WatchlistMonitor,
    Worker,
};
use tracing::{debug, info, warn};

use super::source::SnapshotArgs;
use crate::input;

/// How often the entity table is reprinted
const DISPLAY_INTERVAL: Duration = Duration::from_secs(1);

/// Run the live session mode
pub fn run(source: &SnapshotArgs, config: &Config, offsets: Offsets, json: bool) -> Result<()> {
    // Setup graceful shutdown handler
    let shutdown = Arc::new(ShutdownSignal::new());
    let shutdown_ctrlc = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal, stopping...");
        shutdown_ctrlc.trigger();
    })?;

    // Spawn keyboard input monitor (Esc, q, Q to quit)
    let _keyboard_handle = input::spawn_keyboard_monitor(Arc::clone(&shutdown))?;

    info!("raidscope {}", env!("CARGO_PKG_VERSION"));

    offsets
        .validate()
        .with_context(|| format!("Offsets {} are not usable", offsets.version))?;
    debug!("Using offsets version {}", offsets.version);

    let tables = Arc::new(SharedTables::new(
        ClassificationTables::builtin().with_watchlist(load_watchlist(&config.watchlist_path)),
    ));
    let _monitor = if config.watch_watchlist {
        match WatchlistMonitor::start(&config.watchlist_path, Arc::clone(&tables)) {
            Ok(monitor) => Some(monitor),
            Err(e) => {
                warn!("Watchlist changes will not be picked up: {}", e);
                None
            }
        }
    } else {
        None
    };

    let reader = source.reader_with(Arc::clone(&shutdown))?;
    let session = Session::new(
        reader,
        Arc::new(offsets),
        tables,
        config.session_settings(),
    );
    let worker = Worker::spawn(session, config)?;

    println!("Waiting for a session... (Press Esc or q to quit)");
    let view = Arc::clone(worker.view());
    let mut last_status = None;
    let mut last_ticks = 0;
    while !shutdown.wait(DISPLAY_INTERVAL) {
        let status = view.status();
        if last_status != Some(status) {
            print_status(&view, status);
            last_status = Some(status);
        }

        let ticks = view.ticks();
        if status == SessionStatus::InGame && ticks != last_ticks {
            if json {
                print_json(&view, config)?;
            } else {
                print_players(&view, config);
            }
        }
        last_ticks = ticks;

        if !worker.is_running() {
            warn!("Poll worker exited");
            break;
        }
    }

    worker.stop();
    info!("Stopped");
    Ok(())
}

/// A broken watchlist file should not keep the session from starting.
fn load_watchlist(path: &Path) -> Watchlist {
    match Watchlist::load_or_create(path) {
        Ok(watchlist) => {
            info!("Watchlist: {} entries", watchlist.len());
            watchlist
        }
        Err(e) => {
            warn!("Failed to load watchlist {}: {}", path.display(), e);
            Watchlist::default()
        }
    }
}

fn print_status(view: &SessionView, status: SessionStatus) {
    match view.map_name() {
        Some(map) => println!("[{}] {}", status, map),
        None => println!("[{}]", status),
    }
}

fn visible_players(view: &SessionView, config: &Config) -> Vec<Arc<Player>> {
    view.players()
        .iter()
        .filter(|p| is_listed(p.player_type(), p.is_active(), config.show_ai))
        .cloned()
        .collect()
}

fn is_listed(player_type: PlayerType, active: bool, show_ai: bool) -> bool {
    active && player_type != PlayerType::LocalPlayer && (show_ai || !player_type.is_ai())
}

fn print_players(view: &SessionView, config: &Config) {
    let origin = view.local_player().map(|p| p.position());
    let mut players = visible_players(view, config);
    players.sort_by(|a, b| {
        let da = distance_from(origin, a.position());
        let db = distance_from(origin, b.position());
        da.total_cmp(&db)
    });

    println!();
    println!(
        "{:<24} {:<16} {:>5} {:>8} {:>6}",
        "Name", "Type", "Group", "Dist", "Health"
    );
    for player in &players {
        let distance = distance_from(origin, player.position());
        println!(
            "{:<24} {:<16} {:>5} {:>8} {:>6}",
            listed_name(player.name(), player.player_type(), config.hide_names),
            player.player_type().short_name(),
            group_label(player.group_id()),
            format_distance(distance),
            health_label(player.health(), player.is_alive()),
        );
        if let Some(reason) = player.watch_reason() {
            println!("    watched: {}", reason);
        }
    }
    println!("{} entities", players.len());
}

fn print_json(view: &SessionView, config: &Config) -> Result<()> {
    let states: Vec<PlayerState> = visible_players(view, config)
        .iter()
        .map(|p| {
            let mut state = p.state();
            if config.hide_names {
                state.name = listed_name(&state.name, state.player_type, true);
            }
            state
        })
        .collect();
    println!("{}", serde_json::to_string(&states)?);
    Ok(())
}

fn distance_from(origin: Option<Vec3>, position: Vec3) -> f32 {
    origin.map_or(f32::INFINITY, |origin| origin.distance(&position))
}

fn listed_name(name: &str, player_type: PlayerType, hide_names: bool) -> String {
    if hide_names {
        player_type.short_name().to_string()
    } else {
        name.to_string()
    }
}

fn group_label(group_id: i32) -> String {
    if group_id < 0 {
        "-".to_string()
    } else {
        group_id.to_string()
    }
}

fn health_label(health: i32, alive: bool) -> String {
    match (alive, health) {
        (false, _) => "dead".to_string(),
        (true, h) if h < 0 => "?".to_string(),
        (true, h) => format!("{}%", h),
    }
}

fn format_distance(distance: f32) -> String {
    if distance.is_finite() {
        format!("{:.0}m", distance)
    } else {
        "-".to_string()
    }
}
