use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use raidscope_core::ShutdownSignal;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Spawn a thread that raises `shutdown` on Esc, q/Q or Ctrl+C.
///
/// The thread also exits on its own once shutdown is raised elsewhere, so
/// it never outlives the session it guards.
pub fn spawn_keyboard_monitor(shutdown: Arc<ShutdownSignal>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("raidscope-input".to_string())
        .spawn(move || {
            debug!("Keyboard monitor started");

            while !shutdown.is_shutdown() {
                if event::poll(POLL_INTERVAL).unwrap_or(false)
                    && let Ok(Event::Key(key_event)) = event::read()
                    && is_quit_key(&key_event)
                {
                    debug!("Quit key pressed: {:?}", key_event.code);
                    shutdown.trigger();
                    break;
                }
            }

            debug!("Keyboard monitor stopped");
        })
}

fn is_quit_key(event: &KeyEvent) -> bool {
    if event.kind == KeyEventKind::Release {
        return false;
    }
    match event.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => true,
        KeyCode::Char('c') => event.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}
