use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info};

use super::view::SessionView;
use crate::config::Config;
use crate::error::Result;
use crate::game::{Session, SessionStatus};
use crate::shutdown::ShutdownSignal;

/// Background thread driving a [`Session`].
///
/// The worker owns the session and is the only writer of its entity set.
/// Stopping (or dropping) the worker triggers the session's shutdown
/// signal and joins the thread.
pub struct Worker {
    view: Arc<SessionView>,
    shutdown: Arc<ShutdownSignal>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn(session: Session, config: &Config) -> Result<Self> {
        let view = Arc::new(SessionView::new());
        let shutdown = Arc::clone(session.reader().shutdown_signal());
        let timing = LoopTiming {
            poll: config.poll_interval(),
            reattach: config.reattach_interval(),
        };

        let handle = thread::Builder::new().name("raidscope-poll".to_string()).spawn({
            let view = Arc::clone(&view);
            let shutdown = Arc::clone(&shutdown);
            move || poll_loop(session, &view, &shutdown, timing)
        })?;

        Ok(Self {
            view,
            shutdown,
            handle: Some(handle),
        })
    }

    pub fn view(&self) -> &Arc<SessionView> {
        &self.view
    }

    pub fn shutdown_signal(&self) -> &Arc<ShutdownSignal> {
        &self.shutdown
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Trigger shutdown and wait for the thread to exit.
    pub fn stop(mut self) {
        self.shutdown.trigger();
        self.join_thread();
    }

    /// Wait for the thread to exit on its own (after an external shutdown).
    pub fn join(mut self) {
        self.join_thread();
    }

    fn join_thread(&mut self) {
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            error!("Poll worker panicked");
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.shutdown.trigger();
            self.join_thread();
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct LoopTiming {
    poll: Duration,
    reattach: Duration,
}

fn poll_loop(mut session: Session, view: &SessionView, shutdown: &ShutdownSignal, timing: LoopTiming) {
    info!("Poll worker started");
    loop {
        let status = match session.tick() {
            Ok(status) => status,
            Err(e) => {
                debug!("Poll worker stopping: {}", e);
                view.publish(&session);
                break;
            }
        };
        view.publish(&session);

        let delay = match status {
            SessionStatus::NotFound | SessionStatus::Error => timing.reattach,
            _ => timing.poll,
        };
        if shutdown.wait(delay) {
            break;
        }
        if status == SessionStatus::Error {
            info!("Retrying after unrecoverable fault");
            session.reset();
        }
    }
    info!("Poll worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fixture::alloc_raid;
    use crate::game::{DEFAULT_MODULE_NAME, SharedTables};
    use crate::memory::{MemoryReader, MockMemoryBuilder};
    use crate::offset::test_offsets;
    use std::time::Instant;

    fn wait_for(view: &SessionView, status: SessionStatus) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if view.status() == status {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_worker_reaches_in_game_and_stops() {
        let offsets = test_offsets();
        let mut mem = MockMemoryBuilder::new();
        alloc_raid(&mut mem, &offsets, DEFAULT_MODULE_NAME);
        let shutdown = Arc::new(ShutdownSignal::new());
        let reader = MemoryReader::new(mem.build(), Arc::clone(&shutdown));
        let config = Config {
            poll_interval_ms: 5,
            ..Config::default()
        };
        let session = Session::new(
            reader,
            Arc::new(offsets),
            Arc::new(SharedTables::default()),
            config.session_settings(),
        );

        let worker = Worker::spawn(session, &config).unwrap();
        assert!(wait_for(worker.view(), SessionStatus::InGame));
        assert_eq!(worker.view().players().len(), 2);
        assert!(worker.is_running());

        let view = Arc::clone(worker.view());
        let started = Instant::now();
        worker.stop();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(shutdown.is_shutdown());
        assert!(view.ticks() >= 3);
    }

    #[test]
    fn test_external_shutdown_ends_worker() {
        let offsets = test_offsets();
        let shutdown = Arc::new(ShutdownSignal::new());
        let reader = MemoryReader::new(MockMemoryBuilder::new().build(), Arc::clone(&shutdown));
        let config = Config::default();
        let session = Session::new(
            reader,
            Arc::new(offsets),
            Arc::new(SharedTables::default()),
            config.session_settings(),
        );

        let worker = Worker::spawn(session, &config).unwrap();
        // Module never appears, so the worker sits in its reattach wait
        assert!(wait_for(worker.view(), SessionStatus::NotFound));
        let started = Instant::now();
        shutdown.trigger();
        worker.join();
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
