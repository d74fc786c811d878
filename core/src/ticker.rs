use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use web_time::{Duration, Instant};

use crate::*;

pub type SharedEngine = Arc<Mutex<Engine>>;

/// Shortest wait between two ticks, a zero interval would spin on the engine lock.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Locks the engine, recovering it if a previous holder panicked.
pub fn lock_engine(engine: &SharedEngine) -> MutexGuard<'_, Engine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Background task calling [`Engine::tick`] at the engine's tick interval.
///
/// The task is bound to the session that was running when it was spawned. It stops on its own once that session is
/// replaced, and it is cancelled when the `Ticker` is dropped.
#[derive(Debug)]
pub struct Ticker {
    session: SessionId,
    interval: Duration,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn(engine: SharedEngine) -> io::Result<Self> {
        let (session, interval) = {
            let engine = lock_engine(&engine);
            (engine.session_id(), engine.tick_interval().max(MIN_TICK_INTERVAL))
        };
        let (stop_tx, stop_rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("hexsweeper-ticker".to_owned())
            .spawn(move || run(engine, session, interval, stop_rx))?;
        log::debug!("Ticker started for session {:?} every {:?}", session, interval);
        Ok(Self {
            session,
            interval,
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the task and waits for it to exit; must not be called while holding the engine lock.
    pub fn shutdown(mut self) {
        self.signal_stop();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Ticker for session {:?} panicked", self.session);
            }
        }
    }

    fn signal_stop(&mut self) {
        // dropping the sender disconnects the channel
        self.stop.take();
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.signal_stop();
    }
}

fn run(engine: SharedEngine, session: SessionId, interval: Duration, stop: Receiver<()>) {
    let mut deadline = Instant::now() + interval;
    loop {
        let wait = deadline.saturating_duration_since(Instant::now());
        match stop.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }

        let mut guard = lock_engine(&engine);
        // a stop requested while waiting for the lock wins over the pending tick
        if !matches!(stop.try_recv(), Err(TryRecvError::Empty)) {
            break;
        }
        if guard.session_id() != session {
            log::debug!("Session {:?} was replaced, ticker exits", session);
            break;
        }
        guard.tick();
        drop(guard);

        deadline += interval;
    }
    log::trace!("Ticker for session {:?} stopped", session);
}
