use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::{Acquire, Release};
use std::sync::{Mutex, MutexGuard, PoisonError};

use resona_api::SessionInfo;

/// Session state shared between the lifecycle controller and backend-owned
/// threads. The flags answer `is_open`/`is_playing` from any thread without
/// locking; the mutexes guard the session snapshot and last-error string,
/// which are only touched outside the per-block path.
#[derive(Default)]
pub(crate) struct SessionState {
    open: AtomicBool,
    playing: AtomicBool,
    session: Mutex<Option<SessionInfo>>,
    last_error: Mutex<Option<String>>,
}

impl SessionState {
    pub fn is_open(&self) -> bool {
        self.open.load(Acquire)
    }

    pub fn set_open(&self, open: bool) {
        self.open.store(open, Release);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Acquire)
    }

    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Release);
    }

    pub fn session(&self) -> Option<SessionInfo> {
        lock(&self.session).clone()
    }

    pub fn set_session(&self, session: Option<SessionInfo>) {
        *lock(&self.session) = session;
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.last_error).clone()
    }

    pub fn record_error(&self, message: String) {
        *lock(&self.last_error) = Some(message);
    }

    pub fn clear_error(&self) {
        *lock(&self.last_error) = None;
    }
}

// A consumer panicking inside its callback must not wedge the lifecycle
// thread behind a poisoned lock.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
