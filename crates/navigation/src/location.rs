//! Address-bar abstraction
//!
//! `MemoryLocation` keeps the current URL and the navigations requested by
//! the session. The host agent passes callback URLs to the session, which
//! records them as page loads, and turns recorded navigations into HTTP
//! redirects.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;
use url::Url;

pub trait Location: Send + Sync {
    /// URL of the current page, including query and fragment
    fn current(&self) -> Url;

    /// Change the visible URL without navigating (history replace)
    fn replace(&self, url: Url);

    /// Leave the current page for `url`
    fn navigate(&self, url: Url);
}

#[derive(Debug)]
pub struct MemoryLocation {
    current: Mutex<Url>,
    navigations: Mutex<Vec<Url>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryLocation {
    pub fn new(url: Url) -> Self {
        Self {
            current: Mutex::new(url),
            navigations: Mutex::new(Vec::new()),
        }
    }

    /// Simulate a page load at `url`.
    pub fn set_current(&self, url: Url) {
        *lock(&self.current) = url;
    }

    /// Most recent pending navigation, clearing the queue.
    pub fn take_navigation(&self) -> Option<Url> {
        lock(&self.navigations).drain(..).last()
    }

    /// Every navigation requested so far, oldest first.
    pub fn navigations(&self) -> Vec<Url> {
        lock(&self.navigations).clone()
    }
}

impl Location for MemoryLocation {
    fn current(&self) -> Url {
        lock(&self.current).clone()
    }

    fn replace(&self, url: Url) {
        debug!(path = url.path(), "replacing current URL");
        *lock(&self.current) = url;
    }

    fn navigate(&self, url: Url) {
        debug!(host = url.host_str().unwrap_or(""), "navigation requested");
        lock(&self.navigations).push(url);
    }
}
