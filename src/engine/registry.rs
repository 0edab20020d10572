//! Browser lifecycle registry
//!
//! Tracks every live embedded browser. The registry owns the close
//! handshake: asking the last browser to close sets the `is_closing` flag
//! first, and removing the final entry is the host's sole shutdown signal.

use log::{info, warn};

use super::{BrowserHost, BrowserId};

/// The set of currently live embedded-browser instances.
pub struct BrowserRegistry {
    browsers: Vec<Box<dyn BrowserHost>>,
    is_closing: bool,
}

impl BrowserRegistry {
    pub fn new() -> Self {
        Self {
            browsers: Vec::new(),
            is_closing: false,
        }
    }

    /// Called when a browser finishes creation.
    pub fn on_after_created(&mut self, browser: Box<dyn BrowserHost>) {
        info!("browser {:?} created", browser.id());
        self.browsers.push(browser);
    }

    /// Called when a browser is about to close. Closing the last browser
    /// sets the closing flag so the host lets the window close proceed.
    /// Returns false: the close is always allowed.
    pub fn do_close(&mut self, id: BrowserId) -> bool {
        if self.browsers.len() == 1 {
            self.is_closing = true;
        }
        info!("browser {id:?} closing (last: {})", self.is_closing);
        false
    }

    /// Called when a browser finishes closing. Removes it from the registry;
    /// returns true when the registry emptied and the host must shut down.
    pub fn on_before_close(&mut self, id: BrowserId) -> bool {
        let before = self.browsers.len();
        self.browsers.retain(|b| b.id() != id);
        if self.browsers.len() == before {
            warn!("close notification for unknown browser {id:?}");
        }
        if self.browsers.is_empty() {
            info!("all browsers closed, shutting down");
            true
        } else {
            false
        }
    }

    /// Request close on every live browser.
    pub fn close_all(&mut self) {
        for browser in &mut self.browsers {
            browser.request_close();
        }
    }

    /// Iterate over live browsers for event delivery. Delivery order across
    /// browsers is unspecified.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn BrowserHost>> {
        self.browsers.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.browsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.browsers.is_empty()
    }

    pub fn is_closing(&self) -> bool {
        self.is_closing
    }
}

impl Default for BrowserRegistry {
    fn default() -> Self {
        Self::new()
    }
}
