// Author: Dustin Pilgrim
// License: MIT

//! Host surface consumed by the monitor: cookie store, DOM event
//! registration, the warning banner and a clock. Browser bindings implement
//! these traits; `headless` provides in-memory versions.

pub mod clock;
pub mod cookie;
pub mod dom;
pub mod headless;
pub mod listeners;
pub mod surface;
pub mod ticker;

use std::fmt;
use std::sync::Arc;

use crate::core::events::ActivitySource;

/// Sink for pushing activity into the monitor loop.
/// Listeners hold an `Arc<dyn EventSink>`; pushing must never block.
pub trait EventSink: Send + Sync + 'static {
    fn push(&self, source: ActivitySource);
}

/// Everything one page hands to its monitor.
#[derive(Clone)]
pub struct Host {
    pub cookies: Arc<dyn cookie::CookieJar>,
    pub dom: Arc<dyn dom::Dom>,
    pub surface: Arc<dyn surface::Surface>,
    pub clock: Arc<dyn clock::Clock>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Frame or document belongs to another origin.
    CrossOrigin(String),

    /// Target no longer exists (frame removed, editor destroyed).
    Gone(String),

    /// Neither registration API is present.
    Unsupported,
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::CrossOrigin(t) => write!(f, "cross-origin access denied: {t}"),
            HostError::Gone(t) => write!(f, "target no longer exists: {t}"),
            HostError::Unsupported => write!(f, "no event registration API available"),
        }
    }
}

impl std::error::Error for HostError {}
