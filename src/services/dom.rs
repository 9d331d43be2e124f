// Author: Dustin Pilgrim
// License: MIT

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::core::events::{EditorChannel, InputKind};
use crate::services::{EventSink, HostError};

/// Identifier of something listeners can be attached to: the top window, a
/// child frame, or an iframe's document body.
pub type TargetId = String;

/// Registration APIs the host exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub add_event_listener: bool,
    pub attach_event: bool,
    pub user_agent: String,
}

/// How listeners get registered. Chosen once per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Registration {
    /// `addEventListener(type, handler, false)`
    Modern,
    /// `attachEvent(type, handler)` for old MSIE.
    Legacy,
    /// Nothing usable; the page will see no input activity.
    Unavailable,
}

static MSIE_VERSION: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)msie\s*(\d+)").ok());

/// MSIE major version from a user agent, if it is MSIE at all.
pub fn msie_version(user_agent: &str) -> Option<u32> {
    MSIE_VERSION
        .as_ref()?
        .captures(user_agent)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

impl Registration {
    pub fn detect(caps: &Capabilities) -> Self {
        let legacy_browser = msie_version(&caps.user_agent).is_some_and(|v| v <= 8);

        if caps.add_event_listener && !legacy_browser {
            Registration::Modern
        } else if caps.attach_event {
            Registration::Legacy
        } else if caps.add_event_listener {
            Registration::Modern
        } else {
            Registration::Unavailable
        }
    }
}

/// The parts of the page DOM the monitor instruments.
pub trait Dom: Send + Sync + 'static {
    fn capabilities(&self) -> Capabilities;

    /// The top-level window.
    fn top(&self) -> TargetId;

    /// Direct child frames of the top window. Cross-origin frames come back as errors.
    fn child_frames(&self) -> Vec<Result<TargetId, HostError>>;

    /// Document bodies of the iframes inside `within`.
    fn iframe_bodies(
        &self,
        within: &TargetId,
    ) -> Result<Vec<Result<TargetId, HostError>>, HostError>;

    fn listen(
        &self,
        target: &TargetId,
        kind: InputKind,
        via: Registration,
        sink: Arc<dyn EventSink>,
    ) -> Result<(), HostError>;

    /// Names of live rich-text editor instances, `None` when no editor library is loaded.
    fn editor_instances(&self) -> Option<Vec<String>>;

    fn subscribe_editor(
        &self,
        instance: &str,
        channel: EditorChannel,
        sink: Arc<dyn EventSink>,
    ) -> Result<(), HostError>;
}
