// Author: Dustin Pilgrim
// License: MIT

//! In-memory host used by the simulator and the tests: a cookie store shared
//! between pages, a DOM with frames/iframes/editor instances that can dispatch
//! input to registered listeners, and a surface that records what it showed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use crate::core::events::{ActivitySource, EditorChannel, InputKind};
use crate::services::clock::Clock;
use crate::services::cookie::{CookieJar, find_cookie};
use crate::services::dom::{Capabilities, Dom, Registration, TargetId};
use crate::services::surface::{Banner, Surface};
use crate::services::{EventSink, Host, HostError};

const TOP: &str = "window";

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------- cookies ----------------

/// Cookie storage for one cookie domain. Every page holding a clone of the
/// `Arc` sees every write immediately.
#[derive(Debug, Default)]
pub struct HeadlessCookieJar {
    // (name, value) in insertion order, like document.cookie.
    cookies: Mutex<Vec<(String, String)>>,
}

impl HeadlessCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<String> {
        let raw = self.read_all();
        find_cookie(&raw, name).map(str::to_string)
    }

    /// Overwrite a value directly, bypassing any monitor.
    pub fn set_raw(&self, name: &str, value: &str) {
        self.write(&format!("{name}={value}"));
    }

    pub fn remove(&self, name: &str) {
        lock(&self.cookies).retain(|(n, _)| n != name);
    }
}

impl CookieJar for HeadlessCookieJar {
    fn read_all(&self) -> String {
        lock(&self.cookies)
            .iter()
            .map(|(n, v)| format!("{n}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn write(&self, assignment: &str) {
        // Attributes (path, domain) follow the first ';' and are not stored.
        let pair = assignment.split(';').next().unwrap_or_default();
        let Some((name, value)) = pair.split_once('=') else {
            return;
        };
        let (name, value) = (name.trim().to_string(), value.trim().to_string());

        let mut cookies = lock(&self.cookies);
        match cookies.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => cookies.push((name, value)),
        }
    }
}

// ---------------- dom ----------------

struct Frame {
    id: TargetId,
    accessible: bool,
    removed: bool,
}

struct Listener {
    kind: InputKind,
    via: Registration,
    sink: Arc<dyn EventSink>,
}

struct DomInner {
    caps: Capabilities,
    frames: Vec<Frame>,
    // parent target -> iframe bodies
    iframes: HashMap<TargetId, Vec<Frame>>,
    listeners: HashMap<TargetId, Vec<Listener>>,

    // None: the editor library is not loaded.
    editors: Option<Vec<String>>,
    editor_hooks: HashMap<String, Vec<(EditorChannel, Arc<dyn EventSink>)>>,
}

pub struct HeadlessDom {
    inner: Mutex<DomInner>,
}

impl HeadlessDom {
    pub fn new() -> Self {
        Self::with_capabilities(true, false, "Mozilla/5.0 (X11; Linux x86_64) idlecheck-headless")
    }

    pub fn with_capabilities(
        add_event_listener: bool,
        attach_event: bool,
        user_agent: &str,
    ) -> Self {
        Self {
            inner: Mutex::new(DomInner {
                caps: Capabilities {
                    add_event_listener,
                    attach_event,
                    user_agent: user_agent.to_string(),
                },
                frames: Vec::new(),
                iframes: HashMap::new(),
                listeners: HashMap::new(),
                editors: None,
                editor_hooks: HashMap::new(),
            }),
        }
    }

    pub fn add_frame(&self, id: &str, same_origin: bool) {
        lock(&self.inner).frames.push(Frame {
            id: id.to_string(),
            accessible: same_origin,
            removed: false,
        });
    }

    /// Add an iframe under `parent` (the top window or a child frame).
    pub fn add_iframe(&self, parent: &str, body_id: &str, same_origin: bool) {
        lock(&self.inner)
            .iframes
            .entry(parent.to_string())
            .or_default()
            .push(Frame {
                id: body_id.to_string(),
                accessible: same_origin,
                removed: false,
            });
    }

    /// Remove a frame or iframe. Its listeners stay registered but never fire again.
    pub fn remove_target(&self, id: &str) {
        let mut inner = lock(&self.inner);
        for f in inner.frames.iter_mut().filter(|f| f.id == id) {
            f.removed = true;
        }
        for list in inner.iframes.values_mut() {
            for f in list.iter_mut().filter(|f| f.id == id) {
                f.removed = true;
            }
        }
    }

    pub fn install_editor_registry(&self) {
        let mut inner = lock(&self.inner);
        if inner.editors.is_none() {
            inner.editors = Some(Vec::new());
        }
    }

    pub fn add_editor(&self, name: &str) {
        let mut inner = lock(&self.inner);
        inner.editors.get_or_insert_with(Vec::new).push(name.to_string());
    }

    pub fn remove_editor(&self, name: &str) {
        if let Some(list) = lock(&self.inner).editors.as_mut() {
            list.retain(|n| n != name);
        }
    }

    pub fn listener_count(&self, target: &str) -> usize {
        lock(&self.inner).listeners.get(target).map_or(0, Vec::len)
    }

    /// Registration used by the listeners on `target`.
    pub fn registrations(&self, target: &str) -> Vec<Registration> {
        lock(&self.inner)
            .listeners
            .get(target)
            .map(|l| l.iter().map(|x| x.via).collect())
            .unwrap_or_default()
    }

    /// Deliver an input event to `target`. Returns how many handlers ran.
    pub fn dispatch(&self, target: &str, kind: InputKind) -> usize {
        let sinks: Vec<Arc<dyn EventSink>> = {
            let inner = lock(&self.inner);
            if !inner.is_live(target) {
                return 0;
            }
            inner
                .listeners
                .get(target)
                .map(|l| l.iter().filter(|x| x.kind == kind).map(|x| x.sink.clone()).collect())
                .unwrap_or_default()
        };

        for sink in &sinks {
            sink.push(ActivitySource::Input {
                target: target.to_string(),
                kind,
            });
        }
        sinks.len()
    }

    /// Deliver an editor notification. Returns how many handlers ran.
    pub fn fire_editor(&self, instance: &str, channel: EditorChannel) -> usize {
        let sinks: Vec<Arc<dyn EventSink>> = {
            let inner = lock(&self.inner);
            let live = inner
                .editors
                .as_ref()
                .is_some_and(|l| l.iter().any(|n| n == instance));
            if !live {
                return 0;
            }
            inner
                .editor_hooks
                .get(instance)
                .map(|h| h.iter().filter(|(c, _)| *c == channel).map(|(_, s)| s.clone()).collect())
                .unwrap_or_default()
        };

        for sink in &sinks {
            sink.push(ActivitySource::Editor {
                instance: instance.to_string(),
                channel,
            });
        }
        sinks.len()
    }
}

impl Default for HeadlessDom {
    fn default() -> Self {
        Self::new()
    }
}

impl DomInner {
    fn find(&self, id: &str) -> Option<&Frame> {
        self.frames
            .iter()
            .chain(self.iframes.values().flatten())
            .find(|f| f.id == id)
    }

    fn is_live(&self, id: &str) -> bool {
        id == TOP || self.find(id).is_some_and(|f| !f.removed)
    }

    fn check_access(&self, id: &str) -> Result<(), HostError> {
        if id == TOP {
            return Ok(());
        }
        match self.find(id) {
            Some(f) if f.removed => Err(HostError::Gone(id.to_string())),
            Some(f) if !f.accessible => Err(HostError::CrossOrigin(id.to_string())),
            Some(_) => Ok(()),
            None => Err(HostError::Gone(id.to_string())),
        }
    }
}

impl Dom for HeadlessDom {
    fn capabilities(&self) -> Capabilities {
        lock(&self.inner).caps.clone()
    }

    fn top(&self) -> TargetId {
        TOP.to_string()
    }

    fn child_frames(&self) -> Vec<Result<TargetId, HostError>> {
        lock(&self.inner)
            .frames
            .iter()
            .filter(|f| !f.removed)
            .map(|f| {
                if f.accessible {
                    Ok(f.id.clone())
                } else {
                    Err(HostError::CrossOrigin(f.id.clone()))
                }
            })
            .collect()
    }

    fn iframe_bodies(
        &self,
        within: &TargetId,
    ) -> Result<Vec<Result<TargetId, HostError>>, HostError> {
        let inner = lock(&self.inner);
        inner.check_access(within)?;

        Ok(inner
            .iframes
            .get(within)
            .map(|list| {
                list.iter()
                    .filter(|f| !f.removed)
                    .map(|f| {
                        if f.accessible {
                            Ok(f.id.clone())
                        } else {
                            Err(HostError::CrossOrigin(f.id.clone()))
                        }
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn listen(
        &self,
        target: &TargetId,
        kind: InputKind,
        via: Registration,
        sink: Arc<dyn EventSink>,
    ) -> Result<(), HostError> {
        let mut inner = lock(&self.inner);

        let supported = match via {
            Registration::Modern => inner.caps.add_event_listener,
            Registration::Legacy => inner.caps.attach_event,
            Registration::Unavailable => false,
        };
        if !supported {
            return Err(HostError::Unsupported);
        }

        inner.check_access(target)?;
        inner
            .listeners
            .entry(target.clone())
            .or_default()
            .push(Listener { kind, via, sink });
        Ok(())
    }

    fn editor_instances(&self) -> Option<Vec<String>> {
        lock(&self.inner).editors.clone()
    }

    fn subscribe_editor(
        &self,
        instance: &str,
        channel: EditorChannel,
        sink: Arc<dyn EventSink>,
    ) -> Result<(), HostError> {
        let mut inner = lock(&self.inner);
        let live = inner
            .editors
            .as_ref()
            .is_some_and(|l| l.iter().any(|n| n == instance));
        if !live {
            return Err(HostError::Gone(instance.to_string()));
        }

        inner
            .editor_hooks
            .entry(instance.to_string())
            .or_default()
            .push((channel, sink));
        Ok(())
    }
}

// ---------------- surface ----------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SurfaceChange {
    Mounted,
    Shown { seconds: i64 },
    Countdown { seconds: i64 },
    Hidden,
    Navigated { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurfaceRecord {
    pub at_ms: u64,
    #[serde(flatten)]
    pub change: SurfaceChange,
}

#[derive(Default)]
struct SurfaceInner {
    banner: Option<Banner>,
    visible: bool,
    countdown: Option<i64>,
    navigated: Option<String>,
    history: Vec<SurfaceRecord>,
}

/// Surface that remembers everything it was asked to do.
pub struct RecordingSurface {
    label: String,
    clock: Arc<dyn Clock>,
    inner: Mutex<SurfaceInner>,
}

impl RecordingSurface {
    pub fn new(label: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            label: label.into(),
            clock,
            inner: Mutex::new(SurfaceInner::default()),
        }
    }

    pub fn is_visible(&self) -> bool {
        lock(&self.inner).visible
    }

    pub fn countdown(&self) -> Option<i64> {
        lock(&self.inner).countdown
    }

    pub fn navigated(&self) -> Option<String> {
        lock(&self.inner).navigated.clone()
    }

    pub fn banner(&self) -> Option<Banner> {
        lock(&self.inner).banner.clone()
    }

    pub fn history(&self) -> Vec<SurfaceRecord> {
        lock(&self.inner).history.clone()
    }

    /// Countdown values shown, in order (including the initial one).
    pub fn countdown_trail(&self) -> Vec<i64> {
        lock(&self.inner)
            .history
            .iter()
            .filter_map(|r| match r.change {
                SurfaceChange::Shown { seconds } | SurfaceChange::Countdown { seconds } => {
                    Some(seconds)
                }
                _ => None,
            })
            .collect()
    }

    fn record(&self, inner: &mut SurfaceInner, change: SurfaceChange) {
        inner.history.push(SurfaceRecord {
            at_ms: self.clock.now_ms(),
            change,
        });
    }
}

impl Surface for RecordingSurface {
    fn mount_banner(&self, banner: &Banner) {
        let mut inner = lock(&self.inner);
        inner.banner = Some(banner.clone());
        inner.visible = false;
        self.record(&mut inner, SurfaceChange::Mounted);
    }

    fn show_banner(&self, seconds: i64) {
        let mut inner = lock(&self.inner);
        inner.visible = true;
        inner.countdown = Some(seconds);
        if let Some(b) = inner.banner.as_ref() {
            tracing::info!("[{}] {}", self.label, b.text(seconds));
        }
        self.record(&mut inner, SurfaceChange::Shown { seconds });
    }

    fn set_countdown(&self, seconds: i64) {
        let mut inner = lock(&self.inner);
        inner.countdown = Some(seconds);
        tracing::debug!("[{}] countdown {}", self.label, seconds);
        self.record(&mut inner, SurfaceChange::Countdown { seconds });
    }

    fn hide_banner(&self) {
        let mut inner = lock(&self.inner);
        inner.visible = false;
        inner.countdown = None;
        tracing::info!("[{}] warning dismissed", self.label);
        self.record(&mut inner, SurfaceChange::Hidden);
    }

    fn navigate(&self, url: &str) {
        let mut inner = lock(&self.inner);
        inner.navigated = Some(url.to_string());
        tracing::info!("[{}] navigating to {}", self.label, url);
        self.record(&mut inner, SurfaceChange::Navigated { url: url.to_string() });
    }
}

// ---------------- page ----------------

/// One simulated page: its own DOM and surface, sharing the cookie jar and clock.
#[derive(Clone)]
pub struct HeadlessPage {
    pub label: String,
    pub cookies: Arc<HeadlessCookieJar>,
    pub dom: Arc<HeadlessDom>,
    pub surface: Arc<RecordingSurface>,
    pub clock: Arc<dyn Clock>,
}

impl HeadlessPage {
    pub fn new(
        label: impl Into<String>,
        cookies: Arc<HeadlessCookieJar>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let label = label.into();
        Self {
            surface: Arc::new(RecordingSurface::new(label.clone(), clock.clone())),
            dom: Arc::new(HeadlessDom::new()),
            label,
            cookies,
            clock,
        }
    }

    pub fn host(&self) -> Host {
        Host {
            cookies: self.cookies.clone(),
            dom: self.dom.clone(),
            surface: self.surface.clone(),
            clock: self.clock.clone(),
        }
    }

    /// Simulate a key press on the top window.
    pub fn press_key(&self) -> usize {
        self.dom.dispatch(TOP, InputKind::KeyDown)
    }

    pub fn move_mouse(&self) -> usize {
        self.dom.dispatch(TOP, InputKind::MouseMove)
    }
}
