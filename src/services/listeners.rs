// Author: Dustin Pilgrim
// License: MIT

use std::collections::HashSet;
use std::sync::Arc;

use crate::core::events::{EditorChannel, InputKind};
use crate::services::dom::{Dom, Registration, TargetId};
use crate::services::EventSink;

/// Attaches the activity sink to every input source the page has, now and as
/// new frames/editor instances appear.
///
/// Registration is tracked per target and input kind so repeated polls never
/// add a second handler. A target counts as instrumented once all kinds are
/// registered; a partial failure is retried for the missing kinds only.
/// Targets are never removed from the sets; listeners on a frame that went
/// away simply stop firing.
pub struct Attacher {
    dom: Arc<dyn Dom>,
    sink: Arc<dyn EventSink>,
    registration: Registration,

    instrumented: HashSet<TargetId>,
    listening: HashSet<(TargetId, InputKind)>,
    editor_hooks: HashSet<(String, EditorChannel)>,
}

impl Attacher {
    pub fn new(dom: Arc<dyn Dom>, sink: Arc<dyn EventSink>) -> Self {
        let registration = Registration::detect(&dom.capabilities());

        match registration {
            Registration::Modern => tracing::debug!("listeners: using addEventListener"),
            Registration::Legacy => tracing::debug!("listeners: using attachEvent"),
            Registration::Unavailable => tracing::warn!(
                "listeners: no event registration API; input activity will not be detected"
            ),
        }

        Self {
            dom,
            sink,
            registration,
            instrumented: HashSet::new(),
            listening: HashSet::new(),
            editor_hooks: HashSet::new(),
        }
    }

    pub fn registration(&self) -> Registration {
        self.registration
    }

    pub fn instrumented_count(&self) -> usize {
        self.instrumented.len()
    }

    pub fn editor_hook_count(&self) -> usize {
        self.editor_hooks.len()
    }

    pub fn is_instrumented(&self, target: &str) -> bool {
        self.instrumented.contains(target)
    }

    /// Startup pass: the top window, every reachable child frame, and an
    /// initial scan of iframes and editors.
    pub fn attach_all(&mut self) {
        let top = self.dom.top();
        self.instrument(&top);

        for frame in self.dom.child_frames() {
            match frame {
                Ok(id) => {
                    self.instrument(&id);
                }
                Err(e) => tracing::debug!("listeners: skipping frame: {e}"),
            }
        }

        self.scan_frames();
        self.scan_editors();

        tracing::info!(
            "listeners attached (targets={}, editor hooks={})",
            self.instrumented.len(),
            self.editor_hooks.len()
        );
    }

    /// Look for iframe documents under the top window and its child frames.
    /// Returns how many new targets were instrumented.
    pub fn scan_frames(&mut self) -> usize {
        let mut roots = vec![self.dom.top()];
        roots.extend(self.dom.child_frames().into_iter().filter_map(Result::ok));

        let mut added = 0;
        for root in roots {
            let bodies = match self.dom.iframe_bodies(&root) {
                Ok(b) => b,
                Err(e) => {
                    tracing::debug!("listeners: cannot scan iframes of {root}: {e}");
                    continue;
                }
            };

            for body in bodies {
                match body {
                    Ok(id) => {
                        if self.instrument(&id) {
                            added += 1;
                        }
                    }
                    Err(e) => tracing::debug!("listeners: iframe body skipped: {e}"),
                }
            }
        }

        if added > 0 {
            tracing::debug!("listeners: {added} new iframe target(s)");
        }
        added
    }

    /// Hook every editor instance not hooked yet. Missing editor library is normal.
    /// Returns how many new subscriptions were made.
    pub fn scan_editors(&mut self) -> usize {
        let Some(instances) = self.dom.editor_instances() else {
            return 0;
        };

        let mut added = 0;
        for name in instances {
            for channel in EditorChannel::ALL {
                let key = (name.clone(), channel);
                if self.editor_hooks.contains(&key) {
                    continue;
                }

                match self.dom.subscribe_editor(&name, channel, self.sink.clone()) {
                    Ok(()) => {
                        self.editor_hooks.insert(key);
                        added += 1;
                    }
                    Err(e) => {
                        tracing::debug!(
                            "listeners: editor {name} {} not hooked: {e}",
                            channel.event_name()
                        );
                    }
                }
            }
        }

        if added > 0 {
            tracing::debug!("listeners: {added} new editor hook(s)");
        }
        added
    }

    // Returns true when the target became fully instrumented.
    fn instrument(&mut self, target: &TargetId) -> bool {
        if self.registration == Registration::Unavailable || self.instrumented.contains(target) {
            return false;
        }

        let mut complete = true;
        for kind in InputKind::ALL {
            let key = (target.clone(), kind);
            if self.listening.contains(&key) {
                continue;
            }

            match self.dom.listen(target, kind, self.registration, self.sink.clone()) {
                Ok(()) => {
                    self.listening.insert(key);
                }
                Err(e) => {
                    tracing::debug!("listeners: {target} {} not attached: {e}", kind.event_name());
                    complete = false;
                }
            }
        }

        if complete {
            self.instrumented.insert(target.clone());
        }
        complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::ActivitySource;
    use crate::services::HostError;
    use crate::services::dom::Capabilities;
    use crate::services::headless::HeadlessDom;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ActivitySource>>);

    impl EventSink for Recorder {
        fn push(&self, source: ActivitySource) {
            self.0.lock().unwrap().push(source);
        }
    }

    fn attacher(dom: &Arc<HeadlessDom>) -> (Arc<Recorder>, Attacher) {
        let rec = Arc::new(Recorder::default());
        let a = Attacher::new(dom.clone(), rec.clone());
        (rec, a)
    }

    #[test]
    fn attaches_top_and_same_origin_frames_skipping_cross_origin() {
        let dom = Arc::new(HeadlessDom::new());
        dom.add_frame("frame-a", true);
        dom.add_frame("proxy", false);
        dom.add_frame("frame-b", true);

        let (_rec, mut a) = attacher(&dom);
        a.attach_all();

        assert!(a.is_instrumented("window"));
        assert!(a.is_instrumented("frame-a"));
        assert!(a.is_instrumented("frame-b"));
        assert!(!a.is_instrumented("proxy"));
        assert_eq!(dom.listener_count("window"), 4);
    }

    #[test]
    fn frame_poll_picks_up_late_iframes_once() {
        let dom = Arc::new(HeadlessDom::new());
        let (rec, mut a) = attacher(&dom);
        a.attach_all();
        assert_eq!(a.scan_frames(), 0);

        dom.add_iframe("window", "compose-body", true);
        dom.add_iframe("window", "ads-body", false);
        assert_eq!(a.scan_frames(), 1);
        assert_eq!(a.scan_frames(), 0);
        assert_eq!(dom.listener_count("compose-body"), 4);

        dom.dispatch("compose-body", InputKind::KeyDown);
        assert_eq!(rec.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn iframes_inside_child_frames_are_scanned() {
        let dom = Arc::new(HeadlessDom::new());
        dom.add_frame("notes", true);
        dom.add_iframe("notes", "notes-editor-body", true);

        let (_rec, mut a) = attacher(&dom);
        a.attach_all();
        assert!(a.is_instrumented("notes-editor-body"));
    }

    #[test]
    fn editor_hooks_are_idempotent_and_optional() {
        let dom = Arc::new(HeadlessDom::new());
        let (rec, mut a) = attacher(&dom);
        a.attach_all();
        assert_eq!(a.scan_editors(), 0);

        dom.install_editor_registry();
        dom.add_editor("body");
        assert_eq!(a.scan_editors(), 2);
        assert_eq!(a.scan_editors(), 0);

        dom.add_editor("comment");
        assert_eq!(a.scan_editors(), 2);
        assert_eq!(a.editor_hook_count(), 4);

        dom.fire_editor("body", EditorChannel::SelectionChange);
        assert_eq!(
            rec.0.lock().unwrap().as_slice(),
            [ActivitySource::Editor {
                instance: "body".to_string(),
                channel: EditorChannel::SelectionChange,
            }]
        );
    }

    // Refuses scroll listeners on one target while `failing` is set.
    struct FlakyDom {
        inner: HeadlessDom,
        target: &'static str,
        failing: AtomicBool,
    }

    impl Dom for FlakyDom {
        fn capabilities(&self) -> Capabilities {
            self.inner.capabilities()
        }

        fn top(&self) -> TargetId {
            self.inner.top()
        }

        fn child_frames(&self) -> Vec<Result<TargetId, HostError>> {
            self.inner.child_frames()
        }

        fn iframe_bodies(
            &self,
            within: &TargetId,
        ) -> Result<Vec<Result<TargetId, HostError>>, HostError> {
            self.inner.iframe_bodies(within)
        }

        fn listen(
            &self,
            target: &TargetId,
            kind: InputKind,
            via: Registration,
            sink: Arc<dyn EventSink>,
        ) -> Result<(), HostError> {
            let refused = target == self.target
                && kind == InputKind::Scroll
                && self.failing.load(Ordering::SeqCst);
            if refused {
                return Err(HostError::Gone(target.clone()));
            }
            self.inner.listen(target, kind, via, sink)
        }

        fn editor_instances(&self) -> Option<Vec<String>> {
            self.inner.editor_instances()
        }

        fn subscribe_editor(
            &self,
            instance: &str,
            channel: EditorChannel,
            sink: Arc<dyn EventSink>,
        ) -> Result<(), HostError> {
            self.inner.subscribe_editor(instance, channel, sink)
        }
    }

    #[test]
    fn partial_registration_retries_only_missing_kinds() {
        let dom = Arc::new(FlakyDom {
            inner: HeadlessDom::new(),
            target: "compose-body",
            failing: AtomicBool::new(true),
        });
        dom.inner.add_iframe("window", "compose-body", true);

        let mut a = Attacher::new(dom.clone(), Arc::new(Recorder::default()));
        a.attach_all();
        assert!(!a.is_instrumented("compose-body"));
        assert_eq!(dom.inner.listener_count("compose-body"), 3);

        // Still failing: nothing is registered twice.
        assert_eq!(a.scan_frames(), 0);
        assert_eq!(dom.inner.listener_count("compose-body"), 3);

        dom.failing.store(false, Ordering::SeqCst);
        assert_eq!(a.scan_frames(), 1);
        assert!(a.is_instrumented("compose-body"));
        assert_eq!(dom.inner.listener_count("compose-body"), 4);

        assert_eq!(a.scan_frames(), 0);
        assert_eq!(dom.inner.listener_count("compose-body"), 4);
    }

    #[test]
    fn unavailable_registration_attaches_nothing() {
        let dom = Arc::new(HeadlessDom::with_capabilities(false, false, ""));
        dom.add_frame("frame-a", true);

        let (_rec, mut a) = attacher(&dom);
        a.attach_all();

        assert_eq!(a.registration(), Registration::Unavailable);
        assert_eq!(a.instrumented_count(), 0);
        assert_eq!(dom.listener_count("window"), 0);
    }
}
