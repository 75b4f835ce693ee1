use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::arbiter::ActiveElementArbiter;
use crate::config::{EngineConfig, KeyInput, Shortcut};
use crate::detector::TrackedElement;
use crate::discovery::{discover, find_playing};
use crate::error::{EngineError, Result};
use crate::gate::{GateOutcome, SeekabilityGate};
use crate::history::JumpRecord;
use crate::navigation::{NavigationEpoch, NavigationSignal, NavigationWatcher};
use crate::page::{ElementId, MediaSignal, MediaState, PageBackend};
use crate::scheduler::TimerQueue;
use crate::time::{Millis, minutes_label};

/// Commands accepted by the engine: host page signals and clock advances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Records the initial location, starts polling and runs discovery.
    Start,
    /// Advances the virtual clock, firing every timer due in the window.
    Advance {
        by_ms: Millis,
    },
    Media {
        element: ElementId,
        signal: MediaSignal,
    },
    /// A subtree was inserted into or removed from the document.
    DomMutated,
    KeyDown(KeyInput),
    Navigation(NavigationSignal),
    /// The page is going away; every timer is released.
    Unload,
}

/// Events emitted by the engine.
///
/// Events are observational; nothing inside the engine consumes them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Started {
        location: String,
    },
    Tracked {
        element: ElementId,
        position: f64,
    },
    GateWaiting {
        element: ElementId,
    },
    GateTimedOut {
        element: ElementId,
    },
    ActiveChanged {
        element: ElementId,
        previous: Option<ElementId>,
    },
    JumpDetected {
        element: ElementId,
        jump: JumpRecord,
    },
    UndoApplied {
        element: ElementId,
        jump: JumpRecord,
    },
    RedoApplied {
        element: ElementId,
        jump: JumpRecord,
    },
    TrackingDropped {
        element: ElementId,
    },
    FallbackDiscovery {
        count: usize,
    },
    NavigationReset {
        epoch: u64,
        location: String,
    },
    Unloaded,
    Error(EngineErrorEvent),
}

/// Coarse classification of an engine error for event consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineErrorKind {
    NotRunning,
    ElementUnreachable,
    Other,
}

impl From<&EngineError> for EngineErrorKind {
    fn from(value: &EngineError) -> Self {
        match value {
            EngineError::NotRunning => Self::NotRunning,
            EngineError::ElementUnreachable { .. } => Self::ElementUnreachable,
            _ => Self::Other,
        }
    }
}

/// User-facing error payload emitted as an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineErrorEvent {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineErrorEvent {
    pub fn from_error(error: &EngineError) -> Self {
        Self {
            kind: EngineErrorKind::from(error),
            message: error.to_string(),
        }
    }
}

/// Callbacks the engine schedules on its timer queue.
///
/// Per-element timers carry the navigation epoch they were scheduled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    Sample { element: ElementId, epoch: u64 },
    GateTimeout { element: ElementId, epoch: u64 },
    NavigationPoll,
    NavigationCheck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Running,
    Unloaded,
}

/// Seek-history engine for one page.
///
/// Single-threaded: every command runs to completion and returns the
/// events it produced.
///
/// # Example
/// ```
/// use engine::{Command, Engine, Event};
/// use page_sim::{SimDocument, SimMedia};
///
/// let mut page = SimDocument::new("https://example.test/watch");
/// let mut media = SimMedia::loaded(600.0).expect("duration");
/// media.play();
/// page.append_media(page.root(), media).expect("append");
///
/// let mut engine = Engine::new(page);
/// let events = engine.handle_command(Command::Start).expect("start");
/// assert!(matches!(events[0], Event::Started { .. }));
/// assert!(engine.active().is_some());
/// ```
#[derive(Debug)]
pub struct Engine<P> {
    page: P,
    config: EngineConfig,
    lifecycle: Lifecycle,
    now_ms: Millis,
    timers: TimerQueue<Timer>,
    tracked: HashMap<ElementId, TrackedElement>,
    gate: SeekabilityGate,
    arbiter: ActiveElementArbiter,
    navigation: NavigationWatcher,
}

impl<P> Engine<P>
where
    P: PageBackend,
{
    /// Creates an engine with the default config.
    pub fn new(page: P) -> Self {
        let navigation = NavigationWatcher::new(page.location());
        Self {
            page,
            config: EngineConfig::default(),
            lifecycle: Lifecycle::Idle,
            now_ms: 0,
            timers: TimerQueue::new(),
            tracked: HashMap::new(),
            gate: SeekabilityGate::default(),
            arbiter: ActiveElementArbiter::default(),
            navigation,
        }
    }

    /// Creates an engine with a validated config.
    pub fn with_config(page: P, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let mut engine = Self::new(page);
        engine.config = config;
        Ok(engine)
    }

    /// Applies one command and returns emitted events.
    pub fn handle_command(&mut self, command: Command) -> Result<Vec<Event>> {
        match self.lifecycle {
            Lifecycle::Idle => {
                return match command {
                    Command::Start => self.start(),
                    _ => Err(EngineError::NotRunning),
                };
            }
            Lifecycle::Unloaded => return Err(EngineError::NotRunning),
            Lifecycle::Running => {}
        }

        match command {
            Command::Start => Err(EngineError::AlreadyStarted),
            Command::Advance { by_ms } => Ok(self.advance(by_ms)),
            Command::Media { element, signal } => Ok(self.media_signal(element, signal)),
            Command::DomMutated => Ok(self.dom_mutated()),
            Command::KeyDown(key) => self.key_down(&key),
            Command::Navigation(signal) => {
                debug!(?signal, "navigation signal");
                self.request_navigation_check();
                Ok(Vec::new())
            }
            Command::Unload => Ok(self.unload()),
        }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now_ms(&self) -> Millis {
        self.now_ms
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    pub fn epoch(&self) -> &NavigationEpoch {
        self.navigation.epoch()
    }

    pub fn active(&self) -> Option<ElementId> {
        self.arbiter.active()
    }

    pub fn tracked(&self, element: ElementId) -> Option<&TrackedElement> {
        self.tracked.get(&element)
    }

    /// Tracked elements in id order.
    pub fn tracked_elements(&self) -> Vec<ElementId> {
        let mut elements: Vec<ElementId> = self.tracked.keys().copied().collect();
        elements.sort();
        elements
    }

    /// Elements waiting in the seekability gate, in id order.
    pub fn waiting_elements(&self) -> Vec<ElementId> {
        self.gate.waiting()
    }

    /// Number of timers currently scheduled.
    pub fn scheduled_timers(&self) -> usize {
        self.timers.len()
    }

    fn start(&mut self) -> Result<Vec<Event>> {
        self.lifecycle = Lifecycle::Running;
        let location = self.page.location();
        self.navigation = NavigationWatcher::new(location.clone());
        self.navigation
            .start_polling(&mut self.timers, self.now_ms, self.config.navigation_poll_ms);
        info!(%location, "seek history started");

        let mut events = vec![Event::Started { location }];
        self.discover_and_offer(true, &mut events);
        Ok(events)
    }

    fn advance(&mut self, by_ms: Millis) -> Vec<Event> {
        let target = self.now_ms.saturating_add(by_ms);
        let mut events = Vec::new();
        while let Some((_, timer, due)) = self.timers.pop_due(target) {
            self.now_ms = self.now_ms.max(due);
            self.fire(timer, &mut events);
        }
        self.now_ms = target;
        events
    }

    fn fire(&mut self, timer: Timer, events: &mut Vec<Event>) {
        match timer {
            Timer::Sample { element, epoch } => self.sample(element, epoch, events),
            Timer::GateTimeout { element, epoch } => self.gate_timeout(element, epoch, events),
            Timer::NavigationPoll => self.navigation_poll(events),
            Timer::NavigationCheck => self.navigation_check(events),
        }
    }

    fn sample(&mut self, element: ElementId, epoch: u64, events: &mut Vec<Event>) {
        if epoch != self.navigation.epoch().index {
            debug!(%element, epoch, "stale sampling tick ignored");
            return;
        }
        let Some(state) = self.page.media_state(element) else {
            self.drop_element(element, events);
            return;
        };
        let is_active = self.arbiter.is_active(element);
        let Some(tracked) = self.tracked.get_mut(&element) else {
            return;
        };

        if let Some(jump) = tracked.observe(state.position, is_active, self.config.jump_threshold_secs)
        {
            info!(
                %element,
                from_min = %minutes_label(jump.from),
                to_min = %minutes_label(jump.to),
                undo_depth = tracked.history().undo_len(),
                "jump detected"
            );
            events.push(Event::JumpDetected { element, jump });
        }
    }

    fn gate_timeout(&mut self, element: ElementId, epoch: u64, events: &mut Vec<Event>) {
        if epoch != self.navigation.epoch().index {
            return;
        }
        if self.page.media_state(element).is_none() {
            if self.gate.expire(element) {
                debug!(%element, "waiting element left the page before its timeout");
            }
            return;
        }
        if self.gate.expire(element) {
            warn!(
                %element,
                timeout_ms = self.config.gate_timeout_ms,
                "element never became seekable, tracking abandoned"
            );
            events.push(Event::GateTimedOut { element });
        }
    }

    fn media_signal(&mut self, element: ElementId, signal: MediaSignal) -> Vec<Event> {
        let mut events = Vec::new();
        if signal.is_readiness() {
            let state = self.page.media_state(element);
            if let Some(state) = self.gate.recheck(element, state, &mut self.timers) {
                debug!(%element, ?signal, "element became seekable");
                self.attach(element, state, &mut events);
            }
            return events;
        }

        match signal {
            MediaSignal::Playing => {
                if !self.tracked.contains_key(&element) {
                    debug!(%element, "playback start on untracked element ignored");
                    return events;
                }
                let previous = self.arbiter.active();
                if self.arbiter.on_playback_started(element) {
                    events.push(Event::ActiveChanged { element, previous });
                }
            }
            MediaSignal::Paused | MediaSignal::Ended => {
                debug!(%element, ?signal, "playback stopped, active element kept");
            }
            MediaSignal::LoadedMetadata | MediaSignal::DurationChanged | MediaSignal::CanPlay => {}
        }
        events
    }

    fn dom_mutated(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        self.sweep_unreachable(&mut events);
        self.discover_and_offer(false, &mut events);
        self.request_navigation_check();
        events
    }

    fn key_down(&mut self, key: &KeyInput) -> Result<Vec<Event>> {
        let Some(shortcut) = self.config.shortcuts.resolve(key) else {
            return Ok(Vec::new());
        };
        let Some(element) = self.arbiter.active() else {
            debug!(?shortcut, "no active element");
            return Ok(Vec::new());
        };

        let mut events = Vec::new();
        if self.page.media_state(element).is_none() {
            self.drop_element(element, &mut events);
            return Ok(events);
        }
        let Some(tracked) = self.tracked.get(&element) else {
            return Ok(events);
        };

        let history = tracked.history();
        let next = match shortcut {
            Shortcut::Undo => history.undo_stack().last(),
            Shortcut::Redo => history.redo_stack().last(),
        };
        let Some(&jump) = next else {
            debug!(%element, ?shortcut, "history stack empty");
            return Ok(events);
        };
        let target = match shortcut {
            Shortcut::Undo => jump.from,
            Shortcut::Redo => jump.to,
        };

        // Stacks and the suppression flag only move once the seek landed.
        self.page.set_position(element, target)?;
        if let Some(tracked) = self.tracked.get_mut(&element) {
            match shortcut {
                Shortcut::Undo => tracked.undo(),
                Shortcut::Redo => tracked.redo(),
            };
        }

        match shortcut {
            Shortcut::Undo => {
                info!(
                    %element,
                    back_to_min = %minutes_label(jump.from),
                    was_min = %minutes_label(jump.to),
                    "undo seek"
                );
                events.push(Event::UndoApplied { element, jump });
            }
            Shortcut::Redo => {
                info!(
                    %element,
                    forward_to_min = %minutes_label(jump.to),
                    was_min = %minutes_label(jump.from),
                    "redo seek"
                );
                events.push(Event::RedoApplied { element, jump });
            }
        }
        Ok(events)
    }

    fn unload(&mut self) -> Vec<Event> {
        self.reset_tracking();
        self.navigation.stop(&mut self.timers);
        self.lifecycle = Lifecycle::Unloaded;
        debug_assert!(self.timers.is_empty(), "timers leaked past unload");
        info!("page unloaded, seek history released");
        vec![Event::Unloaded]
    }

    fn request_navigation_check(&mut self) {
        let due = self.now_ms.saturating_add(self.config.navigation_settle_ms);
        self.navigation.request_check(&mut self.timers, due);
    }

    /// The poll checks the location directly; a raw-signal check that is
    /// already pending keeps its due time.
    fn navigation_poll(&mut self, events: &mut Vec<Event>) {
        if self.navigation.has_pending_check() {
            return;
        }
        self.navigation_check(events);
    }

    fn navigation_check(&mut self, events: &mut Vec<Event>) {
        let location = self.page.location();
        let Some(epoch) = self.navigation.check(location).cloned() else {
            return;
        };

        info!(
            epoch = epoch.index,
            location = %epoch.location,
            "navigation detected, resetting seek history"
        );
        self.reset_tracking();
        events.push(Event::NavigationReset {
            epoch: epoch.index,
            location: epoch.location,
        });
        self.discover_and_offer(true, events);
    }

    fn discover_and_offer(&mut self, bootstrap: bool, events: &mut Vec<Event>) {
        let found = discover(&self.page);
        if found.used_fallback && !found.elements.is_empty() {
            info!(
                count = found.elements.len(),
                "media found through shadow root fallback"
            );
            events.push(Event::FallbackDiscovery {
                count: found.elements.len(),
            });
        }

        if bootstrap
            && let Some(playing) = find_playing(
                &self.page,
                &found.elements,
                self.config.bootstrap_min_ready_state,
            )
        {
            debug!(element = %playing, "bootstrapping from already playing element");
            self.offer(playing, events);
        }
        for element in found.elements {
            self.offer(element, events);
        }
    }

    fn offer(&mut self, element: ElementId, events: &mut Vec<Event>) {
        if self.tracked.contains_key(&element) {
            return;
        }
        let state = self.page.media_state(element);
        let timeout_at = self.now_ms.saturating_add(self.config.gate_timeout_ms);
        let epoch = self.navigation.epoch().index;

        match self
            .gate
            .offer(element, state, &mut self.timers, timeout_at, epoch)
        {
            GateOutcome::Ready(state) => self.attach(element, state, events),
            GateOutcome::Waiting => events.push(Event::GateWaiting { element }),
            GateOutcome::Ignored => {}
        }
    }

    fn attach(&mut self, element: ElementId, state: MediaState, events: &mut Vec<Event>) {
        let epoch = self.navigation.epoch().index;
        let interval = self.config.sample_interval_ms;
        let sample_timer = self.timers.schedule_every(
            self.now_ms.saturating_add(interval),
            interval,
            Timer::Sample { element, epoch },
        );
        self.tracked
            .insert(element, TrackedElement::new(state.position, epoch, sample_timer));
        info!(
            %element,
            position = state.position,
            duration = state.duration,
            "tracking attached"
        );
        events.push(Event::Tracked {
            element,
            position: state.position,
        });

        let previous = self.arbiter.active();
        if self.arbiter.on_attach(element, state.is_playing()) {
            events.push(Event::ActiveChanged { element, previous });
        }
    }

    fn sweep_unreachable(&mut self, events: &mut Vec<Event>) {
        for element in self.tracked_elements() {
            if self.page.media_state(element).is_none() {
                self.drop_element(element, events);
            }
        }
        for element in self.gate.waiting() {
            if self.page.media_state(element).is_none() {
                self.gate.release(element, &mut self.timers);
                debug!(%element, "waiting element removed from page");
            }
        }
    }

    fn drop_element(&mut self, element: ElementId, events: &mut Vec<Event>) {
        let Some(tracked) = self.tracked.remove(&element) else {
            return;
        };
        self.timers.cancel(tracked.sample_timer());
        let was_active = self.arbiter.forget(element);
        info!(%element, was_active, "media element unreachable, tracking dropped");
        events.push(Event::TrackingDropped { element });
    }

    fn reset_tracking(&mut self) {
        for (_, tracked) in self.tracked.drain() {
            self.timers.cancel(tracked.sample_timer());
        }
        let released = self.gate.release_all(&mut self.timers);
        if released > 0 {
            debug!(released, "waiting gate entries released");
        }
        self.arbiter.clear();
    }
}
