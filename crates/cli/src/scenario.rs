use std::collections::HashMap;
use std::path::Path;

use engine::{
    Command, ElementId, Engine, EngineConfig, EngineErrorEvent, Event, KeyInput, MediaSignal,
    NavigationSignal,
};
use page_sim::{NodeId, SimDocument, SimMedia};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{CliError, Result};

/// Playback and the engine clock advance together in slices of this size.
const PLAYBACK_SLICE_MS: u64 = 100;

/// A simulated page session: initial location plus ordered steps.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub location: String,
    #[serde(default)]
    pub config: Option<EngineConfig>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CliError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Start,
    AddElement {
        name: String,
        #[serde(default)]
        parent: Option<String>,
        tag: String,
    },
    AttachShadow {
        name: String,
        host: String,
    },
    AddMedia {
        name: String,
        #[serde(default)]
        parent: Option<String>,
        /// Omitted for media whose metadata has not loaded yet.
        #[serde(default)]
        duration: Option<f64>,
        #[serde(default)]
        live: bool,
        #[serde(default)]
        position: f64,
        #[serde(default)]
        playing: bool,
    },
    Remove {
        node: String,
    },
    LoadMetadata {
        node: String,
        duration: f64,
    },
    Play {
        node: String,
    },
    Pause {
        node: String,
    },
    Seek {
        node: String,
        to: f64,
    },
    Wait {
        ms: u64,
    },
    Key(KeyInput),
    PushState {
        url: String,
    },
    ReplaceState {
        url: String,
    },
    Back,
    Forward,
    SetHash {
        hash: String,
    },
    /// Location change without any navigation signal.
    Assign {
        url: String,
    },
    Unload,
}

/// Drives one engine against a simulated page.
pub struct ScenarioRunner {
    engine: Engine<SimDocument>,
    nodes: HashMap<String, NodeId>,
    started: bool,
    events: Vec<Event>,
}

impl ScenarioRunner {
    pub fn new(location: &str, config: EngineConfig) -> Result<Self> {
        let engine = Engine::with_config(SimDocument::new(location), config)?;
        Ok(Self {
            engine,
            nodes: HashMap::new(),
            started: false,
            events: Vec::new(),
        })
    }

    pub fn engine(&self) -> &Engine<SimDocument> {
        &self.engine
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    pub fn node(&self, name: &str) -> Result<NodeId> {
        if name == "document" {
            return Ok(self.engine.page().root());
        }
        self.nodes
            .get(name)
            .copied()
            .ok_or_else(|| CliError::UnknownNode {
                name: name.to_owned(),
            })
    }

    pub fn apply(&mut self, step: &Step) -> Result<()> {
        debug!(?step, "scenario step");
        match step {
            Step::Start => {
                self.started = true;
                self.send(Command::Start);
            }
            Step::AddElement { name, parent, tag } => {
                let parent = self.parent(parent.as_deref())?;
                let node = self.engine.page_mut().append_element(parent, tag.as_str())?;
                self.name(name, node)?;
                self.send(Command::DomMutated);
            }
            Step::AttachShadow { name, host } => {
                let host = self.node(host)?;
                let node = self.engine.page_mut().attach_shadow(host)?;
                self.name(name, node)?;
                self.send(Command::DomMutated);
            }
            Step::AddMedia {
                name,
                parent,
                duration,
                live,
                position,
                playing,
            } => {
                let parent = self.parent(parent.as_deref())?;
                let mut media = match (live, duration) {
                    (true, _) => SimMedia::live(),
                    (false, Some(duration)) => SimMedia::loaded(*duration)?,
                    (false, None) => SimMedia::unloaded(),
                };
                media.seek(*position)?;
                if *playing {
                    media.play();
                }
                let node = self.engine.page_mut().append_media(parent, media)?;
                self.name(name, node)?;
                self.send(Command::DomMutated);
            }
            Step::Remove { node } => {
                let node = self.node(node)?;
                self.engine.page_mut().remove(node)?;
                self.send(Command::DomMutated);
            }
            Step::LoadMetadata { node, duration } => {
                let node = self.node(node)?;
                self.engine
                    .page_mut()
                    .media_mut(node)?
                    .load_metadata(*duration)?;
                self.media_signal(node, MediaSignal::LoadedMetadata);
                self.media_signal(node, MediaSignal::DurationChanged);
            }
            Step::Play { node } => {
                let node = self.node(node)?;
                self.engine.page_mut().media_mut(node)?.play();
                self.media_signal(node, MediaSignal::Playing);
            }
            Step::Pause { node } => {
                let node = self.node(node)?;
                self.engine.page_mut().media_mut(node)?.pause();
                self.media_signal(node, MediaSignal::Paused);
            }
            Step::Seek { node, to } => {
                let node = self.node(node)?;
                self.engine.page_mut().media_mut(node)?.seek(*to)?;
            }
            Step::Wait { ms } => self.wait(*ms),
            Step::Key(key) => self.send(Command::KeyDown(key.clone())),
            Step::PushState { url } => {
                self.engine.page_mut().history_mut().push_state(url.as_str());
                self.send(Command::Navigation(NavigationSignal::HistoryApi));
            }
            Step::ReplaceState { url } => {
                self.engine
                    .page_mut()
                    .history_mut()
                    .replace_state(url.as_str());
                self.send(Command::Navigation(NavigationSignal::HistoryApi));
            }
            Step::Back => {
                if self.engine.page_mut().history_mut().back() {
                    self.send(Command::Navigation(NavigationSignal::PopState));
                }
            }
            Step::Forward => {
                if self.engine.page_mut().history_mut().forward() {
                    self.send(Command::Navigation(NavigationSignal::PopState));
                }
            }
            Step::SetHash { hash } => {
                self.engine.page_mut().history_mut().set_hash(hash);
                self.send(Command::Navigation(NavigationSignal::HashChange));
            }
            Step::Assign { url } => {
                self.engine
                    .page_mut()
                    .history_mut()
                    .assign_silently(url.as_str());
            }
            Step::Unload => self.send(Command::Unload),
        }
        Ok(())
    }

    fn wait(&mut self, ms: u64) {
        let mut remaining = ms;
        while remaining > 0 {
            let slice = remaining.min(PLAYBACK_SLICE_MS);
            let playing = self.playing_media();
            self.engine.page_mut().advance_playback(slice);
            for node in playing {
                if self
                    .engine
                    .page()
                    .media(node)
                    .is_some_and(|media| media.ended())
                {
                    self.media_signal(node, MediaSignal::Ended);
                }
            }
            self.send(Command::Advance { by_ms: slice });
            remaining -= slice;
        }
    }

    fn playing_media(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self
            .nodes
            .values()
            .copied()
            .filter(|node| {
                self.engine
                    .page()
                    .media(*node)
                    .is_some_and(|media| !media.paused() && !media.ended())
            })
            .collect();
        nodes.sort();
        nodes
    }

    fn media_signal(&mut self, node: NodeId, signal: MediaSignal) {
        self.send(Command::Media {
            element: ElementId::from(node),
            signal,
        });
    }

    /// Forwards a command once the scenario has started; engine errors are
    /// recorded as events so later steps still run.
    fn send(&mut self, command: Command) {
        if !self.started {
            return;
        }
        match self.engine.handle_command(command) {
            Ok(events) => self.events.extend(events),
            Err(err) => {
                warn!(%err, "engine rejected command");
                self.events
                    .push(Event::Error(EngineErrorEvent::from_error(&err)));
            }
        }
    }

    fn parent(&self, name: Option<&str>) -> Result<NodeId> {
        match name {
            Some(name) => self.node(name),
            None => Ok(self.engine.page().root()),
        }
    }

    fn name(&mut self, name: &str, node: NodeId) -> Result<()> {
        if name == "document" || self.nodes.contains_key(name) {
            return Err(CliError::DuplicateNode {
                name: name.to_owned(),
            });
        }
        self.nodes.insert(name.to_owned(), node);
        Ok(())
    }
}

/// Runs every step of `scenario` and returns the emitted events.
pub fn run(scenario: &Scenario, config: EngineConfig) -> Result<Vec<Event>> {
    let mut runner = ScenarioRunner::new(&scenario.location, config)?;
    for step in &scenario.steps {
        runner.apply(step)?;
    }
    info!(
        events = runner.events().len(),
        active = ?runner.engine().active(),
        "scenario finished"
    );
    Ok(runner.into_events())
}
