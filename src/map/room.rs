//! Room graph nodes and the edges between them.
//!
//! A [`Room`] is one game location. Its outgoing edges live in `wayto`
//! (neighbor id to the [`Edge`] used to travel there) and their weights in
//! `timeto`. Game variants hang their own fields off a room through the
//! [`RoomExtras`] trait; those fields only matter for serialization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Local room identifier, unique within one loaded registry.
pub type RoomId = u32;

/// External identifier assigned by the game server.
pub type Uid = u64;

/// Travel time used for an edge that has no explicit `timeto` entry.
pub const DEFAULT_COST: f64 = 0.2;

/// Prefix marking a conditional command in the wire format.
pub const CONDITIONAL_PREFIX: &str = ";e ";

/// A script evaluated against live game state to produce a travel command.
///
/// The map never runs these; it only carries the source so a
/// [`CommandResolver`] can evaluate it when the route is walked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConditionalCommand {
    source: String,
}

impl ConditionalCommand {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// A directed connection out of a room.
///
/// Both variants are traversable for planning purposes; only the
/// destination id matters while searching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Edge {
    /// A literal command such as `"north"` or `"go gate"`.
    FixedCommand(String),
    /// A command that depends on game state at the time of travel.
    Conditional(ConditionalCommand),
}

impl Edge {
    pub fn fixed(command: impl Into<String>) -> Self {
        Edge::FixedCommand(command.into())
    }

    pub fn conditional(source: impl Into<String>) -> Self {
        Edge::Conditional(ConditionalCommand::new(source))
    }

    pub fn is_conditional(&self) -> bool {
        matches!(self, Edge::Conditional(_))
    }

    /// Turn this edge into the command string to send.
    ///
    /// Fixed commands resolve to themselves; conditional ones are handed to
    /// `resolver`, which may decline (returns `None`).
    pub fn resolve(&self, resolver: &dyn CommandResolver) -> Option<String> {
        match self {
            Edge::FixedCommand(command) => Some(command.clone()),
            Edge::Conditional(script) => resolver.resolve(script),
        }
    }
}

impl From<String> for Edge {
    fn from(raw: String) -> Self {
        match raw.strip_prefix(CONDITIONAL_PREFIX) {
            Some(source) => Edge::conditional(source),
            None => Edge::FixedCommand(raw),
        }
    }
}

impl From<Edge> for String {
    fn from(edge: Edge) -> Self {
        match edge {
            Edge::FixedCommand(command) => command,
            Edge::Conditional(script) => format!("{}{}", CONDITIONAL_PREFIX, script.source),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::FixedCommand(command) => write!(f, "{}", command),
            Edge::Conditional(script) => write!(f, "<conditional: {}>", script.source),
        }
    }
}

/// Evaluates conditional travel commands against live game state.
pub trait CommandResolver {
    fn resolve(&self, command: &ConditionalCommand) -> Option<String>;
}

/// Game-variant specific fields merged into a room's wire form.
pub trait RoomExtras: fmt::Debug + Send + Sync {
    fn extra_fields(&self) -> Map<String, Value>;
}

/// Free-form extension fields, typically the unknown keys of a wire record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraFields(pub Map<String, Value>);

impl RoomExtras for ExtraFields {
    fn extra_fields(&self) -> Map<String, Value> {
        self.0.clone()
    }
}

/// Zone and map-position metadata used by variants that draw their own maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneMeta {
    pub zone_id: Option<String>,
    pub position: Option<[i64; 3]>,
    pub dirty: Option<bool>,
}

impl RoomExtras for ZoneMeta {
    fn extra_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(zone) = &self.zone_id {
            fields.insert("zone_id".into(), Value::from(zone.as_str()));
        }
        if let Some(position) = self.position {
            fields.insert("position".into(), Value::from(position.to_vec()));
        }
        if let Some(dirty) = self.dirty {
            fields.insert("dirty".into(), Value::from(dirty));
        }
        fields
    }
}

/// One location in the navigation graph.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub title: Vec<String>,
    pub description: Vec<String>,
    /// "Obvious paths/exits" lines as shown by the game.
    pub paths: Vec<String>,
    pub location: Option<String>,
    pub climate: Option<String>,
    pub terrain: Option<String>,
    pub wayto: BTreeMap<RoomId, Edge>,
    pub timeto: BTreeMap<RoomId, f64>,
    pub tags: BTreeSet<String>,
    pub uid: Vec<Uid>,
    pub image: Option<String>,
    pub image_coords: Option<[i64; 4]>,
    pub extras: Arc<dyn RoomExtras>,
}

impl Room {
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            title: Vec::new(),
            description: Vec::new(),
            paths: Vec::new(),
            location: None,
            climate: None,
            terrain: None,
            wayto: BTreeMap::new(),
            timeto: BTreeMap::new(),
            tags: BTreeSet::new(),
            uid: Vec::new(),
            image: None,
            image_coords: None,
            extras: Arc::new(ExtraFields::default()),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title.push(title.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description.push(description.to_string());
        self
    }

    pub fn with_paths(mut self, paths: &str) -> Self {
        self.paths.push(paths.to_string());
        self
    }

    /// Add an exit with no explicit travel time.
    pub fn with_exit(mut self, destination: RoomId, edge: Edge) -> Self {
        self.wayto.insert(destination, edge);
        self
    }

    /// Add an exit together with its travel time.
    pub fn with_timed_exit(mut self, destination: RoomId, edge: Edge, time: f64) -> Self {
        self.wayto.insert(destination, edge);
        self.timeto.insert(destination, time);
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.insert(tag.to_string());
        self
    }

    pub fn with_uid(mut self, uid: Uid) -> Self {
        if !self.uid.contains(&uid) {
            self.uid.push(uid);
        }
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn with_extras(mut self, extras: impl RoomExtras + 'static) -> Self {
        self.extras = Arc::new(extras);
        self
    }

    /// Travel time to `destination`, falling back to `default` when the edge
    /// carries no explicit weight.
    pub fn cost_to(&self, destination: RoomId, default: f64) -> f64 {
        self.timeto.get(&destination).copied().unwrap_or(default)
    }

    pub fn edge_to(&self, destination: RoomId) -> Option<&Edge> {
        self.wayto.get(&destination)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Outdoor rooms list "Obvious paths", indoor ones "Obvious exits".
    pub fn outside(&self) -> bool {
        self.paths
            .first()
            .map(|line| line.starts_with("Obvious paths:"))
            .unwrap_or(false)
    }

    /// Case-insensitive substring match against any of the room's titles.
    pub fn matches_title(&self, text: &str) -> bool {
        let needle = text.to_lowercase();
        self.title
            .iter()
            .any(|title| title.to_lowercase().contains(&needle))
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.title.first() {
            Some(title) => write!(f, "#{} {}", self.id, title),
            None => write!(f, "#{}", self.id),
        }
    }
}
