//! Shortest-path queries over the room graph.
//!
//! [`PathEngine`] runs Dijkstra over the directed graph implied by each
//! room's `wayto`/`timeto`, with the frontier kept in a [`MinHeap`]. A
//! search can stop at one room, at the first of a set of rooms, or run to
//! exhaustion. Edges pointing outside the room set are skipped, never an
//! error. The engine holds only a borrowed [`RoomSet`] and keeps no state
//! between calls.

use log::debug;
use std::collections::{HashMap, HashSet};

use crate::map::heap::MinHeap;
use crate::map::registry::RoomSet;
use crate::map::room::{CommandResolver, Edge, RoomId, DEFAULT_COST};

/// Where a Dijkstra run may stop early.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Sink {
    /// Visit every reachable room.
    #[default]
    Exhaustive,
    /// Stop once this room is settled.
    Room(RoomId),
    /// Stop once any of these rooms is settled.
    AnyOf(HashSet<RoomId>),
}

impl Sink {
    fn contains(&self, id: RoomId) -> bool {
        match self {
            Sink::Exhaustive => false,
            Sink::Room(target) => *target == id,
            Sink::AnyOf(targets) => targets.contains(&id),
        }
    }
}

impl From<RoomId> for Sink {
    fn from(id: RoomId) -> Self {
        Sink::Room(id)
    }
}

impl From<HashSet<RoomId>> for Sink {
    fn from(ids: HashSet<RoomId>) -> Self {
        Sink::AnyOf(ids)
    }
}

impl From<Option<RoomId>> for Sink {
    fn from(id: Option<RoomId>) -> Self {
        id.map(Sink::Room).unwrap_or_default()
    }
}

/// Output of one Dijkstra run.
///
/// `previous` maps each reached room to the room it is entered from on a
/// shortest path. When the run stopped at a sink, `previous` and `distance`
/// may also hold tentative values for rooms that were never settled;
/// [`path_to`](Self::path_to) only answers for settled rooms.
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    source: RoomId,
    previous: HashMap<RoomId, RoomId>,
    distance: HashMap<RoomId, f64>,
    settled: HashSet<RoomId>,
    reached: Option<RoomId>,
}

impl ShortestPaths {
    pub fn previous(&self) -> &HashMap<RoomId, RoomId> {
        &self.previous
    }

    pub fn distance(&self) -> &HashMap<RoomId, f64> {
        &self.distance
    }

    /// The sink member that ended the search, if any.
    pub fn reached(&self) -> Option<RoomId> {
        self.reached
    }

    pub fn distance_to(&self, id: RoomId) -> Option<f64> {
        self.distance.get(&id).copied()
    }

    /// Whether the search fixed the final distance of `id`.
    pub fn is_settled(&self, id: RoomId) -> bool {
        self.settled.contains(&id)
    }

    /// Walk `previous` back from `destination`. The source itself is not
    /// part of the path; `Some(vec![])` means `destination` is the source.
    /// `None` for rooms the search never settled.
    pub fn path_to(&self, destination: RoomId) -> Option<Vec<RoomId>> {
        if destination == self.source {
            return Some(Vec::new());
        }
        if !self.is_settled(destination) {
            return None;
        }
        let mut path = vec![destination];
        let mut current = destination;
        while let Some(&prev) = self.previous.get(&current) {
            if prev == self.source {
                path.reverse();
                return Some(path);
            }
            path.push(prev);
            current = prev;
        }
        None
    }
}

/// One hop of a [`Route`].
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub from: RoomId,
    pub to: RoomId,
    pub edge: Edge,
    pub time: f64,
}

/// A path together with the edge used for every hop.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub steps: Vec<Step>,
    pub total_time: f64,
}

impl Route {
    /// Rooms entered along the way, in order.
    pub fn rooms(&self) -> Vec<RoomId> {
        self.steps.iter().map(|step| step.to).collect()
    }

    /// Commands for every hop, or `None` if a conditional edge could not be
    /// resolved.
    pub fn commands(&self, resolver: &dyn CommandResolver) -> Option<Vec<String>> {
        self.steps
            .iter()
            .map(|step| step.edge.resolve(resolver))
            .collect()
    }
}

/// Dijkstra-based queries against one room set.
#[derive(Debug, Clone, Copy)]
pub struct PathEngine<'a> {
    rooms: &'a RoomSet,
    default_cost: f64,
}

impl<'a> PathEngine<'a> {
    pub fn new(rooms: &'a RoomSet) -> Self {
        Self::with_default_cost(rooms, DEFAULT_COST)
    }

    /// Use `default_cost` for edges without an explicit travel time.
    ///
    /// Panics if `default_cost` is negative or not finite.
    pub fn with_default_cost(rooms: &'a RoomSet, default_cost: f64) -> Self {
        assert!(
            default_cost.is_finite() && default_cost >= 0.0,
            "default travel cost must be a non-negative number, got {}",
            default_cost
        );
        Self {
            rooms,
            default_cost,
        }
    }

    pub fn default_cost(&self) -> f64 {
        self.default_cost
    }

    /// Shortest paths from `source`. Returns `None` when `source` is not in
    /// the room set.
    pub fn dijkstra(&self, source: RoomId, sink: impl Into<Sink>) -> Option<ShortestPaths> {
        self.rooms.get(source)?;
        let sink = sink.into();

        let mut previous = HashMap::new();
        let mut distance = HashMap::new();
        let mut settled = HashSet::new();
        let mut frontier = MinHeap::new();
        let mut reached = None;

        distance.insert(source, 0.0);
        frontier.push(0.0, source);

        while let Some((dist, id)) = frontier.pop() {
            // Stale entry for a room already settled at a lower distance.
            if !settled.insert(id) {
                continue;
            }
            if sink.contains(id) {
                reached = Some(id);
                break;
            }
            let Some(room) = self.rooms.get(id) else {
                continue;
            };
            for &to in room.wayto.keys() {
                if settled.contains(&to) || !self.rooms.contains(to) {
                    continue;
                }
                let candidate = dist + room.cost_to(to, self.default_cost);
                let improved = distance.get(&to).map_or(true, |&known| candidate < known);
                if improved {
                    distance.insert(to, candidate);
                    previous.insert(to, id);
                    frontier.push(candidate, to);
                }
            }
        }

        debug!(
            "Dijkstra from {} settled {} rooms (sink reached: {:?})",
            source,
            settled.len(),
            reached
        );
        Some(ShortestPaths {
            source,
            previous,
            distance,
            settled,
            reached,
        })
    }

    /// Rooms to walk through from `source` to `destination`, excluding
    /// `source`. `None` when there is no route.
    pub fn path_to(&self, source: RoomId, destination: RoomId) -> Option<Vec<RoomId>> {
        self.dijkstra(source, destination)?.path_to(destination)
    }

    /// Like [`path_to`](Self::path_to), with the edge and time of every hop.
    pub fn route(&self, source: RoomId, destination: RoomId) -> Option<Route> {
        let path = self.path_to(source, destination)?;
        let mut steps = Vec::with_capacity(path.len());
        let mut from = source;
        for &to in &path {
            let room = self.rooms.get(from)?;
            steps.push(Step {
                from,
                to,
                edge: room.edge_to(to)?.clone(),
                time: room.cost_to(to, self.default_cost),
            });
            from = to;
        }
        let total_time = self.estimate_time(source, &path);
        Some(Route { steps, total_time })
    }

    pub fn distance_between(&self, source: RoomId, destination: RoomId) -> Option<f64> {
        let paths = self.dijkstra(source, destination)?;
        paths.reached().and(paths.distance_to(destination))
    }

    /// The closest of `candidates` to `source`. `source` itself always wins
    /// when it is a candidate.
    pub fn find_nearest(
        &self,
        source: RoomId,
        candidates: impl IntoIterator<Item = RoomId>,
    ) -> Option<RoomId> {
        let candidates: HashSet<RoomId> = candidates.into_iter().collect();
        if candidates.contains(&source) {
            return Some(source);
        }
        if candidates.is_empty() {
            return None;
        }
        self.dijkstra(source, candidates)?.reached()
    }

    pub fn find_nearest_by_tag(&self, source: RoomId, tag: &str) -> Option<RoomId> {
        self.find_nearest(source, self.rooms.rooms_with_tag(tag))
    }

    /// Every reachable room tagged `tag`, nearest first. Equal distances
    /// are ordered by id.
    pub fn find_all_nearest_by_tag(&self, source: RoomId, tag: &str) -> Vec<RoomId> {
        let Some(paths) = self.dijkstra(source, Sink::Exhaustive) else {
            return Vec::new();
        };
        let mut found: Vec<(f64, RoomId)> = self
            .rooms
            .rooms_with_tag(tag)
            .into_iter()
            .filter_map(|id| paths.distance_to(id).map(|dist| (dist, id)))
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        found.into_iter().map(|(_, id)| id).collect()
    }

    /// Travel time for walking `path` starting from `from`, counting the hop
    /// from `from` into `path[0]`. Hops without an explicit weight, or out of
    /// an unknown room, cost the default.
    pub fn estimate_time(&self, from: RoomId, path: &[RoomId]) -> f64 {
        let mut time = 0.0;
        let mut current = from;
        for &next in path {
            time += self
                .rooms
                .get(current)
                .map(|room| room.cost_to(next, self.default_cost))
                .unwrap_or(self.default_cost);
            current = next;
        }
        time
    }
}

/// `1 + ` the highest room id in use, or `0` for an empty set. `None` once
/// `RoomId::MAX` is taken.
pub fn get_free_id(rooms: &RoomSet) -> Option<RoomId> {
    match rooms.max_id() {
        Some(id) => id.checked_add(1),
        None => Some(0),
    }
}
