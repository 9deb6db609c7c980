//! Room map and navigation.
//!
//! The map is an in-memory directed weighted graph of game locations. A
//! [`Registry`] owns the loaded rooms and their uid table and guards the
//! one-time load; [`PathEngine`] answers route and nearest-room queries
//! against a [`RoomSet`] snapshot taken from it.
//!
//! ```rust
//! use roommap::map::{Edge, PathEngine, Registry, Room};
//!
//! let registry = Registry::from_rooms(vec![
//!     Room::new(0).with_timed_exit(1, Edge::fixed("north"), 0.2),
//!     Room::new(1).with_tag("bank"),
//! ])?;
//! let rooms = registry.snapshot();
//! let engine = PathEngine::new(&rooms);
//! assert_eq!(engine.path_to(0, 1), Some(vec![1]));
//! assert_eq!(engine.find_nearest_by_tag(0, "bank"), Some(1));
//! # Ok::<(), roommap::map::MapError>(())
//! ```

pub mod errors;
pub mod heap;
pub mod loader;
pub mod path;
pub mod registry;
pub mod room;
pub mod uid;
pub mod wire;

pub use errors::MapError;
pub use heap::MinHeap;
pub use loader::{load_rooms_from_json, JsonFileLoader, RoomLoader};
pub use path::{get_free_id, PathEngine, Route, ShortestPaths, Sink, Step};
pub use registry::{Registry, RoomSet};
pub use room::{
    CommandResolver, ConditionalCommand, Edge, ExtraFields, Room, RoomExtras, RoomId, Uid,
    ZoneMeta, DEFAULT_COST,
};
pub use uid::UidRegistry;
pub use wire::{from_wire, registry_to_json, registry_to_wire, rooms_from_json, to_wire};
