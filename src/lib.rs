//! # Roommap - room graph and route planning for game automation
//!
//! Roommap keeps a game's location map in memory as a directed weighted
//! graph and answers the questions automation scripts ask while moving
//! around: how do I get there, how long will it take, and where is the
//! nearest room with a given property.
//!
//! ## Features
//!
//! - **Shared Registry**: One loaded room collection per game session, populated lazily and exactly once even with many concurrent callers.
//! - **Dijkstra Routing**: Single-target, first-of-many and exhaustive searches over `wayto`/`timeto` edges, with a custom binary min-heap frontier.
//! - **Tag Queries**: Nearest room, or all reachable rooms ordered by distance, carrying a tag such as `bank`.
//! - **Uid Reconciliation**: Many-to-many mapping between server-assigned uids and local room ids.
//! - **Wire Format**: Stable JSON export that omits absent fields and composes game-variant extension fields.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roommap::map::{JsonFileLoader, PathEngine, Registry};
//!
//! fn main() -> anyhow::Result<()> {
//!     let registry = Registry::new(JsonFileLoader::new("data/map.json"));
//!     registry.ensure_loaded()?;
//!
//!     let rooms = registry.snapshot();
//!     let engine = PathEngine::new(&rooms);
//!     if let Some(path) = engine.path_to(228, 3668) {
//!         println!("{:?} ({:.1}s)", path, engine.estimate_time(228, &path));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`map`] - Rooms, the registry, the path engine and the wire format
//! - [`config`] - Configuration loading for the `roommap` binary

pub mod config;
pub mod map;
