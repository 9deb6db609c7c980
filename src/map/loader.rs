//! Dataset loaders that produce the room list a [`Registry`] is built from.
//!
//! [`Registry`]: crate::map::Registry

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::map::errors::MapError;
use crate::map::room::Room;
use crate::map::wire::rooms_from_json;

/// Source of the full room collection, invoked once per (re)load.
pub trait RoomLoader: Send + Sync {
    fn load_rooms(&self) -> Result<Vec<Room>, MapError>;
}

impl<F> RoomLoader for F
where
    F: Fn() -> Result<Vec<Room>, MapError> + Send + Sync,
{
    fn load_rooms(&self) -> Result<Vec<Room>, MapError> {
        self()
    }
}

/// Load rooms from a JSON file holding an array of wire objects.
#[derive(Debug, Clone)]
pub struct JsonFileLoader {
    path: PathBuf,
}

impl JsonFileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RoomLoader for JsonFileLoader {
    fn load_rooms(&self) -> Result<Vec<Room>, MapError> {
        load_rooms_from_json(&self.path)
    }
}

/// Read and parse a room dataset file.
pub fn load_rooms_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<Room>, MapError> {
    let path = path.as_ref();
    debug!("Reading room dataset {}", path.display());
    let contents = fs::read_to_string(path)?;

    let rooms = rooms_from_json(&contents).map_err(|e| MapError::Parse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    info!("Parsed {} rooms from {}", rooms.len(), path.display());
    Ok(rooms)
}
