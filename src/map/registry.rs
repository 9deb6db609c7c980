//! Loaded room collection with a lazy, once-only load guard.
//!
//! A [`Registry`] owns the current [`RoomSet`] snapshot and the uid table
//! built from it. Both sit behind one lock and are swapped together, so a
//! reader never pairs rooms from one load with uids from another.
//! The first call to [`Registry::ensure_loaded`] runs the dataset loader
//! under a mutex with a double-checked flag, so concurrent callers observe
//! exactly one load and never a half-built collection. After that the
//! snapshot is read-only; a reload swaps in a whole new snapshot and
//! queries already holding the old `Arc` keep a consistent, stale view.

use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::map::errors::MapError;
use crate::map::loader::RoomLoader;
use crate::map::room::{Room, RoomId, Uid};
use crate::map::uid::UidRegistry;

#[derive(Debug, Default)]
struct TagIndex {
    by_tag: HashMap<String, Vec<RoomId>>,
    all: Vec<String>,
}

impl TagIndex {
    fn build(rooms: &BTreeMap<RoomId, Arc<Room>>) -> Self {
        let mut by_tag: HashMap<String, Vec<RoomId>> = HashMap::new();
        for room in rooms.values() {
            for tag in &room.tags {
                by_tag.entry(tag.clone()).or_default().push(room.id);
            }
        }
        let mut all: Vec<String> = by_tag.keys().cloned().collect();
        all.sort();
        Self { by_tag, all }
    }
}

/// An immutable, validated set of rooms keyed by id.
///
/// The tag index is derived data, built on first use and dropped by
/// [`RoomSet::invalidate_tag_cache`].
#[derive(Debug, Default)]
pub struct RoomSet {
    rooms: BTreeMap<RoomId, Arc<Room>>,
    tag_index: RwLock<Option<Arc<TagIndex>>>,
}

impl RoomSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate and index a room list.
    ///
    /// Fails on duplicate ids and on travel times that are negative or not
    /// finite. Edges pointing at rooms outside the list are kept.
    pub fn build(rooms: Vec<Room>) -> Result<Self, MapError> {
        let mut indexed = BTreeMap::new();
        for room in rooms {
            for (&to, &weight) in &room.timeto {
                if !weight.is_finite() || weight < 0.0 {
                    return Err(MapError::InvalidWeight {
                        from: room.id,
                        to,
                        weight,
                    });
                }
            }
            let id = room.id;
            if indexed.insert(id, Arc::new(room)).is_some() {
                return Err(MapError::DuplicateRoom(id));
            }
        }
        Ok(Self {
            rooms: indexed,
            tag_index: RwLock::new(None),
        })
    }

    pub fn get(&self, id: RoomId) -> Option<&Arc<Room>> {
        self.rooms.get(&id)
    }

    pub fn contains(&self, id: RoomId) -> bool {
        self.rooms.contains_key(&id)
    }

    /// Rooms in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Room>> {
        self.rooms.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = RoomId> + '_ {
        self.rooms.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn max_id(&self) -> Option<RoomId> {
        self.rooms.keys().next_back().copied()
    }

    /// Ids of every room carrying `tag`, ascending.
    pub fn rooms_with_tag(&self, tag: &str) -> Vec<RoomId> {
        self.tag_index()
            .by_tag
            .get(tag)
            .cloned()
            .unwrap_or_default()
    }

    /// All distinct tags, sorted.
    pub fn tags(&self) -> Vec<String> {
        self.tag_index().all.clone()
    }

    pub fn invalidate_tag_cache(&self) {
        let mut cache = self
            .tag_index
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if cache.take().is_some() {
            debug!("Tag cache invalidated");
        }
    }

    /// First room (by id) with a title matching `text`.
    pub fn find_by_title(&self, text: &str) -> Option<&Arc<Room>> {
        self.rooms.values().find(|room| room.matches_title(text))
    }

    fn tag_index(&self) -> Arc<TagIndex> {
        if let Some(index) = self
            .tag_index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Arc::clone(index);
        }

        let mut cache = self
            .tag_index
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(index) = cache.as_ref() {
            return Arc::clone(index);
        }
        let index = Arc::new(TagIndex::build(&self.rooms));
        debug!(
            "Tag cache rebuilt: {} tags over {} rooms",
            index.all.len(),
            self.rooms.len()
        );
        *cache = Some(Arc::clone(&index));
        index
    }
}

/// One load's rooms together with the uid table that belongs to them.
#[derive(Debug, Clone, Default)]
struct MapState {
    rooms: Arc<RoomSet>,
    uids: UidRegistry,
}

impl MapState {
    fn new(rooms: RoomSet) -> Self {
        let uids = UidRegistry::from_rooms(rooms.iter().map(|room| room.as_ref()));
        Self {
            rooms: Arc::new(rooms),
            uids,
        }
    }
}

/// Shared room registry for one game session.
pub struct Registry {
    loader: Option<Box<dyn RoomLoader>>,
    loaded: AtomicBool,
    load_guard: Mutex<()>,
    state: RwLock<Arc<MapState>>,
}

impl Registry {
    /// Create an unloaded registry that will populate itself from `loader`.
    pub fn new(loader: impl RoomLoader + 'static) -> Self {
        Self {
            loader: Some(Box::new(loader)),
            loaded: AtomicBool::new(false),
            load_guard: Mutex::new(()),
            state: RwLock::new(Arc::new(MapState::default())),
        }
    }

    /// Create an already-loaded registry from a room list.
    pub fn from_rooms(rooms: Vec<Room>) -> Result<Self, MapError> {
        let state = MapState::new(RoomSet::build(rooms)?);
        Ok(Self {
            loader: None,
            loaded: AtomicBool::new(true),
            load_guard: Mutex::new(()),
            state: RwLock::new(Arc::new(state)),
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Populate the registry from its loader unless that already happened.
    ///
    /// Loader failures are returned to the caller and leave the registry
    /// unloaded, so a later call retries.
    pub fn ensure_loaded(&self) -> Result<(), MapError> {
        if self.is_loaded() {
            return Ok(());
        }
        let _guard = self
            .load_guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.is_loaded() {
            return Ok(());
        }
        self.load_locked()
    }

    /// Re-run the loader and replace the whole collection.
    ///
    /// On failure the previous snapshot stays in place.
    pub fn reload(&self) -> Result<(), MapError> {
        let _guard = self
            .load_guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        info!("Reloading room map");
        self.load_locked()
    }

    fn load_locked(&self) -> Result<(), MapError> {
        let loader = self
            .loader
            .as_ref()
            .ok_or_else(|| MapError::Loader("no dataset loader configured".to_string()))?;

        let rooms = loader.load_rooms().map_err(|e| {
            warn!("Room map load failed: {}", e);
            e
        })?;
        let state = MapState::new(RoomSet::build(rooms)?);
        info!(
            "Loaded {} rooms ({} uids)",
            state.rooms.len(),
            state.uids.len()
        );

        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(state);
        self.loaded.store(true, Ordering::Release);
        Ok(())
    }

    /// The current room collection. Empty until loaded.
    pub fn snapshot(&self) -> Arc<RoomSet> {
        Arc::clone(&self.state().rooms)
    }

    pub fn get(&self, id: RoomId) -> Option<Arc<Room>> {
        self.snapshot().get(id).cloned()
    }

    /// Every room, ascending by id.
    pub fn all(&self) -> Vec<Arc<Room>> {
        self.snapshot().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    pub fn tags(&self) -> Vec<String> {
        self.snapshot().tags()
    }

    pub fn rooms_with_tag(&self, tag: &str) -> Vec<RoomId> {
        self.snapshot().rooms_with_tag(tag)
    }

    pub fn invalidate_tag_cache(&self) {
        self.snapshot().invalidate_tag_cache();
    }

    /// Record that `uid` resolves to `room_id`. Registering a known pair
    /// changes nothing.
    pub fn register_uid(&self, uid: Uid, room_id: RoomId) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.uids.resolve(uid).contains(&room_id) {
            return;
        }
        // Readers holding the previous Arc keep their copy.
        Arc::make_mut(&mut *state).uids.register(uid, room_id);
        debug!("Registered uid {} -> room {}", uid, room_id);
    }

    pub fn resolve_uid(&self, uid: Uid) -> BTreeSet<RoomId> {
        self.state().uids.resolve(uid)
    }

    pub fn uids_for(&self, room_id: RoomId) -> Vec<Uid> {
        self.state().uids.uids_for(room_id)
    }

    pub fn find_by_title(&self, text: &str) -> Option<Arc<Room>> {
        self.snapshot().find_by_title(text).cloned()
    }

    /// Look a room up the way a user types it: `u<digits>` is a server uid,
    /// plain digits a room id, anything else a title search.
    pub fn lookup(&self, query: &str) -> Vec<Arc<Room>> {
        let query = query.trim();
        let state = self.state();
        let rooms = &state.rooms;

        if let Some(uid) = query
            .strip_prefix('u')
            .and_then(|digits| digits.parse::<Uid>().ok())
        {
            return state
                .uids
                .resolve(uid)
                .into_iter()
                .filter_map(|id| rooms.get(id).cloned())
                .collect();
        }
        if let Ok(id) = query.parse::<RoomId>() {
            return rooms.get(id).cloned().into_iter().collect();
        }
        rooms.find_by_title(query).cloned().into_iter().collect()
    }

    /// Next unused room id, or `None` once `RoomId::MAX` is taken.
    pub fn get_free_id(&self) -> Option<RoomId> {
        crate::map::path::get_free_id(&self.snapshot())
    }

    fn state(&self) -> Arc<MapState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
