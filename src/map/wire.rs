//! JSON wire format for rooms, as consumed by external map tooling.
//!
//! A room serializes to an object whose stable keys are `id`, `title`,
//! `description`, `paths`, `location`, `climate`, `terrain`, `wayto`,
//! `timeto`, `tags`, `uid`, `image` and `image_coords`. Absent values and
//! empty collections are left out entirely. Keys contributed by the room's
//! [`RoomExtras`](crate::map::room::RoomExtras) are merged in afterwards;
//! an extension key that names a base field is dropped whether or not the
//! base field was emitted. Integral travel times are written as integers.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::map::errors::MapError;
use crate::map::registry::RoomSet;
use crate::map::room::{Edge, ExtraFields, Room, RoomId, Uid, CONDITIONAL_PREFIX};

const BASE_KEYS: [&str; 13] = [
    "id",
    "title",
    "description",
    "paths",
    "location",
    "climate",
    "terrain",
    "wayto",
    "timeto",
    "tags",
    "uid",
    "image",
    "image_coords",
];

// Largest magnitude an f64 holds without losing integer precision.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

// Neighbor keys stay strings here: integer map keys do not survive
// `#[serde(flatten)]` buffering.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RoomWire {
    id: RoomId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    title: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    description: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    climate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    terrain: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    wayto: BTreeMap<String, Edge>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    timeto: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    uid: Vec<Uid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_coords: Option<[i64; 4]>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Serialize one room to its wire object.
pub fn to_wire(room: &Room) -> Map<String, Value> {
    let wire = RoomWire {
        id: room.id,
        title: room.title.clone(),
        description: room.description.clone(),
        paths: room.paths.clone(),
        location: room.location.clone(),
        climate: room.climate.clone(),
        terrain: room.terrain.clone(),
        wayto: room
            .wayto
            .iter()
            .map(|(to, edge)| (to.to_string(), edge.clone()))
            .collect(),
        timeto: room
            .timeto
            .iter()
            .map(|(to, &time)| (to.to_string(), time_value(time)))
            .collect(),
        tags: room.tags.clone(),
        uid: room.uid.clone(),
        image: room.image.clone(),
        image_coords: room.image_coords,
        extra: Map::new(),
    };

    let mut object = match serde_json::to_value(wire) {
        Ok(Value::Object(object)) => object,
        // RoomWire only holds strings, numbers and string-keyed maps.
        _ => Map::new(),
    };
    for (key, value) in room.extras.extra_fields() {
        if value.is_null() || BASE_KEYS.contains(&key.as_str()) {
            continue;
        }
        object.insert(key, value);
    }
    object
}

fn time_value(time: f64) -> Value {
    if time.fract() == 0.0 && time.abs() < MAX_EXACT_INTEGER {
        Value::from(time as i64)
    } else {
        Value::from(time)
    }
}

/// Serialize every room in the set, ascending by id.
pub fn registry_to_wire(rooms: &RoomSet) -> Vec<Map<String, Value>> {
    rooms.iter().map(|room| to_wire(room)).collect()
}

/// Pretty-printed JSON array of every room in the set.
pub fn registry_to_json(rooms: &RoomSet) -> Result<String, MapError> {
    Ok(serde_json::to_string_pretty(&registry_to_wire(rooms))?)
}

/// Parse one wire object back into a room.
///
/// Unknown keys become the room's [`ExtraFields`]. Conditional or null
/// travel times are dropped with a warning, so those edges fall back to the
/// default cost.
pub fn from_wire(value: Value) -> Result<Room, MapError> {
    let wire: RoomWire = serde_json::from_value(value)?;
    let id = wire.id;

    let mut wayto = BTreeMap::new();
    for (key, edge) in wire.wayto {
        wayto.insert(parse_neighbor(id, &key)?, edge);
    }

    let mut timeto = BTreeMap::new();
    for (key, raw) in wire.timeto {
        let to = parse_neighbor(id, &key)?;
        match raw {
            Value::Number(n) => match n.as_f64() {
                Some(time) => {
                    timeto.insert(to, time);
                }
                None => warn!("Room {}: unreadable travel time to {}", id, to),
            },
            Value::Null => {}
            Value::String(s) if s.starts_with(CONDITIONAL_PREFIX) => {
                warn!(
                    "Room {}: conditional travel time to {} not supported, using default",
                    id, to
                );
            }
            other => {
                return Err(MapError::Parse {
                    path: format!("room {}", id),
                    reason: format!("travel time to {} is not a number: {}", to, other),
                });
            }
        }
    }

    let extra: Map<String, Value> = wire
        .extra
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .collect();

    Ok(Room {
        id,
        title: wire.title,
        description: wire.description,
        paths: wire.paths,
        location: wire.location,
        climate: wire.climate,
        terrain: wire.terrain,
        wayto,
        timeto,
        tags: wire.tags,
        uid: wire.uid,
        image: wire.image,
        image_coords: wire.image_coords,
        extras: Arc::new(ExtraFields(extra)),
    })
}

/// Parse a JSON array of wire objects.
pub fn rooms_from_json(contents: &str) -> Result<Vec<Room>, MapError> {
    let values: Vec<Value> = serde_json::from_str(contents)?;
    values.into_iter().map(from_wire).collect()
}

fn parse_neighbor(from: RoomId, key: &str) -> Result<RoomId, MapError> {
    key.trim().parse().map_err(|_| MapError::Parse {
        path: format!("room {}", from),
        reason: format!("neighbor key {:?} is not a room id", key),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::room::ZoneMeta;
    use serde_json::json;

    #[test]
    fn test_empty_and_absent_fields_omitted() {
        let room = Room::new(4).with_title("[Dim Cellar]");
        let wire = to_wire(&room);
        assert_eq!(Value::Object(wire.clone()), json!({"id": 4, "title": ["[Dim Cellar]"]}));
        assert!(!wire.contains_key("tags"));
        assert!(!wire.contains_key("climate"));
        assert!(!wire.contains_key("wayto"));
    }

    #[test]
    fn test_edges_and_weights_serialize_with_string_keys() {
        let room = Room::new(1)
            .with_timed_exit(2, Edge::fixed("north"), 0.5)
            .with_exit(3, Edge::conditional("move 'climb rope'"));
        let wire = to_wire(&room);
        assert_eq!(
            wire["wayto"],
            json!({"2": "north", "3": ";e move 'climb rope'"})
        );
        assert_eq!(wire["timeto"], json!({"2": 0.5}));
    }

    #[test]
    fn test_extras_merge_without_overriding_base_keys() {
        let mut fields = Map::new();
        fields.insert("id".into(), json!(999));
        fields.insert("check_location".into(), json!(true));
        fields.insert("unused".into(), Value::Null);
        let room = Room::new(8).with_extras(ExtraFields(fields));
        let wire = to_wire(&room);
        assert_eq!(wire["id"], json!(8));
        assert_eq!(wire["check_location"], json!(true));
        assert!(!wire.contains_key("unused"));
    }

    #[test]
    fn test_extras_never_stand_in_for_omitted_base_keys() {
        let mut fields = Map::new();
        fields.insert("tags".into(), json!("not-a-list"));
        fields.insert("wayto".into(), json!(17));
        fields.insert("zone_id".into(), json!("4"));
        let room = Room::new(1).with_extras(ExtraFields(fields));
        assert!(room.tags.is_empty());

        let wire = to_wire(&room);
        assert_eq!(Value::Object(wire.clone()), json!({"id": 1, "zone_id": "4"}));
        let reparsed = from_wire(Value::Object(wire)).unwrap();
        assert!(reparsed.tags.is_empty());
        assert!(reparsed.wayto.is_empty());
    }

    #[test]
    fn test_integral_travel_times_stay_integers() {
        let original = json!({
            "id": 1,
            "wayto": {"2": "north", "3": "east"},
            "timeto": {"2": 5, "3": 0.25}
        });
        let room = from_wire(original.clone()).unwrap();
        assert_eq!(room.timeto[&2], 5.0);
        let wire = Value::Object(to_wire(&room));
        assert_eq!(wire, original);
        assert_eq!(wire["timeto"]["2"], json!(5));
    }

    #[test]
    fn test_zone_meta_extras() {
        let room = Room::new(3).with_extras(ZoneMeta {
            zone_id: Some("12".into()),
            position: None,
            dirty: Some(false),
        });
        let wire = to_wire(&room);
        assert_eq!(wire["zone_id"], json!("12"));
        assert_eq!(wire["dirty"], json!(false));
        assert!(!wire.contains_key("position"));
    }

    #[test]
    fn test_reparse_and_reserialize_is_identical() {
        let original = json!({
            "id": 228,
            "title": ["[Town Square Central]"],
            "description": ["This is the heart of the town."],
            "paths": ["Obvious paths: north, east"],
            "location": "Wehnimer's Landing",
            "wayto": {"229": "north", "10": ";e fput 'go gate'"},
            "timeto": {"229": 0.2, "10": 1.5},
            "tags": ["town", "meeting point"],
            "uid": [7150105],
            "image": "wl-town.png",
            "image_coords": [10, 20, 30, 40],
            "check_location": true
        });
        let room = from_wire(original.clone()).unwrap();
        assert!(room.outside());
        assert!(room.edge_to(10).unwrap().is_conditional());
        let first = Value::Object(to_wire(&room));
        assert_eq!(first, original);

        let second = Value::Object(to_wire(&from_wire(first.clone()).unwrap()));
        assert_eq!(first, second);
    }

    #[test]
    fn test_null_fields_dropped_on_parse() {
        let room = from_wire(json!({"id": 5, "climate": null, "tags": [], "meta": null})).unwrap();
        assert!(room.climate.is_none());
        assert!(room.tags.is_empty());
        assert_eq!(Value::Object(to_wire(&room)), json!({"id": 5}));
    }

    #[test]
    fn test_conditional_timeto_falls_back_to_default() {
        let room = from_wire(json!({
            "id": 1,
            "wayto": {"2": "go door"},
            "timeto": {"2": ";e $hard_door ? 5 : 1"}
        }))
        .unwrap();
        assert!(room.timeto.is_empty());
        assert!(room.edge_to(2).is_some());
    }

    #[test]
    fn test_bad_neighbor_key_is_an_error() {
        let result = from_wire(json!({"id": 1, "wayto": {"north": "north"}}));
        assert!(matches!(result, Err(MapError::Parse { .. })));
    }

    #[test]
    fn test_rooms_from_json() {
        let rooms = rooms_from_json(r#"[{"id": 0}, {"id": 1, "tags": ["bank"]}]"#).unwrap();
        assert_eq!(rooms.len(), 2);
        assert!(rooms[1].has_tag("bank"));
        assert!(rooms_from_json("{not json").is_err());
    }
}
