//! Test utilities & fixtures.
//! Provides access to the sample map under `tests/test-data-int` and small
//! hand-built graphs.

use std::path::{Path, PathBuf};

use roommap::map::{Edge, Room};

/// Return the path to the static integration test fixture directory.
#[allow(dead_code)]
pub fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("test-data-int")
}

/// Path of the sample town map.
#[allow(dead_code)]
pub fn fixture_map() -> PathBuf {
    fixture_root().join("map.json")
}

/// 0 -> 1 (.2), 0 -> 2 (1.0), 1 -> 2 (.3); rooms 1 and 2 are banks.
/// Room 99 only has an exit into 0.
#[allow(dead_code)]
pub fn triangle_rooms() -> Vec<Room> {
    vec![
        Room::new(0)
            .with_title("[Crossroads]")
            .with_timed_exit(1, Edge::fixed("north"), 0.2)
            .with_timed_exit(2, Edge::fixed("east"), 1.0),
        Room::new(1)
            .with_title("[North Bank]")
            .with_timed_exit(2, Edge::fixed("east"), 0.3)
            .with_tag("bank"),
        Room::new(2).with_title("[East Bank]").with_tag("bank"),
        Room::new(99)
            .with_title("[Island]")
            .with_exit(0, Edge::fixed("swim")),
    ]
}

/// A grid of `width * height` rooms, each linked to its four neighbours
/// with travel times that vary by position.
#[allow(dead_code)]
pub fn grid_rooms(width: u32, height: u32) -> Vec<Room> {
    let id = |x: u32, y: u32| y * width + x;
    let mut rooms = Vec::new();
    for y in 0..height {
        for x in 0..width {
            let mut room = Room::new(id(x, y));
            let cost = 0.1 + ((x * 7 + y * 13) % 5) as f64 * 0.2;
            if x + 1 < width {
                room = room.with_timed_exit(id(x + 1, y), Edge::fixed("east"), cost);
            }
            if x > 0 {
                room = room.with_exit(id(x - 1, y), Edge::fixed("west"));
            }
            if y + 1 < height {
                room = room.with_timed_exit(id(x, y + 1), Edge::fixed("south"), cost * 2.0);
            }
            if y > 0 {
                room = room.with_exit(id(x, y - 1), Edge::fixed("north"));
            }
            if (x + y) % 6 == 0 {
                room = room.with_tag("shrine");
            }
            rooms.push(room);
        }
    }
    rooms
}
