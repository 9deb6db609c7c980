// Integration tests for the once-only registry load under concurrent callers

mod common;

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use roommap::map::{MapError, PathEngine, Registry, Room};

fn counting_registry(calls: &Arc<AtomicUsize>) -> Registry {
    let counter = Arc::clone(calls);
    Registry::new(move || -> Result<Vec<Room>, MapError> {
        counter.fetch_add(1, Ordering::SeqCst);
        // Widen the window in which other callers pile up on the guard.
        thread::sleep(Duration::from_millis(20));
        Ok(common::grid_rooms(10, 10))
    })
}

#[test]
fn concurrent_callers_observe_exactly_one_load() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = counting_registry(&calls);
    let barrier = Barrier::new(16);

    thread::scope(|scope| {
        for _ in 0..16 {
            scope.spawn(|| {
                barrier.wait();
                registry.ensure_loaded().unwrap();
                // Never a partially populated collection.
                assert_eq!(registry.len(), 100);
            });
        }
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(registry.is_loaded());
}

#[test]
fn queries_run_concurrently_after_load() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = counting_registry(&calls);
    registry.ensure_loaded().unwrap();

    thread::scope(|scope| {
        for source in 0..8u32 {
            let registry = &registry;
            scope.spawn(move || {
                let rooms = registry.snapshot();
                let engine = PathEngine::new(&rooms);
                let path = engine.path_to(source, 99).unwrap();
                assert_eq!(path.last(), Some(&99));
                assert!(engine.find_nearest_by_tag(source, "shrine").is_some());
            });
        }
    });
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn uid_registration_is_safe_alongside_readers() {
    let registry = Registry::from_rooms(common::grid_rooms(4, 4)).unwrap();

    thread::scope(|scope| {
        for writer in 0..4u64 {
            let registry = &registry;
            scope.spawn(move || {
                for room in 0..16u32 {
                    registry.register_uid(1000 + writer, room);
                    registry.register_uid(1000 + writer, room);
                }
            });
        }
        for _ in 0..4 {
            let registry = &registry;
            scope.spawn(move || {
                for _ in 0..100 {
                    let rooms = registry.resolve_uid(1000);
                    assert!(rooms.len() <= 16);
                    registry.invalidate_tag_cache();
                    assert!(!registry.rooms_with_tag("shrine").is_empty());
                }
            });
        }
    });

    let expected: BTreeSet<u32> = (0..16).collect();
    for writer in 0..4u64 {
        assert_eq!(registry.resolve_uid(1000 + writer), expected);
    }
}

#[test]
fn reload_swaps_snapshot_and_keeps_old_view() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let registry = Registry::new(move || -> Result<Vec<Room>, MapError> {
        let n = counter.fetch_add(1, Ordering::SeqCst) as u32;
        Ok((0..=n).map(Room::new).collect())
    });

    registry.ensure_loaded().unwrap();
    let old = registry.snapshot();
    assert_eq!(old.len(), 1);

    registry.reload().unwrap();
    assert_eq!(registry.len(), 2);
    assert_eq!(old.len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn failed_reload_keeps_previous_snapshot() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let registry = Registry::new(move || -> Result<Vec<Room>, MapError> {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(vec![Room::new(1), Room::new(2)])
        } else {
            Ok(vec![Room::new(1), Room::new(1)])
        }
    });

    registry.ensure_loaded().unwrap();
    assert!(matches!(registry.reload(), Err(MapError::DuplicateRoom(1))));
    assert_eq!(registry.len(), 2);
    assert!(registry.is_loaded());
}

#[test]
fn uid_lookups_stay_coherent_across_reloads() {
    // Alternating datasets share uid 7 but no room ids.
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let registry = Registry::new(move || -> Result<Vec<Room>, MapError> {
        let base: u32 = if counter.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
            0
        } else {
            100
        };
        Ok((base..base + 50)
            .map(|id| {
                let room = Room::new(id);
                if id == base + 10 {
                    room.with_uid(7)
                } else {
                    room
                }
            })
            .collect())
    });
    registry.ensure_loaded().unwrap();
    let done = AtomicBool::new(false);

    thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..200 {
                registry.reload().unwrap();
            }
            done.store(true, Ordering::SeqCst);
        });
        for _ in 0..4 {
            scope.spawn(|| {
                while !done.load(Ordering::SeqCst) {
                    let found: Vec<u32> = registry.lookup("u7").iter().map(|r| r.id).collect();
                    assert!(found == [10] || found == [110], "incoherent lookup: {:?}", found);
                }
            });
        }
    });

    assert_eq!(calls.load(Ordering::SeqCst), 201);
}
