use core::ptr::NonNull;
use std::sync::Arc;
use std::thread;

use statsreg::{Aggregation, Source, ValueDescriptor, ValueKind};

#[repr(C)]
struct Leaf {
    n: u64,
}

static AGG: [ValueDescriptor; 1] =
    [ValueDescriptor::new("n", 0, ValueKind::U64, Aggregation::Sum)];

/// N reader threads loop on `get_value` while M threads concurrently
/// add/remove subordinates and revoke, for a fixed duration. Nothing
/// here asserts a particular numeric outcome — readers race producers by
/// design — only that no thread panics, deadlocks, or observes a torn
/// data structure.
#[test]
fn concurrent_readers_and_mutators_do_not_corrupt_the_tree() {
    let parent = Source::create("p");
    parent.add_values(&AGG, None).unwrap();

    let mut leaves: Vec<Box<Leaf>> = (0..8).map(|i| Box::new(Leaf { n: i as u64 })).collect();
    let children: Vec<Arc<Source>> = leaves
        .iter_mut()
        .enumerate()
        .map(|(i, leaf)| {
            let child = Source::create(format!("child-{i}"));
            child
                .add_values(&AGG, Some(NonNull::new(leaf.as_mut() as *mut Leaf as *mut u8).unwrap()))
                .unwrap();
            parent.add_subordinate(child.clone());
            child
        })
        .collect();

    let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));

    thread::scope(|scope| {
        for _ in 0..4 {
            let parent = &parent;
            let stop = Arc::clone(&stop);
            scope.spawn(move || {
                while !stop.load(std::sync::atomic::Ordering::Relaxed) {
                    let _ = parent.get_value(&AGG[0]);
                    let _ = parent.get_value_by_name("n");
                }
            });
        }

        for child in children.iter().cloned() {
            let parent = &parent;
            let stop = Arc::clone(&stop);
            scope.spawn(move || {
                let mut iterations = 0;
                while !stop.load(std::sync::atomic::Ordering::Relaxed) && iterations < 200 {
                    parent.remove_subordinate(&child);
                    parent.add_subordinate(child.clone());
                    child.revoke();
                    iterations += 1;
                }
            });
        }

        thread::sleep(std::time::Duration::from_millis(50));
        stop.store(true, std::sync::atomic::Ordering::Relaxed);
    });

    // The tree is still usable afterward: every leaf was revoked above,
    // so the aggregate collapses to 0.
    assert_eq!(parent.get_value(&AGG[0]).unwrap(), 0);
}
