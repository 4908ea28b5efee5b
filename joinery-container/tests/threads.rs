//! Sharing one container between threads.

use joinery_container::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

struct Pool {
    serial: usize,
}

fn container(built: Arc<AtomicUsize>) -> Container {
    let catalog = TypeCatalog::new().with(TypeDescriptor::builder("Pool").build(move |_| {
        thread::sleep(Duration::from_millis(20));
        Ok(Pool {
            serial: built.fetch_add(1, Ordering::SeqCst),
        })
    }));

    Container::builder()
        .introspector(catalog)
        .singleton("pool", "Pool")
        .transient("fresh", "Pool")
        .build()
        .unwrap()
}

#[test]
fn singleton_is_built_once_across_threads() {
    let built = Arc::new(AtomicUsize::new(0));
    let container = container(built.clone());

    let pools: Vec<Arc<Pool>> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| container.resolve::<Pool>("pool").unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(built.load(Ordering::SeqCst), 1);
    assert!(pools.iter().all(|p| Arc::ptr_eq(p, &pools[0])));
}

#[test]
fn transient_builds_per_thread() {
    let built = Arc::new(AtomicUsize::new(0));
    let container = container(built.clone());

    let serials: Vec<usize> = thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| container.resolve::<Pool>("fresh").unwrap().serial))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut sorted = serials.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), 4);
    assert_eq!(built.load(Ordering::SeqCst), 4);
}

#[test]
fn binding_while_resolving_elsewhere() {
    let container = container(Arc::default());

    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..50 {
                container
                    .bind(format!("key.{i}"), Payload::value(i), Lifetime::Transient)
                    .unwrap();
            }
        });
        s.spawn(|| {
            for _ in 0..50 {
                container.resolve::<Pool>("pool").unwrap();
            }
        });
    });

    assert_eq!(container.len(), 52);
}
