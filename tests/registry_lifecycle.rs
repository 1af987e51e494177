//! Registry lifecycle tests: the public surface under realistic use,
//! including the background pruning cycle on paused time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use route_registry::registry::{ManualClock, RouteRegistry};
use route_registry::route::{Endpoint, ModificationTag, RouteUri};

const PRUNE_INTERVAL: Duration = Duration::from_secs(5);
const STALE_THRESHOLD: Duration = Duration::from_secs(120);

fn registry_with_clock() -> (Arc<RouteRegistry>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let registry = Arc::new(RouteRegistry::with_clock(
        PRUNE_INTERVAL,
        STALE_THRESHOLD,
        clock.clone(),
    ));
    (registry, clock)
}

fn endpoint(host: &str, port: u16) -> Endpoint {
    Endpoint::new(
        "app1",
        host,
        port,
        "instance-guid",
        "0",
        HashMap::new(),
        None,
        "",
        ModificationTag::new(),
    )
}

#[test]
fn registers_and_resolves_a_backend() {
    let (registry, _clock) = registry_with_clock();
    let uri = RouteUri::new("foo.example.com");

    registry.register(&uri, endpoint("10.0.0.1", 6060));

    let pool = registry.lookup(&uri).expect("route resolves");
    assert_eq!(pool.len(), 1);
    let mut addrs = Vec::new();
    pool.each(|e| addrs.push(e.canonical_addr().to_string()));
    assert_eq!(addrs, vec!["10.0.0.1:6060"]);

    assert_eq!(registry.num_uris(), 1);
    assert_eq!(registry.num_endpoints(), 1);
}

#[test]
fn concurrent_registrations_all_land() {
    let (registry, _clock) = registry_with_clock();
    let uri = RouteUri::new("foo.example.com");
    let n = 32;

    let handles: Vec<_> = (0..n)
        .map(|i| {
            let registry = registry.clone();
            let uri = uri.clone();
            std::thread::spawn(move || {
                registry.register(&uri, endpoint(&format!("10.0.1.{}", i), 8080));
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.num_uris(), 1);
    assert_eq!(registry.num_endpoints(), n);
}

#[test]
fn concurrent_lookups_during_churn_see_consistent_pools() {
    let (registry, _clock) = registry_with_clock();
    let uri = RouteUri::new("foo.example.com");
    registry.register(&uri, endpoint("10.0.0.1", 1));

    let writer = {
        let registry = registry.clone();
        let uri = uri.clone();
        std::thread::spawn(move || {
            for i in 0..500u16 {
                registry.register(&uri, endpoint("10.0.0.2", i));
                registry.unregister(&uri, &endpoint("10.0.0.2", i));
            }
        })
    };

    // The stable endpoint must be visible in every snapshot.
    for _ in 0..500 {
        let pool = registry.lookup(&uri).expect("stable endpoint present");
        let mut found = false;
        pool.each(|e| found |= e.canonical_addr() == "10.0.0.1:1");
        assert!(found);
    }
    writer.join().unwrap();
}

#[tokio::test(start_paused = true)]
async fn pruning_cycle_evicts_stale_endpoints() {
    let (registry, clock) = registry_with_clock();
    let uri = RouteUri::new("foo.example.com");
    registry.register(&uri, endpoint("10.0.0.1", 6060));

    registry.start_pruning_cycle();

    // Age the endpoint past the threshold, then let one tick fire.
    clock.advance(STALE_THRESHOLD + Duration::from_secs(1));
    tokio::time::sleep(PRUNE_INTERVAL + Duration::from_secs(1)).await;

    assert_eq!(registry.num_endpoints(), 0);
    assert!(registry.lookup(&uri).is_none());

    registry.stop_pruning_cycle();
}

#[tokio::test(start_paused = true)]
async fn fresh_endpoints_survive_the_cycle() {
    let (registry, clock) = registry_with_clock();
    let uri = RouteUri::new("foo.example.com");
    registry.register(&uri, endpoint("10.0.0.1", 6060));

    registry.start_pruning_cycle();

    clock.advance(Duration::from_secs(30));
    tokio::time::sleep(PRUNE_INTERVAL + Duration::from_secs(1)).await;

    assert_eq!(registry.num_endpoints(), 1);

    registry.stop_pruning_cycle();
}

#[tokio::test(start_paused = true)]
async fn stopped_cycle_stops_evicting() {
    let (registry, clock) = registry_with_clock();
    let uri = RouteUri::new("foo.example.com");
    registry.register(&uri, endpoint("10.0.0.1", 6060));

    registry.start_pruning_cycle();
    registry.stop_pruning_cycle();
    // Let the stop propagate to the background task.
    tokio::time::sleep(Duration::from_millis(10)).await;

    clock.advance(STALE_THRESHOLD * 10);
    tokio::time::sleep(PRUNE_INTERVAL * 3).await;

    assert_eq!(registry.num_endpoints(), 1);
}

#[tokio::test(start_paused = true)]
async fn zero_interval_disables_the_cycle() {
    let clock = Arc::new(ManualClock::new());
    let registry = Arc::new(RouteRegistry::with_clock(
        Duration::ZERO,
        STALE_THRESHOLD,
        clock.clone(),
    ));
    registry.register(&RouteUri::new("foo.example.com"), endpoint("10.0.0.1", 1));

    registry.start_pruning_cycle();
    clock.advance(STALE_THRESHOLD * 10);
    tokio::time::sleep(Duration::from_secs(600)).await;

    assert_eq!(registry.num_endpoints(), 1);
}

#[test]
fn end_to_end_example() {
    let (registry, _clock) = registry_with_clock();
    let uri = RouteUri::new("foo.example.com");

    registry.register(
        &uri,
        Endpoint::new(
            "app1",
            "10.0.0.1",
            6060,
            "instance-guid",
            "0",
            HashMap::new(),
            None,
            "",
            ModificationTag::new(),
        ),
    );

    let pool = registry.lookup(&RouteUri::new("foo.example.com")).unwrap();
    assert_eq!(pool.len(), 1);
    pool.each(|e| assert_eq!(e.canonical_addr(), "10.0.0.1:6060"));
    assert_eq!(registry.num_uris(), 1);
    assert_eq!(registry.num_endpoints(), 1);

    let snapshot = registry.snapshot();
    assert_eq!(snapshot["foo.example.com"][0].address, "10.0.0.1:6060");
    assert_eq!(snapshot["foo.example.com"][0].app, "app1");
}
