use logic_lens::{
    config::RateLimitConfig,
    limiter::{LimitScope, RateLimiter},
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::{sync::Arc, thread, time::Duration};

fn limiter(per_client_max: u32, global_max: u32) -> RateLimiter {
    RateLimiter::new(&RateLimitConfig {
        per_client_max,
        global_max,
        ..RateLimitConfig::default()
    })
}

#[rstest]
#[case(1, 1)]
#[case(2, 2)]
#[case(3, 3)]
#[case(5, 3)]
#[case(10, 3)]
fn test_per_client_admits_min_of_limit_and_attempts(#[case] attempts: u32, #[case] admitted: u32) {
    let limiter = limiter(3, 15);
    let accepted = (0..attempts)
        .filter(|_| limiter.admit("198.51.100.4").is_ok())
        .count() as u32;
    assert_eq!(accepted, admitted);
    assert_eq!(limiter.client_count("198.51.100.4"), admitted);
}

#[test]
fn test_per_client_rejection_does_not_touch_global() {
    let limiter = limiter(3, 15);
    for _ in 0..3 {
        limiter.admit("a").unwrap();
    }
    assert_eq!(limiter.global_count(), 3);

    let rejection = limiter.admit("a").unwrap_err();
    assert_eq!(rejection.scope, LimitScope::PerClient);
    assert_eq!(rejection.limit, 3);
    assert_eq!(limiter.global_count(), 3);
    assert_eq!(limiter.client_count("a"), 3);
}

#[test]
fn test_global_limit_spans_clients() {
    let limiter = limiter(3, 15);
    // 5 clients x 3 requests uses up the global budget exactly.
    for client in ["a", "b", "c", "d", "e"] {
        for _ in 0..3 {
            limiter.admit(client).unwrap();
        }
    }
    assert_eq!(limiter.global_count(), 15);

    for client in ["a", "f", "g"] {
        let rejection = limiter.admit(client).unwrap_err();
        assert_eq!(rejection.scope, LimitScope::Global);
    }
    assert_eq!(limiter.client_count("f"), 0);
    assert_eq!(limiter.global_count(), 15);
}

#[test]
fn test_concurrent_admission_is_exact() {
    let limiter = Arc::new(limiter(1000, 15));
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let limiter = limiter.clone();
            thread::spawn(move || {
                (0..10)
                    .filter(|i| limiter.admit(&format!("client-{}-{}", t, i)).is_ok())
                    .count()
            })
        })
        .collect();

    let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(admitted, 15);
    assert_eq!(limiter.global_count(), 15);
}

#[tokio::test(start_paused = true)]
async fn test_windows_reopen_after_background_reset() {
    let limiter = Arc::new(limiter(1, 2));
    let _resets = limiter.spawn_window_resets();

    limiter.admit("a").unwrap();
    limiter.admit("b").unwrap();
    assert_eq!(limiter.admit("c").unwrap_err().scope, LimitScope::Global);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(limiter.admit("c").is_err());

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(limiter.global_count(), 0);
    assert_eq!(limiter.client_count("a"), 0);
    limiter.admit("a").unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_windows_reset_on_independent_timers() {
    let limiter = Arc::new(RateLimiter::new(&RateLimitConfig {
        per_client_max: 1,
        per_client_window_secs: 10,
        global_max: 100,
        global_window_secs: 60,
        trusted_proxies: Vec::new(),
    }));
    let _resets = limiter.spawn_window_resets();

    limiter.admit("a").unwrap();
    assert_eq!(limiter.admit("a").unwrap_err().scope, LimitScope::PerClient);

    tokio::time::sleep(Duration::from_secs(11)).await;
    limiter.admit("a").unwrap();
    assert_eq!(limiter.global_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_guard_stops_resets() {
    let limiter = Arc::new(limiter(1, 1));
    let resets = limiter.spawn_window_resets();
    limiter.admit("a").unwrap();
    drop(resets);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(limiter.global_count(), 1);
    assert!(limiter.admit("a").is_err());
}
