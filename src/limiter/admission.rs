use super::window::{KeyedWindowCounter, WindowCounter};
use crate::config::RateLimitConfig;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Client identity used for the per-client gate (an IP address in practice).
pub type ClientKey = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitScope {
    Global,
    PerClient,
}

/// Why a request was turned away. Nothing was counted for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub scope: LimitScope,
    pub limit: u32,
    pub window: Duration,
}

/// Counter values right after a successful admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub global_count: u32,
    pub client_count: u32,
}

/// Global and per-client fixed-window gates.
///
/// Admission locks the global counter and then the client map, checks both,
/// and increments both only when both have capacity. Resets take the same
/// locks, so a reset can never interleave with a check-and-increment.
pub struct RateLimiter {
    global: Mutex<WindowCounter>,
    clients: Mutex<KeyedWindowCounter<ClientKey>>,
    global_window: Duration,
    client_window: Duration,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            global: Mutex::new(WindowCounter::new(config.global_max)),
            clients: Mutex::new(KeyedWindowCounter::new(config.per_client_max)),
            global_window: Duration::from_secs(config.global_window_secs),
            client_window: Duration::from_secs(config.per_client_window_secs),
        }
    }

    pub fn admit(&self, client: &str) -> Result<Admission, Rejection> {
        let client = client.to_string();
        let mut global = lock(&self.global);
        if !global.has_capacity() {
            warn!(
                "Global limit reached ({} per {:?}), rejecting {}",
                global.limit(),
                self.global_window,
                client
            );
            return Err(Rejection {
                scope: LimitScope::Global,
                limit: global.limit(),
                window: self.global_window,
            });
        }

        let mut clients = lock(&self.clients);
        if !clients.has_capacity(&client) {
            warn!(
                "Client {} reached its limit ({} per {:?})",
                client,
                clients.limit(),
                self.client_window
            );
            return Err(Rejection {
                scope: LimitScope::PerClient,
                limit: clients.limit(),
                window: self.client_window,
            });
        }

        global.increment();
        clients.increment(&client);

        let admission = Admission {
            global_count: global.count(),
            client_count: clients.count(&client),
        };
        debug!(
            "Admitted {} (global {}/{}, client {}/{})",
            client,
            admission.global_count,
            global.limit(),
            admission.client_count,
            clients.limit()
        );
        Ok(admission)
    }

    pub fn global_count(&self) -> u32 {
        lock(&self.global).count()
    }

    pub fn client_count(&self, client: &str) -> u32 {
        lock(&self.clients).count(&client.to_string())
    }

    pub fn global_window(&self) -> Duration {
        self.global_window
    }

    pub fn client_window(&self) -> Duration {
        self.client_window
    }

    pub fn reset_global(&self) {
        lock(&self.global).reset();
    }

    pub fn reset_clients(&self) {
        lock(&self.clients).reset();
    }

    /// Starts one reset timer per gate. Dropping the guard stops both.
    pub fn spawn_window_resets(self: &Arc<Self>) -> WindowResetGuard {
        info!(
            "Starting rate-limit window resets (global every {:?}, per-client every {:?})",
            self.global_window, self.client_window
        );
        let global = spawn_reset(Arc::downgrade(self), self.global_window, |limiter| {
            limiter.reset_global();
            debug!("Global rate-limit window reset");
        });
        let clients = spawn_reset(Arc::downgrade(self), self.client_window, |limiter| {
            limiter.reset_clients();
            debug!("Per-client rate-limit window reset");
        });
        WindowResetGuard {
            handles: vec![global, clients],
        }
    }
}

/// Owns the background reset tasks of a [`RateLimiter`].
pub struct WindowResetGuard {
    handles: Vec<JoinHandle<()>>,
}

impl Drop for WindowResetGuard {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

fn spawn_reset<F>(limiter: Weak<RateLimiter>, period: Duration, reset: F) -> JoinHandle<()>
where
    F: Fn(&RateLimiter) + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(limiter) = limiter.upgrade() else {
                break;
            };
            reset(&limiter);
        }
    })
}

// Counters hold plain integers, so a poisoned lock still guards valid state.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn limiter(per_client: u32, global: u32) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            per_client_max: per_client,
            global_max: global,
            ..RateLimitConfig::default()
        })
    }

    #[test]
    fn test_admission_reports_counts() {
        let limiter = limiter(3, 15);
        let first = limiter.admit("1.1.1.1").unwrap();
        assert_eq!(
            first,
            Admission {
                global_count: 1,
                client_count: 1
            }
        );
        let second = limiter.admit("2.2.2.2").unwrap();
        assert_eq!(second.global_count, 2);
        assert_eq!(second.client_count, 1);
    }

    #[test]
    fn test_global_rejection_wins_when_both_exhausted() {
        let limiter = limiter(1, 1);
        limiter.admit("a").unwrap();
        let rejection = limiter.admit("a").unwrap_err();
        assert_eq!(rejection.scope, LimitScope::Global);
        assert_eq!(rejection.limit, 1);
        assert_eq!(rejection.window, Duration::from_secs(60));
    }

    #[test]
    fn test_reset_clears_only_its_gate() {
        let limiter = limiter(1, 10);
        limiter.admit("a").unwrap();
        limiter.reset_clients();
        assert_eq!(limiter.client_count("a"), 0);
        assert_eq!(limiter.global_count(), 1);

        limiter.reset_global();
        assert_eq!(limiter.global_count(), 0);
    }
}
