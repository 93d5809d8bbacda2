//! Per-instance credential orchestration: election, caching, refresh, and
//! tainted re-election.

use crate::strategy::CredentialStrategy;
use gateway_core::{Credential, GatewayError};
use gateway_resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use gateway_resilience::timeout::{TimeoutConfig, TimeoutManager};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// Bounds a single strategy `init`/`get` attempt to the §5 10s
/// credential-acquisition deadline; a strategy that hangs (an unreachable
/// vault or metadata server) must not stall election/refresh forever.
async fn with_acquisition_timeout<F, T>(fut: F) -> Result<T, GatewayError>
where
    F: std::future::Future<Output = Result<T, GatewayError>>,
{
    TimeoutManager::new(TimeoutConfig::credential_acquisition())
        .run(fut)
        .await?
}

/// A strategy that failed to refresh is tainted for this long before it is
/// reconsidered during re-election.
const TAINT_COOLDOWN: Duration = Duration::from_secs(30);

/// A single failure immediately taints — the cooldown window itself is
/// what the open-circuit timeout encodes, so there's no separate
/// failure-count threshold the way a general-purpose breaker would have.
fn taint_breaker_config() -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        failure_threshold: 1,
        success_threshold: 1,
        timeout: TAINT_COOLDOWN,
        window_size: 1,
        min_requests: 1,
    }
}

/// Orchestrates an instance's ordered strategy list: elects the first
/// strategy that initializes and yields a credential, caches the result,
/// refreshes ahead of expiry, and re-elects (skipping tainted strategies)
/// on refresh failure.
pub struct CredentialManager {
    instance_name: String,
    strategies: Vec<Arc<dyn CredentialStrategy>>,
    /// One breaker per strategy, independent of which is currently
    /// elected, so a taint survives across re-elections.
    breakers: HashMap<String, CircuitBreaker>,
    current: RwLock<Option<Arc<dyn CredentialStrategy>>>,
    cached: RwLock<Option<Credential>>,
    refresh_lock: Mutex<()>,
    /// Monotonically increasing on every successful (re-)election.
    epoch: AtomicU64,
}

impl CredentialManager {
    /// Build a manager over the ordered strategy list. Does not elect yet;
    /// call [`Self::init`] once before the first [`Self::get`].
    #[must_use]
    pub fn new(instance_name: impl Into<String>, strategies: Vec<Arc<dyn CredentialStrategy>>) -> Self {
        let instance_name = instance_name.into();
        let breakers = strategies
            .iter()
            .map(|s| {
                (
                    s.name().to_string(),
                    CircuitBreaker::new(s.name().to_string(), taint_breaker_config()),
                )
            })
            .collect();
        Self {
            instance_name,
            strategies,
            breakers,
            current: RwLock::new(None),
            cached: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            epoch: AtomicU64::new(0),
        }
    }

    /// The current election epoch. Strategy changes are observable as
    /// monotonic increases.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// The name of the currently elected strategy, if one has been
    /// elected, for the `current_strategy` metrics label.
    pub async fn current_strategy_name(&self) -> Option<String> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|s| s.name().to_string())
    }

    /// Elect the first eligible strategy in declared order: `init` and a
    /// first `get` must both succeed. Fails fast
    /// if none succeed.
    ///
    /// # Errors
    /// Returns [`GatewayError::ServiceUnavailable`] naming the last
    /// attempted strategy if every strategy in the list was ineligible.
    pub async fn init(&self) -> Result<(), GatewayError> {
        let mut last_error = None;

        for strategy in &self.strategies {
            if let Err(e) = with_acquisition_timeout(strategy.init()).await {
                warn!(instance = %self.instance_name, strategy = strategy.name(), error = %e, "strategy ineligible");
                last_error = Some(e);
                continue;
            }

            match with_acquisition_timeout(strategy.get()).await {
                Ok(credential) => {
                    info!(instance = %self.instance_name, strategy = strategy.name(), "elected credential strategy");
                    *self.current.write().await = Some(Arc::clone(strategy));
                    *self.cached.write().await = Some(credential);
                    self.epoch.fetch_add(1, Ordering::AcqRel);
                    return Ok(());
                }
                Err(e) => {
                    warn!(instance = %self.instance_name, strategy = strategy.name(), error = %e, "initial acquisition failed");
                    last_error = Some(e);
                }
            }
        }

        Err(GatewayError::service_unavailable(
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no strategies configured".to_string()),
        ))
    }

    /// Return a fresh credential, refreshing or re-electing as needed.
    /// Concurrent callers observing an expired credential collapse onto a
    /// single refresh: the refresh lock serializes them and every caller
    /// after the first simply reads the now-fresh cache.
    ///
    /// # Errors
    /// Returns [`GatewayError::ServiceUnavailable`] if no strategy, current
    /// or re-elected, can produce a credential.
    pub async fn get(&self) -> Result<Credential, GatewayError> {
        if let Some(credential) = self.cached.read().await.clone() {
            if credential.is_fresh(SystemTime::now()) {
                return Ok(credential);
            }
        }

        let _guard = self.refresh_lock.lock().await;

        // Another task may have refreshed while we waited for the lock.
        if let Some(credential) = self.cached.read().await.clone() {
            if credential.is_fresh(SystemTime::now()) {
                return Ok(credential);
            }
        }

        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<Credential, GatewayError> {
        let current = self.current.read().await.clone();

        if let Some(strategy) = &current {
            match with_acquisition_timeout(strategy.get()).await {
                Ok(credential) => {
                    if let Some(breaker) = self.breakers.get(strategy.name()) {
                        breaker.record_success();
                    }
                    *self.cached.write().await = Some(credential.clone());
                    return Ok(credential);
                }
                Err(e) => {
                    warn!(instance = %self.instance_name, strategy = strategy.name(), error = %e, "credential refresh failed, tainting");
                    if let Some(breaker) = self.breakers.get(strategy.name()) {
                        breaker.record_failure();
                    }
                }
            }
        }

        self.re_elect().await
    }

    async fn re_elect(&self) -> Result<Credential, GatewayError> {
        let previous_name = self.current.read().await.as_ref().map(|s| s.name().to_string());
        let mut last_error = None;

        for strategy in &self.strategies {
            if let Some(breaker) = self.breakers.get(strategy.name()) {
                if breaker.check().is_err() {
                    continue;
                }
            }

            if with_acquisition_timeout(strategy.init()).await.is_err() {
                continue;
            }

            match with_acquisition_timeout(strategy.get()).await {
                Ok(credential) => {
                    let changed = previous_name.as_deref() != Some(strategy.name());
                    if changed {
                        info!(instance = %self.instance_name, from = ?previous_name, to = strategy.name(), "credential strategy re-elected");
                    }
                    if let Some(breaker) = self.breakers.get(strategy.name()) {
                        breaker.record_success();
                    }
                    *self.current.write().await = Some(Arc::clone(strategy));
                    *self.cached.write().await = Some(credential.clone());
                    if changed {
                        self.epoch.fetch_add(1, Ordering::AcqRel);
                    }
                    return Ok(credential);
                }
                Err(e) => {
                    if let Some(breaker) = self.breakers.get(strategy.name()) {
                        breaker.record_failure();
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(GatewayError::service_unavailable(
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| previous_name.unwrap_or_else(|| "<none>".to_string())),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::StrategyKind;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;

    struct FakeStrategy {
        name: &'static str,
        eligible: bool,
        get_calls: AtomicU32,
        fail_get_after: Option<u32>,
        expires_in: Option<Duration>,
    }

    impl FakeStrategy {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                eligible: true,
                get_calls: AtomicU32::new(0),
                fail_get_after: None,
                expires_in: None,
            }
        }

        fn ineligible(mut self) -> Self {
            self.eligible = false;
            self
        }

        fn failing_after(mut self, n: u32) -> Self {
            self.fail_get_after = Some(n);
            self
        }

        fn expiring_in(mut self, d: Duration) -> Self {
            self.expires_in = Some(d);
            self
        }

        fn calls(&self) -> u32 {
            self.get_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CredentialStrategy for FakeStrategy {
        fn kind(&self) -> StrategyKind {
            StrategyKind::MountedSecret
        }

        fn name(&self) -> &str {
            self.name
        }

        async fn init(&self) -> Result<(), GatewayError> {
            if self.eligible {
                Ok(())
            } else {
                Err(GatewayError::service_unavailable(self.name))
            }
        }

        async fn get(&self) -> Result<Credential, GatewayError> {
            let n = self.get_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(limit) = self.fail_get_after {
                if n > limit {
                    return Err(GatewayError::service_unavailable(self.name));
                }
            }
            Ok(Credential::ApiKey {
                key: format!("{}-{n}", self.name),
                expires_at: self.expires_in.map(|d| SystemTime::now() + d),
            })
        }
    }

    #[tokio::test]
    async fn elects_first_eligible_strategy() {
        let a = Arc::new(FakeStrategy::new("a").ineligible());
        let b = Arc::new(FakeStrategy::new("b"));
        let manager = CredentialManager::new("inst", vec![a, b]);
        manager.init().await.unwrap();
        assert_eq!(manager.current_strategy_name().await, Some("b".to_string()));
        assert_eq!(manager.epoch(), 1);
    }

    #[tokio::test]
    async fn unusable_when_every_strategy_fails() {
        let a = Arc::new(FakeStrategy::new("a").ineligible());
        let manager = CredentialManager::new("inst", vec![a]);
        assert!(manager.init().await.is_err());
    }

    #[tokio::test]
    async fn fresh_cached_credential_skips_refresh() {
        let a = Arc::new(FakeStrategy::new("a"));
        let manager = CredentialManager::new("inst", vec![Arc::clone(&a) as Arc<dyn CredentialStrategy>]);
        manager.init().await.unwrap();
        manager.get().await.unwrap();
        manager.get().await.unwrap();
        assert_eq!(a.calls(), 1);
    }

    #[tokio::test]
    async fn re_elects_on_refresh_failure() {
        let a: Arc<FakeStrategy> = Arc::new(
            FakeStrategy::new("a")
                .expiring_in(Duration::from_millis(1))
                .failing_after(1),
        );
        let b = Arc::new(FakeStrategy::new("b"));
        let manager = CredentialManager::new(
            "inst",
            vec![a.clone() as Arc<dyn CredentialStrategy>, b.clone() as Arc<dyn CredentialStrategy>],
        );
        manager.init().await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let cred = manager.get().await.unwrap();
        assert!(matches!(cred, Credential::ApiKey { key, .. } if key.starts_with("b-")));
        assert_eq!(manager.current_strategy_name().await, Some("b".to_string()));
        assert_eq!(manager.epoch(), 2);
    }

    #[tokio::test]
    async fn concurrent_get_on_expired_credential_collapses_to_one_refresh() {
        let a: Arc<FakeStrategy> = Arc::new(FakeStrategy::new("a").expiring_in(Duration::from_millis(1)));
        let manager = Arc::new(CredentialManager::new(
            "inst",
            vec![a.clone() as Arc<dyn CredentialStrategy>],
        ));
        manager.init().await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let calls_before = a.calls();
        let barrier = Arc::new(tokio::sync::Barrier::new(10));
        let mut handles = Vec::new();
        for _ in 0..10 {
            let manager = Arc::clone(&manager);
            let barrier = Arc::clone(&barrier);
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                manager.get().await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        // Exactly one refresh call beyond the initial election's `get`.
        assert_eq!(a.calls(), calls_before + 1);
    }
}
