//! A spawned, real gateway server backed by live wiremock upstreams —
//! the harness every test in this crate drives through actual HTTP calls
//! rather than calling dispatcher internals directly.

use gateway_core::PlatformCapabilities;
use gateway_credentials::CredentialManager;
use gateway_providers::ProviderClient;
use gateway_server::{build_credential_manager, AppState};
use gateway_telemetry::Metrics;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;

/// A running gateway instance listening on a loopback port, torn down when
/// dropped.
pub struct TestServer {
    base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    join: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Parse `yaml` (already fully expanded — no `${...}` left to resolve)
    /// into a registry, elect a credential manager per instance against an
    /// empty [`PlatformCapabilities`] (no ambient identity available in
    /// tests), and serve the resulting router on an ephemeral loopback
    /// port.
    pub async fn start(yaml: &str) -> Self {
        struct NoEnv;
        impl gateway_config::env::EnvSource for NoEnv {
            fn get(&self, _name: &str) -> Option<String> {
                None
            }
        }

        let registry = gateway_config::load_from_str(yaml, &NoEnv).expect("test fixture must be valid configuration");
        let registry = Arc::new(registry);

        let caps = PlatformCapabilities::none();
        let mut credentials: HashMap<String, Arc<CredentialManager>> = HashMap::new();
        for instance in registry.iter() {
            let strategies = registry.strategies_for(&instance.name);
            let manager = build_credential_manager(&instance.name, strategies, &caps)
                .await
                .expect("test fixture strategies must elect");
            credentials.insert(instance.name.clone(), manager);
        }

        let provider_client = Arc::new(ProviderClient::new().expect("reqwest client must build"));
        let metrics = Metrics::new();
        let state = AppState::new(registry, credentials, provider_client, metrics);

        Self::serve(gateway_server::router(state)).await
    }

    async fn serve(app: axum::Router) -> Self {
        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local_addr");
        let base_url = format!("http://{addr}");

        let (tx, rx) = oneshot::channel();
        let join = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = rx.await;
                })
                .await
                .expect("test server must serve cleanly");
        });

        Self {
            base_url,
            shutdown: Some(tx),
            join: Some(join),
        }
    }

    /// The server's base URL, e.g. `http://127.0.0.1:54321`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            join.abort();
        }
    }
}

/// Registers a `wiremock` mock that answers any `POST` on `path` with
/// `status` and `body`.
pub async fn mount_json_post(server: &wiremock::MockServer, path: &str, status: u16, body: &serde_json::Value) {
    use wiremock::matchers::{method, path as path_matcher};
    use wiremock::{Mock, ResponseTemplate};

    Mock::given(method("POST"))
        .and(path_matcher(path))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}
