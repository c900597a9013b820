//! API routes

mod api;
mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Create main router with all routes
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health
        .merge(api::routes())
        // Inbound messaging webhooks
        .nest("/webhook", webhooks::routes())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use relayctl_core::hetzner::ServerAction;
    use relayctl_core::{Error, MessageSender, Result, Server, ServerDirectory, ServerStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::config::{Config, HetznerSettings, TwilioSettings};
    use crate::state::AppState;

    /// Directory holding a fixed server list
    pub struct FakeDirectory {
        pub servers: Vec<Server>,
        pub actions: Mutex<Vec<(i64, ServerAction)>>,
    }

    #[async_trait]
    impl ServerDirectory for FakeDirectory {
        async fn list_servers(&self) -> Result<Vec<Server>> {
            Ok(self.servers.clone())
        }

        async fn get_server(&self, id: i64) -> Result<Option<Server>> {
            Ok(self.servers.iter().find(|s| s.id == id).cloned())
        }

        async fn execute_action(&self, id: i64, action: ServerAction) -> bool {
            self.actions.lock().unwrap().push((id, action));
            true
        }
    }

    /// Sender recording messages; the first `fail_first` sends error out
    #[derive(Default)]
    pub struct FakeSender {
        pub sent: Mutex<Vec<(String, String)>>,
        pub fail_first: usize,
        attempts: AtomicUsize,
    }

    impl FakeSender {
        pub fn failing(fail_first: usize) -> Self {
            Self {
                fail_first,
                ..Default::default()
            }
        }

        pub fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessageSender for FakeSender {
        async fn send(&self, to: &str, body: &str) -> Result<()> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.fail_first {
                return Err(Error::HttpError("connection reset".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), body.to_string()));
            Ok(())
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    pub fn config(allowed: &[&str]) -> Config {
        Config {
            hetzner: HetznerSettings {
                api_token: "hz-token".to_string(),
                api_url: "http://127.0.0.1:1".to_string(),
                timeout_secs: 1,
            },
            twilio: TwilioSettings {
                account_sid: "AC123".to_string(),
                auth_token: "secret".to_string(),
                whatsapp_number: "+15550000000".to_string(),
                api_url: "http://127.0.0.1:1".to_string(),
            },
            allowed_phone_numbers: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn state(
        allowed: &[&str],
        sender: Arc<FakeSender>,
    ) -> (AppState, Arc<FakeDirectory>) {
        let directory = Arc::new(FakeDirectory {
            servers: vec![
                Server::new(42, "web-01", ServerStatus::Off),
                Server::new(43, "db-01", ServerStatus::Running),
            ],
            actions: Mutex::new(Vec::new()),
        });
        let state = AppState::with_parts(config(allowed), directory.clone(), sender);
        (state, directory)
    }
}
