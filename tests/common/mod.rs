use std::collections::HashMap;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{redirect::Policy, Client, StatusCode};

use prixfixe_frontend::auth::generate_session_token;
use prixfixe_frontend::config::SessionConfig;
use prixfixe_frontend::types::session::SERVICE_ADMIN_ROLE;
use prixfixe_frontend::types::{AccountPermissions, RequesterInfo, ServicePermissions, SessionContextData};

pub const SESSION_SECRET: &str = "integration-test-secret";
pub const COOKIE_NAME: &str = "prixfixe_it";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Fake-data mode so no backend API is needed.
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_prixfixe-frontend"));
        cmd.env("APP_ENV", "development")
            .env("FRONTEND_PORT", port.to_string())
            .env("USE_FAKE_DATA", "true")
            .env("FRONTEND_STATIC_DIR", concat!(env!("CARGO_MANIFEST_DIR"), "/static"))
            .env("SESSION_SECRET", SESSION_SECRET)
            .env("SESSION_COOKIE_NAME", COOKIE_NAME)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = Client::new();
        let deadline = Instant::now() + timeout;
        let url = format!("{}/_meta_/ready", self.base_url);

        while Instant::now() < deadline {
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// A fresh server for one test; it is killed when the value drops.
pub async fn ensure_server() -> Result<TestServer> {
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Client that leaves redirects for the test to inspect.
pub fn client() -> Client {
    Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("client should build")
}

/// `Cookie` header value for a signed-in session.
pub fn session_cookie(service_roles: &[&str]) -> Result<String> {
    let session = SessionContextData {
        requester: RequesterInfo {
            user_id: 1,
            reputation: "good".to_string(),
            reputation_explanation: String::new(),
            service_permissions: ServicePermissions::new(service_roles.iter().copied()),
        },
        active_account_id: 2,
        account_permissions: HashMap::from([(2, AccountPermissions::default())]),
    };
    let config = SessionConfig {
        cookie_name: COOKIE_NAME.to_string(),
        secret: SESSION_SECRET.to_string(),
        max_age_hours: 1,
    };

    let token = generate_session_token(session, &config)?;
    Ok(format!("{}={}", COOKIE_NAME, token))
}

pub fn admin_cookie() -> Result<String> {
    session_cookie(&[SERVICE_ADMIN_ROLE])
}
