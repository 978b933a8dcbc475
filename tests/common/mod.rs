#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

static SERVER: OnceLock<TestServer> = OnceLock::new();
static ADMIN: OnceLock<Option<(String, String)>> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_solar-asset-api"));
        cmd.env("SOLAR_API_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server can see DATABASE_URL and SECRET_KEY from .env
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(format!("{}/health", self.base_url)).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn api(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// True when /health reports a reachable database. Flows that write data
/// return early otherwise.
pub async fn database_available(server: &TestServer) -> bool {
    match reqwest::get(format!("{}/health", server.base_url)).await {
        Ok(resp) => resp.status() == StatusCode::OK,
        Err(_) => false,
    }
}

pub fn unique_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..10].to_string()
}

/// Migrate and create a fresh super admin through the admin CLI, once per test binary
fn bootstrap_admin() -> Option<(String, String)> {
    ADMIN
        .get_or_init(|| {
            let admin = env!("CARGO_BIN_EXE_solar-admin");
            let migrated = Command::new(admin).arg("migrate").status().ok()?;
            if !migrated.success() {
                return None;
            }

            let email = format!("root-{}@example.com", unique_suffix());
            let password = "root-password-1".to_string();
            let created = Command::new(admin)
                .args(["create-admin", "--email", &email, "--password", &password])
                .status()
                .ok()?;
            created.success().then_some((email, password))
        })
        .clone()
}

pub async fn login(server: &TestServer, email: &str, password: &str) -> Result<reqwest::Response> {
    let res = reqwest::Client::new()
        .post(server.api("/auth/login/access-token"))
        .json(&json!({ "username": email, "password": password }))
        .send()
        .await?;
    Ok(res)
}

/// Bearer token for the bootstrap super admin, or None without a database
pub async fn admin_token(server: &TestServer) -> Result<Option<String>> {
    if !database_available(server).await {
        eprintln!("database unavailable, skipping");
        return Ok(None);
    }
    let Some((email, password)) = tokio::task::spawn_blocking(bootstrap_admin).await? else {
        anyhow::bail!("failed to bootstrap admin account via solar-admin");
    };

    let res = login(server, &email, &password).await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "admin login failed: {}", res.status());
    let body: Value = res.json().await?;
    let token = body["access_token"].as_str().context("missing access_token")?;
    Ok(Some(token.to_string()))
}

/// Authenticated JSON client bound to one token
pub struct Api<'a> {
    server: &'a TestServer,
    client: reqwest::Client,
    token: String,
}

impl<'a> Api<'a> {
    pub fn new(server: &'a TestServer, token: String) -> Self {
        Self { server, client: reqwest::Client::new(), token }
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.get(self.server.api(path)).bearer_auth(&self.token).send().await?;
        Self::read(res).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self.client.post(self.server.api(path)).bearer_auth(&self.token).json(&body).send().await?;
        Self::read(res).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self.client.put(self.server.api(path)).bearer_auth(&self.token).json(&body).send().await?;
        Self::read(res).await
    }

    pub async fn delete(&self, path: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.delete(self.server.api(path)).bearer_auth(&self.token).send().await?;
        Self::read(res).await
    }

    async fn read(res: reqwest::Response) -> Result<(StatusCode, Value)> {
        let status = res.status();
        let body = res.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }
}
