#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use form_admin::{
    config::AppConfig, server, AdminSite, ApiOut, ApiResult, FormAdmin, FormField, FormRequest,
    FormSchema,
};
use serde_json::{json, Map, Value};

pub fn login_schema() -> FormSchema {
    FormSchema::new()
        .field(FormField::text("username"))
        .field(FormField::password("password"))
}

/// Page path only, no schema
#[derive(Default)]
pub struct TestAdmin;

#[async_trait]
impl FormAdmin for TestAdmin {
    fn page_path(&self) -> String {
        "/test".into()
    }

    async fn handle(&self, _request: &FormRequest, _data: Map<String, Value>) -> ApiResult<Value> {
        Ok(ApiOut::default())
    }
}

/// Echoes the submission plus an `extra` marker
#[derive(Default)]
pub struct TestAdmin1;

#[async_trait]
impl FormAdmin for TestAdmin1 {
    fn page_path(&self) -> String {
        "/test".into()
    }

    fn schema(&self) -> Option<FormSchema> {
        Some(login_schema())
    }

    async fn handle(&self, _request: &FormRequest, mut data: Map<String, Value>) -> ApiResult<Value> {
        data.insert("extra".into(), json!("success"));
        Ok(ApiOut::success(Value::Object(data)))
    }
}

/// Same as `TestAdmin1` but pre-populates the form
#[derive(Default)]
pub struct TestAdmin2;

#[async_trait]
impl FormAdmin for TestAdmin2 {
    fn page_path(&self) -> String {
        "/test".into()
    }

    fn schema(&self) -> Option<FormSchema> {
        Some(login_schema())
    }

    fn form_init(&self) -> bool {
        true
    }

    async fn handle(&self, request: &FormRequest, data: Map<String, Value>) -> ApiResult<Value> {
        TestAdmin1.handle(request, data).await
    }

    async fn get_init_data(&self, _request: &FormRequest, _schema: &FormSchema) -> ApiResult<Value> {
        Ok(ApiOut::success(json!({"username": "admin", "password": "admin"})))
    }
}

pub fn test_site() -> AdminSite {
    AdminSite::new(AppConfig::development().site)
}

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
}

impl TestServer {
    /// Serve `site` on a free port for the rest of the test
    pub async fn spawn(site: &AdminSite) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let app = server::app(site, &AppConfig::development())?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self { port, base_url };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(format!("{}/health", self.base_url)).send().await {
                if resp.status().is_success() {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
