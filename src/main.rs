use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use form_admin::{
    config::AppConfig, server, AdminSite, ApiError, ApiOut, ApiResult, FormAdmin, FormField,
    FormRequest, FormSchema,
};
use serde_json::{json, Map, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "form-admin")]
#[command(about = "Serve declarative admin form pages")]
#[command(version)]
struct Cli {
    #[arg(long, help = "Address to bind (overrides FORM_ADMIN_HOST)")]
    host: Option<String>,

    #[arg(long, help = "Port to listen on (overrides FORM_ADMIN_PORT / PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Path the admin site is mounted under (overrides SITE_MOUNT_PATH)")]
    mount: Option<String>,
}

/// Demo login form: echoes the username back on success
#[derive(Default)]
struct LoginAdmin;

#[async_trait]
impl FormAdmin for LoginAdmin {
    fn page_path(&self) -> String {
        "/login".into()
    }

    fn page_title(&self) -> String {
        "Sign in".into()
    }

    fn schema(&self) -> Option<FormSchema> {
        Some(
            FormSchema::new()
                .field(FormField::text("username").label("Username").min_length(3).max_length(32))
                .field(FormField::password("password").label("Password").min_length(4)),
        )
    }

    async fn handle(&self, request: &FormRequest, data: Map<String, Value>) -> ApiResult<Value> {
        tracing::info!(
            username = %data["username"],
            user_agent = request.header("user-agent").unwrap_or("-"),
            "sign-in attempt"
        );
        if data.get("password") != Some(&json!("admin")) {
            return Err(ApiError::bad_request("Incorrect username or password"));
        }
        Ok(ApiOut::success(json!({ "username": data["username"] })).with_message("Signed in"))
    }
}

const PROFILE_SCHEMA: &str = r#"
title: Profile
fields:
  - name: nickname
    label: Nickname
    max_length: 20
  - name: email
    kind: email
    label: E-mail
  - name: language
    kind: select
    label: Language
    default: en
    options:
      - { label: English, value: en }
      - { label: Deutsch, value: de }
  - name: newsletter
    kind: boolean
    label: Subscribe to newsletter
    default: false
"#;

/// Demo profile form, defined in YAML and pre-populated from the init endpoint
#[derive(Default)]
struct ProfileAdmin;

#[async_trait]
impl FormAdmin for ProfileAdmin {
    fn schema(&self) -> Option<FormSchema> {
        match FormSchema::from_yaml(PROFILE_SCHEMA) {
            Ok(schema) => Some(schema),
            Err(e) => {
                tracing::error!("profile schema is invalid: {}", e);
                None
            }
        }
    }

    fn form_init(&self) -> bool {
        true
    }

    async fn handle(&self, _request: &FormRequest, data: Map<String, Value>) -> ApiResult<Value> {
        tracing::info!(nickname = %data["nickname"], "profile updated");
        Ok(ApiOut::success(Value::Object(data)).with_message("Profile saved"))
    }

    async fn get_init_data(&self, _request: &FormRequest, _schema: &FormSchema) -> ApiResult<Value> {
        Ok(ApiOut::success(json!({
            "nickname": "admin",
            "email": "admin@example.com",
            "language": "en",
            "newsletter": false,
        })))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up FORM_ADMIN_PORT, SITE_MOUNT_PATH, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config: AppConfig = form_admin::config::config().clone();
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(mount) = cli.mount {
        config.site.mount_path = mount;
    }
    tracing::info!("Starting form admin in {:?} mode", config.environment);

    let site = AdminSite::new(config.site.clone());
    site.register_admin::<LoginAdmin>()
        .register_admin::<ProfileAdmin>();

    let app = server::app(&site, &config).context("invalid admin configuration")?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Form admin listening on http://{}{}", bind_addr, config.site.mount_path);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
