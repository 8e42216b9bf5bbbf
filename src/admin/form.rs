use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    response::Html,
    routing::{get, post, MethodRouter},
    Router,
};
use serde_json::{Map, Value};

use super::page::render_html;
use super::request::FormRequest;
use crate::amis::{FormPage, PageDescriptor};
use crate::api::{ApiOut, ApiResult};
use crate::config::SiteConfig;
use crate::error::{ApiError, ConfigError};
use crate::schema::{CompiledSchema, FormSchema};

/// A form page declared by the user.
///
/// Only `schema` and `handle` usually need overriding; every path and label
/// has a default derived from the implementing type's name.
#[async_trait]
pub trait FormAdmin: Send + Sync + 'static {
    /// Name used in logs, errors and the default route prefix
    fn name(&self) -> String {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Segment between the site mount path and this admin's pages
    fn router_prefix(&self) -> String {
        format!("/{}", self.name().to_lowercase())
    }

    /// Route of the page view, relative to the router path
    fn page_path(&self) -> String {
        "/".to_string()
    }

    /// Route of the submit (and init) endpoint, relative to the router path
    fn form_path(&self) -> String {
        default_form_path(&self.page_path())
    }

    fn page_title(&self) -> String {
        self.name()
    }

    fn submit_text(&self) -> String {
        "Submit".to_string()
    }

    /// Field definitions; an admin without one cannot be materialized
    fn schema(&self) -> Option<FormSchema> {
        None
    }

    /// Expose `GET {form_path}` for pre-populating the form
    fn form_init(&self) -> bool {
        false
    }

    /// Process a submission that already passed schema validation
    async fn handle(&self, request: &FormRequest, data: Map<String, Value>) -> ApiResult<Value>;

    /// Initial field values; defaults to the declared defaults of `schema`,
    /// the definition compiled at materialization
    async fn get_init_data(&self, _request: &FormRequest, schema: &FormSchema) -> ApiResult<Value> {
        Ok(ApiOut::success(Value::Object(schema.defaults())))
    }
}

fn short_type_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

fn default_form_path(page_path: &str) -> String {
    format!("{}/api", page_path.trim_end_matches('/'))
}

fn join_path(base: &str, segment: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), segment.trim_end_matches('/'))
}

/// An admin after materialization: paths resolved, schema compiled.
/// Immutable and shared by every request.
pub struct FormAdminInstance {
    admin: Arc<dyn FormAdmin>,
    name: String,
    router_path: String,
    page_path: String,
    form_path: String,
    page_title: String,
    submit_text: String,
    form_init: bool,
    amis_cdn: String,
    schema: CompiledSchema,
}

impl std::fmt::Debug for FormAdminInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormAdminInstance")
            .field("name", &self.name)
            .field("router_path", &self.router_path)
            .field("page_path", &self.page_path)
            .field("form_path", &self.form_path)
            .field("form_init", &self.form_init)
            .finish_non_exhaustive()
    }
}

impl FormAdminInstance {
    /// Resolve paths and compile the schema. Fails fast on any
    /// configuration problem so it surfaces at startup, not on first request.
    pub fn materialize(admin: Arc<dyn FormAdmin>, site: &SiteConfig) -> Result<Self, ConfigError> {
        let name = admin.name();

        let prefix = admin.router_prefix();
        let page_path = admin.page_path();
        let form_path = admin.form_path();
        for path in [&site.mount_path, &prefix, &page_path, &form_path] {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidPath { admin: name, path: path.clone() });
            }
        }

        let schema = admin
            .schema()
            .ok_or_else(|| ConfigError::MissingSchema { admin: name.clone() })?
            .compile()
            .map_err(|source| ConfigError::InvalidSchema { admin: name.clone(), source })?;

        let router_path = join_path(&site.mount_path, &prefix);
        tracing::info!(admin = %name, router_path = %router_path, "materialized form admin");

        Ok(Self {
            router_path,
            page_path,
            form_path,
            page_title: admin.page_title(),
            submit_text: admin.submit_text(),
            form_init: admin.form_init(),
            amis_cdn: site.amis_cdn.clone(),
            schema,
            name,
            admin,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Site mount path joined with the admin's router prefix
    pub fn router_path(&self) -> &str {
        &self.router_path
    }

    pub fn page_path(&self) -> &str {
        &self.page_path
    }

    pub fn form_path(&self) -> &str {
        &self.form_path
    }

    pub fn form_init(&self) -> bool {
        self.form_init
    }

    pub fn page_url(&self) -> String {
        format!("{}{}", self.router_path, self.page_path)
    }

    pub fn form_url(&self) -> String {
        format!("{}{}", self.router_path, self.form_path)
    }

    pub fn schema(&self) -> &FormSchema {
        self.schema.schema()
    }

    pub fn render_page(&self, _request: &FormRequest) -> PageDescriptor {
        FormPage {
            title: &self.page_title,
            schema: self.schema.schema(),
            form_url: &self.form_url(),
            form_init: self.form_init,
            submit_text: &self.submit_text,
        }
        .render()
    }

    /// Validate `raw` and pass the cleaned data to the admin's handler
    pub async fn submit(&self, request: &FormRequest, raw: &Value) -> ApiResult<Value> {
        let data = self.schema.validate(raw).map_err(|e| {
            tracing::warn!(admin = %self.name, "form validation failed: {}", e);
            e
        })?;

        self.admin.handle(request, data).await.map_err(|e| {
            if e.status_code() >= 500 {
                tracing::error!(admin = %self.name, "form handler failed: {}", e);
            }
            e
        })
    }

    pub async fn init_data(&self, request: &FormRequest) -> ApiResult<Value> {
        if !self.form_init {
            return Err(ApiError::not_found(format!("{} does not provide initial data", self.name)));
        }
        self.admin.get_init_data(request, self.schema.schema()).await
    }

    /// Routes as `(method, full path)` pairs, for collision checks.
    /// A page path equal to the form path collides with itself.
    pub fn route_keys(&self) -> Vec<(&'static str, String)> {
        let mut keys = vec![
            ("GET", self.page_url()),
            ("POST", self.page_url()),
            ("POST", self.form_url()),
        ];
        if self.form_init {
            keys.push(("GET", self.form_url()));
        }
        keys
    }

    pub fn routes(self: &Arc<Self>) -> Router {
        let page_route: MethodRouter = {
            let html = Arc::clone(self);
            let json = Arc::clone(self);
            get(move |req: FormRequest| Arc::clone(&html).page_html(req))
                .post(move |req: FormRequest| Arc::clone(&json).page_json(req))
        };

        let mut form_route: MethodRouter = {
            let ins = Arc::clone(self);
            post(move |req: FormRequest, body: Bytes| Arc::clone(&ins).submit_route(req, body))
        };
        if self.form_init {
            let ins = Arc::clone(self);
            form_route = form_route.get(move |req: FormRequest| Arc::clone(&ins).init_route(req));
        }

        Router::new()
            .route(&self.page_url(), page_route)
            .route(&self.form_url(), form_route)
    }

    async fn page_json(self: Arc<Self>, req: FormRequest) -> ApiResult<PageDescriptor> {
        tracing::debug!(admin = %self.name, "render page descriptor");
        Ok(ApiOut::success(self.render_page(&req)))
    }

    async fn page_html(self: Arc<Self>, req: FormRequest) -> Result<Html<String>, ApiError> {
        let page = self.render_page(&req);
        render_html(&self.page_title, &self.amis_cdn, &page).map(Html)
    }

    async fn submit_route(self: Arc<Self>, req: FormRequest, body: Bytes) -> ApiResult<Value> {
        tracing::debug!(admin = %self.name, bytes = body.len(), "form submission");
        let raw: Value = if body.is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_slice(&body)?
        };
        self.submit(&req, &raw).await
    }

    async fn init_route(self: Arc<Self>, req: FormRequest) -> ApiResult<Value> {
        tracing::debug!(admin = %self.name, "form init data");
        self.init_data(&req).await
    }
}
