//! Admin site: registry of form admins and the router that serves them.
//!
//! Admins are registered by type (`register_admin::<A>()`, one instance per
//! type, built with `Default`) or as preconfigured values
//! (`register_admin_instance`). Either way nothing is materialized until
//! `get_admin_or_create` or `router` is called; both fail fast on a
//! misconfigured admin.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{routing::get, Router};
use serde::Serialize;

use crate::admin::{FormAdmin, FormAdminInstance};
use crate::api::ApiOut;
use crate::config::SiteConfig;
use crate::error::ConfigError;

type AdminFactory = Box<dyn Fn() -> Arc<dyn FormAdmin> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum AdminKey {
    Type(TypeId),
    Instance(usize),
}

struct Registration {
    key: AdminKey,
    label: String,
    factory: AdminFactory,
}

#[derive(Default)]
struct Registry {
    registrations: Vec<Registration>,
    instances: HashMap<AdminKey, Arc<FormAdminInstance>>,
}

/// Entry of the site index served at the mount path
#[derive(Debug, Clone, Serialize)]
pub struct AdminSummary {
    pub name: String,
    pub page_url: String,
    pub form_url: String,
    pub form_init: bool,
}

pub struct AdminSite {
    settings: SiteConfig,
    registry: Mutex<Registry>,
}

impl AdminSite {
    pub fn new(settings: SiteConfig) -> Self {
        Self {
            settings,
            registry: Mutex::new(Registry::default()),
        }
    }

    pub fn settings(&self) -> &SiteConfig {
        &self.settings
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an admin type. Registering the same type twice is a no-op.
    pub fn register_admin<A: FormAdmin + Default>(&self) -> &Self {
        let key = AdminKey::Type(TypeId::of::<A>());
        let mut registry = self.registry();
        if registry.registrations.iter().any(|r| r.key == key) {
            tracing::debug!(admin = type_name::<A>(), "admin already registered");
            return self;
        }

        let label = A::default().name();
        tracing::info!(admin = %label, "registered form admin");
        registry.registrations.push(Registration {
            key,
            label,
            factory: Box::new(|| Arc::new(A::default()) as Arc<dyn FormAdmin>),
        });
        self
    }

    /// Register a preconfigured admin value. Each call adds a new admin,
    /// so several instances of one type can live side by side.
    pub fn register_admin_instance(&self, admin: impl FormAdmin) -> &Self {
        let admin: Arc<dyn FormAdmin> = Arc::new(admin);
        let mut registry = self.registry();
        let key = AdminKey::Instance(registry.registrations.len());
        let label = admin.name();

        tracing::info!(admin = %label, "registered form admin instance");
        registry.registrations.push(Registration {
            key,
            label,
            factory: Box::new(move || Arc::clone(&admin)),
        });
        self
    }

    /// Return the materialized instance for `A`, creating it on first use
    pub fn get_admin_or_create<A: FormAdmin>(&self) -> Result<Arc<FormAdminInstance>, ConfigError> {
        let key = AdminKey::Type(TypeId::of::<A>());
        let mut registry = self.registry();
        if !registry.registrations.iter().any(|r| r.key == key) {
            return Err(ConfigError::NotRegistered(type_name::<A>().to_string()));
        }
        Self::materialize(&mut registry, key, &self.settings)
    }

    fn materialize(
        registry: &mut Registry,
        key: AdminKey,
        settings: &SiteConfig,
    ) -> Result<Arc<FormAdminInstance>, ConfigError> {
        if let Some(instance) = registry.instances.get(&key) {
            return Ok(Arc::clone(instance));
        }

        let registration = registry
            .registrations
            .iter()
            .find(|r| r.key == key)
            .ok_or_else(|| ConfigError::NotRegistered(format!("{:?}", key)))?;

        let instance = Arc::new(FormAdminInstance::materialize((registration.factory)(), settings)?);
        registry.instances.insert(key, Arc::clone(&instance));
        Ok(instance)
    }

    /// Materialize every registered admin, in registration order
    pub fn instances(&self) -> Result<Vec<Arc<FormAdminInstance>>, ConfigError> {
        let mut registry = self.registry();
        let keys: Vec<AdminKey> = registry.registrations.iter().map(|r| r.key).collect();
        keys.into_iter()
            .map(|key| Self::materialize(&mut registry, key, &self.settings))
            .collect()
    }

    pub fn summaries(&self) -> Result<Vec<AdminSummary>, ConfigError> {
        Ok(self
            .instances()?
            .iter()
            .map(|ins| AdminSummary {
                name: ins.name().to_string(),
                page_url: ins.page_url(),
                form_url: ins.form_url(),
                form_init: ins.form_init(),
            })
            .collect())
    }

    /// Build the router serving every registered admin plus the site index.
    pub fn router(&self) -> Result<Router, ConfigError> {
        let instances = self.instances()?;

        let mut claimed: HashMap<(&'static str, String), String> = HashMap::new();
        let mut router = Router::new();
        for instance in &instances {
            for (method, path) in instance.route_keys() {
                if let Some(first) = claimed.insert((method, path.clone()), instance.name().to_string()) {
                    return Err(ConfigError::DuplicateRoute {
                        method,
                        path,
                        first,
                        second: instance.name().to_string(),
                    });
                }
            }
            router = router.merge(instance.routes());
        }

        let index_path = match self.settings.mount_path.trim_end_matches('/') {
            "" => "/".to_string(),
            path => path.to_string(),
        };
        if claimed.keys().any(|(_, path)| *path == index_path) {
            tracing::warn!(path = %index_path, "an admin page shadows the site index");
        } else {
            let summaries = self.summaries()?;
            let title = self.settings.title.clone();
            router = router.route(
                &index_path,
                get(move || {
                    let body = serde_json::json!({ "title": title.clone(), "admins": summaries.clone() });
                    async move { ApiOut::success(body) }
                }),
            );
        }

        tracing::info!(admins = instances.len(), "admin site router built");
        Ok(router)
    }

    pub fn registered_labels(&self) -> Vec<String> {
        self.registry().registrations.iter().map(|r| r.label.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::FormRequest;
    use crate::api::ApiResult;
    use crate::schema::{FormField, FormSchema};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Map, Value};
    use tower::ServiceExt;

    fn settings() -> SiteConfig {
        SiteConfig {
            mount_path: "/admin".into(),
            title: "Test Site".into(),
            amis_cdn: "https://unpkg.com/amis@6.0.0".into(),
        }
    }

    fn login_schema() -> FormSchema {
        FormSchema::new()
            .field(FormField::text("username"))
            .field(FormField::password("password"))
    }

    #[derive(Default)]
    struct NoSchemaAdmin;

    #[async_trait]
    impl FormAdmin for NoSchemaAdmin {
        fn page_path(&self) -> String {
            "/test".into()
        }

        async fn handle(&self, _request: &FormRequest, _data: Map<String, Value>) -> ApiResult<Value> {
            Ok(ApiOut::default())
        }
    }

    #[derive(Default)]
    struct EchoAdmin;

    #[async_trait]
    impl FormAdmin for EchoAdmin {
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

    /// Configured per instance: same type, different prefix
    struct PrefixedAdmin(&'static str);

    #[async_trait]
    impl FormAdmin for PrefixedAdmin {
        fn router_prefix(&self) -> String {
            self.0.to_string()
        }

        fn schema(&self) -> Option<FormSchema> {
            Some(login_schema())
        }

        async fn handle(&self, _request: &FormRequest, data: Map<String, Value>) -> ApiResult<Value> {
            Ok(ApiOut::success(Value::Object(data)))
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn missing_schema_fails_on_materialization() {
        let site = AdminSite::new(settings());
        site.register_admin::<NoSchemaAdmin>();

        let err = site.get_admin_or_create::<NoSchemaAdmin>().unwrap_err();
        assert!(err.to_string().contains("schema is None"));
        assert!(site.router().is_err());
    }

    #[test]
    fn unregistered_admin_is_an_error() {
        let site = AdminSite::new(settings());
        let err = site.get_admin_or_create::<EchoAdmin>().unwrap_err();
        assert!(matches!(err, ConfigError::NotRegistered(_)));
    }

    #[test]
    fn instances_are_cached_per_type() {
        let site = AdminSite::new(settings());
        site.register_admin::<EchoAdmin>().register_admin::<EchoAdmin>();
        assert_eq!(site.registered_labels(), vec!["EchoAdmin"]);

        let a = site.get_admin_or_create::<EchoAdmin>().unwrap();
        let b = site.get_admin_or_create::<EchoAdmin>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.router_path(), "/admin/echoadmin");
    }

    #[test]
    fn labels_use_admin_names() {
        let site = AdminSite::new(settings());
        site.register_admin::<EchoAdmin>();
        site.register_admin_instance(PrefixedAdmin("/other"));
        assert_eq!(site.registered_labels(), vec!["EchoAdmin", "PrefixedAdmin"]);
    }

    #[test]
    fn duplicate_routes_are_rejected() {
        let site = AdminSite::new(settings());
        site.register_admin_instance(PrefixedAdmin("/same"));
        site.register_admin_instance(PrefixedAdmin("/same"));

        let err = site.router().unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateRoute { .. }));
    }

    #[tokio::test]
    async fn instances_of_one_type_serve_separate_routes() {
        let site = AdminSite::new(settings());
        site.register_admin_instance(PrefixedAdmin("/first"));
        site.register_admin_instance(PrefixedAdmin("/second"));

        let summaries = site.summaries().unwrap();
        assert_eq!(summaries[0].form_url, "/admin/first/api");
        assert_eq!(summaries[1].form_url, "/admin/second/api");

        let response = site
            .router()
            .unwrap()
            .oneshot(
                Request::post("/admin/second/api")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"username":"a","password":"b"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn page_and_submit_routes() {
        let site = AdminSite::new(settings());
        site.register_admin::<EchoAdmin>();
        let ins = site.get_admin_or_create::<EchoAdmin>().unwrap();
        let app = site.router().unwrap();

        let response = app
            .clone()
            .oneshot(Request::post(ins.page_url()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_json(response).await;
        assert_eq!(page["data"]["body"]["type"], "form");
        assert_eq!(page["data"]["body"]["api"]["url"], json!(ins.form_url()));

        let response = app
            .clone()
            .oneshot(
                Request::post(ins.form_url())
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"username":"admin","password":"admin"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        let out = body_json(response).await;
        assert_eq!(out["data"], json!({"username": "admin", "password": "admin", "extra": "success"}));

        let response = app
            .oneshot(Request::get(ins.form_url()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let site = AdminSite::new(settings());
        site.register_admin::<EchoAdmin>();

        let response = site
            .router()
            .unwrap()
            .oneshot(Request::post("/admin/echoadmin/test/api").body(Body::from("{not json")).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let out = body_json(response).await;
        assert_eq!(out["data"]["code"], "INVALID_JSON");
    }

    #[tokio::test]
    async fn site_index_lists_admins() {
        let site = AdminSite::new(settings());
        site.register_admin::<EchoAdmin>();

        let response = site
            .router()
            .unwrap()
            .oneshot(Request::get("/admin").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let out = body_json(response).await;
        assert_eq!(out["data"]["title"], "Test Site");
        assert_eq!(out["data"]["admins"][0]["name"], "EchoAdmin");
        assert_eq!(out["data"]["admins"][0]["page_url"], "/admin/echoadmin/test");
    }
}
