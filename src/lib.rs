pub mod admin;
pub mod amis;
pub mod api;
pub mod config;
pub mod error;
pub mod schema;
pub mod server;
pub mod site;

pub use admin::{FormAdmin, FormAdminInstance, FormRequest};
pub use api::{ApiOut, ApiResult};
pub use error::{ApiError, ConfigError, SchemaError};
pub use schema::{FieldKind, FormField, FormSchema};
pub use site::AdminSite;
