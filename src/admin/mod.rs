// admin/mod.rs - Form admin pages
//
// A form admin is declared by implementing `FormAdmin`; the site turns each
// one into an immutable `FormAdminInstance` that owns the compiled schema
// and the axum routes for its page, submit and init endpoints.

pub mod form;
pub mod page;
pub mod request;

pub use form::{FormAdmin, FormAdminInstance};
pub use request::FormRequest;
