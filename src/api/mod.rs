pub mod response;

pub use response::{ApiOut, ApiResult};
