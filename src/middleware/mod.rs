pub mod json;
pub mod response;

pub use json::ApiJson;
pub use response::{ApiResponse, ApiResult};
