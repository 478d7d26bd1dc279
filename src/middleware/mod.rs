pub mod auth;
pub mod error;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use error::{error_envelope_middleware, handle_panic, route_not_found};
pub use response::{ApiResponse, ApiResult, Empty, Envelope};
