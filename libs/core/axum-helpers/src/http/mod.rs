//! HTTP middleware module.
//!
//! - CORS configuration from an explicit origin list
//! - Security headers
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::http::{create_cors_layer, parse_origins, security_headers};
//!
//! let app = Router::new()
//!     .layer(axum::middleware::from_fn(security_headers))
//!     .layer(create_cors_layer(parse_origins("http://localhost:3000")?));
//! ```

pub mod cors;
pub mod security;

pub use cors::{DEFAULT_CORS_ORIGINS, create_cors_layer, parse_origins};
pub use security::security_headers;
