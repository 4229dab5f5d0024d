//! # Actix Middleware Library
//!
//! Shared middleware components for Agora Actix services
//!
//! ## Modules
//! - `jwt_auth`: bearer-token identity middleware and extractors
//! - `metrics`: Prometheus request metrics middleware

pub mod jwt_auth;
pub mod metrics;

pub use jwt_auth::{AuthUser, JwtAuthMiddleware, MaybeUser};
pub use metrics::MetricsMiddleware;
