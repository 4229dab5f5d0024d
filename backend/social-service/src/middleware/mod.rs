pub mod permissions;

pub use actix_middleware::{AuthUser, JwtAuthMiddleware, MaybeUser, MetricsMiddleware};
pub use permissions::{authorize, require_actor, Operation};
