//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with SQLite store)
//! 4. Authorization guard (global 401 handling)

pub mod auth;
pub mod authorization;
pub mod session;

pub use auth::{Authenticated, OptionalAuth, RequireAdmin, RequireAuth};
pub use authorization::authorization_guard;
pub use session::{connect_session_db, create_session_layer, migrate_session_store};
