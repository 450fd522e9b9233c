//! Application services: the session manager and the cart manager.
//!
//! Both borrow the request's `tower_sessions::Session` explicitly - there is
//! no ambient global state, which keeps the flows testable against an
//! in-memory session store.

pub mod cart;
pub mod session;

pub use cart::{CartError, CartService};
pub use session::{LoginOutcome, ProfileResolution, RetryPolicy, SessionError, SessionService};
