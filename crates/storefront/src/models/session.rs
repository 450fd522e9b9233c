//! Session-related types.
//!
//! The session record is the storefront's durable key/value store: each key
//! is independently readable and writable and survives a process restart.

/// Session keys for persisted state.
pub mod keys {
    /// Key for the bearer token proving an authenticated identity.
    ///
    /// Set together with [`CURRENT_USER`] on login; the third-party redirect
    /// protocol is the one flow that persists the token first and completes
    /// the pair afterwards.
    pub const TOKEN: &str = "token";

    /// Key for the cached `UserRecord` of the logged-in user.
    pub const CURRENT_USER: &str = "user";

    /// Key for the shopping cart line items.
    pub const CART: &str = "cart";
}
