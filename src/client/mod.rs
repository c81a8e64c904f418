//! Client-side auth state: a reactive view of the signed-in user for
//! long-lived consumers (rendering loops, embedded views), independent of the
//! per-request gate.

pub mod auth_state;
pub mod layout;

pub use auth_state::{AuthSnapshot, AuthState};
pub use layout::{ProtectedGate, ProtectedView};

/// Client-side navigation
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}
