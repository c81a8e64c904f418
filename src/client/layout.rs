//! Client-checked protected layout

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::views;

use super::AuthState;

/// What the protected layout shows for the current auth state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtectedView {
    /// Auth state still resolving
    Placeholder,
    /// Signed out; a redirect to login has been issued
    Redirecting,
    Shell { email: String },
}

impl ProtectedView {
    /// Markup for this view; only `Shell` includes `content`
    pub fn into_html(self, title: &str, content: &str) -> String {
        match self {
            ProtectedView::Placeholder => views::document(title, &views::placeholder()),
            ProtectedView::Redirecting => String::new(),
            ProtectedView::Shell { email } => views::protected_shell(title, &email, content),
        }
    }
}

pub struct ProtectedGate {
    state: Arc<AuthState>,
    redirected: AtomicBool,
}

impl ProtectedGate {
    pub fn new(state: Arc<AuthState>) -> Self {
        Self {
            state,
            redirected: AtomicBool::new(false),
        }
    }

    /// Evaluate the gate. The redirect to login fires once per signed-out
    /// stretch, however often this is called.
    pub fn render(&self) -> ProtectedView {
        let snapshot = self.state.snapshot();
        if snapshot.loading {
            return ProtectedView::Placeholder;
        }

        match snapshot.user {
            Some(user) => {
                self.redirected.store(false, Ordering::SeqCst);
                ProtectedView::Shell { email: user.email }
            }
            None => {
                if !self.redirected.swap(true, Ordering::SeqCst) {
                    self.state.redirect_to_login();
                }
                ProtectedView::Redirecting
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::{
        client::{MockNavigator, Navigator},
        gate::GateRules,
        repository::auth::MockAuthBackend,
        services::{
            auth::{
                tests::{cookies_with, settings, user, valid_session},
                AuthClient,
            },
            cookies::SessionCookies,
        },
    };

    fn navigator(redirects: usize) -> Arc<dyn Navigator> {
        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .withf(|path: &str| path == "/user/login")
            .times(redirects)
            .return_const(());
        Arc::new(navigator)
    }

    #[tokio::test]
    async fn test_loading_renders_placeholder_only() {
        let client = Arc::new(AuthClient::new(
            Arc::new(MockAuthBackend::new()),
            Arc::new(SessionCookies::new()),
            settings(),
        ));
        let state = Arc::new(AuthState::mount(client, navigator(0), &GateRules::default()));
        let gate = ProtectedGate::new(state);

        // The fetch task has not run yet on this single-threaded runtime
        let view = gate.render();
        assert_eq!(view, ProtectedView::Placeholder);
        let html = view.into_html("Dashboard", "<p>secret</p>");
        assert!(!html.contains("secret"));
    }

    #[tokio::test]
    async fn test_signed_out_redirects_once_and_renders_nothing() {
        let client = Arc::new(AuthClient::new(
            Arc::new(MockAuthBackend::new()),
            Arc::new(SessionCookies::new()),
            settings(),
        ));
        let state = Arc::new(AuthState::mount(client, navigator(1), &GateRules::default()));
        state.watch().changed().await.unwrap();
        let gate = ProtectedGate::new(state);

        assert_eq!(gate.render(), ProtectedView::Redirecting);
        assert_eq!(gate.render(), ProtectedView::Redirecting);
        assert_eq!(gate.render().into_html("Dashboard", "<p>secret</p>"), "");
    }

    #[tokio::test]
    async fn test_signed_in_renders_shell() {
        let mut backend = MockAuthBackend::new();
        backend.expect_get_user().returning(|_| Ok(Some(user())));
        let client = Arc::new(AuthClient::new(
            Arc::new(backend),
            cookies_with(&valid_session("access-1")),
            settings(),
        ));
        let state = Arc::new(AuthState::mount(client, navigator(0), &GateRules::default()));
        state.watch().changed().await.unwrap();
        let gate = ProtectedGate::new(state);

        let view = gate.render();
        assert_eq!(
            view,
            ProtectedView::Shell {
                email: "staff@library.test".to_string()
            }
        );
        let html = view.into_html("Dashboard", "<p>books</p>");
        assert!(html.contains("Welcome, staff@library.test"));
        assert!(html.contains("<p>books</p>"));
    }
}
