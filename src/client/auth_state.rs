//! Auth state hook.
//!
//! Mounting subscribes to auth events first, then resolves the current user
//! on a spawned task. Events and the initial fetch race; every applied event
//! bumps an epoch under the same lock that publishes the state, and the fetch
//! result is dropped if the epoch moved since mount.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::{sync::watch, task::JoinHandle};

use crate::{
    gate::GateRules,
    models::{AuthEvent, User},
    services::{auth::AuthClient, auth_events::Subscription},
};

use super::Navigator;

/// Published auth state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub user: Option<User>,
    pub loading: bool,
}

impl AuthSnapshot {
    fn loading() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

struct Guard {
    epoch: u64,
    mounted: bool,
}

struct Shared {
    guard: Mutex<Guard>,
    tx: watch::Sender<AuthSnapshot>,
}

impl Shared {
    fn guard(&self) -> MutexGuard<'_, Guard> {
        self.guard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_event(&self, event: &AuthEvent) {
        let mut guard = self.guard();
        if !guard.mounted {
            return;
        }
        guard.epoch += 1;
        let user = match event {
            AuthEvent::SignedIn(user) => Some(user.clone()),
            AuthEvent::SignedOut => None,
        };
        self.tx.send_modify(|state| {
            state.user = user;
            state.loading = false;
        });
    }

    fn apply_initial(&self, mount_epoch: u64, user: Option<User>) {
        let guard = self.guard();
        if !guard.mounted {
            return;
        }
        if guard.epoch != mount_epoch {
            tracing::debug!("Discarding initial user fetch superseded by an auth event");
            return;
        }
        self.tx.send_modify(|state| {
            state.user = user;
            state.loading = false;
        });
    }
}

pub struct AuthState {
    client: Arc<AuthClient>,
    navigator: Arc<dyn Navigator>,
    login_path: String,
    dashboard_path: String,
    shared: Arc<Shared>,
    subscription: Mutex<Option<Subscription>>,
    fetch: Mutex<Option<JoinHandle<()>>>,
}

impl AuthState {
    /// Subscribe and start resolving the current user. Must be called within
    /// a Tokio runtime.
    pub fn mount(client: Arc<AuthClient>, navigator: Arc<dyn Navigator>, rules: &GateRules) -> Self {
        let (tx, _) = watch::channel(AuthSnapshot::loading());
        let shared = Arc::new(Shared {
            guard: Mutex::new(Guard {
                epoch: 0,
                mounted: true,
            }),
            tx,
        });

        let listener = Arc::clone(&shared);
        let subscription = client.on_auth_state_change(move |event| listener.apply_event(event));

        let mount_epoch = shared.guard().epoch;
        let fetcher = Arc::clone(&shared);
        let fetch_client = Arc::clone(&client);
        let fetch = tokio::spawn(async move {
            let user = match fetch_client.get_current_user().await {
                Ok(user) => user,
                Err(e) => {
                    tracing::warn!("Resolving current user failed, treating as signed out: {}", e);
                    None
                }
            };
            fetcher.apply_initial(mount_epoch, user);
        });

        Self {
            client,
            navigator,
            login_path: rules.login_path().to_string(),
            dashboard_path: rules.dashboard_path().to_string(),
            shared,
            subscription: Mutex::new(Some(subscription)),
            fetch: Mutex::new(Some(fetch)),
        }
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.shared.tx.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.shared.tx.borrow().user.clone()
    }

    pub fn loading(&self) -> bool {
        self.shared.tx.borrow().loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.shared.tx.borrow().is_authenticated()
    }

    /// Receiver notified on every state change
    pub fn watch(&self) -> watch::Receiver<AuthSnapshot> {
        self.shared.tx.subscribe()
    }

    /// Sign out, then navigate to the login page
    pub async fn sign_out(&self) {
        self.client.sign_out().await;
        self.redirect_to_login();
    }

    pub fn redirect_to_login(&self) {
        self.navigator.navigate(&self.login_path);
    }

    pub fn redirect_to_dashboard(&self) {
        self.navigator.navigate(&self.dashboard_path);
    }

    /// Stop listening and cancel the pending fetch; the state is frozen
    /// afterwards
    pub fn unmount(&self) {
        self.shared.guard().mounted = false;
        if let Some(subscription) = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            subscription.unsubscribe();
        }
        if let Some(fetch) = self.fetch.lock().unwrap_or_else(PoisonError::into_inner).take() {
            fetch.abort();
        }
    }
}

impl Drop for AuthState {
    fn drop(&mut self) {
        self.unmount();
    }
}
