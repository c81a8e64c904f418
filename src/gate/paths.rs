//! Path classification and the gate decision table

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::RoutesConfig;

/// Framework assets and images never go through session resolution
static STATIC_ASSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/(?:_next/static|_next/image|favicon\.ico|.*\.(?:svg|png|jpg|jpeg|gif|webp)$)").unwrap()
});

pub fn is_static_asset(path: &str) -> bool {
    STATIC_ASSET.is_match(path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Protected,
    Auth,
    Neither,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    PassThrough,
    Redirect(String),
}

/// Route lists and redirect targets, built once at startup
#[derive(Debug, Clone)]
pub struct GateRules {
    protected_prefixes: Vec<String>,
    auth_prefixes: Vec<String>,
    login_path: String,
    dashboard_path: String,
}

impl GateRules {
    pub fn from_config(routes: &RoutesConfig) -> Self {
        Self {
            protected_prefixes: routes.protected_prefixes.clone(),
            auth_prefixes: routes.auth_prefixes.clone(),
            login_path: routes.login_path.clone(),
            dashboard_path: routes.dashboard_path.clone(),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn dashboard_path(&self) -> &str {
        &self.dashboard_path
    }

    /// Prefix match; a path in both lists counts as protected
    pub fn classify(&self, path: &str) -> PathClass {
        if self.protected_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            PathClass::Protected
        } else if self.auth_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            PathClass::Auth
        } else {
            PathClass::Neither
        }
    }

    pub fn decide(&self, class: PathClass, user_present: bool) -> GateDecision {
        match (class, user_present) {
            (PathClass::Protected, false) => GateDecision::Redirect(self.login_path.clone()),
            (PathClass::Auth, true) => GateDecision::Redirect(self.dashboard_path.clone()),
            _ => GateDecision::PassThrough,
        }
    }
}

impl Default for GateRules {
    fn default() -> Self {
        Self::from_config(&RoutesConfig::default())
    }
}
