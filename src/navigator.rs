use std::sync::Arc;

use crate::{
    auth::{DecodedClaim, TokenDecoder},
    error::GateError,
    gate,
    models::{Decision, NavigationResponse},
    route_table::RouteTable,
    store::{ACCESS_TOKEN_KEY, StoreState},
};

/// Navigation
///
/// The outcome of one navigation attempt: where the caller asked to go, where it
/// ends up, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct Navigation {
    pub requested: String,
    pub location: String,
    pub decision: Decision,
}

impl From<Navigation> for NavigationResponse {
    fn from(navigation: Navigation) -> Self {
        NavigationResponse {
            purge_credential: navigation.decision.purges_credential(),
            requested: navigation.requested,
            location: navigation.location,
            decision: navigation.decision,
        }
    }
}

/// evaluate
///
/// Resolves `path` against the table and runs the gate with an explicitly supplied
/// credential. Has no side effects; the caller applies any purge.
pub fn evaluate(
    table: &RouteTable,
    decoder: &TokenDecoder,
    path: &str,
    credential: Option<&str>,
) -> Result<Navigation, GateError> {
    let matched = table
        .resolve(path)
        .ok_or_else(|| GateError::RouteNotFound(path.to_string()))?;

    let decision = gate::authorize(&matched.route.meta, credential, decoder);

    let location = match decision.target() {
        None => path.to_string(),
        Some(target) => table.target_path(target).to_string(),
    };

    match decision {
        Decision::Allow => tracing::debug!(path, route = ?matched.route.name, "Navigation allowed"),
        Decision::Redirect { reason, .. } => {
            tracing::info!(path, %location, ?reason, "Navigation redirected")
        }
    }

    Ok(Navigation {
        requested: path.to_string(),
        location,
        decision,
    })
}

/// Navigator
///
/// The call site that owns storage access around the gate: it reads the stored
/// credential, evaluates the navigation, and deletes the credential when the
/// decision requires it.
#[derive(Clone)]
pub struct Navigator {
    table: Arc<RouteTable>,
    decoder: Arc<TokenDecoder>,
    store: StoreState,
}

impl Navigator {
    pub fn new(table: Arc<RouteTable>, decoder: Arc<TokenDecoder>, store: StoreState) -> Self {
        Self {
            table,
            decoder,
            store,
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn navigate(&self, path: &str) -> Result<Navigation, GateError> {
        let credential = self.stored_credential();
        let navigation = evaluate(&self.table, &self.decoder, path, credential.as_deref())?;

        if navigation.decision.purges_credential() && self.store.remove(ACCESS_TOKEN_KEY).is_some()
        {
            tracing::warn!("Purged stored credential");
        }

        Ok(navigation)
    }

    pub fn login(&self, token: impl Into<String>) {
        self.store.set(ACCESS_TOKEN_KEY, token.into());
    }

    pub fn logout(&self) {
        self.store.remove(ACCESS_TOKEN_KEY);
    }

    pub fn is_logged_in(&self) -> bool {
        self.stored_credential().is_some()
    }

    /// Decodes the stored credential without touching the store.
    pub fn current_claim(&self) -> Option<DecodedClaim> {
        let token = self.stored_credential()?;
        self.decoder.decode(&token).ok()
    }

    fn stored_credential(&self) -> Option<String> {
        self.store
            .get(ACCESS_TOKEN_KEY)
            .filter(|token| !token.is_empty())
    }
}
