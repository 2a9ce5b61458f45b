//! Service wiring.
//!
//! Services follow constructor injection; this bundles the graph the server,
//! the CLI and the integration tests all build the same way.

use std::sync::Arc;
use std::time::Duration;

use accessgate_core::config::AppConfig;
use accessgate_database::Stores;
use accessgate_nas::NasAdapterRegistry;

use crate::accounting::AccountingEngine;
use crate::control::ControlDispatchQueue;
use crate::policy::PolicyResolver;
use crate::quota::QuotaEnforcer;
use crate::session::SessionService;

/// All application services, sharing one set of stores.
#[derive(Clone)]
pub struct Services {
    pub policy: Arc<PolicyResolver>,
    pub dispatch: Arc<ControlDispatchQueue>,
    pub enforcer: Arc<QuotaEnforcer>,
    pub accounting: Arc<AccountingEngine>,
    pub sessions: Arc<SessionService>,
}

impl Services {
    /// Build the service graph over `stores`.
    pub fn new(stores: &Stores, registry: Arc<NasAdapterRegistry>, config: &AppConfig) -> Self {
        let policy = Arc::new(PolicyResolver::new(
            stores.profiles.clone(),
            Duration::from_secs(config.session.profile_cache_ttl_seconds),
        ));
        let dispatch = Arc::new(ControlDispatchQueue::new(
            stores.sessions.clone(),
            stores.control_requests.clone(),
            registry,
            &config.dispatch,
            &config.nas,
        ));
        let enforcer = Arc::new(QuotaEnforcer::new(
            stores.sessions.clone(),
            Arc::clone(&dispatch),
        ));
        let accounting = Arc::new(AccountingEngine::new(
            stores.sessions.clone(),
            Arc::clone(&policy),
            Arc::clone(&enforcer),
        ));
        let sessions = Arc::new(SessionService::new(
            stores.sessions.clone(),
            Arc::clone(&policy),
        ));

        Self {
            policy,
            dispatch,
            enforcer,
            accounting,
            sessions,
        }
    }
}
