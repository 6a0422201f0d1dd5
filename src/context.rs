//! Contexts shared by services. Static context lives as long as the app,
//! dynamic context is built for every request by the host route layer.
use std::sync::Arc;

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use futures_cpupool::CpuPool;
use r2d2::{ManageConnection, Pool};

use config::Config;
use models::{UserId, UserSession};
use repos::repo_factory::ReposFactory;
use services::rate_limit::RateLimiter;

/// Static context for all app
pub struct StaticContext<T, M, F>
where
    T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
    M: ManageConnection<Connection = T>,
    F: ReposFactory<T>,
{
    pub db_pool: Pool<M>,
    pub cpu_pool: CpuPool,
    pub config: Arc<Config>,
    pub repo_factory: F,
    pub rate_limiter: Arc<RateLimiter>,
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > StaticContext<T, M, F>
{
    /// Create a new static context
    pub fn new(db_pool: Pool<M>, cpu_pool: CpuPool, config: Arc<Config>, repo_factory: F, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            db_pool,
            cpu_pool,
            config,
            repo_factory,
            rate_limiter,
        }
    }
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > Clone for StaticContext<T, M, F>
{
    fn clone(&self) -> Self {
        Self {
            db_pool: self.db_pool.clone(),
            cpu_pool: self.cpu_pool.clone(),
            config: self.config.clone(),
            repo_factory: self.repo_factory.clone(),
            rate_limiter: self.rate_limiter.clone(),
        }
    }
}

/// Dynamic context for each request
#[derive(Clone, Debug, Default)]
pub struct DynamicContext {
    pub session: Option<UserSession>,
    /// Address of the requesting client, keys the rate limiter for guests
    pub client_addr: Option<String>,
}

impl DynamicContext {
    /// Create a new dynamic context for each request
    pub fn new(session: Option<UserSession>, client_addr: Option<String>) -> Self {
        Self { session, client_addr }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.session.map(|session| session.user_id)
    }

    pub fn rate_limit_key(&self) -> Option<String> {
        match (self.user_id(), self.client_addr.as_ref()) {
            (Some(user_id), _) => Some(format!("user:{}", user_id)),
            (None, Some(addr)) => Some(format!("addr:{}", addr)),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_key_prefers_user() {
        let context = DynamicContext::new(Some(UserSession::new(UserId(42), false)), Some("10.0.0.1".to_string()));
        assert_eq!(context.rate_limit_key(), Some("user:42".to_string()));

        let context = DynamicContext::new(None, Some("10.0.0.1".to_string()));
        assert_eq!(context.rate_limit_key(), Some("addr:10.0.0.1".to_string()));

        assert_eq!(DynamicContext::default().rate_limit_key(), None);
    }
}
