//! Services is a core layer for the app business logic like
//! validation, authorization, etc.

pub mod coupons;
pub mod discounts;
pub mod rate_limit;
pub mod rewards;
pub mod types;

pub use self::coupons::*;
pub use self::rewards::*;
pub use self::types::*;

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use failure::Fail;
use r2d2::{ManageConnection, PooledConnection};

use context::{DynamicContext, StaticContext};
use errors::Error;
use repos::repo_factory::ReposFactory;

/// Service
pub struct Service<
    T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
    M: ManageConnection<Connection = T>,
    F: ReposFactory<T>,
> {
    pub static_context: StaticContext<T, M, F>,
    pub dynamic_context: DynamicContext,
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > Service<T, M, F>
{
    /// Create a new service
    pub fn new(static_context: StaticContext<T, M, F>, dynamic_context: DynamicContext) -> Self {
        Self {
            static_context,
            dynamic_context,
        }
    }

    /// Runs blocking repo work on the cpu pool with a connection taken from the db pool
    pub fn spawn_on_pool<R, Func>(&self, f: Func) -> ServiceFuture<R>
    where
        Func: FnOnce(PooledConnection<M>) -> Result<R, FailureError> + Send + 'static,
        R: Send + 'static,
    {
        let db_pool = self.static_context.db_pool.clone();
        let cpu_pool = self.static_context.cpu_pool.clone();
        Box::new(cpu_pool.spawn_fn(move || {
            db_pool
                .get()
                .map_err(|e| -> FailureError { e.context(Error::Connection).into() })
                .and_then(f)
        }))
    }
}
