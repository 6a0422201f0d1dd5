//! DocterBee coupons is the discount engine behind the store and service booking checkouts.
//! It prices coupons, records their usage and turns reward points into personal coupons.
//! The layered structure of the crate is
//!
//! `Route layer (host app) -> Service -> Repo + Acl`
//!
//! Each layer can throw Error with context or cover occurred error with
//! Error in the context. Expected business outcomes (rejected coupon, not enough points)
//! are returned as values, never as errors.

#![allow(proc_macro_derive_resolution_fallback)]
#![recursion_limit = "128"]
extern crate config as config_crate;
#[macro_use]
extern crate diesel;
#[macro_use]
extern crate failure;
extern crate futures;
extern crate futures_cpupool;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate r2d2;
extern crate regex;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
extern crate uuid;
extern crate validator;
#[macro_use]
extern crate validator_derive;

#[cfg(test)]
extern crate tokio_core;

#[macro_use]
pub mod macros;
pub mod config;
pub mod context;
pub mod errors;
pub mod models;
pub mod repos;
pub mod schema;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::r2d2::ConnectionManager;
use failure::Error as FailureError;
use failure::Fail;
use futures_cpupool::CpuPool;

use config::Config;
use context::StaticContext;
use errors::Error;
use repos::repo_factory::ReposFactoryImpl;
use services::rate_limit::{FixedWindowRateLimiter, NullRateLimiter, RateLimiter};

/// Production flavour of the static context
pub type AppContext = StaticContext<PgConnection, ConnectionManager<PgConnection>, ReposFactoryImpl>;

/// Prepares database pool, cpu pool and rate limiter from provided `Config`.
/// The returned context is shared by every request of the host route layer.
pub fn create_static_context(config: Config) -> Result<AppContext, FailureError> {
    let database_url = config.server.database.clone();
    let db_manager = ConnectionManager::<PgConnection>::new(database_url);
    let db_pool = r2d2::Pool::builder()
        .build(db_manager)
        .map_err(|e| e.context(Error::Connection))?;

    let thread_count = config.server.thread_count;
    let cpu_pool = CpuPool::new(thread_count);

    let rate_limiter = if config.rate_limit.enabled {
        let window = Duration::from_secs(config.rate_limit.window_secs);
        Arc::new(FixedWindowRateLimiter::new(config.rate_limit.max_requests, window)) as Arc<RateLimiter>
    } else {
        Arc::new(NullRateLimiter::default()) as Arc<RateLimiter>
    };

    info!(
        "Coupons engine context is ready, threads: {}, rate limit enabled: {}",
        thread_count, config.rate_limit.enabled
    );

    Ok(StaticContext::new(
        db_pool,
        cpu_pool,
        Arc::new(config),
        ReposFactoryImpl::default(),
        rate_limiter,
    ))
}
