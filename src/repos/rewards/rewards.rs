use std::time::SystemTime;

use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use errors::from_diesel;
use models::*;
use repos::acl;
use repos::legacy_acl::CheckScope;
use repos::types::{RepoAcl, RepoResult};
use schema::rewards;
use schema::rewards::dsl as Rewards;

/// Rewards repository, responsible for handling rewards table
pub struct RewardsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<Reward>>,
}

pub trait RewardsRepo {
    /// Creates new reward
    fn create(&self, payload: InsertReward) -> RepoResult<Reward>;

    /// Get reward
    fn get(&self, id_arg: RewardId) -> RepoResult<Option<Reward>>;

    /// List rewards, cheapest first
    fn list(&self, only_active: bool) -> RepoResult<Vec<Reward>>;

    /// Update reward
    fn update(&self, id_arg: RewardId, payload: UpdateReward) -> RepoResult<Reward>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> RewardsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<Reward>>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> RewardsRepo for RewardsRepoImpl<'a, T> {
    fn create(&self, payload: InsertReward) -> RepoResult<Reward> {
        debug!("Create new reward {:?}.", payload);

        acl::check(&*self.acl, Resource::Rewards, Action::Create, self, None)?;

        let query = diesel::insert_into(Rewards::rewards).values(&payload);
        query
            .get_result::<RawReward>(self.db_conn)
            .map_err(from_diesel)
            .and_then(Reward::from_raw)
            .map_err(|e: FailureError| e.context(format!("Creates new reward: {:?} error occurred", payload)).into())
    }

    fn get(&self, id_arg: RewardId) -> RepoResult<Option<Reward>> {
        debug!("Find in rewards with id {}.", id_arg);
        let query = Rewards::rewards.filter(Rewards::id.eq(&id_arg));
        query
            .get_result::<RawReward>(self.db_conn)
            .optional()
            .map_err(from_diesel)
            .and_then(|value| match value {
                Some(raw) => {
                    let value = Reward::from_raw(raw)?;
                    acl::check(&*self.acl, Resource::Rewards, Action::Read, self, Some(&value))?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }).map_err(|e: FailureError| e.context(format!("Find reward by id: {} error occurred", id_arg)).into())
    }

    fn list(&self, only_active: bool) -> RepoResult<Vec<Reward>> {
        debug!("Find rewards, only active: {}.", only_active);

        let query: rewards::BoxedQuery<Pg> = Rewards::rewards.order((Rewards::points_cost, Rewards::id)).into_boxed();
        let query = if only_active {
            query.filter(Rewards::is_active.eq(true))
        } else {
            query
        };

        query
            .get_results::<RawReward>(self.db_conn)
            .map_err(from_diesel)
            .and_then(|values| values.into_iter().map(Reward::from_raw).collect::<RepoResult<Vec<Reward>>>())
            .and_then(|values| {
                for value in &values {
                    acl::check(&*self.acl, Resource::Rewards, Action::Read, self, Some(value))?;
                }

                Ok(values)
            }).map_err(|e: FailureError| e.context("List rewards").into())
    }

    fn update(&self, id_arg: RewardId, payload: UpdateReward) -> RepoResult<Reward> {
        debug!("Updating reward with id {} and payload {:?}.", id_arg, payload);
        let query = Rewards::rewards.find(&id_arg);

        query
            .get_result::<RawReward>(self.db_conn)
            .map_err(from_diesel)
            .and_then(Reward::from_raw)
            .and_then(|value| acl::check(&*self.acl, Resource::Rewards, Action::Update, self, Some(&value)))
            .and_then(|_| {
                let filtered = Rewards::rewards.filter(Rewards::id.eq(&id_arg));
                let query = diesel::update(filtered).set((&payload, Rewards::updated_at.eq(SystemTime::now())));

                query
                    .get_result::<RawReward>(self.db_conn)
                    .map_err(from_diesel)
                    .and_then(Reward::from_raw)
            }).map_err(|e: FailureError| {
                e.context(format!("Updates specific reward: id: {}, payload: {:?}, error occurred", id_arg, payload))
                    .into()
            })
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, Reward>
    for RewardsRepoImpl<'a, T>
{
    fn is_in_scope(&self, _user_id: UserId, scope: &Scope, _obj: Option<&Reward>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => false,
        }
    }
}
