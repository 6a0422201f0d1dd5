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
use schema::reward_redemptions::dsl as Redemptions;

/// Redemptions repository, responsible for handling reward_redemptions table.
/// Status updates are conditioned on `status = 'active'`, terminal rows never move.
pub struct RewardRedemptionsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<RewardRedemption>>,
}

pub trait RewardRedemptionsRepo {
    /// Creates new redemption
    fn create(&self, payload: NewRewardRedemption) -> RepoResult<RewardRedemption>;

    /// Get redemption
    fn get(&self, id_arg: RedemptionId) -> RepoResult<Option<RewardRedemption>>;

    /// List redemptions of user, newest first
    fn list_for_user(&self, user_id_arg: UserId) -> RepoResult<Vec<RewardRedemption>>;

    /// Moves active redemption to used. Returns None if it is not active.
    fn mark_used(&self, id_arg: RedemptionId) -> RepoResult<Option<RewardRedemption>>;

    /// Moves active redemption to cancelled. Returns None if it is not active.
    fn cancel(&self, id_arg: RedemptionId) -> RepoResult<Option<RewardRedemption>>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> RewardRedemptionsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<RewardRedemption>>) -> Self {
        Self { db_conn, acl }
    }

    fn transition(&self, id_arg: RedemptionId, next: RedemptionStatus) -> RepoResult<Option<RewardRedemption>> {
        acl::check(&*self.acl, Resource::RewardRedemptions, Action::Update, self, None)?;

        if !RedemptionStatus::Active.can_transition_to(next) {
            return Err(format_err!("Reward redemption {} can not move to {}", id_arg, next));
        }

        let filtered = Redemptions::reward_redemptions
            .filter(Redemptions::id.eq(&id_arg))
            .filter(Redemptions::status.eq(RedemptionStatus::Active));

        let result = match next {
            RedemptionStatus::Used => diesel::update(filtered)
                .set((Redemptions::status.eq(next), Redemptions::used_at.eq(SystemTime::now())))
                .get_result::<RewardRedemption>(self.db_conn),
            _ => diesel::update(filtered)
                .set(Redemptions::status.eq(next))
                .get_result::<RewardRedemption>(self.db_conn),
        };

        result.optional().map_err(from_diesel)
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> RewardRedemptionsRepo
    for RewardRedemptionsRepoImpl<'a, T>
{
    fn create(&self, payload: NewRewardRedemption) -> RepoResult<RewardRedemption> {
        debug!("Create new reward redemption {:?}.", payload);

        let query = diesel::insert_into(Redemptions::reward_redemptions).values(&payload);
        query
            .get_result::<RewardRedemption>(self.db_conn)
            .map_err(from_diesel)
            .and_then(|value| {
                acl::check(&*self.acl, Resource::RewardRedemptions, Action::Create, self, Some(&value))?;

                Ok(value)
            }).map_err(|e: FailureError| {
                e.context(format!("Creates new reward redemption: {:?} error occurred", payload))
                    .into()
            })
    }

    fn get(&self, id_arg: RedemptionId) -> RepoResult<Option<RewardRedemption>> {
        debug!("Find in reward redemptions with id {}.", id_arg);
        let query = Redemptions::reward_redemptions.filter(Redemptions::id.eq(&id_arg));
        query
            .get_result::<RewardRedemption>(self.db_conn)
            .optional()
            .map_err(from_diesel)
            .and_then(|value| {
                if let Some(value) = value.as_ref() {
                    acl::check(&*self.acl, Resource::RewardRedemptions, Action::Read, self, Some(value))?;
                };

                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find reward redemption by id: {} error occurred", id_arg)).into())
    }

    fn list_for_user(&self, user_id_arg: UserId) -> RepoResult<Vec<RewardRedemption>> {
        debug!("List reward redemptions of user {}.", user_id_arg);
        let query = Redemptions::reward_redemptions
            .filter(Redemptions::user_id.eq(&user_id_arg))
            .order(Redemptions::redeemed_at.desc());

        query
            .get_results::<RewardRedemption>(self.db_conn)
            .map_err(from_diesel)
            .and_then(|values| {
                for value in &values {
                    acl::check(&*self.acl, Resource::RewardRedemptions, Action::Read, self, Some(value))?;
                }

                Ok(values)
            }).map_err(|e: FailureError| {
                e.context(format!("List reward redemptions of user {} failed.", user_id_arg))
                    .into()
            })
    }

    fn mark_used(&self, id_arg: RedemptionId) -> RepoResult<Option<RewardRedemption>> {
        debug!("Mark reward redemption {} as used.", id_arg);
        self.transition(id_arg, RedemptionStatus::Used)
            .map_err(|e: FailureError| e.context(format!("Mark reward redemption {} as used error occurred", id_arg)).into())
    }

    fn cancel(&self, id_arg: RedemptionId) -> RepoResult<Option<RewardRedemption>> {
        debug!("Cancel reward redemption {}.", id_arg);
        self.transition(id_arg, RedemptionStatus::Cancelled)
            .map_err(|e: FailureError| e.context(format!("Cancel reward redemption {} error occurred", id_arg)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, RewardRedemption>
    for RewardRedemptionsRepoImpl<'a, T>
{
    fn is_in_scope(&self, user_id: UserId, scope: &Scope, obj: Option<&RewardRedemption>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => {
                if let Some(value) = obj {
                    value.user_id == user_id
                } else {
                    false
                }
            }
        }
    }
}
