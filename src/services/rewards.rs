//! Rewards Services, turns points into personal coupons and presents
//! CRUD operations with rewards

use std::time::{Duration, SystemTime};

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use futures::future;
use r2d2::ManageConnection;
use validator::Validate;

use super::coupons::unique_coupon_code;
use super::types::ServiceFuture;
use errors::Error;
use models::*;
use repos::ReposFactory;
use services::Service;

const SECONDS_IN_DAY: u64 = 24 * 60 * 60;

pub trait RewardsService {
    /// Spends points of the session user on a reward and mints the personal coupon
    fn redeem_reward(&self, payload: RedeemRewardPayload) -> ServiceFuture<RedemptionOutcome>;
    /// Creates new reward
    fn create_reward(&self, payload: NewReward) -> ServiceFuture<Reward>;
    /// Updates reward
    fn update_reward(&self, id_arg: RewardId, payload: UpdateReward) -> ServiceFuture<Reward>;
    /// Lists rewards, inactive ones are listed for admins only
    fn list_rewards(&self) -> ServiceFuture<Vec<Reward>>;
    /// Returns reward by id
    fn get_reward(&self, id_arg: RewardId) -> ServiceFuture<Option<Reward>>;
    /// Redemptions of the session user with their effective status
    fn list_redemptions(&self) -> ServiceFuture<Vec<RewardRedemption>>;
    /// Cancels active redemption and deactivates its coupon
    fn cancel_redemption(&self, id_arg: RedemptionId) -> ServiceFuture<Option<RewardRedemption>>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > RewardsService for Service<T, M, F>
{
    fn redeem_reward(&self, payload: RedeemRewardPayload) -> ServiceFuture<RedemptionOutcome> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();
        let coupons_config = self.static_context.config.coupons.clone();

        let user_id = match self.dynamic_context.user_id() {
            Some(user_id) => user_id,
            None => {
                return Box::new(future::err(
                    format_err!("Denied request to redeem reward for unauthorized user")
                        .context(Error::Forbidden)
                        .into(),
                ));
            }
        };

        self.spawn_on_pool(move |conn| {
            let rewards_repo = repo_factory.create_rewards_repo(&*conn, session);
            let user_points_repo = repo_factory.create_user_points_repo(&*conn, session);
            let redemptions_repo = repo_factory.create_reward_redemptions_repo(&*conn, session);
            let coupons_repo = repo_factory.create_coupons_repo_with_sys_acl(&*conn);

            conn.transaction::<RedemptionOutcome, FailureError, _>(move || {
                let reward = match rewards_repo.get(payload.reward_id)? {
                    Some(ref reward) if !reward.is_active => {
                        return Ok(RedemptionOutcome::Rejected(RedemptionRejection::NotFound));
                    }
                    Some(reward) => reward,
                    None => return Ok(RedemptionOutcome::Rejected(RedemptionRejection::NotFound)),
                };

                if payload.current_points < reward.points_cost {
                    return Ok(RedemptionOutcome::Rejected(RedemptionRejection::InsufficientPoints {
                        required: reward.points_cost,
                        available: payload.current_points,
                    }));
                }

                // balance handed over by the caller may be stale, the guarded update has the last word
                if user_points_repo.deduct(user_id, reward.points_cost)?.is_none() {
                    let available = user_points_repo.get(user_id)?.map(|p| p.points).unwrap_or(Points(0));
                    return Ok(RedemptionOutcome::Rejected(RedemptionRejection::InsufficientPoints {
                        required: reward.points_cost,
                        available,
                    }));
                }

                let code = unique_coupon_code(
                    &*coupons_repo,
                    Some(coupons_config.generated_code_prefix.as_str()),
                    coupons_config.generated_code_length,
                    coupons_config.code_generation_attempts,
                )?;
                let expires_at = SystemTime::now() + Duration::from_secs(coupons_config.redemption_validity_days * SECONDS_IN_DAY);

                let redemption = redemptions_repo.create(NewRewardRedemption {
                    user_id,
                    reward_id: reward.id,
                    points_spent: reward.points_cost,
                    coupon_code: code.clone(),
                    status: RedemptionStatus::Active,
                    expires_at,
                })?;

                let coupon = coupons_repo.create(InsertCoupon {
                    code,
                    description: Some(reward.title.clone()),
                    discount_type: reward.prize.discount_type(),
                    discount_value: reward.prize.discount_value(),
                    target_product_id: reward.prize.target_product_id(),
                    min_order_value: reward.min_order_value,
                    max_uses: Some(1),
                    coupon_type: reward.coupon_type,
                    expires_at: Some(expires_at),
                    owner_user_id: Some(user_id),
                    source_redemption_id: Some(redemption.id),
                })?;

                info!(
                    "User {} redeemed reward {} for {} points, coupon {} issued.",
                    user_id, reward.id, reward.points_cost, coupon.code
                );

                Ok(RedemptionOutcome::Redeemed { redemption, coupon })
            }).map_err(|e| e.context("Service Rewards, redeem_reward endpoint error occurred.").into())
        })
    }

    fn create_reward(&self, payload: NewReward) -> ServiceFuture<Reward> {
        if let Err(e) = payload.validate() {
            return Box::new(future::err(
                format_err!("Reward {} is invalid", payload.title).context(Error::Validate(e)).into(),
            ));
        }

        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();
        let insert = InsertReward::from(&payload);

        self.spawn_on_pool(move |conn| {
            let rewards_repo = repo_factory.create_rewards_repo(&*conn, session);

            rewards_repo
                .create(insert)
                .map_err(|e| e.context("Service Rewards, create_reward endpoint error occurred.").into())
        })
    }

    fn update_reward(&self, id_arg: RewardId, payload: UpdateReward) -> ServiceFuture<Reward> {
        if let Err(e) = payload.validate() {
            return Box::new(future::err(
                format_err!("Update of reward {} is invalid", id_arg)
                    .context(Error::Validate(e))
                    .into(),
            ));
        }

        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let rewards_repo = repo_factory.create_rewards_repo(&*conn, session);

            rewards_repo
                .update(id_arg, payload)
                .map_err(|e| e.context("Service Rewards, update_reward endpoint error occurred.").into())
        })
    }

    fn list_rewards(&self) -> ServiceFuture<Vec<Reward>> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();
        let only_active = !session.map(|s| s.is_admin).unwrap_or(false);

        self.spawn_on_pool(move |conn| {
            let rewards_repo = repo_factory.create_rewards_repo(&*conn, session);

            rewards_repo
                .list(only_active)
                .map_err(|e| e.context("Service Rewards, list_rewards endpoint error occurred.").into())
        })
    }

    fn get_reward(&self, id_arg: RewardId) -> ServiceFuture<Option<Reward>> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();
        let is_admin = session.map(|s| s.is_admin).unwrap_or(false);

        self.spawn_on_pool(move |conn| {
            let rewards_repo = repo_factory.create_rewards_repo(&*conn, session);

            rewards_repo
                .get(id_arg)
                .map(|reward| reward.filter(|reward| is_admin || reward.is_active))
                .map_err(|e| e.context("Service Rewards, get_reward endpoint error occurred.").into())
        })
    }

    fn list_redemptions(&self) -> ServiceFuture<Vec<RewardRedemption>> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        let user_id = match self.dynamic_context.user_id() {
            Some(user_id) => user_id,
            None => {
                return Box::new(future::err(
                    format_err!("Denied request to list redemptions for unauthorized user")
                        .context(Error::Forbidden)
                        .into(),
                ));
            }
        };

        self.spawn_on_pool(move |conn| {
            let redemptions_repo = repo_factory.create_reward_redemptions_repo(&*conn, session);
            let now = SystemTime::now();

            redemptions_repo
                .list_for_user(user_id)
                .map(|redemptions| {
                    redemptions
                        .into_iter()
                        .map(|mut redemption| {
                            redemption.status = redemption.effective_status(now);
                            redemption
                        }).collect()
                }).map_err(|e| e.context("Service Rewards, list_redemptions endpoint error occurred.").into())
        })
    }

    fn cancel_redemption(&self, id_arg: RedemptionId) -> ServiceFuture<Option<RewardRedemption>> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let redemptions_repo = repo_factory.create_reward_redemptions_repo(&*conn, session);
            let coupons_repo = repo_factory.create_coupons_repo(&*conn, session);

            conn.transaction::<Option<RewardRedemption>, FailureError, _>(move || {
                let redemption = match redemptions_repo.cancel(id_arg)? {
                    Some(redemption) => redemption,
                    None => {
                        debug!("Redemption {} is not active, nothing to cancel.", id_arg);
                        return Ok(None);
                    }
                };
                let coupons = coupons_repo.deactivate_by_redemption(id_arg)?;
                info!("Redemption {} cancelled, {} coupons deactivated.", id_arg, coupons.len());

                Ok(Some(redemption))
            }).map_err(|e| e.context("Service Rewards, cancel_redemption endpoint error occurred.").into())
        })
    }
}
