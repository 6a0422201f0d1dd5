use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;

use models::*;
use repos::legacy_acl::{Acl, SystemACL};
use repos::*;

pub trait ReposFactory<C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static>: Clone + Send + 'static {
    fn create_coupons_repo<'a>(&self, db_conn: &'a C, session: Option<UserSession>) -> Box<CouponsRepo + 'a>;
    fn create_coupons_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<CouponsRepo + 'a>;
    fn create_used_coupons_repo<'a>(&self, db_conn: &'a C, session: Option<UserSession>) -> Box<UsedCouponsRepo + 'a>;
    fn create_rewards_repo<'a>(&self, db_conn: &'a C, session: Option<UserSession>) -> Box<RewardsRepo + 'a>;
    fn create_reward_redemptions_repo<'a>(&self, db_conn: &'a C, session: Option<UserSession>) -> Box<RewardRedemptionsRepo + 'a>;
    fn create_reward_redemptions_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<RewardRedemptionsRepo + 'a>;
    fn create_user_points_repo<'a>(&self, db_conn: &'a C, session: Option<UserSession>) -> Box<UserPointsRepo + 'a>;
    fn create_products_repo<'a>(&self, db_conn: &'a C, session: Option<UserSession>) -> Box<ProductsRepo + 'a>;
}

#[derive(Clone, Copy, Default)]
pub struct ReposFactoryImpl;

impl ReposFactoryImpl {
    fn get_acl<T>(&self, session: Option<UserSession>) -> Box<Acl<Resource, Action, Scope, FailureError, T>> {
        session.map_or(
            Box::new(UnauthorizedAcl::default()) as Box<Acl<Resource, Action, Scope, FailureError, T>>,
            |session| (Box::new(ApplicationAcl::new(session.roles(), session.user_id)) as Box<Acl<Resource, Action, Scope, FailureError, T>>),
        )
    }

    fn get_sys_acl<T>(&self) -> Box<Acl<Resource, Action, Scope, FailureError, T>> {
        Box::new(SystemACL::default()) as Box<Acl<Resource, Action, Scope, FailureError, T>>
    }
}

impl<C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ReposFactory<C> for ReposFactoryImpl {
    fn create_coupons_repo<'a>(&self, db_conn: &'a C, session: Option<UserSession>) -> Box<CouponsRepo + 'a> {
        let acl = self.get_acl(session);
        Box::new(CouponsRepoImpl::new(db_conn, acl)) as Box<CouponsRepo>
    }
    fn create_coupons_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<CouponsRepo + 'a> {
        Box::new(CouponsRepoImpl::new(db_conn, self.get_sys_acl())) as Box<CouponsRepo>
    }
    fn create_used_coupons_repo<'a>(&self, db_conn: &'a C, session: Option<UserSession>) -> Box<UsedCouponsRepo + 'a> {
        let acl = self.get_acl(session);
        Box::new(UsedCouponsRepoImpl::new(db_conn, acl)) as Box<UsedCouponsRepo>
    }
    fn create_rewards_repo<'a>(&self, db_conn: &'a C, session: Option<UserSession>) -> Box<RewardsRepo + 'a> {
        let acl = self.get_acl(session);
        Box::new(RewardsRepoImpl::new(db_conn, acl)) as Box<RewardsRepo>
    }
    fn create_reward_redemptions_repo<'a>(&self, db_conn: &'a C, session: Option<UserSession>) -> Box<RewardRedemptionsRepo + 'a> {
        let acl = self.get_acl(session);
        Box::new(RewardRedemptionsRepoImpl::new(db_conn, acl)) as Box<RewardRedemptionsRepo>
    }
    fn create_reward_redemptions_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<RewardRedemptionsRepo + 'a> {
        Box::new(RewardRedemptionsRepoImpl::new(db_conn, self.get_sys_acl())) as Box<RewardRedemptionsRepo>
    }
    fn create_user_points_repo<'a>(&self, db_conn: &'a C, session: Option<UserSession>) -> Box<UserPointsRepo + 'a> {
        let acl = self.get_acl(session);
        Box::new(UserPointsRepoImpl::new(db_conn, acl)) as Box<UserPointsRepo>
    }
    fn create_products_repo<'a>(&self, db_conn: &'a C, session: Option<UserSession>) -> Box<ProductsRepo + 'a> {
        let acl = self.get_acl(session);
        Box::new(ProductsRepoImpl::new(db_conn, acl)) as Box<ProductsRepo>
    }
}
