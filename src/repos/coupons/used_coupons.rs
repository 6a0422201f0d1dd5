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
use schema::coupon_usage::dsl as CouponUsage;

/// UsedCoupons repository, responsible for handling coupon_usage table.
/// The ledger is append only, there is no update or delete.
pub struct UsedCouponsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<UsedCoupon>>,
}

pub trait UsedCouponsRepo {
    /// Creates new used coupon record. A second record for the same user and coupon
    /// fails with `errors::Error::UniqueViolation` in the cause chain.
    fn create(&self, payload: NewUsedCoupon) -> RepoResult<UsedCoupon>;

    /// Check user used coupon
    fn user_used_coupon(&self, id_arg: CouponId, user_id_arg: UserId) -> RepoResult<bool>;

    /// List used coupons of user
    fn list_for_user(&self, user_id_arg: UserId) -> RepoResult<Vec<UsedCoupon>>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> UsedCouponsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<UsedCoupon>>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> UsedCouponsRepo
    for UsedCouponsRepoImpl<'a, T>
{
    fn create(&self, payload: NewUsedCoupon) -> RepoResult<UsedCoupon> {
        debug!("Create new used coupon record {:?}.", payload);

        let query = diesel::insert_into(CouponUsage::coupon_usage).values(&payload);
        query
            .get_result::<UsedCoupon>(self.db_conn)
            .map_err(from_diesel)
            .and_then(|value| {
                acl::check(&*self.acl, Resource::UsedCoupons, Action::Create, self, Some(&value))?;

                Ok(value)
            }).map_err(|e: FailureError| {
                e.context(format!("Creates new used coupon record: {:?} error occurred", payload))
                    .into()
            })
    }

    fn user_used_coupon(&self, id_arg: CouponId, user_id_arg: UserId) -> RepoResult<bool> {
        debug!("Check coupon_id: {} for user_id: {}.", id_arg, user_id_arg);

        let query = CouponUsage::coupon_usage
            .filter(CouponUsage::coupon_id.eq(&id_arg))
            .filter(CouponUsage::user_id.eq(&user_id_arg));

        query
            .get_result::<UsedCoupon>(self.db_conn)
            .optional()
            .map_err(from_diesel)
            .and_then(|value| match value {
                Some(value) => {
                    acl::check(&*self.acl, Resource::UsedCoupons, Action::Read, self, Some(&value))?;
                    Ok(true)
                }
                None => Ok(false),
            }).map_err(|e: FailureError| {
                e.context(format!("Check coupon_id: {} for user_id: {}.", id_arg, user_id_arg))
                    .into()
            })
    }

    fn list_for_user(&self, user_id_arg: UserId) -> RepoResult<Vec<UsedCoupon>> {
        debug!("List used coupons of user {}.", user_id_arg);

        let query = CouponUsage::coupon_usage
            .filter(CouponUsage::user_id.eq(&user_id_arg))
            .order(CouponUsage::used_at.desc());

        query
            .get_results::<UsedCoupon>(self.db_conn)
            .map_err(from_diesel)
            .and_then(|values| {
                for value in &values {
                    acl::check(&*self.acl, Resource::UsedCoupons, Action::Read, self, Some(value))?;
                }

                Ok(values)
            }).map_err(|e: FailureError| e.context(format!("List used coupons of user {} failed.", user_id_arg)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, UsedCoupon>
    for UsedCouponsRepoImpl<'a, T>
{
    fn is_in_scope(&self, user_id: UserId, scope: &Scope, obj: Option<&UsedCoupon>) -> bool {
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
