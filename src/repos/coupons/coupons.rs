use std::time::SystemTime;

use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::dsl::exists;
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
use schema::coupons;
use schema::coupons::dsl as Coupons;

/// Coupons repository, responsible for handling coupons table
pub struct CouponsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<Coupon>>,
}

pub trait CouponsRepo {
    /// Creates new coupon
    fn create(&self, payload: InsertCoupon) -> RepoResult<Coupon>;

    /// Get coupon
    fn get(&self, id_arg: CouponId) -> RepoResult<Option<Coupon>>;

    /// Get coupon by code, the code is compared upper cased
    fn get_by_code(&self, code_arg: CouponCode) -> RepoResult<Option<Coupon>>;

    /// Checks if any coupon already carries the code
    fn code_exists(&self, code_arg: CouponCode) -> RepoResult<bool>;

    /// Search coupons by optional filters
    fn search(&self, terms: CouponSearchTerms) -> RepoResult<Vec<Coupon>>;

    /// Update coupon
    fn update(&self, id_arg: CouponId, payload: UpdateCoupon) -> RepoResult<Coupon>;

    /// Atomically increments used_count. Returns None if the coupon is gone.
    fn increment_usage(&self, id_arg: CouponId) -> RepoResult<Option<Coupon>>;

    /// Deactivates coupons minted by the redemption
    fn deactivate_by_redemption(&self, redemption_id_arg: RedemptionId) -> RepoResult<Vec<Coupon>>;

    /// Delete coupon
    fn delete(&self, id_arg: CouponId) -> RepoResult<Coupon>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CouponsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<Coupon>>) -> Self {
        Self { db_conn, acl }
    }

    fn check_all(&self, action: Action, values: &[Coupon]) -> RepoResult<()> {
        for value in values {
            acl::check(&*self.acl, Resource::Coupons, action, self, Some(value))?;
        }
        Ok(())
    }
}

fn from_raw_optional(value: Option<RawCoupon>) -> RepoResult<Option<Coupon>> {
    match value {
        Some(raw) => Coupon::from_raw(raw).map(Some),
        None => Ok(None),
    }
}

fn from_raw_many(values: Vec<RawCoupon>) -> RepoResult<Vec<Coupon>> {
    values.into_iter().map(Coupon::from_raw).collect()
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CouponsRepo for CouponsRepoImpl<'a, T> {
    fn create(&self, payload: InsertCoupon) -> RepoResult<Coupon> {
        debug!("Create new coupon {:?}.", payload);

        acl::check(&*self.acl, Resource::Coupons, Action::Create, self, None)?;

        let query = diesel::insert_into(Coupons::coupons).values(&payload);
        query
            .get_result::<RawCoupon>(self.db_conn)
            .map_err(from_diesel)
            .and_then(Coupon::from_raw)
            .map_err(|e: FailureError| e.context(format!("Creates new coupon: {:?} error occurred", payload)).into())
    }

    fn get(&self, id_arg: CouponId) -> RepoResult<Option<Coupon>> {
        debug!("Find in coupon with id {}.", id_arg);
        let query = Coupons::coupons.filter(Coupons::id.eq(&id_arg));
        query
            .get_result::<RawCoupon>(self.db_conn)
            .optional()
            .map_err(from_diesel)
            .and_then(from_raw_optional)
            .and_then(|value: Option<Coupon>| {
                if let Some(value) = value.as_ref() {
                    acl::check(&*self.acl, Resource::Coupons, Action::Read, self, Some(value))?;
                };

                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find coupon by id: {} error occurred", id_arg)).into())
    }

    fn get_by_code(&self, code_arg: CouponCode) -> RepoResult<Option<Coupon>> {
        let code_arg = code_arg.normalized();
        debug!("Find in coupon with coupon code: {}.", code_arg);
        let query = Coupons::coupons.filter(Coupons::code.eq(&code_arg));
        query
            .get_result::<RawCoupon>(self.db_conn)
            .optional()
            .map_err(from_diesel)
            .and_then(from_raw_optional)
            .and_then(|value: Option<Coupon>| {
                if let Some(value) = value.as_ref() {
                    acl::check(&*self.acl, Resource::Coupons, Action::Read, self, Some(value))?;
                };

                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find coupon by code: {} error occurred", code_arg)).into())
    }

    fn code_exists(&self, code_arg: CouponCode) -> RepoResult<bool> {
        let code_arg = code_arg.normalized();
        debug!("Check if coupon code {} exists.", code_arg);

        acl::check(&*self.acl, Resource::Coupons, Action::Read, self, None)?;

        let query = diesel::select(exists(Coupons::coupons.filter(Coupons::code.eq(&code_arg))));
        query
            .get_result::<bool>(self.db_conn)
            .map_err(from_diesel)
            .map_err(|e: FailureError| e.context(format!("Check if coupon code {} exists error occurred", code_arg)).into())
    }

    fn search(&self, terms: CouponSearchTerms) -> RepoResult<Vec<Coupon>> {
        debug!("Get coupons by search terms: {:?}.", terms);

        let mut query: coupons::BoxedQuery<Pg> = Coupons::coupons.into_boxed();
        if let Some(is_active) = terms.is_active {
            query = query.filter(Coupons::is_active.eq(is_active));
        }
        if let Some(coupon_type) = terms.coupon_type {
            query = query.filter(Coupons::coupon_type.eq(coupon_type));
        }
        if let Some(owner_user_id) = terms.owner_user_id {
            query = query.filter(Coupons::owner_user_id.eq(owner_user_id));
        }
        if let Some(source_redemption_id) = terms.source_redemption_id {
            query = query.filter(Coupons::source_redemption_id.eq(source_redemption_id));
        }

        query
            .order(Coupons::id.desc())
            .get_results::<RawCoupon>(self.db_conn)
            .map_err(from_diesel)
            .and_then(from_raw_many)
            .and_then(|values| {
                self.check_all(Action::Read, &values)?;
                Ok(values)
            }).map_err(|e: FailureError| e.context(format!("Search coupons by {:?} failed.", terms)).into())
    }

    fn update(&self, id_arg: CouponId, payload: UpdateCoupon) -> RepoResult<Coupon> {
        debug!("Updating coupon with id {} and payload {:?}.", id_arg, payload);
        let query = Coupons::coupons.find(&id_arg);

        query
            .get_result::<RawCoupon>(self.db_conn)
            .map_err(from_diesel)
            .and_then(Coupon::from_raw)
            .and_then(|value| acl::check(&*self.acl, Resource::Coupons, Action::Update, self, Some(&value)))
            .and_then(|_| {
                let filtered = Coupons::coupons.filter(Coupons::id.eq(&id_arg));
                let query = diesel::update(filtered).set((&payload, Coupons::updated_at.eq(SystemTime::now())));

                query
                    .get_result::<RawCoupon>(self.db_conn)
                    .map_err(from_diesel)
                    .and_then(Coupon::from_raw)
            }).map_err(|e: FailureError| {
                e.context(format!("Updates specific coupon: id: {}, payload: {:?}, error occurred", id_arg, payload))
                    .into()
            })
    }

    fn increment_usage(&self, id_arg: CouponId) -> RepoResult<Option<Coupon>> {
        debug!("Increment usage of coupon with id {}.", id_arg);

        acl::check(&*self.acl, Resource::Coupons, Action::Update, self, None)?;

        let filtered = Coupons::coupons.filter(Coupons::id.eq(&id_arg));
        let query = diesel::update(filtered).set((
            Coupons::used_count.eq(Coupons::used_count + 1),
            Coupons::updated_at.eq(SystemTime::now()),
        ));

        query
            .get_result::<RawCoupon>(self.db_conn)
            .optional()
            .map_err(from_diesel)
            .and_then(from_raw_optional)
            .map_err(|e: FailureError| e.context(format!("Increment usage of coupon {} error occurred", id_arg)).into())
    }

    fn deactivate_by_redemption(&self, redemption_id_arg: RedemptionId) -> RepoResult<Vec<Coupon>> {
        debug!("Deactivate coupons minted by redemption {}.", redemption_id_arg);

        acl::check(&*self.acl, Resource::Coupons, Action::Update, self, None)?;

        let filtered = Coupons::coupons.filter(Coupons::source_redemption_id.eq(redemption_id_arg));
        let query = diesel::update(filtered).set((Coupons::is_active.eq(false), Coupons::updated_at.eq(SystemTime::now())));

        query
            .get_results::<RawCoupon>(self.db_conn)
            .map_err(from_diesel)
            .and_then(from_raw_many)
            .map_err(|e: FailureError| {
                e.context(format!("Deactivate coupons of redemption {} error occurred", redemption_id_arg))
                    .into()
            })
    }

    fn delete(&self, id_arg: CouponId) -> RepoResult<Coupon> {
        debug!("Delete coupon with id {:?}.", id_arg);

        acl::check(&*self.acl, Resource::Coupons, Action::Delete, self, None)?;

        let filtered = Coupons::coupons.filter(Coupons::id.eq(&id_arg));
        let query = diesel::delete(filtered);

        query
            .get_result::<RawCoupon>(self.db_conn)
            .map_err(from_diesel)
            .and_then(Coupon::from_raw)
            .map_err(|e: FailureError| e.context(format!("Delete coupon: {:?} error occurred", id_arg)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, Coupon>
    for CouponsRepoImpl<'a, T>
{
    fn is_in_scope(&self, user_id: UserId, scope: &Scope, obj: Option<&Coupon>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => {
                if let Some(value) = obj {
                    value.owner_user_id == Some(user_id)
                } else {
                    false
                }
            }
        }
    }
}
