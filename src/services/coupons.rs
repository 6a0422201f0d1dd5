//! Coupons Services, prices coupons on checkouts, commits their usage
//! and presents CRUD operations with coupons

use std::time::SystemTime;

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use futures::future;
use r2d2::ManageConnection;
use uuid::Uuid;
use validator::Validate;

use super::discounts;
use super::types::ServiceFuture;
use errors::{is_unique_violation, Error};
use models::*;
use repos::{CouponsRepo, ProductsRepo, ReposFactory};
use services::Service;

pub trait CouponsService {
    /// Prices coupon against a checkout subtotal, changes nothing
    fn validate_coupon_price(&self, payload: CouponPricePayload) -> ServiceFuture<CouponCheck>;
    /// Commits usage of a coupon once the order is stored.
    /// Counts with the system acl for any caller, so only the order flow may reach it, never a public route.
    fn apply_coupon(&self, payload: ApplyCouponPayload) -> ServiceFuture<CouponApplication>;
    /// Creates new coupon
    fn create_coupon(&self, payload: NewCoupon) -> ServiceFuture<Coupon>;
    /// Returns coupon by id
    fn get_coupon(&self, id_arg: CouponId) -> ServiceFuture<Option<Coupon>>;
    /// Returns coupon by code
    fn get_coupon_by_code(&self, code: CouponCode) -> ServiceFuture<Option<Coupon>>;
    /// Search coupons
    fn search_coupons(&self, terms: CouponSearchTerms) -> ServiceFuture<Vec<Coupon>>;
    /// Update coupon
    fn update_coupon(&self, id_arg: CouponId, payload: UpdateCoupon) -> ServiceFuture<Coupon>;
    /// Deletes coupon
    fn delete_coupon(&self, id_arg: CouponId) -> ServiceFuture<Coupon>;
    /// Generate coupon code not taken by any coupon
    fn generate_coupon_code(&self) -> ServiceFuture<CouponCode>;
    /// Usage records of the session user
    fn list_used_coupons(&self) -> ServiceFuture<Vec<UsedCoupon>>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > CouponsService for Service<T, M, F>
{
    fn validate_coupon_price(&self, payload: CouponPricePayload) -> ServiceFuture<CouponCheck> {
        if let Err(e) = payload.validate() {
            return Box::new(future::err(
                format_err!("Coupon price payload {:?} is invalid", payload)
                    .context(Error::Validate(e))
                    .into(),
            ));
        }

        if let Some(key) = self.dynamic_context.rate_limit_key() {
            if !self.static_context.rate_limiter.check(&key) {
                return Box::new(future::err(
                    format_err!("Too many coupon checks from {}", key)
                        .context(Error::TooManyRequests)
                        .into(),
                ));
            }
        }

        let session = self.dynamic_context.session;
        let user_id = self.dynamic_context.user_id();
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let coupons_repo = repo_factory.create_coupons_repo(&*conn, session);
            let used_coupons_repo = repo_factory.create_used_coupons_repo(&*conn, session);
            let products_repo = repo_factory.create_products_repo(&*conn, session);

            {
                let coupon = match coupons_repo.get_by_code(payload.code.clone())? {
                    Some(coupon) => coupon,
                    None => return Ok(CouponCheck::Rejected(CouponRejection::NotFound)),
                };

                if let Err(rejection) = discounts::check_availability(&coupon, payload.domain, SystemTime::now()) {
                    return Ok(CouponCheck::Rejected(rejection));
                }

                if let Some(user_id) = user_id {
                    if used_coupons_repo.user_used_coupon(coupon.id, user_id)? {
                        return Ok(CouponCheck::Rejected(CouponRejection::AlreadyUsed));
                    }
                }

                if let Err(rejection) = discounts::check_minimum(&coupon, payload.subtotal) {
                    return Ok(CouponCheck::Rejected(rejection));
                }

                let free_product_price = free_product_price(&*products_repo, &coupon.discount)?;

                Ok(CouponCheck::Valid(discounts::quote(&coupon, payload.subtotal, free_product_price)))
            }.map_err(|e: FailureError| {
                e.context("Service Coupons, validate_coupon_price endpoint error occurred.")
                    .into()
            })
        })
    }

    fn apply_coupon(&self, payload: ApplyCouponPayload) -> ServiceFuture<CouponApplication> {
        let session = self.dynamic_context.session;
        let user_id = self.dynamic_context.user_id();
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let coupons_repo = repo_factory.create_coupons_repo_with_sys_acl(&*conn);
            let used_coupons_repo = repo_factory.create_used_coupons_repo(&*conn, session);
            let redemptions_repo = repo_factory.create_reward_redemptions_repo_with_sys_acl(&*conn);

            {
                let coupon = match coupons_repo.increment_usage(payload.coupon_id)? {
                    Some(coupon) => coupon,
                    None => {
                        warn!(
                            "Coupon {} vanished before usage of order {} {} was counted.",
                            payload.coupon_id, payload.order_type, payload.order_id
                        );
                        return Ok(CouponApplication {
                            committed: false,
                            usage_recorded: false,
                            warning: Some(format!("Coupon {} not found, usage was not counted", payload.coupon_id)),
                        });
                    }
                };
                info!(
                    "Coupon {} applied to {} order {}, used {} times.",
                    coupon.code, payload.order_type, payload.order_id, coupon.used_count
                );

                let mut warning = None;
                if let Some(redemption_id) = coupon.source_redemption_id {
                    match redemptions_repo.mark_used(redemption_id) {
                        Ok(Some(_)) => debug!("Redemption {} is used by coupon {}.", redemption_id, coupon.code),
                        Ok(None) => {
                            warn!("Redemption {} of coupon {} was not active.", redemption_id, coupon.code);
                            warning = Some(format!("Redemption {} was not active", redemption_id));
                        }
                        Err(e) => {
                            error!("Redemption {} of coupon {} was not marked used: {}", redemption_id, coupon.code, e);
                            warning = Some(format!("Redemption {} was not marked used", redemption_id));
                        }
                    }
                }

                let usage_recorded = match user_id {
                    Some(user_id) => {
                        let new_usage = NewUsedCoupon {
                            user_id,
                            coupon_id: coupon.id,
                            order_type: payload.order_type,
                            order_id: Some(payload.order_id),
                        };
                        match conn.transaction::<UsedCoupon, FailureError, _>(|| used_coupons_repo.create(new_usage)) {
                            Ok(_) => true,
                            Err(ref e) if is_unique_violation(e) => {
                                warn!("Usage of coupon {} by user {} is already recorded.", coupon.code, user_id);
                                false
                            }
                            Err(e) => return Err(e),
                        }
                    }
                    None => false,
                };

                Ok(CouponApplication {
                    committed: true,
                    usage_recorded,
                    warning,
                })
            }.map_err(|e: FailureError| e.context("Service Coupons, apply_coupon endpoint error occurred.").into())
        })
    }

    fn create_coupon(&self, payload: NewCoupon) -> ServiceFuture<Coupon> {
        if let Err(e) = payload.validate() {
            return Box::new(future::err(
                format_err!("Coupon {} is invalid", payload.code).context(Error::Validate(e)).into(),
            ));
        }

        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();
        let insert = InsertCoupon::from(&payload);

        self.spawn_on_pool(move |conn| {
            let coupons_repo = repo_factory.create_coupons_repo(&*conn, session);
            conn.transaction::<Coupon, FailureError, _>(move || coupons_repo.create(insert))
                .map_err(|e| e.context("Service Coupons, create_coupon endpoint error occurred.").into())
        })
    }

    fn get_coupon(&self, id_arg: CouponId) -> ServiceFuture<Option<Coupon>> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let coupons_repo = repo_factory.create_coupons_repo(&*conn, session);

            coupons_repo
                .get(id_arg)
                .map_err(|e| e.context("Service Coupons, get_coupon endpoint error occurred.").into())
        })
    }

    fn get_coupon_by_code(&self, code: CouponCode) -> ServiceFuture<Option<Coupon>> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let coupons_repo = repo_factory.create_coupons_repo(&*conn, session);

            coupons_repo
                .get_by_code(code)
                .map_err(|e| e.context("Service Coupons, get_coupon_by_code endpoint error occurred.").into())
        })
    }

    fn search_coupons(&self, terms: CouponSearchTerms) -> ServiceFuture<Vec<Coupon>> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let coupons_repo = repo_factory.create_coupons_repo(&*conn, session);

            coupons_repo
                .search(terms)
                .map_err(|e| e.context("Service Coupons, search_coupons endpoint error occurred.").into())
        })
    }

    fn update_coupon(&self, id_arg: CouponId, payload: UpdateCoupon) -> ServiceFuture<Coupon> {
        if let Err(e) = payload.validate() {
            return Box::new(future::err(
                format_err!("Update of coupon {} is invalid", id_arg)
                    .context(Error::Validate(e))
                    .into(),
            ));
        }

        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let coupons_repo = repo_factory.create_coupons_repo(&*conn, session);

            coupons_repo
                .update(id_arg, payload)
                .map_err(|e| e.context("Service Coupons, update_coupon endpoint error occurred.").into())
        })
    }

    fn delete_coupon(&self, id_arg: CouponId) -> ServiceFuture<Coupon> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let coupons_repo = repo_factory.create_coupons_repo(&*conn, session);

            coupons_repo
                .delete(id_arg)
                .map_err(|e| e.context("Service Coupons, delete_coupon endpoint error occurred.").into())
        })
    }

    fn generate_coupon_code(&self) -> ServiceFuture<CouponCode> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();
        let length = self.static_context.config.coupons.generated_code_length;
        let attempts = self.static_context.config.coupons.code_generation_attempts;

        self.spawn_on_pool(move |conn| {
            let coupons_repo = repo_factory.create_coupons_repo(&*conn, session);

            unique_coupon_code(&*coupons_repo, None, length, attempts)
                .map_err(|e| e.context("Service Coupons, generate_coupon_code endpoint error occurred.").into())
        })
    }

    fn list_used_coupons(&self) -> ServiceFuture<Vec<UsedCoupon>> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        let user_id = match self.dynamic_context.user_id() {
            Some(user_id) => user_id,
            None => {
                return Box::new(future::err(
                    format_err!("Denied request to list used coupons for unauthorized user")
                        .context(Error::Forbidden)
                        .into(),
                ));
            }
        };

        self.spawn_on_pool(move |conn| {
            let used_coupons_repo = repo_factory.create_used_coupons_repo(&*conn, session);

            used_coupons_repo
                .list_for_user(user_id)
                .map_err(|e| e.context("Service Coupons, list_used_coupons endpoint error occurred.").into())
        })
    }
}

/// Price of the product granted by a free product coupon.
/// Missing or inactive products are priced at nothing.
fn free_product_price(products_repo: &ProductsRepo, discount: &Discount) -> Result<Option<Amount>, FailureError> {
    let product_id = match *discount {
        Discount::FreeProduct { product_id } => product_id,
        _ => return Ok(None),
    };

    match products_repo.find_price(product_id)? {
        Some(ref product) if product.is_active => Ok(Some(product.price)),
        _ => {
            warn!("Free product {} is not available, coupon grants no discount.", product_id);
            Ok(None)
        }
    }
}

/// Random code from uuid v4 hex digits, `prefix` is joined with a dash
pub fn generate_code(prefix: Option<&str>, length: usize) -> CouponCode {
    let token = Uuid::new_v4()
        .simple()
        .to_string()
        .to_uppercase()
        .chars()
        .take(length)
        .collect::<String>();

    match prefix {
        Some(prefix) if !prefix.is_empty() => CouponCode(format!("{}-{}", prefix, token)),
        _ => CouponCode(token),
    }
}

/// Generates codes until one is free in the coupon store
pub fn unique_coupon_code(coupons_repo: &CouponsRepo, prefix: Option<&str>, length: usize, attempts: usize) -> Result<CouponCode, FailureError> {
    for _ in 0..attempts {
        let code = generate_code(prefix, length);
        if !coupons_repo.code_exists(code.clone())? {
            return Ok(code);
        }
        warn!("Generated coupon code {} is taken, retrying.", code);
    }

    Err(format_err!("No free coupon code found in {} attempts", attempts)
        .context(Error::UniqueViolation)
        .into())
}

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;
    use std::time::{Duration, SystemTime};

    use tokio_core::reactor::Core;

    use errors::{error_kind, Error};
    use models::*;
    use repos::repo_factory::tests::*;
    use services::rate_limit::FixedWindowRateLimiter;
    use services::*;

    fn price_payload(code: &str, subtotal: i64, domain: OrderDomain) -> CouponPricePayload {
        CouponPricePayload {
            code: CouponCode::from(code),
            subtotal: Amount(subtotal),
            domain,
        }
    }

    fn apply_payload(coupon_id: CouponId) -> ApplyCouponPayload {
        ApplyCouponPayload {
            coupon_id,
            order_type: OrderType::Store,
            order_id: OrderId(500),
        }
    }

    fn ten_percent_db() -> MockDb {
        MockDb::default().with_coupon(create_coupon(CouponId(1), MOCK_COUPON_CODE, Discount::Percentage { percent: 10 }))
    }

    #[test]
    fn test_validate_coupon_price() {
        let mut core = Core::new().unwrap();
        let service = create_service(user_session(MOCK_USER_ID), ten_percent_db());
        let work = service.validate_coupon_price(price_payload(MOCK_COUPON_CODE, 100000, OrderDomain::Store));
        let result = core.run(work).unwrap();
        let quote = result.quote().unwrap();
        assert_eq!(quote.coupon_id, CouponId(1));
        assert_eq!(quote.discount_amount, Amount(10000));
        assert_eq!(quote.final_amount, Amount(90000));
    }

    #[test]
    fn test_preview_does_not_mutate() {
        let mut core = Core::new().unwrap();
        let db = ten_percent_db();
        let service = create_service(user_session(MOCK_USER_ID), db.clone());

        let first = core
            .run(service.validate_coupon_price(price_payload(MOCK_COUPON_CODE, 123457, OrderDomain::Store)))
            .unwrap();
        for _ in 0..5 {
            let next = core
                .run(service.validate_coupon_price(price_payload(MOCK_COUPON_CODE, 123457, OrderDomain::Store)))
                .unwrap();
            assert_eq!(next, first);
        }
        assert_eq!(db.coupon_by_code(MOCK_COUPON_CODE).unwrap().used_count, 0);
        assert!(db.state().used_coupons.is_empty());
    }

    #[test]
    fn test_code_is_case_insensitive() {
        let mut core = Core::new().unwrap();
        let service = create_service(None, ten_percent_db());
        let lower = core
            .run(service.validate_coupon_price(price_payload("save10", 50000, OrderDomain::Store)))
            .unwrap();
        let upper = core
            .run(service.validate_coupon_price(price_payload("SAVE10", 50000, OrderDomain::Store)))
            .unwrap();
        assert_eq!(lower.quote().unwrap().coupon_id, CouponId(1));
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_unknown_code_is_not_found() {
        let mut core = Core::new().unwrap();
        let service = create_service(user_session(MOCK_USER_ID), ten_percent_db());
        let result = core
            .run(service.validate_coupon_price(price_payload("NOPE42", 50000, OrderDomain::Store)))
            .unwrap();
        assert_eq!(result.rejection(), Some(CouponRejection::NotFound));
    }

    #[test]
    fn test_one_time_per_user() {
        let mut core = Core::new().unwrap();
        let db = ten_percent_db();

        let service = create_service(user_session(MOCK_USER_ID), db.clone());
        let application = core.run(service.apply_coupon(apply_payload(CouponId(1)))).unwrap();
        assert!(application.committed);
        assert!(application.usage_recorded);

        let result = core
            .run(service.validate_coupon_price(price_payload(MOCK_COUPON_CODE, 100000, OrderDomain::Store)))
            .unwrap();
        assert_eq!(result.rejection(), Some(CouponRejection::AlreadyUsed));

        let other = create_service(user_session(MOCK_OTHER_USER_ID), db.clone());
        let result = core
            .run(other.validate_coupon_price(price_payload(MOCK_COUPON_CODE, 100000, OrderDomain::Store)))
            .unwrap();
        assert!(result.quote().is_some());
    }

    #[test]
    fn test_usage_cap_boundary() {
        let mut core = Core::new().unwrap();
        let mut coupon = create_coupon(CouponId(1), MOCK_COUPON_CODE, Discount::Fixed { amount: Amount(5000) });
        coupon.max_uses = Some(1);
        let db = MockDb::default().with_coupon(coupon);

        let service = create_service(user_session(MOCK_USER_ID), db.clone());
        let result = core
            .run(service.validate_coupon_price(price_payload(MOCK_COUPON_CODE, 100000, OrderDomain::Store)))
            .unwrap();
        assert!(result.quote().is_some());
        core.run(service.apply_coupon(apply_payload(CouponId(1)))).unwrap();

        let guest = create_service(None, db.clone());
        let result = core
            .run(guest.validate_coupon_price(price_payload(MOCK_COUPON_CODE, 100000, OrderDomain::Store)))
            .unwrap();
        assert_eq!(result.rejection(), Some(CouponRejection::Exhausted));
    }

    #[test]
    fn test_domain_restriction() {
        let mut core = Core::new().unwrap();
        let mut store_only = create_coupon(CouponId(1), "STORE10", Discount::Percentage { percent: 10 });
        store_only.coupon_type = CouponScope::Store;
        let both = create_coupon(CouponId(2), "ANY10", Discount::Percentage { percent: 10 });
        let db = MockDb::default().with_coupon(store_only).with_coupon(both);
        let service = create_service(user_session(MOCK_USER_ID), db);

        let result = core
            .run(service.validate_coupon_price(price_payload("STORE10", 100000, OrderDomain::Services)))
            .unwrap();
        assert_eq!(
            result.rejection(),
            Some(CouponRejection::WrongDomain {
                valid_for: CouponScope::Store
            })
        );

        let result = core
            .run(service.validate_coupon_price(price_payload("STORE10", 100000, OrderDomain::Store)))
            .unwrap();
        assert!(result.quote().is_some());

        let result = core
            .run(service.validate_coupon_price(price_payload("ANY10", 100000, OrderDomain::Services)))
            .unwrap();
        assert!(result.quote().is_some());
    }

    #[test]
    fn test_expired_and_below_minimum() {
        let mut core = Core::new().unwrap();
        let mut expired = create_coupon(CouponId(1), "OLD10", Discount::Percentage { percent: 10 });
        expired.expires_at = Some(SystemTime::now() - Duration::from_secs(1));
        let mut minimum = create_coupon(CouponId(2), "BIG10", Discount::Percentage { percent: 10 });
        minimum.min_order_value = Amount(200000);
        let db = MockDb::default().with_coupon(expired).with_coupon(minimum);
        let service = create_service(user_session(MOCK_USER_ID), db);

        let result = core
            .run(service.validate_coupon_price(price_payload("OLD10", 100000, OrderDomain::Store)))
            .unwrap();
        assert_eq!(result.rejection(), Some(CouponRejection::InactiveOrExpired));

        let result = core
            .run(service.validate_coupon_price(price_payload("BIG10", 100000, OrderDomain::Store)))
            .unwrap();
        assert_eq!(
            result.rejection(),
            Some(CouponRejection::BelowMinimum {
                min_order_value: Amount(200000)
            })
        );
    }

    #[test]
    fn test_free_product_is_priced() {
        let mut core = Core::new().unwrap();
        let db = MockDb::default()
            .with_coupon(create_coupon(CouponId(1), "HONEY", Discount::FreeProduct { product_id: ProductId(9) }))
            .with_coupon(create_coupon(CouponId(2), "GHOST", Discount::FreeProduct { product_id: ProductId(404) }))
            .with_product(ProductId(9), Amount(35000));
        let service = create_service(user_session(MOCK_USER_ID), db);

        let result = core
            .run(service.validate_coupon_price(price_payload("HONEY", 20000, OrderDomain::Store)))
            .unwrap();
        let quote = result.quote().unwrap();
        assert_eq!(quote.discount_amount, Amount(20000));
        assert_eq!(quote.final_amount, Amount(0));
        assert_eq!(quote.free_product_id, Some(ProductId(9)));

        let result = core
            .run(service.validate_coupon_price(price_payload("GHOST", 20000, OrderDomain::Store)))
            .unwrap();
        let quote = result.quote().unwrap();
        assert_eq!(quote.discount_amount, Amount(0));
        assert_eq!(quote.free_product_id, Some(ProductId(404)));
    }

    #[test]
    fn test_invalid_price_payload() {
        let mut core = Core::new().unwrap();
        let service = create_service(user_session(MOCK_USER_ID), ten_percent_db());
        let err = core
            .run(service.validate_coupon_price(price_payload(MOCK_COUPON_CODE, -1, OrderDomain::Store)))
            .unwrap_err();
        match error_kind(&err) {
            Some(Error::Validate(_)) => (),
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_validation_is_rate_limited() {
        let mut core = Core::new().unwrap();
        let limiter = Arc::new(FixedWindowRateLimiter::new(2, Duration::from_secs(60)));
        let service = create_service_with_limiter(user_session(MOCK_USER_ID), ten_percent_db(), limiter);

        for _ in 0..2 {
            core.run(service.validate_coupon_price(price_payload(MOCK_COUPON_CODE, 100000, OrderDomain::Store)))
                .unwrap();
        }
        let err = core
            .run(service.validate_coupon_price(price_payload(MOCK_COUPON_CODE, 100000, OrderDomain::Store)))
            .unwrap_err();
        match error_kind(&err) {
            Some(Error::TooManyRequests) => (),
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_usage_is_swallowed() {
        let mut core = Core::new().unwrap();
        let db = ten_percent_db();
        db.state().used_coupons.push(UsedCoupon {
            user_id: MOCK_USER_ID,
            coupon_id: CouponId(1),
            order_type: OrderType::Store,
            order_id: Some(OrderId(499)),
            used_at: SystemTime::now(),
        });
        let service = create_service(user_session(MOCK_USER_ID), db.clone());

        let application = core.run(service.apply_coupon(apply_payload(CouponId(1)))).unwrap();
        assert!(application.committed);
        assert!(!application.usage_recorded);
        assert_eq!(db.coupon_by_code(MOCK_COUPON_CODE).unwrap().used_count, 1);
        assert_eq!(db.state().used_coupons.len(), 1);
    }

    #[test]
    fn test_apply_missing_coupon_is_warning() {
        let mut core = Core::new().unwrap();
        let db = MockDb::default();
        let service = create_service(user_session(MOCK_USER_ID), db.clone());

        let application = core.run(service.apply_coupon(apply_payload(CouponId(77)))).unwrap();
        assert!(!application.committed);
        assert!(!application.usage_recorded);
        assert!(application.warning.is_some());
        assert!(db.state().used_coupons.is_empty());
    }

    #[test]
    fn test_guest_apply_counts_without_record() {
        let mut core = Core::new().unwrap();
        let db = ten_percent_db();
        let service = create_service(None, db.clone());

        let application = core.run(service.apply_coupon(apply_payload(CouponId(1)))).unwrap();
        assert!(application.committed);
        assert!(!application.usage_recorded);
        assert_eq!(db.coupon_by_code(MOCK_COUPON_CODE).unwrap().used_count, 1);
    }

    #[test]
    fn test_create_coupon_canonicalizes_code() {
        let mut core = Core::new().unwrap();
        let db = MockDb::default();
        let service = create_service(admin_session(), db.clone());
        let payload = NewCoupon {
            code: CouponCode::from("welcome25"),
            description: Some("Welcome".to_string()),
            discount: Discount::Percentage { percent: 25 },
            min_order_value: Amount(0),
            max_uses: Some(100),
            coupon_type: CouponScope::Services,
            expires_at: None,
            owner_user_id: None,
            source_redemption_id: None,
        };

        let coupon = core.run(service.create_coupon(payload)).unwrap();
        assert_eq!(coupon.code, CouponCode::from("WELCOME25"));
        assert!(db.coupon_by_code("Welcome25").is_some());
    }

    #[test]
    fn test_generate_coupon_code() {
        let mut core = Core::new().unwrap();
        let service = create_service(admin_session(), MockDb::default());
        let code = core.run(service.generate_coupon_code()).unwrap();
        assert_eq!(code.0.len(), service.static_context.config.coupons.generated_code_length);
        assert!(code.0.len() >= 16);
        assert_eq!(code, code.normalized());
    }

    #[test]
    fn test_delete_coupon_keeps_usage_history() {
        let mut core = Core::new().unwrap();
        let db = ten_percent_db();
        let user = create_service(user_session(MOCK_USER_ID), db.clone());
        let admin = create_service(admin_session(), db.clone());

        core.run(user.apply_coupon(apply_payload(CouponId(1)))).unwrap();
        core.run(admin.delete_coupon(CouponId(1))).unwrap();

        assert!(db.coupon_by_code(MOCK_COUPON_CODE).is_none());
        let history = core.run(user.list_used_coupons()).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].coupon_id, CouponId(1));
    }

    #[test]
    fn test_list_used_coupons_requires_user() {
        let mut core = Core::new().unwrap();
        let service = create_service(None, ten_percent_db());
        let err = core.run(service.list_used_coupons()).unwrap_err();
        match error_kind(&err) {
            Some(Error::Forbidden) => (),
            other => panic!("unexpected kind {:?}", other),
        }
    }
}
