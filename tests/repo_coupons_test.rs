extern crate diesel;
extern crate failure;
extern crate docterbee_lib;

use diesel::pg::PgConnection;
use diesel::Connection;

use docterbee_lib::config::Config;
use docterbee_lib::errors::is_unique_violation;
use docterbee_lib::models::*;
use docterbee_lib::repos::legacy_acl::SystemACL;
use docterbee_lib::repos::{CouponsRepo, CouponsRepoImpl, UsedCouponsRepo, UsedCouponsRepoImpl};

fn connection() -> PgConnection {
    let config = Config::new().unwrap();
    PgConnection::establish(&config.server.database).unwrap()
}

#[test]
#[ignore]
fn test_coupon_usage_roundtrip() {
    let conn = connection();
    conn.begin_test_transaction().unwrap();

    let coupons_repo = CouponsRepoImpl::new(&conn, Box::new(SystemACL::default()));
    let used_coupons_repo = UsedCouponsRepoImpl::new(&conn, Box::new(SystemACL::default()));

    let coupon = coupons_repo
        .create(InsertCoupon {
            code: CouponCode::from("ITEST10"),
            description: None,
            discount_type: DiscountType::Percentage,
            discount_value: Some(10),
            target_product_id: None,
            min_order_value: Amount(0),
            max_uses: Some(5),
            coupon_type: CouponScope::Both,
            expires_at: None,
            owner_user_id: None,
            source_redemption_id: None,
        }).unwrap();

    let found = coupons_repo.get_by_code(CouponCode::from("itest10")).unwrap().unwrap();
    assert_eq!(found.id, coupon.id);

    let incremented = coupons_repo.increment_usage(coupon.id).unwrap().unwrap();
    assert_eq!(incremented.used_count, 1);

    let usage = NewUsedCoupon {
        user_id: UserId(42),
        coupon_id: coupon.id,
        order_type: OrderType::Store,
        order_id: Some(OrderId(1)),
    };
    used_coupons_repo.create(usage.clone()).unwrap();
    assert!(used_coupons_repo.user_used_coupon(coupon.id, UserId(42)).unwrap());
    assert!(!used_coupons_repo.user_used_coupon(coupon.id, UserId(7)).unwrap());

    // savepoint keeps the outer test transaction usable after the failed insert
    let err = conn
        .transaction::<UsedCoupon, failure::Error, _>(|| used_coupons_repo.create(usage.clone()))
        .unwrap_err();
    assert!(is_unique_violation(&err));
    assert_eq!(used_coupons_repo.list_for_user(UserId(42)).unwrap().len(), 1);
}

#[test]
#[ignore]
fn test_deleting_coupon_keeps_usage_records() {
    let conn = connection();
    conn.begin_test_transaction().unwrap();

    let coupons_repo = CouponsRepoImpl::new(&conn, Box::new(SystemACL::default()));
    let used_coupons_repo = UsedCouponsRepoImpl::new(&conn, Box::new(SystemACL::default()));

    let coupon = coupons_repo
        .create(InsertCoupon {
            code: CouponCode::from("ITEST20"),
            description: None,
            discount_type: DiscountType::Fixed,
            discount_value: Some(2000),
            target_product_id: None,
            min_order_value: Amount(0),
            max_uses: None,
            coupon_type: CouponScope::Store,
            expires_at: None,
            owner_user_id: None,
            source_redemption_id: None,
        }).unwrap();
    used_coupons_repo
        .create(NewUsedCoupon {
            user_id: UserId(42),
            coupon_id: coupon.id,
            order_type: OrderType::Store,
            order_id: Some(OrderId(9)),
        }).unwrap();

    coupons_repo.delete(coupon.id).unwrap();

    assert!(coupons_repo.get(coupon.id).unwrap().is_none());
    assert!(used_coupons_repo.user_used_coupon(coupon.id, UserId(42)).unwrap());
    let history = used_coupons_repo.list_for_user(UserId(42)).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].coupon_id, coupon.id);
}
