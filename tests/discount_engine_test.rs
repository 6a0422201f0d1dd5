extern crate docterbee_lib;

use std::time::{Duration, SystemTime};

use docterbee_lib::models::*;
use docterbee_lib::services::discounts::{calculate_discount, check_availability, check_minimum, quote};
use docterbee_lib::services::rate_limit::{FixedWindowRateLimiter, RateLimiter};

fn coupon(discount: Discount, coupon_type: CouponScope) -> Coupon {
    Coupon {
        id: CouponId(10),
        code: CouponCode::from("sehat20").normalized(),
        description: Some("Promo sehat".to_string()),
        discount,
        min_order_value: Amount(0),
        max_uses: None,
        used_count: 0,
        coupon_type,
        is_active: true,
        expires_at: None,
        owner_user_id: None,
        source_redemption_id: None,
        created_at: SystemTime::now(),
        updated_at: SystemTime::now(),
    }
}

/// Walks the gates the way a checkout does and returns what the customer would see
fn price(coupon: &Coupon, subtotal: Amount, domain: OrderDomain, now: SystemTime) -> CouponCheck {
    if let Err(rejection) = check_availability(coupon, domain, now) {
        return CouponCheck::Rejected(rejection);
    }
    if let Err(rejection) = check_minimum(coupon, subtotal) {
        return CouponCheck::Rejected(rejection);
    }
    CouponCheck::Valid(quote(coupon, subtotal, None))
}

#[test]
fn test_percentage_and_fixed_examples() {
    let now = SystemTime::now();

    let percent = coupon(Discount::Percentage { percent: 10 }, CouponScope::Both);
    let check = price(&percent, Amount(100000), OrderDomain::Store, now);
    let quote = check.quote().unwrap();
    assert_eq!(quote.discount_amount, Amount(10000));
    assert_eq!(quote.final_amount, Amount(90000));
    assert_eq!(quote.code, CouponCode::from("SEHAT20"));

    let fixed = coupon(Discount::Fixed { amount: Amount(15000) }, CouponScope::Both);
    let check = price(&fixed, Amount(10000), OrderDomain::Services, now);
    let quote = check.quote().unwrap();
    assert_eq!(quote.discount_amount, Amount(10000));
    assert_eq!(quote.final_amount, Amount(0));
}

#[test]
fn test_clamp_holds_for_odd_subtotals() {
    for percent in 1..101 {
        let discount = Discount::Percentage { percent };
        for subtotal in &[0i64, 1, 3, 7, 99, 101, 9999, 123456789] {
            let amount = calculate_discount(&discount, Amount(*subtotal), None);
            assert!(amount >= Amount(0));
            assert!(amount <= Amount(*subtotal));
        }
    }
}

#[test]
fn test_services_only_coupon_on_store_checkout() {
    let services_only = coupon(Discount::Percentage { percent: 20 }, CouponScope::Services);
    let check = price(&services_only, Amount(100000), OrderDomain::Store, SystemTime::now());
    assert_eq!(
        check.rejection(),
        Some(CouponRejection::WrongDomain {
            valid_for: CouponScope::Services
        })
    );
}

#[test]
fn test_expiry_is_checked_against_given_clock() {
    let mut expiring = coupon(Discount::Percentage { percent: 20 }, CouponScope::Both);
    let now = SystemTime::now();
    expiring.expires_at = Some(now + Duration::from_secs(60));

    assert!(price(&expiring, Amount(1000), OrderDomain::Store, now).quote().is_some());
    assert_eq!(
        price(&expiring, Amount(1000), OrderDomain::Store, now + Duration::from_secs(61)).rejection(),
        Some(CouponRejection::InactiveOrExpired)
    );
}

#[test]
fn test_rate_limiter_is_shared_across_keys() {
    let limiter = FixedWindowRateLimiter::new(3, Duration::from_secs(60));
    for _ in 0..3 {
        assert!(limiter.check("addr:192.168.1.10"));
    }
    assert!(!limiter.check("addr:192.168.1.10"));
    assert!(limiter.check("user:42"));
}
