//! Discount engine gates and pricing. Everything here is pure, the services
//! feed it coupons loaded from storage.
use std::time::SystemTime;

use models::*;

/// Gates that depend on the coupon alone, in the order they are checked:
/// activity and expiry, usage cap, domain.
pub fn check_availability(coupon: &Coupon, domain: OrderDomain, now: SystemTime) -> Result<(), CouponRejection> {
    if !coupon.is_active || coupon.is_expired(now) {
        return Err(CouponRejection::InactiveOrExpired);
    }

    if coupon.is_exhausted() {
        return Err(CouponRejection::Exhausted);
    }

    if !coupon.coupon_type.allows(domain) {
        return Err(CouponRejection::WrongDomain {
            valid_for: coupon.coupon_type,
        });
    }

    Ok(())
}

pub fn check_minimum(coupon: &Coupon, subtotal: Amount) -> Result<(), CouponRejection> {
    if subtotal < coupon.min_order_value {
        Err(CouponRejection::BelowMinimum {
            min_order_value: coupon.min_order_value,
        })
    } else {
        Ok(())
    }
}

/// Discount taken off `subtotal`, never negative and never above `subtotal`.
/// `free_product_price` is the price of the granted product, if known.
pub fn calculate_discount(discount: &Discount, subtotal: Amount, free_product_price: Option<Amount>) -> Amount {
    let subtotal = if subtotal.is_negative() { Amount::zero() } else { subtotal };

    let raw = match *discount {
        // half up rounding, subtotal * percent fits i128 for any i64 subtotal
        Discount::Percentage { percent } => {
            let value = (i128::from(subtotal.0) * i128::from(percent) + 50) / 100;
            if value > i128::from(subtotal.0) {
                subtotal
            } else {
                Amount(value as i64)
            }
        }
        Discount::Fixed { amount } => amount,
        Discount::FreeProduct { .. } => free_product_price.unwrap_or_default(),
    };

    if raw.is_negative() {
        Amount::zero()
    } else if raw > subtotal {
        subtotal
    } else {
        raw
    }
}

pub fn quote(coupon: &Coupon, subtotal: Amount, free_product_price: Option<Amount>) -> CouponQuote {
    let discount_amount = calculate_discount(&coupon.discount, subtotal, free_product_price);

    CouponQuote {
        coupon_id: coupon.id,
        code: coupon.code.clone(),
        discount_type: coupon.discount.discount_type(),
        discount_amount,
        final_amount: subtotal - discount_amount,
        free_product_id: coupon.discount.target_product_id(),
    }
}
