use std::borrow::Cow;
use std::collections::HashMap;

use regex::Regex;
use serde_json;
use validator::ValidationError;

use models::{Amount, CouponCode, Discount, Points};

pub fn validate_coupon_code(code: &CouponCode) -> Result<(), ValidationError> {
    lazy_static! {
        static ref COUPON_CODE_VALIDATION_RE: Regex = Regex::new(r"^[A-Z0-9_-]{3,32}$").unwrap();
    }

    if COUPON_CODE_VALIDATION_RE.is_match(&code.normalized().0) {
        Ok(())
    } else {
        Err(ValidationError {
            code: Cow::from("code"),
            message: Some(Cow::from(
                "Coupon code must be 3 to 32 characters of latin letters, digits, '-' or '_'.",
            )),
            params: HashMap::new(),
        })
    }
}

pub fn validate_discount(discount: &Discount) -> Result<(), ValidationError> {
    let error = |message: &'static str, value: i64| {
        let mut params = HashMap::new();
        params.insert(Cow::from("value"), serde_json::Value::from(value));
        Err(ValidationError {
            code: Cow::from("discount"),
            message: Some(Cow::from(message)),
            params,
        })
    };

    match *discount {
        Discount::Percentage { percent } if percent <= 0 || percent > 100 => {
            error("Percentage discount must be greater than 0 and at most 100.", percent)
        }
        Discount::Fixed { amount } if amount.0 <= 0 => error("Fixed discount must be greater than 0.", amount.0),
        _ => Ok(()),
    }
}

pub fn validate_non_negative_amount(amount: &Amount) -> Result<(), ValidationError> {
    if amount.is_negative() {
        Err(ValidationError {
            code: Cow::from("amount"),
            message: Some(Cow::from("Value must be non negative.")),
            params: HashMap::new(),
        })
    } else {
        Ok(())
    }
}

pub fn validate_positive_points(points: &Points) -> Result<(), ValidationError> {
    if points.0 > 0 {
        Ok(())
    } else {
        Err(ValidationError {
            code: Cow::from("points"),
            message: Some(Cow::from("Points cost must be greater than 0.")),
            params: HashMap::new(),
        })
    }
}
