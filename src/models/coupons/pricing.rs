//! Inputs and outcomes of coupon pricing and application
use validator::Validate;

use models::validation_rules::*;
use models::{Amount, CouponCode, CouponId, CouponScope, DiscountType, OrderDomain, OrderId, OrderType, ProductId};

/// Payload for previewing a coupon on a checkout
#[derive(Serialize, Deserialize, Clone, Validate, Debug)]
pub struct CouponPricePayload {
    pub code: CouponCode,
    #[validate(custom = "validate_non_negative_amount")]
    pub subtotal: Amount,
    pub domain: OrderDomain,
}

/// Successful pricing of a coupon against a subtotal
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CouponQuote {
    pub coupon_id: CouponId,
    pub code: CouponCode,
    pub discount_type: DiscountType,
    pub discount_amount: Amount,
    pub final_amount: Amount,
    /// Product granted by a free product coupon
    pub free_product_id: Option<ProductId>,
}

/// Reason a coupon can not be applied, shown to the customer
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponRejection {
    NotFound,
    InactiveOrExpired,
    Exhausted,
    WrongDomain { valid_for: CouponScope },
    AlreadyUsed,
    BelowMinimum { min_order_value: Amount },
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CouponCheck {
    Valid(CouponQuote),
    Rejected(CouponRejection),
}

impl CouponCheck {
    pub fn quote(&self) -> Option<&CouponQuote> {
        match *self {
            CouponCheck::Valid(ref quote) => Some(quote),
            CouponCheck::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<CouponRejection> {
        match *self {
            CouponCheck::Valid(_) => None,
            CouponCheck::Rejected(rejection) => Some(rejection),
        }
    }
}

/// Payload for committing a coupon after the order row is written
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApplyCouponPayload {
    pub coupon_id: CouponId,
    pub order_type: OrderType,
    pub order_id: OrderId,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CouponApplication {
    /// Usage counter of the coupon was incremented
    pub committed: bool,
    /// A new usage record was written for the customer
    pub usage_recorded: bool,
    pub warning: Option<String>,
}
