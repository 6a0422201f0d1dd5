//! Discount carried by a coupon or a reward.
//! Stored flat as `discount_type`, `discount_value` and `target_product_id` columns.

use diesel::sql_types::VarChar;
use failure::Error as FailureError;

use models::{Amount, ProductId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "VarChar"]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    Fixed,
    FreeProduct,
}

varchar_enum_impls!(DiscountType {
    Percentage => "percentage",
    Fixed => "fixed",
    FreeProduct => "free_product",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "discount_type", rename_all = "snake_case")]
pub enum Discount {
    /// Percent of the subtotal, 1..=100
    Percentage { percent: i64 },
    /// Amount taken off the subtotal
    Fixed { amount: Amount },
    /// Product granted for free
    FreeProduct { product_id: ProductId },
}

impl Discount {
    pub fn discount_type(&self) -> DiscountType {
        match *self {
            Discount::Percentage { .. } => DiscountType::Percentage,
            Discount::Fixed { .. } => DiscountType::Fixed,
            Discount::FreeProduct { .. } => DiscountType::FreeProduct,
        }
    }

    pub fn discount_value(&self) -> Option<i64> {
        match *self {
            Discount::Percentage { percent } => Some(percent),
            Discount::Fixed { amount } => Some(amount.0),
            Discount::FreeProduct { .. } => None,
        }
    }

    pub fn target_product_id(&self) -> Option<ProductId> {
        match *self {
            Discount::FreeProduct { product_id } => Some(product_id),
            _ => None,
        }
    }

    /// Restores discount from its columns, rejecting combinations that can not be priced
    pub fn from_columns(
        discount_type: DiscountType,
        discount_value: Option<i64>,
        target_product_id: Option<ProductId>,
    ) -> Result<Discount, FailureError> {
        match (discount_type, discount_value, target_product_id) {
            (DiscountType::Percentage, Some(percent), None) => Ok(Discount::Percentage { percent }),
            (DiscountType::Fixed, Some(amount), None) => Ok(Discount::Fixed { amount: Amount(amount) }),
            (DiscountType::FreeProduct, None, Some(product_id)) => Ok(Discount::FreeProduct { product_id }),
            (discount_type, value, product_id) => Err(format_err!(
                "Inconsistent discount columns: type {}, value {:?}, target product {:?}",
                discount_type,
                value,
                product_id
            )),
        }
    }
}
