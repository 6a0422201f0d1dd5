//! Newtypes shared by all models
use std::fmt;
use std::ops::{Add, Sub};

use diesel::sql_types::{BigInt, Integer, VarChar};

macro_rules! display_inner {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "Integer"]
pub struct UserId(pub i32);
newtype_sql_impls!(UserId, i32, Integer);
display_inner!(UserId);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "Integer"]
pub struct CouponId(pub i32);
newtype_sql_impls!(CouponId, i32, Integer);
display_inner!(CouponId);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "Integer"]
pub struct ProductId(pub i32);
newtype_sql_impls!(ProductId, i32, Integer);
display_inner!(ProductId);

/// Id of a store order or a service booking, owned by the host app
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "Integer"]
pub struct OrderId(pub i32);
newtype_sql_impls!(OrderId, i32, Integer);
display_inner!(OrderId);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "Integer"]
pub struct RewardId(pub i32);
newtype_sql_impls!(RewardId, i32, Integer);
display_inner!(RewardId);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "Integer"]
pub struct RedemptionId(pub i32);
newtype_sql_impls!(RedemptionId, i32, Integer);
display_inner!(RedemptionId);

/// Loyalty points balance or cost
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "Integer"]
pub struct Points(pub i32);
newtype_sql_impls!(Points, i32, Integer);
display_inner!(Points);

/// Money in the smallest currency unit (rupiah has no minor unit)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "BigInt"]
pub struct Amount(pub i64);
newtype_sql_impls!(Amount, i64, BigInt);
display_inner!(Amount);

impl Amount {
    pub fn zero() -> Self {
        Amount(0)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "VarChar"]
pub struct CouponCode(pub String);
newtype_sql_impls!(CouponCode, String, VarChar);
display_inner!(CouponCode);

impl CouponCode {
    /// Codes are stored and compared upper cased, customers may type them in any case
    pub fn normalized(&self) -> CouponCode {
        CouponCode(self.0.trim().to_uppercase())
    }
}

impl From<String> for CouponCode {
    fn from(value: String) -> Self {
        CouponCode(value)
    }
}

impl<'a> From<&'a str> for CouponCode {
    fn from(value: &'a str) -> Self {
        CouponCode(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json;

    use super::*;

    #[test]
    fn test_code_normalization() {
        assert_eq!(CouponCode::from(" save10 ").normalized(), CouponCode::from("SAVE10"));
        assert_eq!(CouponCode::from("Save10").normalized(), CouponCode::from("SAVE10").normalized());
    }

    #[test]
    fn test_amount_arithmetic_saturates() {
        assert_eq!(Amount(100000) - Amount(10000), Amount(90000));
        assert_eq!(Amount(::std::i64::MIN) - Amount(1), Amount(::std::i64::MIN));
        assert!(Amount(-1).is_negative());
        assert!(!Amount::zero().is_negative());
    }

    #[test]
    fn test_ids_are_transparent_in_json() {
        assert_eq!(serde_json::to_string(&UserId(42)).unwrap(), "42");
        assert_eq!(serde_json::to_string(&CouponCode::from("SAVE10")).unwrap(), "\"SAVE10\"");
    }
}
