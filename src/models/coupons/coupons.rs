//! Model coupons
use std::time::SystemTime;

use diesel::sql_types::VarChar;
use failure::Error as FailureError;
use validator::Validate;

use models::validation_rules::*;
use models::{Amount, CouponCode, CouponId, Discount, DiscountType, ProductId, RedemptionId, UserId};
use schema::coupons;

/// Checkout a coupon can be used on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "VarChar"]
#[serde(rename_all = "snake_case")]
pub enum CouponScope {
    Store,
    Services,
    Both,
}

varchar_enum_impls!(CouponScope {
    Store => "store",
    Services => "services",
    Both => "both",
});

impl Default for CouponScope {
    fn default() -> Self {
        CouponScope::Both
    }
}

/// Checkout being priced: the store cart or a service booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderDomain {
    Store,
    Services,
}

impl CouponScope {
    pub fn allows(&self, domain: OrderDomain) -> bool {
        match (*self, domain) {
            (CouponScope::Both, _) => true,
            (CouponScope::Store, OrderDomain::Store) => true,
            (CouponScope::Services, OrderDomain::Services) => true,
            _ => false,
        }
    }
}

/// DB presenting by coupon
#[derive(Debug, Clone, Queryable)]
pub struct RawCoupon {
    pub id: CouponId,
    pub code: CouponCode,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Option<i64>,
    pub target_product_id: Option<ProductId>,
    pub min_order_value: Amount,
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub coupon_type: CouponScope,
    pub is_active: bool,
    pub expires_at: Option<SystemTime>,
    pub owner_user_id: Option<UserId>,
    pub source_redemption_id: Option<RedemptionId>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coupon {
    pub id: CouponId,
    pub code: CouponCode,
    pub description: Option<String>,
    pub discount: Discount,
    pub min_order_value: Amount,
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub coupon_type: CouponScope,
    pub is_active: bool,
    pub expires_at: Option<SystemTime>,
    /// Set for personal coupons minted from a reward redemption
    pub owner_user_id: Option<UserId>,
    pub source_redemption_id: Option<RedemptionId>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl Coupon {
    pub fn from_raw(raw: RawCoupon) -> Result<Coupon, FailureError> {
        let discount = Discount::from_columns(raw.discount_type, raw.discount_value, raw.target_product_id)
            .map_err(|e| e.context(format!("Coupon {} has broken discount", raw.id)))?;

        Ok(Coupon {
            id: raw.id,
            code: raw.code,
            description: raw.description,
            discount,
            min_order_value: raw.min_order_value,
            max_uses: raw.max_uses,
            used_count: raw.used_count,
            coupon_type: raw.coupon_type,
            is_active: raw.is_active,
            expires_at: raw.expires_at,
            owner_user_id: raw.owner_user_id,
            source_redemption_id: raw.source_redemption_id,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        })
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expires_at.map(|expires_at| expires_at < now).unwrap_or(false)
    }

    pub fn is_exhausted(&self) -> bool {
        self.max_uses.map(|max_uses| self.used_count >= max_uses).unwrap_or(false)
    }
}

/// Payload for creating coupon
#[derive(Serialize, Deserialize, Clone, Validate, Debug)]
pub struct NewCoupon {
    #[validate(custom = "validate_coupon_code")]
    pub code: CouponCode,
    pub description: Option<String>,
    #[validate(custom = "validate_discount")]
    pub discount: Discount,
    #[serde(default)]
    #[validate(custom = "validate_non_negative_amount")]
    pub min_order_value: Amount,
    #[validate(range(min = "1", max = "1000000000"))]
    pub max_uses: Option<i32>,
    #[serde(default)]
    pub coupon_type: CouponScope,
    pub expires_at: Option<SystemTime>,
    #[serde(default)]
    pub owner_user_id: Option<UserId>,
    #[serde(default)]
    pub source_redemption_id: Option<RedemptionId>,
}

/// Row written to coupons table, code is already canonical here
#[derive(Insertable, Clone, Debug)]
#[table_name = "coupons"]
pub struct InsertCoupon {
    pub code: CouponCode,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Option<i64>,
    pub target_product_id: Option<ProductId>,
    pub min_order_value: Amount,
    pub max_uses: Option<i32>,
    pub coupon_type: CouponScope,
    pub expires_at: Option<SystemTime>,
    pub owner_user_id: Option<UserId>,
    pub source_redemption_id: Option<RedemptionId>,
}

impl<'a> From<&'a NewCoupon> for InsertCoupon {
    fn from(payload: &'a NewCoupon) -> Self {
        InsertCoupon {
            code: payload.code.normalized(),
            description: payload.description.clone(),
            discount_type: payload.discount.discount_type(),
            discount_value: payload.discount.discount_value(),
            target_product_id: payload.discount.target_product_id(),
            min_order_value: payload.min_order_value,
            max_uses: payload.max_uses,
            coupon_type: payload.coupon_type,
            expires_at: payload.expires_at,
            owner_user_id: payload.owner_user_id,
            source_redemption_id: payload.source_redemption_id,
        }
    }
}

/// Payload for updating coupon. The discount itself can not be changed once customers may hold the code.
#[derive(Serialize, Deserialize, AsChangeset, Validate, Clone, Default, Debug)]
#[table_name = "coupons"]
pub struct UpdateCoupon {
    pub description: Option<String>,
    #[validate(custom = "validate_non_negative_amount")]
    pub min_order_value: Option<Amount>,
    #[validate(range(min = "1", max = "1000000000"))]
    pub max_uses: Option<i32>,
    pub coupon_type: Option<CouponScope>,
    pub is_active: Option<bool>,
    pub expires_at: Option<SystemTime>,
}

/// Optional filters of the coupons admin listing
#[derive(Deserialize, Clone, Default, Debug)]
pub struct CouponSearchTerms {
    pub is_active: Option<bool>,
    pub coupon_type: Option<CouponScope>,
    pub owner_user_id: Option<UserId>,
    pub source_redemption_id: Option<RedemptionId>,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn create_raw_coupon() -> RawCoupon {
        RawCoupon {
            id: CouponId(1),
            code: CouponCode::from("SAVE10"),
            description: None,
            discount_type: DiscountType::Percentage,
            discount_value: Some(10),
            target_product_id: None,
            min_order_value: Amount(0),
            max_uses: Some(2),
            used_count: 0,
            coupon_type: CouponScope::Store,
            is_active: true,
            expires_at: None,
            owner_user_id: None,
            source_redemption_id: None,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        }
    }

    #[test]
    fn test_scope_allows_domain() {
        assert!(CouponScope::Both.allows(OrderDomain::Store));
        assert!(CouponScope::Both.allows(OrderDomain::Services));
        assert!(CouponScope::Store.allows(OrderDomain::Store));
        assert!(!CouponScope::Store.allows(OrderDomain::Services));
        assert!(!CouponScope::Services.allows(OrderDomain::Store));
    }

    #[test]
    fn test_coupon_from_raw() {
        let coupon = Coupon::from_raw(create_raw_coupon()).unwrap();
        assert_eq!(coupon.discount, Discount::Percentage { percent: 10 });

        let mut broken = create_raw_coupon();
        broken.target_product_id = Some(ProductId(4));
        assert!(Coupon::from_raw(broken).is_err());
    }

    #[test]
    fn test_exhausted_and_expired() {
        let mut coupon = Coupon::from_raw(create_raw_coupon()).unwrap();
        assert!(!coupon.is_exhausted());
        coupon.used_count = 2;
        assert!(coupon.is_exhausted());
        coupon.max_uses = None;
        assert!(!coupon.is_exhausted());

        let now = SystemTime::now();
        coupon.expires_at = Some(now - Duration::from_secs(1));
        assert!(coupon.is_expired(now));
        coupon.expires_at = Some(now + Duration::from_secs(3600));
        assert!(!coupon.is_expired(now));
    }

    #[test]
    fn test_insert_coupon_is_canonical() {
        let payload = NewCoupon {
            code: CouponCode::from("save10"),
            description: None,
            discount: Discount::Fixed { amount: Amount(15000) },
            min_order_value: Amount(0),
            max_uses: None,
            coupon_type: CouponScope::Both,
            expires_at: None,
            owner_user_id: None,
            source_redemption_id: None,
        };
        let insert = InsertCoupon::from(&payload);
        assert_eq!(insert.code, CouponCode::from("SAVE10"));
        assert_eq!(insert.discount_type, DiscountType::Fixed);
        assert_eq!(insert.discount_value, Some(15000));
        assert!(insert.target_product_id.is_none());
    }

    #[test]
    fn test_new_coupon_validation() {
        let payload = NewCoupon {
            code: CouponCode::from("x"),
            description: None,
            discount: Discount::Percentage { percent: 0 },
            min_order_value: Amount(-1),
            max_uses: Some(0),
            coupon_type: CouponScope::Both,
            expires_at: None,
            owner_user_id: None,
            source_redemption_id: None,
        };
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("code"));
        assert!(fields.contains_key("discount"));
        assert!(fields.contains_key("min_order_value"));
        assert!(fields.contains_key("max_uses"));
    }
}
