//! Model rewards, things customers buy with points
use std::time::SystemTime;

use diesel::sql_types::VarChar;
use failure::Error as FailureError;
use validator::Validate;

use models::validation_rules::*;
use models::{Amount, CouponScope, Discount, DiscountType, Points, ProductId, RewardId};
use schema::rewards;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "VarChar"]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    Discount,
    FreeProduct,
}

varchar_enum_impls!(RewardType {
    Discount => "discount",
    FreeProduct => "free_product",
});

/// DB presenting by reward
#[derive(Debug, Clone, Queryable)]
pub struct RawReward {
    pub id: RewardId,
    pub title: String,
    pub description: Option<String>,
    pub points_cost: Points,
    pub reward_type: RewardType,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<i64>,
    pub target_product_id: Option<ProductId>,
    pub coupon_type: CouponScope,
    pub min_order_value: Amount,
    pub is_active: bool,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reward {
    pub id: RewardId,
    pub title: String,
    pub description: Option<String>,
    pub points_cost: Points,
    /// Discount copied into the coupon minted on redemption
    pub prize: Discount,
    pub coupon_type: CouponScope,
    pub min_order_value: Amount,
    pub is_active: bool,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl Reward {
    pub fn from_raw(raw: RawReward) -> Result<Reward, FailureError> {
        let prize = match (raw.reward_type, raw.discount_type) {
            (RewardType::Discount, Some(discount_type)) if discount_type != DiscountType::FreeProduct => {
                Discount::from_columns(discount_type, raw.discount_value, None)
            }
            (RewardType::FreeProduct, None) => Discount::from_columns(DiscountType::FreeProduct, None, raw.target_product_id),
            (reward_type, discount_type) => Err(format_err!(
                "Reward of type {} can not carry discount type {:?}",
                reward_type,
                discount_type
            )),
        }.map_err(|e| e.context(format!("Reward {} has broken prize", raw.id)))?;

        Ok(Reward {
            id: raw.id,
            title: raw.title,
            description: raw.description,
            points_cost: raw.points_cost,
            prize,
            coupon_type: raw.coupon_type,
            min_order_value: raw.min_order_value,
            is_active: raw.is_active,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        })
    }

    pub fn reward_type(&self) -> RewardType {
        reward_type_of(&self.prize)
    }
}

fn reward_type_of(prize: &Discount) -> RewardType {
    match *prize {
        Discount::FreeProduct { .. } => RewardType::FreeProduct,
        _ => RewardType::Discount,
    }
}

/// Payload for creating reward
#[derive(Serialize, Deserialize, Clone, Validate, Debug)]
pub struct NewReward {
    pub title: String,
    pub description: Option<String>,
    #[validate(custom = "validate_positive_points")]
    pub points_cost: Points,
    #[validate(custom = "validate_discount")]
    pub prize: Discount,
    #[serde(default)]
    pub coupon_type: CouponScope,
    #[serde(default)]
    #[validate(custom = "validate_non_negative_amount")]
    pub min_order_value: Amount,
}

#[derive(Insertable, Clone, Debug)]
#[table_name = "rewards"]
pub struct InsertReward {
    pub title: String,
    pub description: Option<String>,
    pub points_cost: Points,
    pub reward_type: RewardType,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<i64>,
    pub target_product_id: Option<ProductId>,
    pub coupon_type: CouponScope,
    pub min_order_value: Amount,
}

impl<'a> From<&'a NewReward> for InsertReward {
    fn from(payload: &'a NewReward) -> Self {
        let reward_type = reward_type_of(&payload.prize);
        let discount_type = match reward_type {
            RewardType::Discount => Some(payload.prize.discount_type()),
            RewardType::FreeProduct => None,
        };

        InsertReward {
            title: payload.title.clone(),
            description: payload.description.clone(),
            points_cost: payload.points_cost,
            reward_type,
            discount_type,
            discount_value: payload.prize.discount_value(),
            target_product_id: payload.prize.target_product_id(),
            coupon_type: payload.coupon_type,
            min_order_value: payload.min_order_value,
        }
    }
}

/// Payload for updating reward
#[derive(Serialize, Deserialize, AsChangeset, Validate, Clone, Default, Debug)]
#[table_name = "rewards"]
pub struct UpdateReward {
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "validate_positive_points")]
    pub points_cost: Option<Points>,
    pub coupon_type: Option<CouponScope>,
    #[validate(custom = "validate_non_negative_amount")]
    pub min_order_value: Option<Amount>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_raw_reward() -> RawReward {
        RawReward {
            id: RewardId(1),
            title: "Potongan 10%".to_string(),
            description: None,
            points_cost: Points(100),
            reward_type: RewardType::Discount,
            discount_type: Some(DiscountType::Percentage),
            discount_value: Some(10),
            target_product_id: None,
            coupon_type: CouponScope::Both,
            min_order_value: Amount(0),
            is_active: true,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        }
    }

    #[test]
    fn test_discount_reward_from_raw() {
        let reward = Reward::from_raw(create_raw_reward()).unwrap();
        assert_eq!(reward.prize, Discount::Percentage { percent: 10 });
        assert_eq!(reward.reward_type(), RewardType::Discount);
    }

    #[test]
    fn test_free_product_reward_from_raw() {
        let mut raw = create_raw_reward();
        raw.reward_type = RewardType::FreeProduct;
        raw.discount_type = None;
        raw.discount_value = None;
        raw.target_product_id = Some(ProductId(12));
        let reward = Reward::from_raw(raw).unwrap();
        assert_eq!(reward.prize, Discount::FreeProduct { product_id: ProductId(12) });
    }

    #[test]
    fn test_mismatched_reward_is_rejected() {
        let mut raw = create_raw_reward();
        raw.reward_type = RewardType::FreeProduct;
        assert!(Reward::from_raw(raw).is_err());
    }

    #[test]
    fn test_insert_reward_columns() {
        let payload = NewReward {
            title: "Gratis madu".to_string(),
            description: None,
            points_cost: Points(250),
            prize: Discount::FreeProduct { product_id: ProductId(5) },
            coupon_type: CouponScope::Store,
            min_order_value: Amount(0),
        };
        let insert = InsertReward::from(&payload);
        assert_eq!(insert.reward_type, RewardType::FreeProduct);
        assert_eq!(insert.discount_type, None);
        assert_eq!(insert.target_product_id, Some(ProductId(5)));
    }
}
