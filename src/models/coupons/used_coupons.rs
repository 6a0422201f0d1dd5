//! Model coupon_usage, the per-user ledger of applied coupons.
//! At most one record per (user, coupon), records are never updated or deleted.
use std::time::SystemTime;

use diesel::sql_types::VarChar;

use models::{CouponId, OrderId, UserId};
use schema::coupon_usage;

/// Kind of order that consumed a coupon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "VarChar"]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Store,
    Service,
}

varchar_enum_impls!(OrderType {
    Store => "store",
    Service => "service",
});

#[derive(Debug, Serialize, Deserialize, Queryable, Clone, PartialEq)]
pub struct UsedCoupon {
    pub user_id: UserId,
    pub coupon_id: CouponId,
    pub order_type: OrderType,
    pub order_id: Option<OrderId>,
    pub used_at: SystemTime,
}

/// Payload for creating usage record
#[derive(Serialize, Deserialize, Insertable, Clone, Debug)]
#[table_name = "coupon_usage"]
pub struct NewUsedCoupon {
    pub user_id: UserId,
    pub coupon_id: CouponId,
    pub order_type: OrderType,
    pub order_id: Option<OrderId>,
}
