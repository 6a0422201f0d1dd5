//! Model reward_redemptions
//!
//! Status lifecycle: `active` is initial, `used`, `expired` and `cancelled` are terminal.
//! `expired` is never written by a sweep, it is computed from `expires_at` on read.
use std::time::SystemTime;

use diesel::sql_types::VarChar;

use models::{Coupon, CouponCode, Points, RedemptionId, RewardId, UserId};
use schema::reward_redemptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "VarChar"]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    Active,
    Used,
    Expired,
    Cancelled,
}

varchar_enum_impls!(RedemptionStatus {
    Active => "active",
    Used => "used",
    Expired => "expired",
    Cancelled => "cancelled",
});

impl RedemptionStatus {
    pub fn can_transition_to(&self, next: RedemptionStatus) -> bool {
        match (*self, next) {
            (RedemptionStatus::Active, RedemptionStatus::Used)
            | (RedemptionStatus::Active, RedemptionStatus::Expired)
            | (RedemptionStatus::Active, RedemptionStatus::Cancelled) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Queryable, Clone, PartialEq)]
pub struct RewardRedemption {
    pub id: RedemptionId,
    pub user_id: UserId,
    pub reward_id: RewardId,
    pub points_spent: Points,
    pub coupon_code: CouponCode,
    pub status: RedemptionStatus,
    pub expires_at: SystemTime,
    pub redeemed_at: SystemTime,
    pub used_at: Option<SystemTime>,
}

impl RewardRedemption {
    /// Status as the customer sees it, an active redemption past its expiry is expired
    pub fn effective_status(&self, now: SystemTime) -> RedemptionStatus {
        match self.status {
            RedemptionStatus::Active if self.expires_at < now => RedemptionStatus::Expired,
            status => status,
        }
    }
}

#[derive(Serialize, Deserialize, Insertable, Clone, Debug)]
#[table_name = "reward_redemptions"]
pub struct NewRewardRedemption {
    pub user_id: UserId,
    pub reward_id: RewardId,
    pub points_spent: Points,
    pub coupon_code: CouponCode,
    pub status: RedemptionStatus,
    pub expires_at: SystemTime,
}

/// Payload for redeeming a reward. The caller hands over the balance it read from the session user.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RedeemRewardPayload {
    pub reward_id: RewardId,
    pub current_points: Points,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedemptionRejection {
    NotFound,
    InsufficientPoints { required: Points, available: Points },
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RedemptionOutcome {
    Redeemed { redemption: RewardRedemption, coupon: Coupon },
    Rejected(RedemptionRejection),
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_only_active_moves() {
        assert!(RedemptionStatus::Active.can_transition_to(RedemptionStatus::Used));
        assert!(RedemptionStatus::Active.can_transition_to(RedemptionStatus::Cancelled));
        assert!(!RedemptionStatus::Used.can_transition_to(RedemptionStatus::Active));
        assert!(!RedemptionStatus::Cancelled.can_transition_to(RedemptionStatus::Used));
        assert!(!RedemptionStatus::Expired.can_transition_to(RedemptionStatus::Used));
        assert!(!RedemptionStatus::Active.can_transition_to(RedemptionStatus::Active));
    }

    #[test]
    fn test_effective_status_is_lazy_expiry() {
        let now = SystemTime::now();
        let mut redemption = RewardRedemption {
            id: RedemptionId(1),
            user_id: UserId(42),
            reward_id: RewardId(1),
            points_spent: Points(100),
            coupon_code: CouponCode::from("RWD-ABCDEF12"),
            status: RedemptionStatus::Active,
            expires_at: now - Duration::from_secs(1),
            redeemed_at: now - Duration::from_secs(3600),
            used_at: None,
        };
        assert_eq!(redemption.effective_status(now), RedemptionStatus::Expired);

        redemption.status = RedemptionStatus::Used;
        assert_eq!(redemption.effective_status(now), RedemptionStatus::Used);

        redemption.status = RedemptionStatus::Active;
        redemption.expires_at = now + Duration::from_secs(3600);
        assert_eq!(redemption.effective_status(now), RedemptionStatus::Active);
    }
}
