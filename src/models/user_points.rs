//! Points balance of a customer, the only column of users this crate touches

use models::{Points, UserId};

#[derive(Debug, Serialize, Deserialize, Queryable, Clone, Copy, PartialEq)]
pub struct UserPoints {
    pub user_id: UserId,
    pub points: Points,
}
