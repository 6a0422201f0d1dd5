//! Models contains all structures that are used in different
//! modules of the app

pub mod authorization;
pub mod coupons;
pub mod product;
pub mod rewards;
pub mod types;
pub mod user_points;
pub mod validation_rules;

pub use self::authorization::*;
pub use self::coupons::*;
pub use self::product::*;
pub use self::rewards::*;
pub use self::types::*;
pub use self::user_points::*;
pub use self::validation_rules::*;
