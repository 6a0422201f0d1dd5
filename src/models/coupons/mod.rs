pub mod coupons;
pub mod discount;
pub mod pricing;
pub mod used_coupons;

pub use self::coupons::*;
pub use self::discount::*;
pub use self::pricing::*;
pub use self::used_coupons::*;
