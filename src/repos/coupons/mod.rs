pub mod coupons;
pub mod used_coupons;

pub use self::coupons::*;
pub use self::used_coupons::*;
