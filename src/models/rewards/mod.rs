pub mod redemptions;
pub mod rewards;

pub use self::redemptions::*;
pub use self::rewards::*;
