//! Repos is a module responsible for interacting with postgres db
#[macro_use]
pub mod acl;
pub mod coupons;
pub mod products;
pub mod repo_factory;
pub mod rewards;
pub mod types;
pub mod user_points;

pub use self::acl::*;
pub use self::coupons::*;
pub use self::products::*;
pub use self::repo_factory::*;
pub use self::rewards::*;
pub use self::types::*;
pub use self::user_points::*;
