//! Product price as seen by the discount engine

use models::{Amount, ProductId};

#[derive(Debug, Serialize, Deserialize, Queryable, Clone, Copy, PartialEq)]
pub struct ProductPrice {
    pub product_id: ProductId,
    pub price: Amount,
    pub is_active: bool,
}
