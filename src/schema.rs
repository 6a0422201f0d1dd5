/// diesel table for coupons
table! {
    coupons (id) {
        id -> Integer,
        code -> VarChar,
        description -> Nullable<VarChar>,
        discount_type -> VarChar,
        discount_value -> Nullable<BigInt>,
        target_product_id -> Nullable<Integer>,
        min_order_value -> BigInt,
        max_uses -> Nullable<Integer>,
        used_count -> Integer,
        coupon_type -> VarChar,
        is_active -> Bool,
        expires_at -> Nullable<Timestamp>,
        owner_user_id -> Nullable<Integer>,
        source_redemption_id -> Nullable<Integer>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

/// diesel table for coupon_usage
table! {
    coupon_usage (user_id, coupon_id) {
        user_id -> Integer,
        coupon_id -> Integer,
        order_type -> VarChar,
        order_id -> Nullable<Integer>,
        used_at -> Timestamp,
    }
}

/// diesel table for rewards
table! {
    rewards (id) {
        id -> Integer,
        title -> VarChar,
        description -> Nullable<VarChar>,
        points_cost -> Integer,
        reward_type -> VarChar,
        discount_type -> Nullable<VarChar>,
        discount_value -> Nullable<BigInt>,
        target_product_id -> Nullable<Integer>,
        coupon_type -> VarChar,
        min_order_value -> BigInt,
        is_active -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

/// diesel table for reward_redemptions
table! {
    reward_redemptions (id) {
        id -> Integer,
        user_id -> Integer,
        reward_id -> Integer,
        points_spent -> Integer,
        coupon_code -> VarChar,
        status -> VarChar,
        expires_at -> Timestamp,
        redeemed_at -> Timestamp,
        used_at -> Nullable<Timestamp>,
    }
}

/// diesel table for users, only the points balance is mapped
table! {
    users (id) {
        id -> Integer,
        points -> Integer,
    }
}

/// diesel table for products, only the price is mapped
table! {
    products (id) {
        id -> Integer,
        price -> BigInt,
        is_active -> Bool,
    }
}

joinable!(reward_redemptions -> rewards (reward_id));

allow_tables_to_appear_in_same_query!(coupons, coupon_usage, rewards, reward_redemptions, users, products);
