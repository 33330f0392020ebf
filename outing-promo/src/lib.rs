pub mod engine;
pub mod models;
pub mod seed;
pub mod service;

pub use engine::{calculate_discount, CouponBook, CouponError};
pub use models::{Coupon, CouponApplication, CouponStatus, CouponType, CouponUsage, NewCoupon};
pub use service::{CouponService, Redemption, COUPONS_KEY, USAGE_KEY};
