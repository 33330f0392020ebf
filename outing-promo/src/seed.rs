use chrono::{DateTime, Duration, Utc};

use crate::models::{Coupon, CouponType};

/// Launch promotions written to an empty store on first start.
pub fn default_coupons(now: DateTime<Utc>) -> Vec<Coupon> {
    let mut welcome = Coupon::new("WELCOME50", CouponType::Percentage, 50.0);
    welcome.max_discount = Some(25.0);
    welcome.first_ride_only = true;
    welcome.description = Some("50% off your first ride, up to $25".to_string());

    let mut save = Coupon::new("SAVE20", CouponType::FixedAmount, 20.0);
    save.min_ride_amount = Some(40.0);
    save.usage_limit = Some(3);
    save.expires_at = Some(now + Duration::days(90));
    save.description = Some("$20 off rides of $40 or more".to_string());

    let mut free = Coupon::new("FREERIDE", CouponType::FirstRideFree, 0.0);
    free.first_ride_only = true;
    free.usage_limit = Some(1);
    free.description = Some("Your first ride is on us".to_string());

    let mut friend = Coupon::new("FRIEND10", CouponType::Referral, 10.0);
    friend.usage_limit = Some(1);
    friend.description = Some("$10 credit from a friend's invite".to_string());

    vec![welcome, save, free, friend]
        .into_iter()
        .map(|mut c| {
            c.created_at = now;
            c
        })
        .collect()
}
