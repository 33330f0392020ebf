use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CouponType {
    /// `value` percent off, capped at `max_discount`
    Percentage,
    /// `value` dollars off
    FixedAmount,
    /// The whole ride is waived
    FirstRideFree,
    /// Fixed credit from a referral, `value` dollars
    Referral,
    /// Types written by newer issuers; never discounts
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CouponStatus {
    Active,
    Expired,
    Disabled,
    Used,
}

/// A promotional code. Records are never deleted; redemption only bumps
/// `usage_count`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coupon {
    pub id: Uuid,
    /// Upper-case, trimmed
    pub code: String,
    pub coupon_type: CouponType,
    pub value: f64,
    #[serde(default)]
    pub min_ride_amount: Option<f64>,
    #[serde(default)]
    pub max_discount: Option<f64>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub usage_count: u32,
    pub status: CouponStatus,
    #[serde(default)]
    pub first_ride_only: bool,
    #[serde(default)]
    pub valid_for_user_ids: Option<Vec<String>>,
    #[serde(default)]
    pub excluded_venues: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    pub fn new(code: &str, coupon_type: CouponType, value: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: normalize_code(code),
            coupon_type,
            value,
            min_ride_amount: None,
            max_discount: None,
            expires_at: None,
            usage_limit: None,
            usage_count: 0,
            status: CouponStatus::Active,
            first_ride_only: false,
            valid_for_user_ids: None,
            excluded_venues: None,
            description: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at < now).unwrap_or(false)
    }

    /// Global limit reached across all users.
    pub fn is_exhausted(&self) -> bool {
        self.usage_limit
            .map(|limit| self.usage_count >= limit)
            .unwrap_or(false)
    }

    /// Whether anyone could still redeem this coupon.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == CouponStatus::Active && !self.is_expired_at(now) && !self.is_exhausted()
    }

    pub fn excludes_venue(&self, venue: &str) -> bool {
        let venue = venue.trim();
        self.excluded_venues
            .as_ref()
            .map(|list| list.iter().any(|v| v.trim().eq_ignore_ascii_case(venue)))
            .unwrap_or(false)
    }

    pub fn allows_user(&self, user_id: &str) -> bool {
        self.valid_for_user_ids
            .as_ref()
            .map(|ids| ids.iter().any(|id| id == user_id))
            .unwrap_or(true)
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Admin payload for issuing a coupon.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCoupon {
    pub code: String,
    pub coupon_type: CouponType,
    pub value: f64,
    pub min_ride_amount: Option<f64>,
    pub max_discount: Option<f64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub first_ride_only: bool,
    pub valid_for_user_ids: Option<Vec<String>>,
    pub excluded_venues: Option<Vec<String>>,
    pub description: Option<String>,
}

impl NewCoupon {
    pub fn into_coupon(self) -> Coupon {
        let mut coupon = Coupon::new(&self.code, self.coupon_type, self.value);
        coupon.min_ride_amount = self.min_ride_amount;
        coupon.max_discount = self.max_discount;
        coupon.expires_at = self.expires_at;
        coupon.usage_limit = self.usage_limit;
        coupon.first_ride_only = self.first_ride_only;
        coupon.valid_for_user_ids = self.valid_for_user_ids;
        coupon.excluded_venues = self.excluded_venues;
        coupon.description = self.description;
        coupon
    }
}

/// One row per successful redemption. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CouponUsage {
    pub id: Uuid,
    pub coupon_id: Uuid,
    pub user_id: String,
    pub ride_id: String,
    pub discount_amount: f64,
    pub applied_at: DateTime<Utc>,
}

impl CouponUsage {
    pub fn new(coupon_id: Uuid, user_id: String, ride_id: String, discount_amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            coupon_id,
            user_id,
            ride_id,
            discount_amount,
            applied_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CouponApplication {
    pub coupon: Coupon,
    pub discount_amount: f64,
    pub final_amount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_code_is_normalized() {
        let coupon = Coupon::new("  welcome50 ", CouponType::Percentage, 50.0);
        assert_eq!(coupon.code, "WELCOME50");
        assert_eq!(coupon.status, CouponStatus::Active);
    }

    #[test]
    fn test_activity_rules() {
        let now = Utc::now();
        let mut coupon = Coupon::new("X", CouponType::FixedAmount, 5.0);
        assert!(coupon.is_active_at(now));

        coupon.expires_at = Some(now - Duration::minutes(1));
        assert!(!coupon.is_active_at(now));

        coupon.expires_at = Some(now + Duration::days(1));
        coupon.usage_limit = Some(2);
        coupon.usage_count = 2;
        assert!(coupon.is_exhausted());
        assert!(!coupon.is_active_at(now));

        coupon.usage_count = 1;
        coupon.status = CouponStatus::Disabled;
        assert!(!coupon.is_active_at(now));
    }

    #[test]
    fn test_unrecognized_type_decodes_as_unknown() {
        let raw = json!({
            "id": Uuid::new_v4(),
            "code": "MYSTERY",
            "coupon_type": "buy_one_get_one",
            "value": 5.0,
            "status": "active",
            "created_at": "2026-01-01T00:00:00Z"
        });
        let coupon: Coupon = serde_json::from_value(raw).unwrap();
        assert_eq!(coupon.coupon_type, CouponType::Unknown);
        assert_eq!(coupon.usage_count, 0);
        assert!(!coupon.first_ride_only);
    }

    #[test]
    fn test_venue_and_user_lists() {
        let mut coupon = Coupon::new("X", CouponType::FixedAmount, 5.0);
        assert!(coupon.allows_user("anyone"));
        assert!(!coupon.excludes_venue("Progressive Field"));

        coupon.valid_for_user_ids = Some(vec!["u1".to_string()]);
        coupon.excluded_venues = Some(vec!["Progressive Field".to_string()]);
        assert!(coupon.allows_user("u1"));
        assert!(!coupon.allows_user("u2"));
        assert!(coupon.excludes_venue(" progressive field"));
    }
}
