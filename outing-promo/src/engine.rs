use chrono::{DateTime, Utc};
use outing_core::{round_cents, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

use crate::models::{normalize_code, Coupon, CouponApplication, CouponStatus, CouponType, CouponUsage};

#[derive(Debug, thiserror::Error)]
pub enum CouponError {
    #[error("Invalid coupon code")]
    InvalidCode,

    #[error("This coupon has been disabled")]
    Disabled,

    #[error("This coupon has expired")]
    Expired,

    #[error("This coupon is only valid on your first ride")]
    FirstRideOnly,

    #[error("This coupon is not valid for your account")]
    NotEligible,

    #[error("This coupon cannot be used at {0}")]
    ExcludedVenue(String),

    #[error("Minimum ride amount is ${0:.2}")]
    BelowMinimum(f64),

    #[error("You have already used this coupon")]
    AlreadyUsed,

    #[error("Coupon code already exists: {0}")]
    DuplicateCode(String),

    #[error("Invalid coupon definition: {0}")]
    InvalidDefinition(String),

    #[error("Failed to persist coupons: {0}")]
    Store(#[from] StoreError),
}

impl CouponError {
    /// True for eligibility failures a rider can act on.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            CouponError::DuplicateCode(_) | CouponError::InvalidDefinition(_) | CouponError::Store(_)
        )
    }
}

/// Discount for `ride_amount`, rounded to cents and never above the ride.
pub fn calculate_discount(coupon: &Coupon, ride_amount: f64) -> f64 {
    let amount = if ride_amount.is_finite() { ride_amount.max(0.0) } else { 0.0 };
    let value = coupon.value.max(0.0);

    let discount = match coupon.coupon_type {
        CouponType::Percentage => {
            let raw = amount * value / 100.0;
            match coupon.max_discount {
                Some(cap) => raw.min(cap.max(0.0)),
                None => raw,
            }
        }
        CouponType::FixedAmount | CouponType::Referral => value.min(amount),
        CouponType::FirstRideFree => amount,
        CouponType::Unknown => 0.0,
    };

    round_cents(discount.min(amount))
}

/// In-memory snapshot of coupons and the redemption ledger. Mutations return
/// a new snapshot so callers can persist before swapping it in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CouponBook {
    pub coupons: Vec<Coupon>,
    pub usage: Vec<CouponUsage>,
}

impl CouponBook {
    pub fn new(coupons: Vec<Coupon>, usage: Vec<CouponUsage>) -> Self {
        Self { coupons, usage }
    }

    pub fn find(&self, code: &str) -> Option<&Coupon> {
        let code = normalize_code(code);
        self.coupons.iter().find(|c| c.code == code)
    }

    pub fn user_redemptions(&self, coupon_id: Uuid, user_id: &str) -> usize {
        self.usage
            .iter()
            .filter(|u| u.coupon_id == coupon_id && u.user_id == user_id)
            .count()
    }

    /// Eligibility checks in fixed order; the first failure wins.
    pub fn validate_coupon(
        &self,
        code: &str,
        user_id: &str,
        ride_amount: f64,
        venue: Option<&str>,
        is_first_ride: bool,
        now: DateTime<Utc>,
    ) -> Result<&Coupon, CouponError> {
        let coupon = self.find(code).ok_or(CouponError::InvalidCode)?;

        match coupon.status {
            CouponStatus::Disabled => return Err(CouponError::Disabled),
            CouponStatus::Expired => return Err(CouponError::Expired),
            _ => {}
        }

        if coupon.is_expired_at(now) {
            return Err(CouponError::Expired);
        }

        if coupon.first_ride_only && !is_first_ride {
            return Err(CouponError::FirstRideOnly);
        }

        if !coupon.allows_user(user_id) {
            return Err(CouponError::NotEligible);
        }

        if let Some(venue) = venue.filter(|v| coupon.excludes_venue(v)) {
            return Err(CouponError::ExcludedVenue(venue.to_string()));
        }

        if let Some(min) = coupon.min_ride_amount {
            if ride_amount < min {
                return Err(CouponError::BelowMinimum(min));
            }
        }

        if let Some(limit) = coupon.usage_limit {
            if self.user_redemptions(coupon.id, user_id) >= limit as usize {
                return Err(CouponError::AlreadyUsed);
            }
        }

        Ok(coupon)
    }

    pub fn apply_coupon(
        &self,
        code: &str,
        user_id: &str,
        ride_amount: f64,
        venue: Option<&str>,
        is_first_ride: bool,
        now: DateTime<Utc>,
    ) -> Result<CouponApplication, CouponError> {
        let coupon = self.validate_coupon(code, user_id, ride_amount, venue, is_first_ride, now)?;
        let discount_amount = calculate_discount(coupon, ride_amount);
        let final_amount = round_cents((ride_amount - discount_amount).max(0.0));

        Ok(CouponApplication {
            coupon: coupon.clone(),
            discount_amount,
            final_amount,
        })
    }

    /// Snapshot with the ledger row appended and the coupon's counter bumped.
    /// An unknown coupon id still records the row.
    pub fn with_usage(&self, usage: CouponUsage) -> CouponBook {
        let mut next = self.clone();
        match next.coupons.iter_mut().find(|c| c.id == usage.coupon_id) {
            Some(coupon) => coupon.usage_count += 1,
            None => warn!(
                coupon_id = %usage.coupon_id,
                "Recorded usage for unknown coupon, counter not incremented"
            ),
        }
        next.usage.push(usage);
        next
    }

    /// Coupons anyone could still use. Per-user checks are not applied.
    pub fn active_coupons(&self, now: DateTime<Utc>) -> Vec<Coupon> {
        self.coupons
            .iter()
            .filter(|c| c.is_active_at(now))
            .cloned()
            .collect()
    }

    /// Recomputes every `usage_count` from the ledger. Returns whether
    /// anything changed.
    pub fn reconcile(&mut self) -> bool {
        let mut counts: HashMap<Uuid, u32> = HashMap::new();
        for row in &self.usage {
            *counts.entry(row.coupon_id).or_default() += 1;
        }

        let mut changed = false;
        for coupon in &mut self.coupons {
            let expected = counts.get(&coupon.id).copied().unwrap_or(0);
            if coupon.usage_count != expected {
                warn!(
                    code = %coupon.code,
                    stored = coupon.usage_count,
                    ledger = expected,
                    "Coupon usage count drifted from ledger"
                );
                coupon.usage_count = expected;
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn welcome50() -> Coupon {
        let mut c = Coupon::new("WELCOME50", CouponType::Percentage, 50.0);
        c.max_discount = Some(25.0);
        c.first_ride_only = true;
        c
    }

    fn save20() -> Coupon {
        let mut c = Coupon::new("SAVE20", CouponType::FixedAmount, 20.0);
        c.min_ride_amount = Some(40.0);
        c
    }

    fn book(coupons: Vec<Coupon>) -> CouponBook {
        CouponBook::new(coupons, Vec::new())
    }

    #[test]
    fn test_welcome50_caps_percentage() {
        let book = book(vec![welcome50()]);
        let applied = book
            .apply_coupon("welcome50", "rider-1", 80.0, None, true, Utc::now())
            .unwrap();
        assert_eq!(applied.discount_amount, 25.0);
        assert_eq!(applied.final_amount, 55.0);
    }

    #[test]
    fn test_save20_below_minimum() {
        let book = book(vec![save20()]);
        let err = book
            .validate_coupon("SAVE20", "rider-1", 30.0, None, false, Utc::now())
            .unwrap_err();
        assert_eq!(err.to_string(), "Minimum ride amount is $40.00");

        let ok = book.apply_coupon("SAVE20", "rider-1", 45.0, None, false, Utc::now()).unwrap();
        assert_eq!(ok.discount_amount, 20.0);
        assert_eq!(ok.final_amount, 25.0);
    }

    #[test]
    fn test_check_order_is_fixed() {
        let now = Utc::now();
        let mut coupon = welcome50();
        coupon.expires_at = Some(now - Duration::hours(1));
        coupon.valid_for_user_ids = Some(vec!["someone-else".to_string()]);
        coupon.min_ride_amount = Some(100.0);
        let book = book(vec![coupon]);

        // Expiry is reported before every later check
        let err = book.validate_coupon("WELCOME50", "rider-1", 5.0, None, false, now).unwrap_err();
        assert_eq!(err.to_string(), "This coupon has expired");

        let mut later = book.clone();
        later.coupons[0].expires_at = None;
        let err = later.validate_coupon("WELCOME50", "rider-1", 5.0, None, false, now).unwrap_err();
        assert_eq!(err.to_string(), "This coupon is only valid on your first ride");

        let err = later.validate_coupon("WELCOME50", "rider-1", 5.0, None, true, now).unwrap_err();
        assert_eq!(err.to_string(), "This coupon is not valid for your account");

        let err = later
            .validate_coupon("WELCOME50", "someone-else", 5.0, None, true, now)
            .unwrap_err();
        assert_eq!(err.to_string(), "Minimum ride amount is $100.00");
    }

    #[test]
    fn test_status_checks() {
        let now = Utc::now();
        let mut disabled = Coupon::new("OFF", CouponType::FixedAmount, 5.0);
        disabled.status = CouponStatus::Disabled;
        let mut expired = Coupon::new("OLD", CouponType::FixedAmount, 5.0);
        expired.status = CouponStatus::Expired;
        let book = book(vec![disabled, expired]);

        let err = book.validate_coupon("off", "u", 10.0, None, false, now).unwrap_err();
        assert_eq!(err.to_string(), "This coupon has been disabled");
        let err = book.validate_coupon("old", "u", 10.0, None, false, now).unwrap_err();
        assert_eq!(err.to_string(), "This coupon has expired");
        let err = book.validate_coupon("nope", "u", 10.0, None, false, now).unwrap_err();
        assert_eq!(err.to_string(), "Invalid coupon code");
    }

    #[test]
    fn test_excluded_venue_only_when_supplied() {
        let mut coupon = Coupon::new("GAMEDAY", CouponType::FixedAmount, 5.0);
        coupon.excluded_venues = Some(vec!["Progressive Field".to_string()]);
        let book = book(vec![coupon]);
        let now = Utc::now();

        let err = book
            .validate_coupon("GAMEDAY", "u", 10.0, Some("Progressive Field"), false, now)
            .unwrap_err();
        assert_eq!(err.to_string(), "This coupon cannot be used at Progressive Field");
        assert!(book.validate_coupon("GAMEDAY", "u", 10.0, None, false, now).is_ok());
        assert!(book
            .validate_coupon("GAMEDAY", "u", 10.0, Some("Barley House"), false, now)
            .is_ok());
    }

    #[test]
    fn test_per_user_limit_uses_ledger() {
        let mut coupon = Coupon::new("ONCE", CouponType::FixedAmount, 5.0);
        coupon.usage_limit = Some(1);
        // Global counter is ignored for the per-user check
        coupon.usage_count = 0;
        let id = coupon.id;
        let book = book(vec![coupon]).with_usage(CouponUsage::new(id, "u1".into(), "r1".into(), 5.0));
        let now = Utc::now();

        let err = book.validate_coupon("ONCE", "u1", 10.0, None, false, now).unwrap_err();
        assert_eq!(err.to_string(), "You have already used this coupon");
        assert!(book.validate_coupon("ONCE", "u2", 10.0, None, false, now).is_ok());
    }

    #[test]
    fn test_discount_never_exceeds_ride() {
        let mut fixed = Coupon::new("F", CouponType::FixedAmount, 20.0);
        assert_eq!(calculate_discount(&fixed, 12.5), 12.5);
        fixed.coupon_type = CouponType::Referral;
        assert_eq!(calculate_discount(&fixed, 12.5), 12.5);
        assert_eq!(calculate_discount(&fixed, 30.0), 20.0);

        let free = Coupon::new("FREE", CouponType::FirstRideFree, 0.0);
        assert_eq!(calculate_discount(&free, 17.35), 17.35);

        let unknown = Coupon::new("?", CouponType::Unknown, 99.0);
        assert_eq!(calculate_discount(&unknown, 17.35), 0.0);

        let pct = Coupon::new("P", CouponType::Percentage, 15.0);
        assert_eq!(calculate_discount(&pct, 33.33), 5.0);
        assert_eq!(calculate_discount(&pct, -4.0), 0.0);
    }

    #[test]
    fn test_first_ride_free_final_is_zero() {
        let book = book(vec![Coupon::new("FREERIDE", CouponType::FirstRideFree, 0.0)]);
        let applied = book.apply_coupon("freeride", "u", 21.4, None, true, Utc::now()).unwrap();
        assert_eq!(applied.final_amount, 0.0);
    }

    #[test]
    fn test_with_usage_is_copy_on_write() {
        let coupon = save20();
        let id = coupon.id;
        let original = book(vec![coupon]);

        let next = original.with_usage(CouponUsage::new(id, "u".into(), "r".into(), 20.0));
        assert_eq!(original.coupons[0].usage_count, 0);
        assert!(original.usage.is_empty());
        assert_eq!(next.coupons[0].usage_count, 1);
        assert_eq!(next.usage.len(), 1);

        let orphan = next.with_usage(CouponUsage::new(Uuid::new_v4(), "u".into(), "r2".into(), 1.0));
        assert_eq!(orphan.usage.len(), 2);
        assert_eq!(orphan.coupons[0].usage_count, 1);
    }

    #[test]
    fn test_active_coupons_filter() {
        let now = Utc::now();
        let live = save20();
        let mut spent = Coupon::new("SPENT", CouponType::FixedAmount, 5.0);
        spent.usage_limit = Some(1);
        spent.usage_count = 1;
        let mut lapsed = Coupon::new("LAPSED", CouponType::FixedAmount, 5.0);
        lapsed.expires_at = Some(now - Duration::days(1));

        let active = book(vec![live, spent, lapsed]).active_coupons(now);
        let codes: Vec<&str> = active.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["SAVE20"]);
    }

    #[test]
    fn test_reconcile_from_ledger() {
        let mut coupon = save20();
        coupon.usage_count = 7;
        let id = coupon.id;
        let mut book = CouponBook::new(
            vec![coupon],
            vec![
                CouponUsage::new(id, "a".into(), "r1".into(), 20.0),
                CouponUsage::new(id, "b".into(), "r2".into(), 20.0),
            ],
        );

        assert!(book.reconcile());
        assert_eq!(book.coupons[0].usage_count, 2);
        assert!(!book.reconcile());
    }
}
