use chrono::Utc;
use outing_core::repository::{encode_entry, load_typed};
use outing_core::KeyValueStore;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info};
use uuid::Uuid;

use crate::engine::{CouponBook, CouponError};
use crate::models::{
    normalize_code, Coupon, CouponApplication, CouponStatus, CouponType, CouponUsage, NewCoupon,
};
use crate::seed::default_coupons;

pub const COUPONS_KEY: &str = "coupons";
pub const USAGE_KEY: &str = "coupon_usage";

#[derive(Debug, Clone, Serialize)]
pub struct Redemption {
    #[serde(flatten)]
    pub application: CouponApplication,
    pub usage: CouponUsage,
}

/// Owns coupon state. Every mutation runs under one lock, is persisted as a
/// single batch, and is only swapped into memory after the store accepts it.
pub struct CouponService {
    store: Arc<dyn KeyValueStore>,
    book: Mutex<CouponBook>,
}

impl CouponService {
    pub fn new(store: Arc<dyn KeyValueStore>, book: CouponBook) -> Self {
        Self {
            store,
            book: Mutex::new(book),
        }
    }

    /// Loads coupons and the ledger. An empty store is seeded with the
    /// launch promotions; drifted counters are rebuilt from the ledger.
    pub async fn hydrate(store: Arc<dyn KeyValueStore>) -> Result<Self, CouponError> {
        let coupons: Vec<Coupon> = load_typed(store.as_ref(), COUPONS_KEY)
            .await?
            .unwrap_or_default();
        let usage: Vec<CouponUsage> = load_typed(store.as_ref(), USAGE_KEY)
            .await?
            .unwrap_or_default();

        let seeded = coupons.is_empty();
        let coupons = if seeded { default_coupons(Utc::now()) } else { coupons };

        let mut book = CouponBook::new(coupons, usage);
        let reconciled = book.reconcile();

        if seeded || reconciled {
            persist(store.as_ref(), &book).await?;
        }

        info!(
            coupons = book.coupons.len(),
            usage = book.usage.len(),
            seeded,
            reconciled,
            "Coupon state hydrated"
        );

        Ok(Self::new(store, book))
    }

    pub async fn validate(
        &self,
        code: &str,
        user_id: &str,
        ride_amount: f64,
        venue: Option<&str>,
        is_first_ride: bool,
    ) -> Result<Coupon, CouponError> {
        let book = self.book.lock().await;
        book.validate_coupon(code, user_id, ride_amount, venue, is_first_ride, Utc::now())
            .cloned()
    }

    pub async fn apply(
        &self,
        code: &str,
        user_id: &str,
        ride_amount: f64,
        venue: Option<&str>,
        is_first_ride: bool,
    ) -> Result<CouponApplication, CouponError> {
        let book = self.book.lock().await;
        book.apply_coupon(code, user_id, ride_amount, venue, is_first_ride, Utc::now())
    }

    /// Appends a ledger row and bumps the coupon's counter as one write.
    pub async fn record_coupon_usage(
        &self,
        coupon_id: Uuid,
        user_id: &str,
        ride_id: &str,
        discount_amount: f64,
    ) -> Result<CouponUsage, CouponError> {
        let mut book = self.book.lock().await;
        let usage = CouponUsage::new(coupon_id, user_id.to_string(), ride_id.to_string(), discount_amount);
        let next = book.with_usage(usage.clone());
        self.commit(&mut book, next).await?;
        Ok(usage)
    }

    /// Applies and records under one lock, so concurrent redemptions cannot
    /// lose an increment or a ledger row. The returned coupon is the
    /// committed one.
    pub async fn redeem(
        &self,
        code: &str,
        user_id: &str,
        ride_id: &str,
        ride_amount: f64,
        venue: Option<&str>,
        is_first_ride: bool,
    ) -> Result<Redemption, CouponError> {
        let mut book = self.book.lock().await;
        let mut application =
            book.apply_coupon(code, user_id, ride_amount, venue, is_first_ride, Utc::now())?;

        let usage = CouponUsage::new(
            application.coupon.id,
            user_id.to_string(),
            ride_id.to_string(),
            application.discount_amount,
        );
        let next = book.with_usage(usage.clone());
        self.commit(&mut book, next).await?;
        if let Some(committed) = book.find(&application.coupon.code) {
            application.coupon = committed.clone();
        }

        info!(
            code = %application.coupon.code,
            user_id,
            ride_id,
            discount = application.discount_amount,
            "Coupon redeemed"
        );

        Ok(Redemption { application, usage })
    }

    pub async fn active_coupons(&self) -> Vec<Coupon> {
        self.book.lock().await.active_coupons(Utc::now())
    }

    pub async fn usage_for_user(&self, user_id: &str) -> Vec<CouponUsage> {
        self.book
            .lock()
            .await
            .usage
            .iter()
            .filter(|u| u.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn create_coupon(&self, draft: NewCoupon) -> Result<Coupon, CouponError> {
        let coupon = draft.into_coupon();
        check_definition(&coupon)?;

        let mut book = self.book.lock().await;
        if book.find(&coupon.code).is_some() {
            return Err(CouponError::DuplicateCode(coupon.code));
        }

        let mut next = book.clone();
        next.coupons.push(coupon.clone());
        self.commit(&mut book, next).await?;

        info!(code = %coupon.code, coupon_type = ?coupon.coupon_type, "Coupon created");
        Ok(coupon)
    }

    pub async fn disable_coupon(&self, code: &str) -> Result<Coupon, CouponError> {
        let code = normalize_code(code);
        let mut book = self.book.lock().await;

        let mut next = book.clone();
        let coupon = next
            .coupons
            .iter_mut()
            .find(|c| c.code == code)
            .ok_or(CouponError::InvalidCode)?;
        coupon.status = CouponStatus::Disabled;
        let disabled = coupon.clone();

        self.commit(&mut book, next).await?;
        info!(code = %disabled.code, "Coupon disabled");
        Ok(disabled)
    }

    async fn commit(
        &self,
        current: &mut MutexGuard<'_, CouponBook>,
        next: CouponBook,
    ) -> Result<(), CouponError> {
        if let Err(e) = persist(self.store.as_ref(), &next).await {
            error!(error = %e, "Coupon state not saved, keeping previous snapshot");
            return Err(e);
        }
        **current = next;
        Ok(())
    }
}

async fn persist(store: &dyn KeyValueStore, book: &CouponBook) -> Result<(), CouponError> {
    let entries = vec![
        encode_entry(COUPONS_KEY, &book.coupons)?,
        encode_entry(USAGE_KEY, &book.usage)?,
    ];
    store.save_batch(entries).await?;
    Ok(())
}

fn check_definition(coupon: &Coupon) -> Result<(), CouponError> {
    if coupon.code.is_empty() {
        return Err(CouponError::InvalidDefinition("code is required".to_string()));
    }
    if !coupon.value.is_finite() || coupon.value < 0.0 {
        return Err(CouponError::InvalidDefinition("value must be a non-negative number".to_string()));
    }
    if coupon.coupon_type == CouponType::Percentage && coupon.value > 100.0 {
        return Err(CouponError::InvalidDefinition("percentage cannot exceed 100".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use outing_core::StoreError;
    use outing_store::MemoryStore;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Delegates to memory until told to fail.
    struct FlakyStore {
        inner: MemoryStore,
        failing: AtomicBool,
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
            self.inner.load(key).await
        }

        async fn save_batch(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("connection refused".to_string()));
            }
            self.inner.save_batch(entries).await
        }
    }

    async fn seeded() -> (Arc<MemoryStore>, CouponService) {
        let store = Arc::new(MemoryStore::new());
        let service = CouponService::hydrate(store.clone()).await.unwrap();
        (store, service)
    }

    #[tokio::test]
    async fn test_hydrate_seeds_empty_store() {
        let (store, service) = seeded().await;
        let active = service.active_coupons().await;
        assert_eq!(active.len(), 4);
        assert!(store.load(COUPONS_KEY).await.unwrap().is_some());
        assert!(store.load(USAGE_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_redeem_persists_both_halves() {
        let (store, service) = seeded().await;

        let redemption = service
            .redeem("welcome50", "rider-1", "ride-1", 80.0, None, true)
            .await
            .unwrap();
        assert_eq!(redemption.application.discount_amount, 25.0);
        assert_eq!(redemption.application.final_amount, 55.0);
        assert_eq!(redemption.application.coupon.usage_count, 1);

        let reloaded = CouponService::hydrate(store).await.unwrap();
        let usage = reloaded.usage_for_user("rider-1").await;
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].ride_id, "ride-1");

        let book = reloaded.book.lock().await;
        assert_eq!(book.find("WELCOME50").unwrap().usage_count, 1);
    }

    #[tokio::test]
    async fn test_failed_save_does_not_advance_state() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            failing: AtomicBool::new(false),
        });
        let service = CouponService::hydrate(store.clone()).await.unwrap();

        store.failing.store(true, Ordering::SeqCst);
        let err = service
            .redeem("SAVE20", "rider-1", "ride-1", 50.0, None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, CouponError::Store(_)));
        assert!(!err.is_rejection());

        assert!(service.usage_for_user("rider-1").await.is_empty());
        let book = service.book.lock().await;
        assert_eq!(book.find("SAVE20").unwrap().usage_count, 0);
    }

    #[tokio::test]
    async fn test_per_user_limit_after_redeem() {
        let (_, service) = seeded().await;
        service
            .redeem("FRIEND10", "rider-1", "ride-1", 18.0, None, false)
            .await
            .unwrap();

        let err = service
            .redeem("FRIEND10", "rider-1", "ride-2", 18.0, None, false)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "You have already used this coupon");

        // Global limit of one is now spent, so it leaves the active list
        let codes: Vec<String> = service.active_coupons().await.into_iter().map(|c| c.code).collect();
        assert!(!codes.contains(&"FRIEND10".to_string()));
    }

    #[tokio::test]
    async fn test_record_unknown_coupon_still_logs_row() {
        let (_, service) = seeded().await;
        let usage = service
            .record_coupon_usage(Uuid::new_v4(), "rider-9", "ride-9", 3.0)
            .await
            .unwrap();
        assert_eq!(service.usage_for_user("rider-9").await, vec![usage]);
    }

    #[tokio::test]
    async fn test_hydrate_reconciles_drifted_counts() {
        let store = Arc::new(MemoryStore::new());
        let mut coupon = Coupon::new("DRIFT", CouponType::FixedAmount, 5.0);
        coupon.usage_count = 4;
        let usage = CouponUsage::new(coupon.id, "u".into(), "r".into(), 5.0);
        store
            .save_batch(vec![
                encode_entry(COUPONS_KEY, &vec![coupon]).unwrap(),
                encode_entry(USAGE_KEY, &vec![usage]).unwrap(),
            ])
            .await
            .unwrap();

        let service = CouponService::hydrate(store.clone()).await.unwrap();
        assert_eq!(service.book.lock().await.find("drift").unwrap().usage_count, 1);

        let stored: Vec<Coupon> = load_typed(store.as_ref(), COUPONS_KEY).await.unwrap().unwrap();
        assert_eq!(stored[0].usage_count, 1);
    }

    #[tokio::test]
    async fn test_create_and_disable() {
        let (_, service) = seeded().await;
        let draft: NewCoupon = serde_json::from_value(serde_json::json!({
            "code": "gameday5",
            "coupon_type": "fixed_amount",
            "value": 5.0,
            "excluded_venues": ["Cleveland Hopkins International Airport"]
        }))
        .unwrap();

        let created = service.create_coupon(draft.clone()).await.unwrap();
        assert_eq!(created.code, "GAMEDAY5");

        let dup = service.create_coupon(draft).await.unwrap_err();
        assert!(matches!(dup, CouponError::DuplicateCode(_)));

        service.disable_coupon("GameDay5").await.unwrap();
        let err = service
            .validate("GAMEDAY5", "u", 20.0, None, false)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "This coupon has been disabled");

        assert!(matches!(
            service.disable_coupon("NOPE").await,
            Err(CouponError::InvalidCode)
        ));
    }

    #[tokio::test]
    async fn test_rejects_bad_definitions() {
        let (_, service) = seeded().await;
        let draft: NewCoupon = serde_json::from_value(serde_json::json!({
            "code": "HALFPLUS",
            "coupon_type": "percentage",
            "value": 150.0
        }))
        .unwrap();
        assert!(matches!(
            service.create_coupon(draft).await,
            Err(CouponError::InvalidDefinition(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_keep_counter_and_ledger_in_step() {
        let store = Arc::new(MemoryStore::new());
        let service = Arc::new(CouponService::hydrate(store.clone()).await.unwrap());
        let draft: NewCoupon = serde_json::from_value(serde_json::json!({
            "code": "RALLY",
            "coupon_type": "fixed_amount",
            "value": 2.0
        }))
        .unwrap();
        let coupon_id = service.create_coupon(draft).await.unwrap().id;

        let mut handles = Vec::new();
        for i in 0..16 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .redeem("RALLY", &format!("rider-{}", i), &format!("ride-{}", i), 20.0, None, false)
                    .await
                    .map(|_| ())
            }));
        }
        for i in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .record_coupon_usage(coupon_id, "walk-up", &format!("cash-{}", i), 2.0)
                    .await
                    .map(|_| ())
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        {
            let book = service.book.lock().await;
            let rows = book.usage.iter().filter(|u| u.coupon_id == coupon_id).count();
            assert_eq!(rows, 24);
            assert_eq!(book.find("RALLY").unwrap().usage_count, 24);
        }

        // The stored snapshot agrees without needing reconciliation
        let stored: Vec<Coupon> = load_typed(store.as_ref(), COUPONS_KEY).await.unwrap().unwrap();
        let stored_usage: Vec<CouponUsage> = load_typed(store.as_ref(), USAGE_KEY).await.unwrap().unwrap();
        let rally = stored.iter().find(|c| c.code == "RALLY").unwrap();
        assert_eq!(rally.usage_count, 24);
        assert_eq!(stored_usage.iter().filter(|u| u.coupon_id == coupon_id).count(), 24);

        let reloaded = CouponService::hydrate(store).await.unwrap();
        assert_eq!(reloaded.book.lock().await.find("RALLY").unwrap().usage_count, 24);
    }
}
