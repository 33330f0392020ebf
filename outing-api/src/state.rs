use outing_catalog::EventAggregator;
use outing_places::SmartAddResolver;
use outing_promo::CouponService;
use outing_shared::GeoPoint;
use std::sync::Arc;

/// Request defaults for event discovery.
#[derive(Clone, Copy, Debug)]
pub struct DiscoveryDefaults {
    pub origin: GeoPoint,
    pub radius_miles: f64,
    pub page_size: u32,
}

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<EventAggregator>,
    pub resolver: Arc<SmartAddResolver>,
    pub coupons: Arc<CouponService>,
    pub discovery: DiscoveryDefaults,
}
