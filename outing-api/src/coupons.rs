use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use outing_promo::{Coupon, CouponApplication, CouponUsage, Redemption};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CouponRequest {
    pub code: String,
    pub user_id: String,
    pub ride_amount: f64,
    pub venue: Option<String>,
    #[serde(default)]
    pub is_first_ride: bool,
}

impl CouponRequest {
    fn check(&self) -> Result<(), AppError> {
        if !self.ride_amount.is_finite() || self.ride_amount < 0.0 {
            return Err(AppError::ValidationError(
                "ride_amount must be a non-negative number".to_string(),
            ));
        }
        if self.user_id.trim().is_empty() {
            return Err(AppError::ValidationError("user_id is required".to_string()));
        }
        Ok(())
    }

    fn venue(&self) -> Option<&str> {
        self.venue.as_deref().filter(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    #[serde(flatten)]
    pub coupon: CouponRequest,
    pub ride_id: String,
}

#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<Coupon>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/coupons/validate", post(validate_coupon))
        .route("/v1/coupons/apply", post(apply_coupon))
        .route("/v1/coupons/redeem", post(redeem_coupon))
        .route("/v1/coupons/active", get(active_coupons))
        .route("/v1/users/{user_id}/coupon-usage", get(user_usage))
}

/// POST /v1/coupons/validate
///
/// Eligibility failures are part of the response body, not an error status.
async fn validate_coupon(
    State(state): State<AppState>,
    Json(req): Json<CouponRequest>,
) -> Result<Json<ValidationResponse>, AppError> {
    req.check()?;

    let outcome = state
        .coupons
        .validate(&req.code, &req.user_id, req.ride_amount, req.venue(), req.is_first_ride)
        .await;

    let response = match outcome {
        Ok(coupon) => ValidationResponse {
            valid: true,
            error: None,
            coupon: Some(coupon),
        },
        Err(e) if e.is_rejection() => ValidationResponse {
            valid: false,
            error: Some(e.to_string()),
            coupon: None,
        },
        Err(e) => return Err(e.into()),
    };

    Ok(Json(response))
}

/// POST /v1/coupons/apply
async fn apply_coupon(
    State(state): State<AppState>,
    Json(req): Json<CouponRequest>,
) -> Result<Json<CouponApplication>, AppError> {
    req.check()?;

    let application = state
        .coupons
        .apply(&req.code, &req.user_id, req.ride_amount, req.venue(), req.is_first_ride)
        .await?;

    Ok(Json(application))
}

/// POST /v1/coupons/redeem
async fn redeem_coupon(
    State(state): State<AppState>,
    Json(req): Json<RedeemRequest>,
) -> Result<Json<Redemption>, AppError> {
    req.coupon.check()?;
    if req.ride_id.trim().is_empty() {
        return Err(AppError::ValidationError("ride_id is required".to_string()));
    }

    let c = &req.coupon;
    let redemption = state
        .coupons
        .redeem(&c.code, &c.user_id, &req.ride_id, c.ride_amount, c.venue(), c.is_first_ride)
        .await?;

    Ok(Json(redemption))
}

/// GET /v1/coupons/active
async fn active_coupons(State(state): State<AppState>) -> Json<Vec<Coupon>> {
    Json(state.coupons.active_coupons().await)
}

/// GET /v1/users/{user_id}/coupon-usage
async fn user_usage(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<Vec<CouponUsage>> {
    Json(state.coupons.usage_for_user(&user_id).await)
}
