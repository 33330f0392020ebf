use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use outing_promo::{Coupon, CouponError, NewCoupon};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/coupons", post(create_coupon))
        .route("/v1/admin/coupons/{code}/disable", post(disable_coupon))
}

/// POST /v1/admin/coupons
async fn create_coupon(
    State(state): State<AppState>,
    Json(req): Json<NewCoupon>,
) -> Result<(StatusCode, Json<Coupon>), AppError> {
    let coupon = state.coupons.create_coupon(req).await?;
    Ok((StatusCode::CREATED, Json(coupon)))
}

/// POST /v1/admin/coupons/{code}/disable
async fn disable_coupon(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Coupon>, AppError> {
    let coupon = state.coupons.disable_coupon(&code).await.map_err(|e| match e {
        CouponError::InvalidCode => AppError::NotFoundError(format!("Coupon not found: {}", code)),
        other => other.into(),
    })?;
    Ok(Json(coupon))
}
