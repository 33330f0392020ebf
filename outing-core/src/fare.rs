use serde::{Deserialize, Serialize};

pub const BASE_FARE: f64 = 3.00;
pub const PER_MILE: f64 = 1.85;
pub const AIRPORT_FEE: f64 = 4.00;

/// Fares are rounded up to this many steps per dollar ($0.05).
const ROUNDING_STEPS_PER_DOLLAR: f64 = 20.0;

/// Tolerance so that `4.85 * 20.0 == 97.00000000000001` does not round up a step.
const ROUNDING_EPSILON: f64 = 1e-9;

/// Rounds a dollar amount to whole cents.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Linear fare model parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareConfig {
    /// Flag-drop amount in USD
    pub base: f64,

    /// Cost per mile in USD
    pub per_mile: f64,

    /// Flat surcharge for airport drop-offs
    pub airport_fee: f64,
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            base: BASE_FARE,
            per_mile: PER_MILE,
            airport_fee: AIRPORT_FEE,
        }
    }
}

impl FareConfig {
    /// `ceil((base + miles * per_mile) * surge * 20) / 20`
    ///
    /// Negative distances are treated as zero and surge never discounts below 1.0.
    pub fn estimate(&self, distance_miles: f64, surge: f64) -> f64 {
        let distance = sanitize_distance(distance_miles);
        let surge = sanitize_surge(surge);

        let raw = (self.base + distance * self.per_mile) * surge;
        let steps = (raw * ROUNDING_STEPS_PER_DOLLAR - ROUNDING_EPSILON).ceil();
        round_cents(steps / ROUNDING_STEPS_PER_DOLLAR)
    }
}

/// Fare estimate with the default model.
pub fn estimate_fare(distance_miles: f64, surge: f64) -> f64 {
    FareConfig::default().estimate(distance_miles, surge)
}

fn sanitize_distance(distance_miles: f64) -> f64 {
    if distance_miles.is_finite() && distance_miles > 0.0 {
        distance_miles
    } else {
        0.0
    }
}

fn sanitize_surge(surge: f64) -> f64 {
    if surge.is_finite() && surge > 1.0 {
        surge
    } else {
        1.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FareLine {
    pub label: String,
    pub amount: f64,
}

/// Itemized ride price. Built once by [`RideQuote::build`] and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RideQuote {
    pub base: f64,
    pub distance_miles: f64,
    pub per_mile_cost: f64,
    pub airport_fee: f64,
    pub surge: f64,
    pub total: f64,
    pub breakdown: Vec<FareLine>,
}

impl RideQuote {
    pub fn build(distance_miles: f64, surge: f64, to_airport: bool, config: &FareConfig) -> Self {
        let distance = sanitize_distance(distance_miles);
        let surge = sanitize_surge(surge);

        let fare = config.estimate(distance, surge);
        let distance_cost = round_cents(distance * config.per_mile);
        let airport_fee = if to_airport { config.airport_fee } else { 0.0 };

        let mut breakdown = vec![
            FareLine {
                label: "Base fare".to_string(),
                amount: config.base,
            },
            FareLine {
                label: format!("Distance ({:.1} mi x ${:.2})", distance, config.per_mile),
                amount: distance_cost,
            },
        ];

        // Includes the round-up to the next $0.05
        let adjustment = round_cents(fare - config.base - distance_cost);
        if adjustment != 0.0 {
            let label = if surge > 1.0 {
                format!("Surge ({:.1}x)", surge)
            } else {
                "Rounding".to_string()
            };
            breakdown.push(FareLine { label, amount: adjustment });
        }

        if to_airport {
            breakdown.push(FareLine {
                label: "Airport fee".to_string(),
                amount: airport_fee,
            });
        }

        Self {
            base: config.base,
            distance_miles: distance,
            per_mile_cost: config.per_mile,
            airport_fee,
            surge,
            total: round_cents(fare + airport_fee),
            breakdown,
        }
    }
}
