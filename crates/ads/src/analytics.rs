//! Performance math over the raw interaction counters. Pure computation,
//! nothing here is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vendora_core::types::ServiceAd;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdPerformance {
    pub ad_id: Uuid,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    /// Click-through rate as a percentage, 2 decimals.
    pub ctr: f64,
    /// Conversions per click as a percentage, 2 decimals.
    pub conversion_rate: f64,
    pub days_active: i64,
    pub total_spent: f64,
    pub average_daily_cost: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Whole days the ad has been live: ceil((min(now, end) − start) / 1 day),
/// floored at 1 once the ad has started; 0 if it never started.
fn days_active(ad: &ServiceAd, now: DateTime<Utc>) -> i64 {
    let Some(start) = ad.actual_start_date else {
        return 0;
    };
    let end = ad.actual_end_date.unwrap_or(ad.admin_end_date);
    let effective_end = end.min(now);
    let seconds = (effective_end - start).num_seconds();
    ((seconds as f64 / 86_400.0).ceil() as i64).max(1)
}

pub fn performance(ad: &ServiceAd, total_spent: f64, now: DateTime<Utc>) -> AdPerformance {
    let ctr = if ad.impression_count > 0 {
        round2(ad.click_count as f64 / ad.impression_count as f64 * 100.0)
    } else {
        0.0
    };
    let conversion_rate = if ad.click_count > 0 {
        round2(ad.conversion_count as f64 / ad.click_count as f64 * 100.0)
    } else {
        0.0
    };
    let days = days_active(ad, now);
    let average_daily_cost = if days > 0 {
        round2(total_spent / days as f64)
    } else {
        0.0
    };

    AdPerformance {
        ad_id: ad.id,
        impressions: ad.impression_count,
        clicks: ad.click_count,
        conversions: ad.conversion_count,
        ctr,
        conversion_rate,
        days_active: days,
        total_spent,
        average_daily_cost,
    }
}
