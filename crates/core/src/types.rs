use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity attached to a request by upstream auth middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Admin { id: Uuid },
    Vendor { id: Uuid },
    Anonymous,
}

impl Actor {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Actor::Anonymous)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin { .. })
    }

    pub fn vendor_id(&self) -> Option<Uuid> {
        match self {
            Actor::Vendor { id } => Some(*id),
            _ => None,
        }
    }

    pub fn admin_id(&self) -> Option<Uuid> {
        match self {
            Actor::Admin { id } => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdType {
    Featured,
    Sponsored,
    Premium,
}

/// Marketplace vertical the promoted listing belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Venue,
    Catering,
    Photography,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdRequestStatus {
    Pending,
    Approved,
    Rejected,
    UnderReview,
    /// Vendor withdrew the request. Kept distinct from `Rejected`; the admin
    /// rejection path and the vendor cancel path used to share one terminal
    /// state and reporting could not tell them apart.
    Cancelled,
}

/// Vendor proposal for promoting a listing. Created by the vendor, mutated
/// only by admins (approve/reject/review); never deleted except by the
/// cleanup scan once Rejected and stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdRequest {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub ad_type: AdType,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub requested_price: f64,
    pub requested_start_date: DateTime<Utc>,
    pub requested_end_date: DateTime<Utc>,
    pub status: AdRequestStatus,
    pub admin_notes: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Explicit ServiceAd lifecycle. One variant per state — pause and cancel
/// no longer reuse unrelated variants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceAdStatus {
    Scheduled,
    Active,
    Paused,
    Expired,
    Cancelled,
}

/// A recurring weekly delivery window owned by exactly one `ServiceAd`.
///
/// Invariants: `start_time < end_time` lexicographically, both `"HH:MM"`;
/// `days_of_week` ⊆ 0..=6 (0 = Sunday); `priority` ∈ 1..=5 (1 = highest).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeSlot {
    pub id: Uuid,
    pub start_time: String,
    pub end_time: String,
    pub days_of_week: Vec<u8>,
    pub priority: u8,
    pub is_active: bool,
}

/// Vendor/admin-submitted slot definition, before an id is assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlotSpec {
    pub start_time: String,
    pub end_time: String,
    pub days_of_week: Vec<u8>,
    pub priority: u8,
}

impl TimeSlotSpec {
    pub fn materialize(&self) -> TimeSlot {
        TimeSlot {
            id: Uuid::new_v4(),
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
            days_of_week: self.days_of_week.clone(),
            priority: self.priority,
            is_active: true,
        }
    }
}

/// The activated ad, spawned when an `AdRequest` is approved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAd {
    pub id: Uuid,
    pub request_id: Uuid,
    pub vendor_id: Uuid,
    pub ad_type: AdType,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub final_price: f64,
    pub status: ServiceAdStatus,
    pub admin_start_date: DateTime<Utc>,
    pub admin_end_date: DateTime<Utc>,
    pub actual_start_date: Option<DateTime<Utc>>,
    pub actual_end_date: Option<DateTime<Utc>>,
    pub impression_count: u64,
    pub click_count: u64,
    pub conversion_count: u64,
    pub time_slots: Vec<TimeSlot>,
    pub total_scheduled_runs: u64,
    pub successful_runs: u64,
    pub failed_runs: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExternalAdStatus {
    Active,
    Inactive,
    Expired,
}

/// Third-party placement independent of the vendor/request flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalAd {
    pub id: Uuid,
    pub title: String,
    pub advertiser: String,
    pub target_url: String,
    pub image_url: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: ExternalAdStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Scheduled,
    Running,
    Completed,
    Failed,
    Cancelled,
    Paused,
}

/// One concrete run of a `TimeSlot` on a specific calendar date. Created by
/// the allocator only after the availability check passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdSchedule {
    pub id: Uuid,
    pub ad_id: Uuid,
    pub time_slot_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub status: ScheduleStatus,
    pub retry_count: u32,
    pub next_retry: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// Which ad a payment settles — exactly one of the two kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum AdRef {
    Service(Uuid),
    External(Uuid),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdPayment {
    pub id: Uuid,
    pub ad_ref: AdRef,
    pub amount: f64,
    pub payment_status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Inclusive calendar-date range for bulk scheduling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Every calendar day in the range, in order. Empty when `end < start`.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}
