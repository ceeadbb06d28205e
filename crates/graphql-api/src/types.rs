//! GraphQL representations of the domain types.

use async_graphql::{Enum, InputObject, Object};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;
use vendora_ads::analytics;
use vendora_ads::service as ads;
use vendora_core::types as domain;
use vendora_scheduler::slots;

// ─── Enums (mirrors of the domain enums) ────────────────────────────────────

#[derive(Enum, Copy, Clone, Eq, PartialEq)]
#[graphql(remote = "vendora_core::types::AdType")]
pub enum AdType {
    Featured,
    Sponsored,
    Premium,
}

#[derive(Enum, Copy, Clone, Eq, PartialEq)]
#[graphql(remote = "vendora_core::types::EntityType")]
pub enum EntityType {
    Venue,
    Catering,
    Photography,
}

#[derive(Enum, Copy, Clone, Eq, PartialEq)]
#[graphql(remote = "vendora_core::types::AdRequestStatus")]
pub enum AdRequestStatus {
    Pending,
    Approved,
    Rejected,
    UnderReview,
    Cancelled,
}

#[derive(Enum, Copy, Clone, Eq, PartialEq)]
#[graphql(remote = "vendora_core::types::ServiceAdStatus")]
pub enum ServiceAdStatus {
    Scheduled,
    Active,
    Paused,
    Expired,
    Cancelled,
}

#[derive(Enum, Copy, Clone, Eq, PartialEq)]
#[graphql(remote = "vendora_core::types::ExternalAdStatus")]
pub enum ExternalAdStatus {
    Active,
    Inactive,
    Expired,
}

#[derive(Enum, Copy, Clone, Eq, PartialEq)]
#[graphql(remote = "vendora_core::types::ScheduleStatus")]
pub enum ScheduleStatus {
    Scheduled,
    Running,
    Completed,
    Failed,
    Cancelled,
    Paused,
}

#[derive(Enum, Copy, Clone, Eq, PartialEq)]
#[graphql(remote = "vendora_core::types::PaymentStatus")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

// ─── Output objects ─────────────────────────────────────────────────────────

/// GraphQL representation of an ad request
#[derive(Clone)]
pub struct AdRequest {
    pub inner: domain::AdRequest,
}

impl From<domain::AdRequest> for AdRequest {
    fn from(inner: domain::AdRequest) -> Self {
        Self { inner }
    }
}

#[Object]
impl AdRequest {
    async fn id(&self) -> Uuid {
        self.inner.id
    }

    async fn vendor_id(&self) -> Uuid {
        self.inner.vendor_id
    }

    async fn ad_type(&self) -> AdType {
        self.inner.ad_type.into()
    }

    async fn entity_type(&self) -> EntityType {
        self.inner.entity_type.into()
    }

    async fn entity_id(&self) -> Uuid {
        self.inner.entity_id
    }

    async fn requested_price(&self) -> f64 {
        self.inner.requested_price
    }

    async fn requested_start_date(&self) -> DateTime<Utc> {
        self.inner.requested_start_date
    }

    async fn requested_end_date(&self) -> DateTime<Utc> {
        self.inner.requested_end_date
    }

    async fn status(&self) -> AdRequestStatus {
        self.inner.status.into()
    }

    async fn admin_notes(&self) -> Option<&str> {
        self.inner.admin_notes.as_deref()
    }

    async fn reviewed_by(&self) -> Option<Uuid> {
        self.inner.reviewed_by
    }

    async fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.inner.reviewed_at
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.inner.updated_at
    }
}

/// GraphQL representation of a recurring weekly time slot
#[derive(Clone)]
pub struct TimeSlot {
    pub inner: domain::TimeSlot,
}

impl From<domain::TimeSlot> for TimeSlot {
    fn from(inner: domain::TimeSlot) -> Self {
        Self { inner }
    }
}

#[Object]
impl TimeSlot {
    async fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Window start, "HH:MM"
    async fn start_time(&self) -> &str {
        &self.inner.start_time
    }

    /// Window end, "HH:MM"
    async fn end_time(&self) -> &str {
        &self.inner.end_time
    }

    /// 0 = Sunday .. 6 = Saturday
    async fn days_of_week(&self) -> &[u8] {
        &self.inner.days_of_week
    }

    /// 1 = highest .. 5 = lowest
    async fn priority(&self) -> u8 {
        self.inner.priority
    }

    async fn is_active(&self) -> bool {
        self.inner.is_active
    }
}

/// GraphQL representation of an activated service ad
#[derive(Clone)]
pub struct ServiceAd {
    pub inner: domain::ServiceAd,
}

impl From<domain::ServiceAd> for ServiceAd {
    fn from(inner: domain::ServiceAd) -> Self {
        Self { inner }
    }
}

#[Object]
impl ServiceAd {
    async fn id(&self) -> Uuid {
        self.inner.id
    }

    async fn request_id(&self) -> Uuid {
        self.inner.request_id
    }

    async fn vendor_id(&self) -> Uuid {
        self.inner.vendor_id
    }

    async fn ad_type(&self) -> AdType {
        self.inner.ad_type.into()
    }

    async fn entity_type(&self) -> EntityType {
        self.inner.entity_type.into()
    }

    async fn entity_id(&self) -> Uuid {
        self.inner.entity_id
    }

    async fn final_price(&self) -> f64 {
        self.inner.final_price
    }

    async fn status(&self) -> ServiceAdStatus {
        self.inner.status.into()
    }

    async fn admin_start_date(&self) -> DateTime<Utc> {
        self.inner.admin_start_date
    }

    async fn admin_end_date(&self) -> DateTime<Utc> {
        self.inner.admin_end_date
    }

    async fn actual_start_date(&self) -> Option<DateTime<Utc>> {
        self.inner.actual_start_date
    }

    async fn actual_end_date(&self) -> Option<DateTime<Utc>> {
        self.inner.actual_end_date
    }

    async fn impression_count(&self) -> u64 {
        self.inner.impression_count
    }

    async fn click_count(&self) -> u64 {
        self.inner.click_count
    }

    async fn conversion_count(&self) -> u64 {
        self.inner.conversion_count
    }

    async fn time_slots(&self) -> Vec<TimeSlot> {
        self.inner.time_slots.iter().cloned().map(Into::into).collect()
    }

    async fn total_scheduled_runs(&self) -> u64 {
        self.inner.total_scheduled_runs
    }

    async fn successful_runs(&self) -> u64 {
        self.inner.successful_runs
    }

    async fn failed_runs(&self) -> u64 {
        self.inner.failed_runs
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.inner.updated_at
    }
}

/// GraphQL representation of a third-party ad
#[derive(Clone)]
pub struct ExternalAd {
    pub inner: domain::ExternalAd,
}

impl From<domain::ExternalAd> for ExternalAd {
    fn from(inner: domain::ExternalAd) -> Self {
        Self { inner }
    }
}

#[Object]
impl ExternalAd {
    async fn id(&self) -> Uuid {
        self.inner.id
    }

    async fn title(&self) -> &str {
        &self.inner.title
    }

    async fn advertiser(&self) -> &str {
        &self.inner.advertiser
    }

    async fn target_url(&self) -> &str {
        &self.inner.target_url
    }

    async fn image_url(&self) -> Option<&str> {
        self.inner.image_url.as_deref()
    }

    async fn start_date(&self) -> DateTime<Utc> {
        self.inner.start_date
    }

    async fn end_date(&self) -> DateTime<Utc> {
        self.inner.end_date
    }

    async fn status(&self) -> ExternalAdStatus {
        self.inner.status.into()
    }
}

/// GraphQL representation of one concrete run of a time slot
#[derive(Clone)]
pub struct AdSchedule {
    pub inner: domain::AdSchedule,
}

impl From<domain::AdSchedule> for AdSchedule {
    fn from(inner: domain::AdSchedule) -> Self {
        Self { inner }
    }
}

#[Object]
impl AdSchedule {
    async fn id(&self) -> Uuid {
        self.inner.id
    }

    async fn ad_id(&self) -> Uuid {
        self.inner.ad_id
    }

    async fn time_slot_id(&self) -> Uuid {
        self.inner.time_slot_id
    }

    async fn scheduled_date(&self) -> NaiveDate {
        self.inner.scheduled_date
    }

    async fn status(&self) -> ScheduleStatus {
        self.inner.status.into()
    }

    async fn retry_count(&self) -> u32 {
        self.inner.retry_count
    }

    async fn next_retry(&self) -> Option<DateTime<Utc>> {
        self.inner.next_retry
    }

    async fn failure_reason(&self) -> Option<&str> {
        self.inner.failure_reason.as_deref()
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }
}

/// GraphQL representation of a payment against an ad
#[derive(Clone)]
pub struct AdPayment {
    pub inner: domain::AdPayment,
}

impl From<domain::AdPayment> for AdPayment {
    fn from(inner: domain::AdPayment) -> Self {
        Self { inner }
    }
}

#[Object]
impl AdPayment {
    async fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Set when the payment targets a service ad.
    async fn service_ad_id(&self) -> Option<Uuid> {
        match self.inner.ad_ref {
            domain::AdRef::Service(id) => Some(id),
            domain::AdRef::External(_) => None,
        }
    }

    /// Set when the payment targets an external ad.
    async fn external_ad_id(&self) -> Option<Uuid> {
        match self.inner.ad_ref {
            domain::AdRef::External(id) => Some(id),
            domain::AdRef::Service(_) => None,
        }
    }

    async fn amount(&self) -> f64 {
        self.inner.amount
    }

    async fn payment_status(&self) -> PaymentStatus {
        self.inner.payment_status.into()
    }

    async fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.inner.paid_at
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }
}

/// Performance snapshot for a service ad
#[derive(Clone)]
pub struct AdPerformance {
    pub inner: analytics::AdPerformance,
}

impl From<analytics::AdPerformance> for AdPerformance {
    fn from(inner: analytics::AdPerformance) -> Self {
        Self { inner }
    }
}

#[Object]
impl AdPerformance {
    async fn ad_id(&self) -> Uuid {
        self.inner.ad_id
    }

    async fn impressions(&self) -> u64 {
        self.inner.impressions
    }

    async fn clicks(&self) -> u64 {
        self.inner.clicks
    }

    async fn conversions(&self) -> u64 {
        self.inner.conversions
    }

    async fn ctr(&self) -> f64 {
        self.inner.ctr
    }

    async fn conversion_rate(&self) -> f64 {
        self.inner.conversion_rate
    }

    async fn days_active(&self) -> i64 {
        self.inner.days_active
    }

    async fn total_spent(&self) -> f64 {
        self.inner.total_spent
    }

    async fn average_daily_cost(&self) -> f64 {
        self.inner.average_daily_cost
    }
}

/// One delivery window on a given date, with whoever already occupies it
#[derive(Clone)]
pub struct TimeSlotAvailability {
    pub inner: slots::TimeSlotAvailability,
}

impl From<slots::TimeSlotAvailability> for TimeSlotAvailability {
    fn from(inner: slots::TimeSlotAvailability) -> Self {
        Self { inner }
    }
}

#[Object]
impl TimeSlotAvailability {
    async fn start_time(&self) -> &str {
        &self.inner.start_time
    }

    async fn end_time(&self) -> &str {
        &self.inner.end_time
    }

    async fn available(&self) -> bool {
        self.inner.available
    }

    async fn conflicting_ads(&self) -> &[Uuid] {
        &self.inner.conflicting_ads
    }
}

// ─── Input objects ──────────────────────────────────────────────────────────

#[derive(InputObject)]
pub struct TimeSlotInput {
    pub start_time: String,
    pub end_time: String,
    /// 0 = Sunday .. 6 = Saturday
    pub days_of_week: Vec<u8>,
    /// 1 = highest .. 5 = lowest
    pub priority: u8,
}

impl From<TimeSlotInput> for domain::TimeSlotSpec {
    fn from(input: TimeSlotInput) -> Self {
        Self {
            start_time: input.start_time,
            end_time: input.end_time,
            days_of_week: input.days_of_week,
            priority: input.priority,
        }
    }
}

/// Structured replacement for the legacy `"YYYY-MM-DD,YYYY-MM-DD"` string.
#[derive(InputObject)]
pub struct DateRangeInput {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl From<DateRangeInput> for domain::DateRange {
    fn from(input: DateRangeInput) -> Self {
        Self {
            start: input.start,
            end: input.end,
        }
    }
}

#[derive(InputObject)]
pub struct CreateAdRequestInput {
    pub ad_type: AdType,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub requested_price: f64,
    pub requested_start_date: DateTime<Utc>,
    pub requested_end_date: DateTime<Utc>,
}

impl From<CreateAdRequestInput> for ads::CreateAdRequestInput {
    fn from(input: CreateAdRequestInput) -> Self {
        Self {
            ad_type: input.ad_type.into(),
            entity_type: input.entity_type.into(),
            entity_id: input.entity_id,
            requested_price: input.requested_price,
            requested_start_date: input.requested_start_date,
            requested_end_date: input.requested_end_date,
        }
    }
}

#[derive(InputObject)]
pub struct UpdateAdRequestInput {
    pub requested_price: Option<f64>,
    pub requested_start_date: Option<DateTime<Utc>>,
    pub requested_end_date: Option<DateTime<Utc>>,
}

impl From<UpdateAdRequestInput> for ads::UpdateAdRequestInput {
    fn from(input: UpdateAdRequestInput) -> Self {
        Self {
            requested_price: input.requested_price,
            requested_start_date: input.requested_start_date,
            requested_end_date: input.requested_end_date,
        }
    }
}

#[derive(InputObject)]
pub struct ApproveAdRequestInput {
    pub final_price: f64,
    pub admin_start_date: DateTime<Utc>,
    pub admin_end_date: DateTime<Utc>,
    pub admin_notes: Option<String>,
    pub time_slots: Vec<TimeSlotInput>,
}

impl From<ApproveAdRequestInput> for ads::ApproveAdRequestInput {
    fn from(input: ApproveAdRequestInput) -> Self {
        Self {
            final_price: input.final_price,
            admin_start_date: input.admin_start_date,
            admin_end_date: input.admin_end_date,
            admin_notes: input.admin_notes,
            time_slots: input.time_slots.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(InputObject)]
pub struct ExternalAdInput {
    pub title: String,
    pub advertiser: String,
    pub target_url: String,
    pub image_url: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl From<ExternalAdInput> for ads::ExternalAdInput {
    fn from(input: ExternalAdInput) -> Self {
        Self {
            title: input.title,
            advertiser: input.advertiser,
            target_url: input.target_url,
            image_url: input.image_url,
            start_date: input.start_date,
            end_date: input.end_date,
        }
    }
}
