//! In-memory ad store backed by DashMap.
//!
//! Production: replace with PostgreSQL (sqlx) or similar ACID store.
//! This provides the same API surface for development and testing.

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use uuid::Uuid;
use vendora_core::error::{AdError, AdResult};
use vendora_core::types::*;
use vendora_core::validate::windows_overlap;

/// Thread-safe in-memory store for ad requests, service ads, external ads,
/// schedule runs, and payments.
pub struct AdStore {
    requests: DashMap<Uuid, AdRequest>,
    service_ads: DashMap<Uuid, ServiceAd>,
    external_ads: DashMap<Uuid, ExternalAd>,
    schedules: DashMap<Uuid, AdSchedule>,
    payments: DashMap<Uuid, AdPayment>,
}

impl AdStore {
    pub fn new() -> Self {
        Self {
            requests: DashMap::new(),
            service_ads: DashMap::new(),
            external_ads: DashMap::new(),
            schedules: DashMap::new(),
            payments: DashMap::new(),
        }
    }

    // ─── Ad Requests ───────────────────────────────────────────────────────

    pub fn insert_request(&self, request: AdRequest) {
        self.requests.insert(request.id, request);
    }

    pub fn get_request(&self, id: Uuid) -> Option<AdRequest> {
        self.requests.get(&id).map(|r| r.value().clone())
    }

    /// Applies `f` under the entry lock; `updated_at` is stamped on success.
    pub fn try_update_request(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut AdRequest) -> AdResult<()>,
    ) -> AdResult<AdRequest> {
        let mut entry = self
            .requests
            .get_mut(&id)
            .ok_or_else(|| AdError::not_found("ad request", id))?;
        f(entry.value_mut())?;
        entry.value_mut().updated_at = Utc::now();
        Ok(entry.value().clone())
    }

    pub fn list_requests(
        &self,
        vendor_id: Option<Uuid>,
        status: Option<AdRequestStatus>,
    ) -> Vec<AdRequest> {
        let mut requests: Vec<AdRequest> = self
            .requests
            .iter()
            .map(|r| r.value().clone())
            .filter(|r| vendor_id.map_or(true, |v| r.vendor_id == v))
            .filter(|r| status.map_or(true, |s| r.status == s))
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        requests
    }

    /// Hard-deletes Rejected requests last touched before `cutoff`.
    /// Returns the number of rows removed.
    pub fn purge_rejected_before(&self, cutoff: DateTime<Utc>) -> usize {
        let stale: Vec<Uuid> = self
            .requests
            .iter()
            .filter(|r| r.value().status == AdRequestStatus::Rejected && r.value().updated_at < cutoff)
            .map(|r| *r.key())
            .collect();
        for id in &stale {
            self.requests.remove(id);
        }
        stale.len()
    }

    // ─── Service Ads ───────────────────────────────────────────────────────

    pub fn insert_service_ad(&self, ad: ServiceAd) {
        self.service_ads.insert(ad.id, ad);
    }

    pub fn get_service_ad(&self, id: Uuid) -> Option<ServiceAd> {
        self.service_ads.get(&id).map(|r| r.value().clone())
    }

    pub fn try_update_service_ad(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut ServiceAd) -> AdResult<()>,
    ) -> AdResult<ServiceAd> {
        let mut entry = self
            .service_ads
            .get_mut(&id)
            .ok_or_else(|| AdError::not_found("service ad", id))?;
        f(entry.value_mut())?;
        entry.value_mut().updated_at = Utc::now();
        Ok(entry.value().clone())
    }

    pub fn list_service_ads(
        &self,
        vendor_id: Option<Uuid>,
        status: Option<ServiceAdStatus>,
    ) -> Vec<ServiceAd> {
        let mut ads: Vec<ServiceAd> = self
            .service_ads
            .iter()
            .map(|r| r.value().clone())
            .filter(|a| vendor_id.map_or(true, |v| a.vendor_id == v))
            .filter(|a| status.map_or(true, |s| a.status == s))
            .collect();
        ads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        ads
    }

    /// Scheduled ads whose admin start date has passed.
    pub fn ads_due_for_activation(&self, now: DateTime<Utc>) -> Vec<ServiceAd> {
        self.service_ads
            .iter()
            .filter(|r| {
                r.value().status == ServiceAdStatus::Scheduled && r.value().admin_start_date <= now
            })
            .map(|r| r.value().clone())
            .collect()
    }

    /// Active or paused ads whose admin end date has passed.
    pub fn ads_due_for_expiration(&self, now: DateTime<Utc>) -> Vec<ServiceAd> {
        self.service_ads
            .iter()
            .filter(|r| {
                matches!(
                    r.value().status,
                    ServiceAdStatus::Active | ServiceAdStatus::Paused
                ) && r.value().admin_end_date <= now
            })
            .map(|r| r.value().clone())
            .collect()
    }

    /// Expired ads last touched before `cutoff` — candidates for archival.
    pub fn count_expired_before(&self, cutoff: DateTime<Utc>) -> usize {
        self.service_ads
            .iter()
            .filter(|r| r.value().status == ServiceAdStatus::Expired && r.value().updated_at < cutoff)
            .count()
    }

    /// Replaces the ad's slot set wholesale.
    pub fn replace_time_slots(&self, ad_id: Uuid, slots: Vec<TimeSlot>) -> AdResult<ServiceAd> {
        self.try_update_service_ad(ad_id, |ad| {
            ad.time_slots = slots;
            Ok(())
        })
    }

    // ─── External Ads ──────────────────────────────────────────────────────

    pub fn insert_external_ad(&self, ad: ExternalAd) {
        self.external_ads.insert(ad.id, ad);
    }

    pub fn get_external_ad(&self, id: Uuid) -> Option<ExternalAd> {
        self.external_ads.get(&id).map(|r| r.value().clone())
    }

    pub fn try_update_external_ad(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut ExternalAd) -> AdResult<()>,
    ) -> AdResult<ExternalAd> {
        let mut entry = self
            .external_ads
            .get_mut(&id)
            .ok_or_else(|| AdError::not_found("external ad", id))?;
        f(entry.value_mut())?;
        entry.value_mut().updated_at = Utc::now();
        Ok(entry.value().clone())
    }

    pub fn list_external_ads(&self, status: Option<ExternalAdStatus>) -> Vec<ExternalAd> {
        let mut ads: Vec<ExternalAd> = self
            .external_ads
            .iter()
            .map(|r| r.value().clone())
            .filter(|a| status.map_or(true, |s| a.status == s))
            .collect();
        ads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        ads
    }

    pub fn external_ads_due_for_expiration(&self, now: DateTime<Utc>) -> Vec<ExternalAd> {
        self.external_ads
            .iter()
            .filter(|r| r.value().status == ExternalAdStatus::Active && r.value().end_date <= now)
            .map(|r| r.value().clone())
            .collect()
    }

    // ─── Schedule Runs ─────────────────────────────────────────────────────

    pub fn insert_schedule(&self, schedule: AdSchedule) {
        self.schedules.insert(schedule.id, schedule);
    }

    pub fn try_update_schedule(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut AdSchedule) -> AdResult<()>,
    ) -> AdResult<AdSchedule> {
        let mut entry = self
            .schedules
            .get_mut(&id)
            .ok_or_else(|| AdError::not_found("ad schedule", id))?;
        f(entry.value_mut())?;
        entry.value_mut().updated_at = Utc::now();
        Ok(entry.value().clone())
    }

    pub fn schedules_on(&self, date: NaiveDate) -> Vec<AdSchedule> {
        self.schedules
            .iter()
            .filter(|r| r.value().scheduled_date == date)
            .map(|r| r.value().clone())
            .collect()
    }

    pub fn upcoming_schedules(&self, from: NaiveDate, limit: usize) -> Vec<AdSchedule> {
        let mut upcoming: Vec<AdSchedule> = self
            .schedules
            .iter()
            .filter(|r| {
                r.value().status == ScheduleStatus::Scheduled && r.value().scheduled_date >= from
            })
            .map(|r| r.value().clone())
            .collect();
        upcoming.sort_by(|a, b| a.scheduled_date.cmp(&b.scheduled_date));
        upcoming.truncate(limit);
        upcoming
    }

    pub fn failed_schedules(&self, limit: usize) -> Vec<AdSchedule> {
        let mut failed: Vec<AdSchedule> = self
            .schedules
            .iter()
            .filter(|r| r.value().status == ScheduleStatus::Failed)
            .map(|r| r.value().clone())
            .collect();
        failed.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        failed.truncate(limit);
        failed
    }

    /// Ads with a Scheduled or Running run on `date` whose slot window
    /// overlaps `[start, end)`. This is the availability computation the
    /// allocator consults before creating a run.
    pub fn conflicting_runs(&self, date: NaiveDate, start: &str, end: &str) -> Vec<Uuid> {
        let mut conflicting: Vec<Uuid> = Vec::new();
        for schedule in self.schedules_on(date) {
            if !matches!(
                schedule.status,
                ScheduleStatus::Scheduled | ScheduleStatus::Running
            ) {
                continue;
            }
            let Some(ad) = self.get_service_ad(schedule.ad_id) else {
                continue;
            };
            let Some(slot) = ad.time_slots.iter().find(|s| s.id == schedule.time_slot_id) else {
                continue;
            };
            if windows_overlap(start, end, &slot.start_time, &slot.end_time)
                && !conflicting.contains(&ad.id)
            {
                conflicting.push(ad.id);
            }
        }
        conflicting
    }

    // ─── Payments ──────────────────────────────────────────────────────────

    pub fn insert_payment(&self, payment: AdPayment) {
        self.payments.insert(payment.id, payment);
    }

    pub fn try_update_payment(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut AdPayment) -> AdResult<()>,
    ) -> AdResult<AdPayment> {
        let mut entry = self
            .payments
            .get_mut(&id)
            .ok_or_else(|| AdError::not_found("ad payment", id))?;
        f(entry.value_mut())?;
        Ok(entry.value().clone())
    }

    pub fn list_payments(&self, ad_ref: Option<AdRef>) -> Vec<AdPayment> {
        let mut payments: Vec<AdPayment> = self
            .payments
            .iter()
            .map(|r| r.value().clone())
            .filter(|p| ad_ref.map_or(true, |a| p.ad_ref == a))
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        payments
    }

    /// Sum of Paid payments against the given ad.
    pub fn total_paid(&self, ad_ref: AdRef) -> f64 {
        self.payments
            .iter()
            .filter(|p| p.value().ad_ref == ad_ref && p.value().payment_status == PaymentStatus::Paid)
            .map(|p| p.value().amount)
            .sum()
    }
}

impl Default for AdStore {
    fn default() -> Self {
        Self::new()
    }
}
