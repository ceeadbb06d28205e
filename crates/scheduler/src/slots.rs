//! Time-slot allocator: validates recurring weekly windows, computes
//! per-date availability, and creates concrete schedule runs once the
//! availability check passes.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use vendora_ads::store::AdStore;
use vendora_core::error::{AdError, AdResult};
use vendora_core::event_bus::{make_event, AdEventKind, AdEventSink};
use vendora_core::types::*;
use vendora_core::validate::{parse_date_param, validate_slots};

/// One delivery window on a given date, with whoever already occupies it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlotAvailability {
    pub start_time: String,
    pub end_time: String,
    pub available: bool,
    pub conflicting_ads: Vec<Uuid>,
}

pub struct SlotAllocator {
    store: Arc<AdStore>,
    events: Arc<dyn AdEventSink>,
}

fn weekday_of(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

impl SlotAllocator {
    pub fn new(store: Arc<AdStore>, events: Arc<dyn AdEventSink>) -> Self {
        Self { store, events }
    }

    /// Replaces an ad's slot set. The whole batch is rejected on the first
    /// invalid slot; nothing is written in that case.
    pub fn update_ad_time_slots(
        &self,
        ad_id: Uuid,
        specs: &[TimeSlotSpec],
    ) -> AdResult<ServiceAd> {
        validate_slots(specs)?;
        let slots: Vec<TimeSlot> = specs.iter().map(TimeSlotSpec::materialize).collect();
        let ad = self.store.replace_time_slots(ad_id, slots)?;
        info!(ad_id = %ad_id, slots = ad.time_slots.len(), "time slots replaced");
        Ok(ad)
    }

    /// Distinct active windows covering `date`'s weekday across scheduled and
    /// active ads, each flagged with the ads already occupying it that day.
    pub fn get_available_time_slots(
        &self,
        date: &str,
        ad_type: Option<AdType>,
    ) -> AdResult<Vec<TimeSlotAvailability>> {
        let date = parse_date_param(date)?;
        let weekday = weekday_of(date);

        let mut windows: Vec<(String, String)> = Vec::new();
        for status in [ServiceAdStatus::Scheduled, ServiceAdStatus::Active] {
            for ad in self.store.list_service_ads(None, Some(status)) {
                if ad_type.map_or(false, |t| ad.ad_type != t) {
                    continue;
                }
                for slot in &ad.time_slots {
                    if !slot.is_active || !slot.days_of_week.contains(&weekday) {
                        continue;
                    }
                    let window = (slot.start_time.clone(), slot.end_time.clone());
                    if !windows.contains(&window) {
                        windows.push(window);
                    }
                }
            }
        }
        windows.sort();

        Ok(windows
            .into_iter()
            .map(|(start, end)| {
                let conflicting_ads = self.store.conflicting_runs(date, &start, &end);
                TimeSlotAvailability {
                    available: conflicting_ads.is_empty(),
                    start_time: start,
                    end_time: end,
                    conflicting_ads,
                }
            })
            .collect())
    }

    /// Creates one concrete run of `time_slot_id` on `date`, failing with
    /// Conflict (and the occupying ad ids) when the window is taken.
    pub fn schedule_ad_run(
        &self,
        ad_id: Uuid,
        time_slot_id: Uuid,
        date: NaiveDate,
    ) -> AdResult<AdSchedule> {
        let ad = self
            .store
            .get_service_ad(ad_id)
            .ok_or_else(|| AdError::not_found("service ad", ad_id))?;
        let slot = ad
            .time_slots
            .iter()
            .find(|s| s.id == time_slot_id)
            .ok_or_else(|| AdError::not_found("time slot", time_slot_id))?;

        let conflicting = self
            .store
            .conflicting_runs(date, &slot.start_time, &slot.end_time);
        if !conflicting.is_empty() {
            return Err(AdError::Conflict {
                message: format!(
                    "window {}-{} on {date} is already booked",
                    slot.start_time, slot.end_time
                ),
                conflicting_ads: conflicting,
            });
        }

        let now = Utc::now();
        let schedule = AdSchedule {
            id: Uuid::new_v4(),
            ad_id,
            time_slot_id,
            scheduled_date: date,
            status: ScheduleStatus::Scheduled,
            retry_count: 0,
            next_retry: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_schedule(schedule.clone());
        self.store.try_update_service_ad(ad_id, |ad| {
            ad.total_scheduled_runs += 1;
            Ok(())
        })?;
        info!(ad_id = %ad_id, schedule_id = %schedule.id, date = %date, "ad run scheduled");
        self.events.emit(make_event(
            AdEventKind::RunScheduled,
            Some(ad_id),
            None,
            Some(ad.vendor_id),
        ));
        Ok(schedule)
    }

    /// Overwrites each ad's slots, then creates a run for every day in the
    /// range whose weekday matches one of the slots. Per-ad-per-day failures
    /// are logged and skipped; the batch always continues.
    pub fn bulk_schedule_ads(
        &self,
        ad_ids: &[Uuid],
        specs: &[TimeSlotSpec],
        range: DateRange,
    ) -> AdResult<Vec<AdSchedule>> {
        if range.end < range.start {
            return Err(AdError::BadRequest(
                "date range end must not precede start".into(),
            ));
        }
        validate_slots(specs)?;

        let mut created = Vec::new();
        for &ad_id in ad_ids {
            let ad = match self.update_ad_time_slots(ad_id, specs) {
                Ok(ad) => ad,
                Err(e) => {
                    warn!(ad_id = %ad_id, error = %e, "bulk schedule: skipping ad");
                    continue;
                }
            };
            for date in range.days() {
                let weekday = weekday_of(date);
                for slot in ad.time_slots.iter().filter(|s| s.is_active) {
                    if !slot.days_of_week.contains(&weekday) {
                        continue;
                    }
                    match self.schedule_ad_run(ad_id, slot.id, date) {
                        Ok(schedule) => created.push(schedule),
                        Err(e) => {
                            warn!(ad_id = %ad_id, date = %date, error = %e,
                                  "bulk schedule: run skipped");
                        }
                    }
                }
            }
        }
        info!(requested = ad_ids.len(), created = created.len(), "bulk schedule finished");
        Ok(created)
    }

    /// Manual reset of a failed run back to Scheduled. There is no automatic
    /// retry or backoff; an operator triggers this explicitly.
    pub fn retry_failed_schedule(&self, schedule_id: Uuid) -> AdResult<AdSchedule> {
        let schedule = self.store.try_update_schedule(schedule_id, |schedule| {
            if schedule.status != ScheduleStatus::Failed {
                return Err(AdError::BadRequest(format!(
                    "only failed schedules can be retried, current status {:?}",
                    schedule.status
                )));
            }
            schedule.status = ScheduleStatus::Scheduled;
            schedule.retry_count = 0;
            schedule.next_retry = None;
            schedule.failure_reason = None;
            Ok(())
        })?;
        info!(schedule_id = %schedule_id, "failed schedule reset to scheduled");
        self.events.emit(make_event(
            AdEventKind::RunRetried,
            Some(schedule.ad_id),
            None,
            None,
        ));
        Ok(schedule)
    }

    pub fn upcoming_schedules(&self, limit: usize) -> Vec<AdSchedule> {
        self.store
            .upcoming_schedules(Utc::now().date_naive(), limit)
    }

    pub fn failed_schedules(&self, limit: usize) -> Vec<AdSchedule> {
        self.store.failed_schedules(limit)
    }
}
