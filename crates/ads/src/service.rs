//! Ad service — business rules over the store: request/approval state
//! machine, ServiceAd lifecycle transitions, external ads, interaction
//! counters, and payments. Role and ownership checks live here; the GraphQL
//! resolvers only verify that an identity is present.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use vendora_core::error::{AdError, AdResult};
use vendora_core::event_bus::{make_event, AdEventKind, AdEventSink};
use vendora_core::types::*;
use vendora_core::validate::validate_slots;

use crate::analytics::{self, AdPerformance};
use crate::store::AdStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAdRequestInput {
    pub ad_type: AdType,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub requested_price: f64,
    pub requested_start_date: DateTime<Utc>,
    pub requested_end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAdRequestInput {
    pub requested_price: Option<f64>,
    pub requested_start_date: Option<DateTime<Utc>>,
    pub requested_end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveAdRequestInput {
    pub final_price: f64,
    pub admin_start_date: DateTime<Utc>,
    pub admin_end_date: DateTime<Utc>,
    pub admin_notes: Option<String>,
    pub time_slots: Vec<TimeSlotSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalAdInput {
    pub title: String,
    pub advertiser: String,
    pub target_url: String,
    pub image_url: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

pub struct AdService {
    store: Arc<AdStore>,
    events: Arc<dyn AdEventSink>,
}

fn require_admin(actor: Actor) -> AdResult<Uuid> {
    match actor {
        Actor::Admin { id } => Ok(id),
        Actor::Anonymous => Err(AdError::Unauthenticated),
        Actor::Vendor { .. } => Err(AdError::Forbidden("admin role required".into())),
    }
}

fn require_vendor(actor: Actor) -> AdResult<Uuid> {
    match actor {
        Actor::Vendor { id } => Ok(id),
        Actor::Anonymous => Err(AdError::Unauthenticated),
        Actor::Admin { .. } => Err(AdError::Forbidden("vendor account required".into())),
    }
}

impl AdService {
    pub fn new(store: Arc<AdStore>, events: Arc<dyn AdEventSink>) -> Self {
        Self { store, events }
    }

    pub fn store(&self) -> &Arc<AdStore> {
        &self.store
    }

    // ─── Request / approval state machine ──────────────────────────────────

    pub fn create_ad_request(
        &self,
        actor: Actor,
        input: CreateAdRequestInput,
    ) -> AdResult<AdRequest> {
        let vendor_id = require_vendor(actor)?;
        if input.requested_price <= 0.0 {
            return Err(AdError::InvalidInput("requested_price must be positive".into()));
        }
        if input.requested_end_date <= input.requested_start_date {
            return Err(AdError::BadRequest(
                "requested_end_date must be after requested_start_date".into(),
            ));
        }

        let now = Utc::now();
        let request = AdRequest {
            id: Uuid::new_v4(),
            vendor_id,
            ad_type: input.ad_type,
            entity_type: input.entity_type,
            entity_id: input.entity_id,
            requested_price: input.requested_price,
            requested_start_date: input.requested_start_date,
            requested_end_date: input.requested_end_date,
            status: AdRequestStatus::Pending,
            admin_notes: None,
            reviewed_by: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_request(request.clone());
        info!(request_id = %request.id, vendor_id = %vendor_id, "ad request created");
        self.events.emit(make_event(
            AdEventKind::Requested,
            None,
            Some(request.id),
            Some(vendor_id),
        ));
        Ok(request)
    }

    /// Owning vendor only, and only while the request is still Pending.
    pub fn update_ad_request(
        &self,
        actor: Actor,
        id: Uuid,
        input: UpdateAdRequestInput,
    ) -> AdResult<AdRequest> {
        let vendor_id = require_vendor(actor)?;
        self.store.try_update_request(id, |request| {
            if request.vendor_id != vendor_id {
                return Err(AdError::Forbidden("not the owner of this request".into()));
            }
            if request.status != AdRequestStatus::Pending {
                return Err(AdError::BadRequest(format!(
                    "only pending requests can be updated, current status {:?}",
                    request.status
                )));
            }
            // Merge into candidates and check those; no field is written
            // until the whole update is known to be valid.
            let price = input.requested_price.unwrap_or(request.requested_price);
            let start = input
                .requested_start_date
                .unwrap_or(request.requested_start_date);
            let end = input
                .requested_end_date
                .unwrap_or(request.requested_end_date);
            if price <= 0.0 {
                return Err(AdError::InvalidInput("requested_price must be positive".into()));
            }
            if end <= start {
                return Err(AdError::BadRequest(
                    "requested_end_date must be after requested_start_date".into(),
                ));
            }
            request.requested_price = price;
            request.requested_start_date = start;
            request.requested_end_date = end;
            Ok(())
        })
    }

    /// Vendor withdrawal. Moves the request to the distinct Cancelled state.
    pub fn cancel_ad_request(&self, actor: Actor, id: Uuid) -> AdResult<AdRequest> {
        let vendor_id = require_vendor(actor)?;
        let request = self.store.try_update_request(id, |request| {
            if request.vendor_id != vendor_id {
                return Err(AdError::Forbidden("not the owner of this request".into()));
            }
            if request.status != AdRequestStatus::Pending {
                return Err(AdError::BadRequest(format!(
                    "only pending requests can be cancelled, current status {:?}",
                    request.status
                )));
            }
            request.status = AdRequestStatus::Cancelled;
            Ok(())
        })?;
        info!(request_id = %id, "ad request cancelled by vendor");
        self.events.emit(make_event(
            AdEventKind::RequestCancelled,
            None,
            Some(id),
            Some(vendor_id),
        ));
        Ok(request)
    }

    /// Marks a pending request as under review. UnderReview has no edge back
    /// to Pending; it is resolved by approve or reject.
    pub fn review_ad_request(
        &self,
        actor: Actor,
        id: Uuid,
        notes: Option<String>,
    ) -> AdResult<AdRequest> {
        let admin_id = require_admin(actor)?;
        let request = self.store.try_update_request(id, |request| {
            if request.status != AdRequestStatus::Pending {
                return Err(AdError::BadRequest(format!(
                    "only pending requests can be moved to review, current status {:?}",
                    request.status
                )));
            }
            request.status = AdRequestStatus::UnderReview;
            request.admin_notes = notes;
            request.reviewed_by = Some(admin_id);
            request.reviewed_at = Some(Utc::now());
            Ok(())
        })?;
        self.events.emit(make_event(
            AdEventKind::Reviewed,
            None,
            Some(id),
            Some(request.vendor_id),
        ));
        Ok(request)
    }

    /// Approves a request and spawns the ServiceAd in status Scheduled. The
    /// originating request is not mutated again after this point.
    pub fn approve_ad_request(
        &self,
        actor: Actor,
        id: Uuid,
        input: ApproveAdRequestInput,
    ) -> AdResult<ServiceAd> {
        let admin_id = require_admin(actor)?;
        if input.final_price <= 0.0 {
            return Err(AdError::InvalidInput("final_price must be positive".into()));
        }
        if input.admin_end_date <= input.admin_start_date {
            return Err(AdError::BadRequest(
                "admin_end_date must be after admin_start_date".into(),
            ));
        }
        validate_slots(&input.time_slots)?;

        let request = self.store.try_update_request(id, |request| {
            if !matches!(
                request.status,
                AdRequestStatus::Pending | AdRequestStatus::UnderReview
            ) {
                return Err(AdError::BadRequest(format!(
                    "request cannot be approved from status {:?}",
                    request.status
                )));
            }
            request.status = AdRequestStatus::Approved;
            request.admin_notes = input.admin_notes.clone();
            request.reviewed_by = Some(admin_id);
            request.reviewed_at = Some(Utc::now());
            Ok(())
        })?;

        let now = Utc::now();
        let ad = ServiceAd {
            id: Uuid::new_v4(),
            request_id: request.id,
            vendor_id: request.vendor_id,
            ad_type: request.ad_type,
            entity_type: request.entity_type,
            entity_id: request.entity_id,
            final_price: input.final_price,
            status: ServiceAdStatus::Scheduled,
            admin_start_date: input.admin_start_date,
            admin_end_date: input.admin_end_date,
            actual_start_date: None,
            actual_end_date: None,
            impression_count: 0,
            click_count: 0,
            conversion_count: 0,
            time_slots: input.time_slots.iter().map(TimeSlotSpec::materialize).collect(),
            total_scheduled_runs: 0,
            successful_runs: 0,
            failed_runs: 0,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_service_ad(ad.clone());
        info!(request_id = %id, ad_id = %ad.id, "ad request approved");
        self.events.emit(make_event(
            AdEventKind::Approved,
            Some(ad.id),
            Some(request.id),
            Some(request.vendor_id),
        ));
        Ok(ad)
    }

    pub fn reject_ad_request(
        &self,
        actor: Actor,
        id: Uuid,
        notes: Option<String>,
    ) -> AdResult<AdRequest> {
        let admin_id = require_admin(actor)?;
        let request = self.store.try_update_request(id, |request| {
            if !matches!(
                request.status,
                AdRequestStatus::Pending | AdRequestStatus::UnderReview
            ) {
                return Err(AdError::BadRequest(format!(
                    "request cannot be rejected from status {:?}",
                    request.status
                )));
            }
            request.status = AdRequestStatus::Rejected;
            request.admin_notes = notes;
            request.reviewed_by = Some(admin_id);
            request.reviewed_at = Some(Utc::now());
            Ok(())
        })?;
        info!(request_id = %id, "ad request rejected");
        self.events.emit(make_event(
            AdEventKind::Rejected,
            None,
            Some(id),
            Some(request.vendor_id),
        ));
        Ok(request)
    }

    pub fn get_ad_request(&self, actor: Actor, id: Uuid) -> AdResult<AdRequest> {
        let request = self
            .store
            .get_request(id)
            .ok_or_else(|| AdError::not_found("ad request", id))?;
        match actor {
            Actor::Admin { .. } => Ok(request),
            Actor::Vendor { id: vendor_id } if request.vendor_id == vendor_id => Ok(request),
            Actor::Vendor { .. } => Err(AdError::Forbidden("not the owner of this request".into())),
            Actor::Anonymous => Err(AdError::Unauthenticated),
        }
    }

    /// Admins see everything; vendors see their own requests.
    pub fn list_ad_requests(
        &self,
        actor: Actor,
        status: Option<AdRequestStatus>,
    ) -> AdResult<Vec<AdRequest>> {
        match actor {
            Actor::Admin { .. } => Ok(self.store.list_requests(None, status)),
            Actor::Vendor { id } => Ok(self.store.list_requests(Some(id), status)),
            Actor::Anonymous => Err(AdError::Unauthenticated),
        }
    }

    // ─── ServiceAd lifecycle ───────────────────────────────────────────────

    fn transition_service_ad(
        &self,
        actor: Actor,
        id: Uuid,
        kind: AdEventKind,
        f: impl FnOnce(&mut ServiceAd) -> AdResult<()>,
    ) -> AdResult<ServiceAd> {
        require_admin(actor)?;
        let ad = self.store.try_update_service_ad(id, f)?;
        info!(ad_id = %id, status = ?ad.status, "service ad transition");
        self.events.emit(make_event(
            kind,
            Some(ad.id),
            Some(ad.request_id),
            Some(ad.vendor_id),
        ));
        Ok(ad)
    }

    pub fn activate_service_ad(&self, actor: Actor, id: Uuid) -> AdResult<ServiceAd> {
        self.transition_service_ad(actor, id, AdEventKind::Activated, |ad| {
            if ad.status != ServiceAdStatus::Scheduled {
                return Err(AdError::BadRequest(format!(
                    "ad cannot be activated from status {:?}",
                    ad.status
                )));
            }
            ad.status = ServiceAdStatus::Active;
            ad.actual_start_date = Some(Utc::now());
            Ok(())
        })
    }

    pub fn pause_service_ad(&self, actor: Actor, id: Uuid) -> AdResult<ServiceAd> {
        self.transition_service_ad(actor, id, AdEventKind::Paused, |ad| {
            if ad.status != ServiceAdStatus::Active {
                return Err(AdError::BadRequest(format!(
                    "ad cannot be paused from status {:?}",
                    ad.status
                )));
            }
            ad.status = ServiceAdStatus::Paused;
            Ok(())
        })
    }

    pub fn resume_service_ad(&self, actor: Actor, id: Uuid) -> AdResult<ServiceAd> {
        self.transition_service_ad(actor, id, AdEventKind::Resumed, |ad| {
            if ad.status != ServiceAdStatus::Paused {
                return Err(AdError::BadRequest(format!(
                    "ad cannot be resumed from status {:?}",
                    ad.status
                )));
            }
            ad.status = ServiceAdStatus::Active;
            Ok(())
        })
    }

    pub fn cancel_service_ad(&self, actor: Actor, id: Uuid) -> AdResult<ServiceAd> {
        self.transition_service_ad(actor, id, AdEventKind::Cancelled, |ad| {
            if !matches!(
                ad.status,
                ServiceAdStatus::Scheduled | ServiceAdStatus::Active | ServiceAdStatus::Paused
            ) {
                return Err(AdError::BadRequest(format!(
                    "ad cannot be cancelled from status {:?}",
                    ad.status
                )));
            }
            ad.status = ServiceAdStatus::Cancelled;
            ad.actual_end_date = Some(Utc::now());
            Ok(())
        })
    }

    /// Expires from any state except an already-Expired ad.
    pub fn expire_service_ad(&self, actor: Actor, id: Uuid) -> AdResult<ServiceAd> {
        self.transition_service_ad(actor, id, AdEventKind::Expired, |ad| {
            if ad.status == ServiceAdStatus::Expired {
                return Err(AdError::BadRequest("ad is already expired".into()));
            }
            ad.status = ServiceAdStatus::Expired;
            ad.actual_end_date = Some(Utc::now());
            Ok(())
        })
    }

    /// End date moves forward only.
    pub fn extend_service_ad(
        &self,
        actor: Actor,
        id: Uuid,
        new_end_date: DateTime<Utc>,
    ) -> AdResult<ServiceAd> {
        self.transition_service_ad(actor, id, AdEventKind::Extended, |ad| {
            if !matches!(ad.status, ServiceAdStatus::Active | ServiceAdStatus::Paused) {
                return Err(AdError::BadRequest(format!(
                    "ad cannot be extended from status {:?}",
                    ad.status
                )));
            }
            if new_end_date <= ad.admin_end_date {
                return Err(AdError::BadRequest(
                    "new end date must be after the current end date".into(),
                ));
            }
            ad.admin_end_date = new_end_date;
            Ok(())
        })
    }

    pub fn get_service_ad(&self, id: Uuid) -> AdResult<ServiceAd> {
        self.store
            .get_service_ad(id)
            .ok_or_else(|| AdError::not_found("service ad", id))
    }

    pub fn list_service_ads(
        &self,
        vendor_id: Option<Uuid>,
        status: Option<ServiceAdStatus>,
    ) -> Vec<ServiceAd> {
        self.store.list_service_ads(vendor_id, status)
    }

    // ─── External ads ──────────────────────────────────────────────────────

    pub fn create_external_ad(&self, actor: Actor, input: ExternalAdInput) -> AdResult<ExternalAd> {
        require_admin(actor)?;
        if input.end_date <= input.start_date {
            return Err(AdError::BadRequest("end_date must be after start_date".into()));
        }
        let now = Utc::now();
        let ad = ExternalAd {
            id: Uuid::new_v4(),
            title: input.title,
            advertiser: input.advertiser,
            target_url: input.target_url,
            image_url: input.image_url,
            start_date: input.start_date,
            end_date: input.end_date,
            status: ExternalAdStatus::Active,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_external_ad(ad.clone());
        info!(ad_id = %ad.id, advertiser = %ad.advertiser, "external ad created");
        Ok(ad)
    }

    pub fn set_external_ad_status(
        &self,
        actor: Actor,
        id: Uuid,
        status: ExternalAdStatus,
    ) -> AdResult<ExternalAd> {
        require_admin(actor)?;
        if status == ExternalAdStatus::Expired {
            return Err(AdError::BadRequest(
                "expiry is driven by the end date, not set directly".into(),
            ));
        }
        self.store.try_update_external_ad(id, |ad| {
            if ad.status == ExternalAdStatus::Expired {
                return Err(AdError::BadRequest("ad is already expired".into()));
            }
            ad.status = status;
            Ok(())
        })
    }

    pub fn list_external_ads(&self, status: Option<ExternalAdStatus>) -> Vec<ExternalAd> {
        self.store.list_external_ads(status)
    }

    // ─── Interaction counters (public endpoints, no auth) ─────────────────

    pub fn record_impression(&self, ad_id: Uuid) -> AdResult<u64> {
        let ad = self.store.try_update_service_ad(ad_id, |ad| {
            ad.impression_count += 1;
            Ok(())
        })?;
        Ok(ad.impression_count)
    }

    pub fn record_click(&self, ad_id: Uuid) -> AdResult<u64> {
        let ad = self.store.try_update_service_ad(ad_id, |ad| {
            ad.click_count += 1;
            Ok(())
        })?;
        Ok(ad.click_count)
    }

    pub fn record_conversion(&self, ad_id: Uuid) -> AdResult<u64> {
        let ad = self.store.try_update_service_ad(ad_id, |ad| {
            ad.conversion_count += 1;
            Ok(())
        })?;
        Ok(ad.conversion_count)
    }

    // ─── Payments ──────────────────────────────────────────────────────────

    pub fn create_ad_payment(&self, actor: Actor, ad_ref: AdRef, amount: f64) -> AdResult<AdPayment> {
        require_admin(actor)?;
        if amount <= 0.0 {
            return Err(AdError::InvalidInput("amount must be positive".into()));
        }
        match ad_ref {
            AdRef::Service(id) => {
                self.get_service_ad(id)?;
            }
            AdRef::External(id) => {
                self.store
                    .get_external_ad(id)
                    .ok_or_else(|| AdError::not_found("external ad", id))?;
            }
        }
        let payment = AdPayment {
            id: Uuid::new_v4(),
            ad_ref,
            amount,
            payment_status: PaymentStatus::Pending,
            paid_at: None,
            created_at: Utc::now(),
        };
        self.store.insert_payment(payment.clone());
        Ok(payment)
    }

    pub fn mark_ad_payment(
        &self,
        actor: Actor,
        id: Uuid,
        status: PaymentStatus,
    ) -> AdResult<AdPayment> {
        require_admin(actor)?;
        self.store.try_update_payment(id, |payment| {
            payment.payment_status = status;
            if status == PaymentStatus::Paid {
                payment.paid_at = Some(Utc::now());
            }
            Ok(())
        })
    }

    pub fn list_ad_payments(&self, actor: Actor, ad_ref: Option<AdRef>) -> AdResult<Vec<AdPayment>> {
        require_admin(actor)?;
        Ok(self.store.list_payments(ad_ref))
    }

    // ─── Analytics ─────────────────────────────────────────────────────────

    /// Performance snapshot for an ad; admin or the owning vendor only.
    pub fn ad_performance(&self, actor: Actor, ad_id: Uuid) -> AdResult<AdPerformance> {
        let ad = self.get_service_ad(ad_id)?;
        match actor {
            Actor::Admin { .. } => {}
            Actor::Vendor { id } if ad.vendor_id == id => {}
            Actor::Vendor { .. } => {
                return Err(AdError::Forbidden("not the owner of this ad".into()))
            }
            Actor::Anonymous => return Err(AdError::Unauthenticated),
        }
        let total_spent = self.store.total_paid(AdRef::Service(ad_id));
        Ok(analytics::performance(&ad, total_spent, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use vendora_core::event_bus::{capture_sink, CaptureSink};

    fn service() -> (AdService, Arc<CaptureSink>) {
        let sink = capture_sink();
        let service = AdService::new(Arc::new(AdStore::new()), sink.clone());
        (service, sink)
    }

    fn vendor() -> Actor {
        Actor::Vendor { id: Uuid::new_v4() }
    }

    fn admin() -> Actor {
        Actor::Admin { id: Uuid::new_v4() }
    }

    fn request_input() -> CreateAdRequestInput {
        let now = Utc::now();
        CreateAdRequestInput {
            ad_type: AdType::Featured,
            entity_type: EntityType::Venue,
            entity_id: Uuid::new_v4(),
            requested_price: 250.0,
            requested_start_date: now + Duration::days(1),
            requested_end_date: now + Duration::days(31),
        }
    }

    fn approve_input() -> ApproveAdRequestInput {
        let now = Utc::now();
        ApproveAdRequestInput {
            final_price: 200.0,
            admin_start_date: now + Duration::days(1),
            admin_end_date: now + Duration::days(31),
            admin_notes: Some("looks good".into()),
            time_slots: vec![TimeSlotSpec {
                start_time: "09:00".into(),
                end_time: "12:00".into(),
                days_of_week: vec![1, 3, 5],
                priority: 2,
            }],
        }
    }

    fn approved_ad(service: &AdService) -> (Actor, ServiceAd) {
        let v = vendor();
        let request = service.create_ad_request(v, request_input()).unwrap();
        let ad = service
            .approve_ad_request(admin(), request.id, approve_input())
            .unwrap();
        (v, ad)
    }

    // 1. Request state machine -----------------------------------------------

    #[test]
    fn test_create_requires_vendor() {
        let (service, _) = service();
        let err = service
            .create_ad_request(Actor::Anonymous, request_input())
            .unwrap_err();
        assert_eq!(err.code(), "UNAUTHENTICATED");

        let err = service.create_ad_request(admin(), request_input()).unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
    }

    #[test]
    fn test_approval_spawns_scheduled_ad() {
        let (service, sink) = service();
        let (v, ad) = approved_ad(&service);

        assert_eq!(ad.status, ServiceAdStatus::Scheduled);
        assert_eq!(ad.time_slots.len(), 1);
        assert_eq!(ad.vendor_id, v.vendor_id().unwrap());

        let request = service.get_ad_request(v, ad.request_id).unwrap();
        assert_eq!(request.status, AdRequestStatus::Approved);
        assert!(request.reviewed_by.is_some());
        assert_eq!(sink.count_kind(AdEventKind::Approved), 1);
    }

    #[test]
    fn test_approve_rejects_invalid_slots() {
        let (service, _) = service();
        let v = vendor();
        let request = service.create_ad_request(v, request_input()).unwrap();

        let mut input = approve_input();
        input.time_slots[0].priority = 0;
        let err = service
            .approve_ad_request(admin(), request.id, input)
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");

        // Request untouched by the failed approval
        let request = service.get_ad_request(v, request.id).unwrap();
        assert_eq!(request.status, AdRequestStatus::Pending);
    }

    #[test]
    fn test_only_owner_updates_pending_request() {
        let (service, _) = service();
        let owner = vendor();
        let request = service.create_ad_request(owner, request_input()).unwrap();

        let err = service
            .update_ad_request(vendor(), request.id, UpdateAdRequestInput::default())
            .unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");

        let updated = service
            .update_ad_request(
                owner,
                request.id,
                UpdateAdRequestInput {
                    requested_price: Some(300.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!((updated.requested_price - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejected_update_writes_nothing() {
        let (service, _) = service();
        let owner = vendor();
        let request = service.create_ad_request(owner, request_input()).unwrap();

        // Valid price paired with an inverted date range: the whole update
        // must be rejected, including the price.
        let err = service
            .update_ad_request(
                owner,
                request.id,
                UpdateAdRequestInput {
                    requested_price: Some(999.0),
                    requested_end_date: Some(request.requested_start_date - Duration::days(1)),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.code(), "BAD_REQUEST");

        let current = service.get_ad_request(owner, request.id).unwrap();
        assert!((current.requested_price - request.requested_price).abs() < f64::EPSILON);
        assert_eq!(current.requested_start_date, request.requested_start_date);
        assert_eq!(current.requested_end_date, request.requested_end_date);
    }

    #[test]
    fn test_cancel_is_distinct_from_reject() {
        let (service, sink) = service();
        let v = vendor();
        let request = service.create_ad_request(v, request_input()).unwrap();
        let cancelled = service.cancel_ad_request(v, request.id).unwrap();
        assert_eq!(cancelled.status, AdRequestStatus::Cancelled);
        assert_eq!(sink.count_kind(AdEventKind::RequestCancelled), 1);

        // Terminal: cannot update or re-cancel
        assert!(service
            .update_ad_request(v, request.id, UpdateAdRequestInput::default())
            .is_err());
        assert!(service.cancel_ad_request(v, request.id).is_err());
    }

    #[test]
    fn test_under_review_is_a_dead_end_for_the_vendor() {
        let (service, _) = service();
        let v = vendor();
        let a = admin();
        let request = service.create_ad_request(v, request_input()).unwrap();
        let reviewed = service
            .review_ad_request(a, request.id, Some("checking".into()))
            .unwrap();
        assert_eq!(reviewed.status, AdRequestStatus::UnderReview);

        // Vendor can no longer update or cancel; admin can still approve.
        assert!(service
            .update_ad_request(v, request.id, UpdateAdRequestInput::default())
            .is_err());
        assert!(service.cancel_ad_request(v, request.id).is_err());
        assert!(service.approve_ad_request(a, request.id, approve_input()).is_ok());
    }

    // 2. ServiceAd lifecycle --------------------------------------------------

    #[test]
    fn test_lifecycle_happy_path() {
        let (service, sink) = service();
        let (_, ad) = approved_ad(&service);
        let a = admin();

        let active = service.activate_service_ad(a, ad.id).unwrap();
        assert_eq!(active.status, ServiceAdStatus::Active);
        assert!(active.actual_start_date.is_some());

        let paused = service.pause_service_ad(a, ad.id).unwrap();
        assert_eq!(paused.status, ServiceAdStatus::Paused);

        let resumed = service.resume_service_ad(a, ad.id).unwrap();
        assert_eq!(resumed.status, ServiceAdStatus::Active);

        let expired = service.expire_service_ad(a, ad.id).unwrap();
        assert_eq!(expired.status, ServiceAdStatus::Expired);
        assert!(expired.actual_end_date.is_some());

        assert_eq!(sink.count_kind(AdEventKind::Activated), 1);
        assert_eq!(sink.count_kind(AdEventKind::Expired), 1);
    }

    #[test]
    fn test_illegal_transitions_are_bad_requests() {
        let (service, _) = service();
        let (_, ad) = approved_ad(&service);
        let a = admin();

        // Scheduled ad cannot be paused or resumed
        assert_eq!(service.pause_service_ad(a, ad.id).unwrap_err().code(), "BAD_REQUEST");
        assert_eq!(service.resume_service_ad(a, ad.id).unwrap_err().code(), "BAD_REQUEST");

        service.expire_service_ad(a, ad.id).unwrap();
        assert_eq!(service.expire_service_ad(a, ad.id).unwrap_err().code(), "BAD_REQUEST");
        assert_eq!(service.cancel_service_ad(a, ad.id).unwrap_err().code(), "BAD_REQUEST");
    }

    #[test]
    fn test_lifecycle_requires_admin() {
        let (service, _) = service();
        let (v, ad) = approved_ad(&service);

        assert_eq!(
            service.activate_service_ad(Actor::Anonymous, ad.id).unwrap_err().code(),
            "UNAUTHENTICATED"
        );
        assert_eq!(service.activate_service_ad(v, ad.id).unwrap_err().code(), "FORBIDDEN");
    }

    #[test]
    fn test_extend_moves_forward_only() {
        let (service, _) = service();
        let (_, ad) = approved_ad(&service);
        let a = admin();
        service.activate_service_ad(a, ad.id).unwrap();

        let err = service
            .extend_service_ad(a, ad.id, ad.admin_end_date)
            .unwrap_err();
        assert_eq!(err.code(), "BAD_REQUEST");

        let err = service
            .extend_service_ad(a, ad.id, ad.admin_end_date - Duration::days(1))
            .unwrap_err();
        assert_eq!(err.code(), "BAD_REQUEST");

        let extended = service
            .extend_service_ad(a, ad.id, ad.admin_end_date + Duration::days(7))
            .unwrap();
        assert_eq!(extended.admin_end_date, ad.admin_end_date + Duration::days(7));
    }

    // 3. Counters and payments ------------------------------------------------

    #[test]
    fn test_interaction_counters_are_public_and_monotonic() {
        let (service, _) = service();
        let (_, ad) = approved_ad(&service);

        assert_eq!(service.record_impression(ad.id).unwrap(), 1);
        assert_eq!(service.record_impression(ad.id).unwrap(), 2);
        assert_eq!(service.record_click(ad.id).unwrap(), 1);
        assert_eq!(service.record_conversion(ad.id).unwrap(), 1);

        let missing = Uuid::new_v4();
        assert_eq!(service.record_click(missing).unwrap_err().code(), "NOT_FOUND");
    }

    #[test]
    fn test_payment_flow() {
        let (service, _) = service();
        let (_, ad) = approved_ad(&service);
        let a = admin();

        let payment = service
            .create_ad_payment(a, AdRef::Service(ad.id), 200.0)
            .unwrap();
        assert_eq!(payment.payment_status, PaymentStatus::Pending);

        let paid = service.mark_ad_payment(a, payment.id, PaymentStatus::Paid).unwrap();
        assert!(paid.paid_at.is_some());

        let err = service
            .create_ad_payment(a, AdRef::Service(Uuid::new_v4()), 10.0)
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
