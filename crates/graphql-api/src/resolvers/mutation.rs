use async_graphql::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use vendora_core::error::AdError;
use vendora_core::types::AdRef;

use crate::schema::{gql_err, require_admin, require_identity, AppContext};
use crate::types::*;

/// Root mutation object. Resolvers check that an identity is present; role
/// and ownership rules live in the service layer. Allocator and payment
/// mutations are admin-only and gated here.
pub struct Mutation;

#[async_graphql::Object]
impl Mutation {
    // ─── Request / approval state machine ──────────────────────────────────

    async fn create_ad_request(
        &self,
        ctx: &Context<'_>,
        input: CreateAdRequestInput,
    ) -> Result<AdRequest> {
        let actor = require_identity(ctx)?;
        let app = ctx.data::<AppContext>()?;
        app.ads
            .create_ad_request(actor, input.into())
            .map(Into::into)
            .map_err(gql_err)
    }

    async fn update_ad_request(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        input: UpdateAdRequestInput,
    ) -> Result<AdRequest> {
        let actor = require_identity(ctx)?;
        let app = ctx.data::<AppContext>()?;
        app.ads
            .update_ad_request(actor, id, input.into())
            .map(Into::into)
            .map_err(gql_err)
    }

    async fn cancel_ad_request(&self, ctx: &Context<'_>, id: Uuid) -> Result<AdRequest> {
        let actor = require_identity(ctx)?;
        let app = ctx.data::<AppContext>()?;
        app.ads.cancel_ad_request(actor, id).map(Into::into).map_err(gql_err)
    }

    async fn review_ad_request(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        notes: Option<String>,
    ) -> Result<AdRequest> {
        let actor = require_identity(ctx)?;
        let app = ctx.data::<AppContext>()?;
        app.ads
            .review_ad_request(actor, id, notes)
            .map(Into::into)
            .map_err(gql_err)
    }

    /// Approval spawns the service ad in Scheduled.
    async fn approve_ad_request(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        input: ApproveAdRequestInput,
    ) -> Result<ServiceAd> {
        let actor = require_identity(ctx)?;
        let app = ctx.data::<AppContext>()?;
        app.ads
            .approve_ad_request(actor, id, input.into())
            .map(Into::into)
            .map_err(gql_err)
    }

    async fn reject_ad_request(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        notes: Option<String>,
    ) -> Result<AdRequest> {
        let actor = require_identity(ctx)?;
        let app = ctx.data::<AppContext>()?;
        app.ads
            .reject_ad_request(actor, id, notes)
            .map(Into::into)
            .map_err(gql_err)
    }

    // ─── ServiceAd lifecycle ───────────────────────────────────────────────

    async fn activate_service_ad(&self, ctx: &Context<'_>, id: Uuid) -> Result<ServiceAd> {
        let actor = require_identity(ctx)?;
        let app = ctx.data::<AppContext>()?;
        app.ads.activate_service_ad(actor, id).map(Into::into).map_err(gql_err)
    }

    async fn pause_service_ad(&self, ctx: &Context<'_>, id: Uuid) -> Result<ServiceAd> {
        let actor = require_identity(ctx)?;
        let app = ctx.data::<AppContext>()?;
        app.ads.pause_service_ad(actor, id).map(Into::into).map_err(gql_err)
    }

    async fn resume_service_ad(&self, ctx: &Context<'_>, id: Uuid) -> Result<ServiceAd> {
        let actor = require_identity(ctx)?;
        let app = ctx.data::<AppContext>()?;
        app.ads.resume_service_ad(actor, id).map(Into::into).map_err(gql_err)
    }

    async fn cancel_service_ad(&self, ctx: &Context<'_>, id: Uuid) -> Result<ServiceAd> {
        let actor = require_identity(ctx)?;
        let app = ctx.data::<AppContext>()?;
        app.ads.cancel_service_ad(actor, id).map(Into::into).map_err(gql_err)
    }

    async fn expire_service_ad(&self, ctx: &Context<'_>, id: Uuid) -> Result<ServiceAd> {
        let actor = require_identity(ctx)?;
        let app = ctx.data::<AppContext>()?;
        app.ads.expire_service_ad(actor, id).map(Into::into).map_err(gql_err)
    }

    async fn extend_service_ad(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        new_end_date: DateTime<Utc>,
    ) -> Result<ServiceAd> {
        let actor = require_identity(ctx)?;
        let app = ctx.data::<AppContext>()?;
        app.ads
            .extend_service_ad(actor, id, new_end_date)
            .map(Into::into)
            .map_err(gql_err)
    }

    // ─── Slot allocation and schedule runs ─────────────────────────────────

    async fn update_ad_time_slots(
        &self,
        ctx: &Context<'_>,
        ad_id: Uuid,
        time_slots: Vec<TimeSlotInput>,
    ) -> Result<ServiceAd> {
        require_admin(ctx)?;
        let app = ctx.data::<AppContext>()?;
        let specs: Vec<_> = time_slots.into_iter().map(Into::into).collect();
        app.allocator
            .update_ad_time_slots(ad_id, &specs)
            .map(Into::into)
            .map_err(gql_err)
    }

    async fn schedule_ad_run(
        &self,
        ctx: &Context<'_>,
        ad_id: Uuid,
        time_slot_id: Uuid,
        scheduled_date: NaiveDate,
    ) -> Result<AdSchedule> {
        require_admin(ctx)?;
        let app = ctx.data::<AppContext>()?;
        app.allocator
            .schedule_ad_run(ad_id, time_slot_id, scheduled_date)
            .map(Into::into)
            .map_err(gql_err)
    }

    /// Overwrites the slots of every listed ad and books a run for each
    /// matching weekday in the range. Skips failing ads and days rather than
    /// aborting the batch.
    async fn bulk_schedule_ads(
        &self,
        ctx: &Context<'_>,
        ad_ids: Vec<Uuid>,
        time_slots: Vec<TimeSlotInput>,
        range: DateRangeInput,
    ) -> Result<Vec<AdSchedule>> {
        require_admin(ctx)?;
        let app = ctx.data::<AppContext>()?;
        let specs: Vec<_> = time_slots.into_iter().map(Into::into).collect();
        app.allocator
            .bulk_schedule_ads(&ad_ids, &specs, range.into())
            .map(|schedules| schedules.into_iter().map(Into::into).collect())
            .map_err(gql_err)
    }

    async fn retry_failed_schedule(
        &self,
        ctx: &Context<'_>,
        schedule_id: Uuid,
    ) -> Result<AdSchedule> {
        require_admin(ctx)?;
        let app = ctx.data::<AppContext>()?;
        app.allocator
            .retry_failed_schedule(schedule_id)
            .map(Into::into)
            .map_err(gql_err)
    }

    // ─── Interaction counters (public, no auth) ────────────────────────────

    /// Returns the new impression count.
    async fn record_ad_impression(&self, ctx: &Context<'_>, ad_id: Uuid) -> Result<u64> {
        let app = ctx.data::<AppContext>()?;
        app.ads.record_impression(ad_id).map_err(gql_err)
    }

    /// Returns the new click count.
    async fn record_ad_click(&self, ctx: &Context<'_>, ad_id: Uuid) -> Result<u64> {
        let app = ctx.data::<AppContext>()?;
        app.ads.record_click(ad_id).map_err(gql_err)
    }

    /// Returns the new conversion count.
    async fn record_ad_conversion(&self, ctx: &Context<'_>, ad_id: Uuid) -> Result<u64> {
        let app = ctx.data::<AppContext>()?;
        app.ads.record_conversion(ad_id).map_err(gql_err)
    }

    // ─── External ads ──────────────────────────────────────────────────────

    async fn create_external_ad(
        &self,
        ctx: &Context<'_>,
        input: ExternalAdInput,
    ) -> Result<ExternalAd> {
        let actor = require_identity(ctx)?;
        let app = ctx.data::<AppContext>()?;
        app.ads
            .create_external_ad(actor, input.into())
            .map(Into::into)
            .map_err(gql_err)
    }

    async fn set_external_ad_status(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        status: ExternalAdStatus,
    ) -> Result<ExternalAd> {
        let actor = require_identity(ctx)?;
        let app = ctx.data::<AppContext>()?;
        app.ads
            .set_external_ad_status(actor, id, status.into())
            .map(Into::into)
            .map_err(gql_err)
    }

    // ─── Payments ──────────────────────────────────────────────────────────

    /// Exactly one of `service_ad_id` and `external_ad_id` must be given.
    async fn create_ad_payment(
        &self,
        ctx: &Context<'_>,
        service_ad_id: Option<Uuid>,
        external_ad_id: Option<Uuid>,
        amount: f64,
    ) -> Result<AdPayment> {
        let actor = require_identity(ctx)?;
        let app = ctx.data::<AppContext>()?;
        let ad_ref = match (service_ad_id, external_ad_id) {
            (Some(id), None) => AdRef::Service(id),
            (None, Some(id)) => AdRef::External(id),
            _ => {
                return Err(gql_err(AdError::InvalidInput(
                    "exactly one of serviceAdId and externalAdId must be set".into(),
                )))
            }
        };
        app.ads
            .create_ad_payment(actor, ad_ref, amount)
            .map(Into::into)
            .map_err(gql_err)
    }

    async fn mark_ad_payment(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<AdPayment> {
        let actor = require_identity(ctx)?;
        let app = ctx.data::<AppContext>()?;
        app.ads
            .mark_ad_payment(actor, id, status.into())
            .map(Into::into)
            .map_err(gql_err)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_graphql::Request;
    use serde_json::json;
    use vendora_ads::store::AdStore;
    use vendora_ads::AdService;
    use vendora_core::event_bus::noop_sink;
    use vendora_core::types::Actor;
    use vendora_scheduler::SlotAllocator;

    use crate::schema::{create_schema, AdSchema};

    fn schema() -> AdSchema {
        let store = Arc::new(AdStore::new());
        let ads = Arc::new(AdService::new(store.clone(), noop_sink()));
        let allocator = Arc::new(SlotAllocator::new(store, noop_sink()));
        create_schema(ads, allocator)
    }

    fn error_code(response: &async_graphql::Response) -> String {
        let value = serde_json::to_value(response).unwrap();
        value["errors"][0]["extensions"]["code"]
            .as_str()
            .unwrap()
            .to_string()
    }

    const CREATE_REQUEST: &str = r#"
        mutation {
            createAdRequest(input: {
                adType: FEATURED,
                entityType: VENUE,
                entityId: "7f8a8f1e-4c2b-4e64-9d3c-111111111111",
                requestedPrice: 150.0,
                requestedStartDate: "2025-07-01T00:00:00Z",
                requestedEndDate: "2025-07-31T00:00:00Z"
            }) { id status vendorId }
        }
    "#;

    #[tokio::test]
    async fn test_anonymous_mutation_is_unauthenticated() {
        let schema = schema();
        let response = schema.execute(CREATE_REQUEST).await;
        assert!(response.is_err());
        assert_eq!(error_code(&response), "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn test_vendor_creates_request() {
        let schema = schema();
        let vendor_id = uuid::Uuid::new_v4();
        let response = schema
            .execute(Request::new(CREATE_REQUEST).data(Actor::Vendor { id: vendor_id }))
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);

        let data = response.data.into_json().unwrap();
        assert_eq!(data["createAdRequest"]["status"], json!("PENDING"));
        assert_eq!(
            data["createAdRequest"]["vendorId"],
            json!(vendor_id.to_string())
        );
    }

    #[tokio::test]
    async fn test_admin_gate_on_allocator_mutations() {
        let schema = schema();
        let query = r#"
            mutation {
                retryFailedSchedule(scheduleId: "7f8a8f1e-4c2b-4e64-9d3c-222222222222") { id }
            }
        "#;

        let response = schema
            .execute(Request::new(query).data(Actor::Vendor { id: uuid::Uuid::new_v4() }))
            .await;
        assert_eq!(error_code(&response), "FORBIDDEN");

        // Admin passes the gate and hits the store lookup instead
        let response = schema
            .execute(Request::new(query).data(Actor::Admin { id: uuid::Uuid::new_v4() }))
            .await;
        assert_eq!(error_code(&response), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_payment_requires_exactly_one_target() {
        let schema = schema();
        let query = r#"
            mutation {
                createAdPayment(amount: 10.0) { id }
            }
        "#;
        let response = schema
            .execute(Request::new(query).data(Actor::Admin { id: uuid::Uuid::new_v4() }))
            .await;
        assert_eq!(error_code(&response), "INVALID_INPUT");
    }
}
