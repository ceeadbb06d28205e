use async_graphql::{Context, Result};
use uuid::Uuid;

use crate::schema::{actor_of, gql_err, require_admin, require_identity, AppContext};
use crate::types::*;

const DEFAULT_SCHEDULE_LIMIT: usize = 50;

/// Root query object
pub struct Query;

#[async_graphql::Object]
impl Query {
    /// A single ad request; admins see all, vendors only their own.
    async fn ad_request(&self, ctx: &Context<'_>, id: Uuid) -> Result<AdRequest> {
        let actor = require_identity(ctx)?;
        let app = ctx.data::<AppContext>()?;
        app.ads.get_ad_request(actor, id).map(Into::into).map_err(gql_err)
    }

    /// Ad requests visible to the caller, optionally filtered by status.
    async fn ad_requests(
        &self,
        ctx: &Context<'_>,
        status: Option<AdRequestStatus>,
    ) -> Result<Vec<AdRequest>> {
        let actor = require_identity(ctx)?;
        let app = ctx.data::<AppContext>()?;
        app.ads
            .list_ad_requests(actor, status.map(Into::into))
            .map(|requests| requests.into_iter().map(Into::into).collect())
            .map_err(gql_err)
    }

    async fn service_ad(&self, ctx: &Context<'_>, id: Uuid) -> Result<ServiceAd> {
        let app = ctx.data::<AppContext>()?;
        app.ads.get_service_ad(id).map(Into::into).map_err(gql_err)
    }

    async fn service_ads(
        &self,
        ctx: &Context<'_>,
        vendor_id: Option<Uuid>,
        status: Option<ServiceAdStatus>,
    ) -> Result<Vec<ServiceAd>> {
        let app = ctx.data::<AppContext>()?;
        Ok(app
            .ads
            .list_service_ads(vendor_id, status.map(Into::into))
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn external_ads(
        &self,
        ctx: &Context<'_>,
        status: Option<ExternalAdStatus>,
    ) -> Result<Vec<ExternalAd>> {
        let app = ctx.data::<AppContext>()?;
        Ok(app
            .ads
            .list_external_ads(status.map(Into::into))
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Delivery windows defined for the given date's weekday, each flagged
    /// with the ads already occupying it.
    async fn get_available_time_slots(
        &self,
        ctx: &Context<'_>,
        date: String,
        ad_type: Option<AdType>,
    ) -> Result<Vec<TimeSlotAvailability>> {
        let app = ctx.data::<AppContext>()?;
        app.allocator
            .get_available_time_slots(&date, ad_type.map(Into::into))
            .map(|windows| windows.into_iter().map(Into::into).collect())
            .map_err(gql_err)
    }

    async fn get_upcoming_schedules(
        &self,
        ctx: &Context<'_>,
        limit: Option<usize>,
    ) -> Result<Vec<AdSchedule>> {
        require_admin(ctx)?;
        let app = ctx.data::<AppContext>()?;
        Ok(app
            .allocator
            .upcoming_schedules(limit.unwrap_or(DEFAULT_SCHEDULE_LIMIT))
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn get_failed_schedules(
        &self,
        ctx: &Context<'_>,
        limit: Option<usize>,
    ) -> Result<Vec<AdSchedule>> {
        require_admin(ctx)?;
        let app = ctx.data::<AppContext>()?;
        Ok(app
            .allocator
            .failed_schedules(limit.unwrap_or(DEFAULT_SCHEDULE_LIMIT))
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Performance snapshot; admin or the owning vendor.
    async fn ad_performance(&self, ctx: &Context<'_>, ad_id: Uuid) -> Result<AdPerformance> {
        let actor = actor_of(ctx);
        let app = ctx.data::<AppContext>()?;
        app.ads.ad_performance(actor, ad_id).map(Into::into).map_err(gql_err)
    }

    async fn ad_payments(&self, ctx: &Context<'_>) -> Result<Vec<AdPayment>> {
        let actor = actor_of(ctx);
        let app = ctx.data::<AppContext>()?;
        app.ads
            .list_ad_payments(actor, None)
            .map(|payments| payments.into_iter().map(Into::into).collect())
            .map_err(gql_err)
    }
}
