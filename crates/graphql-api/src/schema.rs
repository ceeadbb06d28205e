use std::sync::Arc;

use async_graphql::{EmptySubscription, ErrorExtensions, Schema};
use vendora_ads::AdService;
use vendora_core::error::AdError;
use vendora_core::types::Actor;
use vendora_scheduler::SlotAllocator;

use crate::resolvers::{Mutation, Query};

/// Shared application state available to every resolver. The per-request
/// `Actor` identity is injected separately via `Request::data`.
pub struct AppContext {
    pub ads: Arc<AdService>,
    pub allocator: Arc<SlotAllocator>,
}

pub type AdSchema = Schema<Query, Mutation, EmptySubscription>;

pub fn create_schema(ads: Arc<AdService>, allocator: Arc<SlotAllocator>) -> AdSchema {
    Schema::build(Query, Mutation, EmptySubscription)
        .data(AppContext { ads, allocator })
        .finish()
}

/// Maps a service error onto a GraphQL error with `extensions.code`;
/// conflicts additionally carry the occupying ad ids.
pub fn gql_err(err: AdError) -> async_graphql::Error {
    let code = err.code();
    let conflicting: Option<Vec<String>> = match &err {
        AdError::Conflict { conflicting_ads, .. } => {
            Some(conflicting_ads.iter().map(ToString::to_string).collect())
        }
        _ => None,
    };
    async_graphql::Error::new(err.to_string()).extend_with(|_, e| {
        e.set("code", code);
        if let Some(ads) = &conflicting {
            e.set("conflictingAds", ads.clone());
        }
    })
}

/// Per-request identity; defaults to anonymous when the auth middleware put
/// nothing in the request.
pub fn actor_of(ctx: &async_graphql::Context<'_>) -> Actor {
    ctx.data_opt::<Actor>().copied().unwrap_or(Actor::Anonymous)
}

/// Resolver-level presence check: no identity at all is UNAUTHENTICATED.
pub fn require_identity(ctx: &async_graphql::Context<'_>) -> async_graphql::Result<Actor> {
    let actor = actor_of(ctx);
    if actor.is_anonymous() {
        return Err(gql_err(AdError::Unauthenticated));
    }
    Ok(actor)
}

/// Resolver-level gate for admin-only operations.
pub fn require_admin(ctx: &async_graphql::Context<'_>) -> async_graphql::Result<Actor> {
    let actor = require_identity(ctx)?;
    if !actor.is_admin() {
        return Err(gql_err(AdError::Forbidden("admin role required".into())));
    }
    Ok(actor)
}
