//! HTTP surface: a GraphQL endpoint with GraphiQL on GET, plus a health
//! probe. Identity arrives via headers set by the upstream gateway and is
//! injected into each GraphQL request as an `Actor`.

use axum::extract::Extension;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use vendora_core::types::Actor;

use crate::schema::AdSchema;

const ADMIN_HEADER: &str = "x-admin-id";
const VENDOR_HEADER: &str = "x-vendor-id";

/// Resolves the caller from gateway headers. An admin header wins over a
/// vendor header; anything unparseable falls back to anonymous.
fn actor_from_headers(headers: &HeaderMap) -> Actor {
    let parse = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
    };
    if let Some(id) = parse(ADMIN_HEADER) {
        return Actor::Admin { id };
    }
    if let Some(id) = parse(VENDOR_HEADER) {
        return Actor::Vendor { id };
    }
    Actor::Anonymous
}

async fn graphql_handler(
    Extension(schema): Extension<AdSchema>,
    headers: HeaderMap,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    let actor = actor_from_headers(&headers);
    Json(schema.execute(request.data(actor)).await)
}

async fn graphiql() -> impl IntoResponse {
    Html(
        async_graphql::http::GraphiQLSource::build()
            .endpoint("/graphql")
            .finish(),
    )
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

pub fn app(schema: AdSchema) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/graphql", get(graphiql).post(graphql_handler))
        .layer(Extension(schema))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn start_server(schema: AdSchema, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "GraphQL server listening");
    axum::serve(listener, app(schema)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_actor_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(matches!(actor_from_headers(&headers), Actor::Anonymous));

        let vendor = Uuid::new_v4();
        headers.insert(
            VENDOR_HEADER,
            HeaderValue::from_str(&vendor.to_string()).unwrap(),
        );
        assert!(matches!(
            actor_from_headers(&headers),
            Actor::Vendor { id } if id == vendor
        ));

        // Admin header takes precedence
        let admin = Uuid::new_v4();
        headers.insert(
            ADMIN_HEADER,
            HeaderValue::from_str(&admin.to_string()).unwrap(),
        );
        assert!(matches!(
            actor_from_headers(&headers),
            Actor::Admin { id } if id == admin
        ));

        // Garbage degrades to anonymous rather than erroring
        let mut junk = HeaderMap::new();
        junk.insert(ADMIN_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert!(matches!(actor_from_headers(&junk), Actor::Anonymous));
    }
}
