//! Integration test for the full ad lifecycle: request, approval, slot
//! booking, activation, interaction tracking, and expiration.

use std::sync::Arc;

use async_graphql::Request;
use chrono::{Duration, NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;

use vendora_ads::service::{ApproveAdRequestInput, CreateAdRequestInput};
use vendora_ads::{AdService, AdStore};
use vendora_core::config::SchedulerConfig;
use vendora_core::event_bus::{capture_sink, AdEventKind, CaptureSink};
use vendora_core::types::*;
use vendora_graphql::{create_schema, AdSchema};
use vendora_scheduler::{AdScans, SlotAllocator};

struct Harness {
    store: Arc<AdStore>,
    ads: Arc<AdService>,
    allocator: Arc<SlotAllocator>,
    scans: AdScans,
    schema: AdSchema,
    events: Arc<CaptureSink>,
}

fn harness() -> Harness {
    let store = Arc::new(AdStore::new());
    let events = capture_sink();
    let ads = Arc::new(AdService::new(store.clone(), events.clone()));
    let allocator = Arc::new(SlotAllocator::new(store.clone(), events.clone()));
    let scans = AdScans::new(store.clone(), SchedulerConfig::default());
    let schema = create_schema(ads.clone(), allocator.clone());
    Harness {
        store,
        ads,
        allocator,
        scans,
        schema,
        events,
    }
}

fn slot(start: &str, end: &str, days: Vec<u8>) -> TimeSlotSpec {
    TimeSlotSpec {
        start_time: start.into(),
        end_time: end.into(),
        days_of_week: days,
        priority: 1,
    }
}

// 2025-06-02 is a Monday (weekday 1 counting from Sunday).
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

#[tokio::test]
async fn test_full_ad_lifecycle() {
    let h = harness();
    let vendor = Actor::Vendor { id: Uuid::new_v4() };
    let admin = Actor::Admin { id: Uuid::new_v4() };
    let now = Utc::now();

    // Vendor submits a request
    let request = h
        .ads
        .create_ad_request(
            vendor,
            CreateAdRequestInput {
                ad_type: AdType::Featured,
                entity_type: EntityType::Venue,
                entity_id: Uuid::new_v4(),
                requested_price: 300.0,
                requested_start_date: now - Duration::hours(1),
                requested_end_date: now + Duration::days(30),
            },
        )
        .unwrap();
    assert_eq!(request.status, AdRequestStatus::Pending);

    // Admin reviews, then approves; the service ad spawns Scheduled with a
    // start date already in the past so the activation scan picks it up.
    h.ads
        .review_ad_request(admin, request.id, Some("checking".into()))
        .unwrap();
    let ad = h
        .ads
        .approve_ad_request(
            admin,
            request.id,
            ApproveAdRequestInput {
                final_price: 250.0,
                admin_start_date: now - Duration::hours(1),
                admin_end_date: now + Duration::days(30),
                admin_notes: None,
                time_slots: vec![slot("10:00", "12:00", vec![1])],
            },
        )
        .unwrap();
    assert_eq!(ad.status, ServiceAdStatus::Scheduled);

    // The Monday window shows open, and booking it flips availability
    let open = h.allocator.get_available_time_slots("2025-06-02", None).unwrap();
    assert_eq!(open.len(), 1);
    assert!(open[0].available);

    let run = h
        .allocator
        .schedule_ad_run(ad.id, ad.time_slots[0].id, monday())
        .unwrap();
    assert_eq!(run.status, ScheduleStatus::Scheduled);

    let booked = h.allocator.get_available_time_slots("2025-06-02", None).unwrap();
    assert!(!booked[0].available);
    assert_eq!(booked[0].conflicting_ads, vec![ad.id]);

    // Activation scan flips the due ad
    assert_eq!(h.scans.run_activation_scan(now).unwrap(), 1);
    let active = h.ads.get_service_ad(ad.id).unwrap();
    assert_eq!(active.status, ServiceAdStatus::Active);
    assert!(active.actual_start_date.is_some());

    // Public interaction counters feed the performance snapshot
    for _ in 0..50 {
        h.ads.record_impression(ad.id).unwrap();
    }
    for _ in 0..5 {
        h.ads.record_click(ad.id).unwrap();
    }
    h.ads.record_conversion(ad.id).unwrap();

    let perf = h.ads.ad_performance(vendor, ad.id).unwrap();
    assert_eq!(perf.impressions, 50);
    assert!((perf.ctr - 10.0).abs() < f64::EPSILON);
    assert!((perf.conversion_rate - 20.0).abs() < f64::EPSILON);
    assert!(perf.days_active >= 1);

    // Expiration scan catches the ad once its end date has passed
    h.store
        .try_update_service_ad(ad.id, |ad| {
            ad.admin_end_date = now - Duration::hours(1);
            Ok(())
        })
        .unwrap();
    assert_eq!(h.scans.run_expiration_scan(now).unwrap(), 1);
    let expired = h.ads.get_service_ad(ad.id).unwrap();
    assert_eq!(expired.status, ServiceAdStatus::Expired);
    assert!(expired.actual_end_date.is_some());

    // Events fired along the way
    assert_eq!(h.events.count_kind(AdEventKind::Requested), 1);
    assert_eq!(h.events.count_kind(AdEventKind::Approved), 1);
    assert_eq!(h.events.count_kind(AdEventKind::RunScheduled), 1);
}

#[tokio::test]
async fn test_graphql_flow_end_to_end() {
    let h = harness();
    let vendor_id = Uuid::new_v4();
    let admin_id = Uuid::new_v4();
    let vendor = Actor::Vendor { id: vendor_id };
    let admin = Actor::Admin { id: admin_id };

    let create = r#"
        mutation {
            createAdRequest(input: {
                adType: PREMIUM,
                entityType: PHOTOGRAPHY,
                entityId: "7f8a8f1e-4c2b-4e64-9d3c-333333333333",
                requestedPrice: 500.0,
                requestedStartDate: "2025-07-01T00:00:00Z",
                requestedEndDate: "2025-08-01T00:00:00Z"
            }) { id status }
        }
    "#;
    let response = h.schema.execute(Request::new(create).data(vendor)).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let data = response.data.into_json().unwrap();
    assert_eq!(data["createAdRequest"]["status"], json!("PENDING"));
    let request_id = data["createAdRequest"]["id"].as_str().unwrap().to_string();

    // Another vendor cannot see the request
    let query = format!(r#"{{ adRequest(id: "{request_id}") {{ id }} }}"#);
    let other = Actor::Vendor { id: Uuid::new_v4() };
    let response = h
        .schema
        .execute(Request::new(query.as_str()).data(other))
        .await;
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["errors"][0]["extensions"]["code"], json!("FORBIDDEN"));

    // Admin approves through the API
    let approve = format!(
        r#"
        mutation {{
            approveAdRequest(id: "{request_id}", input: {{
                finalPrice: 450.0,
                adminStartDate: "2025-07-01T00:00:00Z",
                adminEndDate: "2025-08-01T00:00:00Z",
                timeSlots: [{{
                    startTime: "09:00",
                    endTime: "11:00",
                    daysOfWeek: [1, 3],
                    priority: 2
                }}]
            }}) {{ id status timeSlots {{ id startTime }} }}
        }}
    "#
    );
    let response = h
        .schema
        .execute(Request::new(approve.as_str()).data(admin))
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let data = response.data.into_json().unwrap();
    assert_eq!(data["approveAdRequest"]["status"], json!("SCHEDULED"));
    let ad_id = data["approveAdRequest"]["id"].as_str().unwrap().to_string();
    let slot_id = data["approveAdRequest"]["timeSlots"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Book a Monday run, then a second booking of the same window conflicts
    let schedule = format!(
        r#"
        mutation {{
            scheduleAdRun(adId: "{ad_id}", timeSlotId: "{slot_id}", scheduledDate: "2025-07-07")
            {{ id status scheduledDate }}
        }}
    "#
    );
    let response = h
        .schema
        .execute(Request::new(schedule.as_str()).data(admin))
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);

    let response = h
        .schema
        .execute(Request::new(schedule.as_str()).data(admin))
        .await;
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["errors"][0]["extensions"]["code"], json!("CONFLICT"));
    assert_eq!(
        value["errors"][0]["extensions"]["conflictingAds"],
        json!([ad_id])
    );

    // Anonymous interaction tracking works against the same ad
    let track = format!(r#"mutation {{ recordAdImpression(adId: "{ad_id}") }}"#);
    let response = h.schema.execute(track.as_str()).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let data = response.data.into_json().unwrap();
    assert_eq!(data["recordAdImpression"], json!(1));
}
