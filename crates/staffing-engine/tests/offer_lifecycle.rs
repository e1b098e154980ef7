//! End-to-end scenarios for the offer and engagement lifecycle.
//!
//! Everything goes through the public engine facade and the HTTP router so ranking, offers,
//! reputation and engagements are exercised together.

mod common {
    use std::sync::Arc;

    use chrono::{DateTime, TimeZone, Utc};

    use staffing_engine::clock::ManualClock;
    use staffing_engine::config::EngineConfig;
    use staffing_engine::workflows::engagement::CodeGenerator;
    use staffing_engine::workflows::matching::{
        BadgeTier, CandidateId, CandidateProfile, InMemoryDirectory, JobId, JobPosting, NoJitter,
        PayRange, TaxType,
    };
    use staffing_engine::workflows::notifications::RecordingSink;
    use staffing_engine::workflows::StaffingEngine;

    pub const CODE: &str = "204817";

    #[derive(Debug)]
    struct StaticCode;

    impl CodeGenerator for StaticCode {
        fn generate(&self) -> String {
            CODE.to_string()
        }
    }

    pub fn opened_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 7, 30, 0).unwrap()
    }

    pub fn office_clean() -> JobPosting {
        JobPosting {
            id: JobId("job-office-clean".to_string()),
            industry: "Cleaning".to_string(),
            title: "Office Cleaner".to_string(),
            tax_type: TaxType::Abn,
            search_radius_km: 10.0,
            salary: PayRange::new(20.0, 30.0),
            required_experience_years: 2,
            staff_required: 1,
        }
    }

    /// Industry, tax type, pay and experience line up; role and radius do not. Scores 85.
    pub fn cleaner() -> CandidateProfile {
        CandidateProfile {
            id: CandidateId("cand-ava".to_string()),
            industries: vec!["Cleaning".to_string()],
            preferred_roles: vec!["Window Washer".to_string()],
            tax_types: vec![TaxType::Abn],
            service_radius_km: 8.0,
            pay_preference: PayRange::new(22.0, 28.0),
            experience_years: 3,
            badge: BadgeTier::Platinum,
        }
    }

    pub fn barista() -> CandidateProfile {
        CandidateProfile {
            id: CandidateId("cand-ben".to_string()),
            industries: vec!["Hospitality".to_string()],
            preferred_roles: vec!["Barista".to_string()],
            tax_types: vec![TaxType::Tfn],
            service_radius_km: 25.0,
            pay_preference: PayRange::new(26.0, 34.0),
            experience_years: 2,
            badge: BadgeTier::Pro,
        }
    }

    pub struct World {
        pub engine: Arc<StaffingEngine>,
        pub clock: Arc<ManualClock>,
        pub sink: RecordingSink,
    }

    pub fn world() -> World {
        let clock = Arc::new(ManualClock::new(opened_at()));
        let sink = RecordingSink::default();
        let directory = Arc::new(InMemoryDirectory::new(
            vec![office_clean()],
            vec![vec![cleaner()], vec![barista()]],
        ));
        let engine = StaffingEngine::builder(EngineConfig::default())
            .directory(directory)
            .clock(clock.clone())
            .jitter(Arc::new(NoJitter))
            .code_generator(Arc::new(StaticCode))
            .notifications(Arc::new(sink.clone()))
            .build();
        World {
            engine: Arc::new(engine),
            clock,
            sink,
        }
    }
}

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use chrono::Duration;
use serde_json::{json, Value};
use tower::ServiceExt;

use staffing_engine::clock::Clock;
use staffing_engine::workflows::engagement::{Coordinate, EngagementStage, LocationUpdate, Party};
use staffing_engine::workflows::matching::{MatchScorer, RankFilters, RankingMode};
use staffing_engine::workflows::engine_router;
use staffing_engine::workflows::offers::{
    OfferStatus, ResolveOutcome, ResponseDetails, SendOffer,
};

use common::*;

fn update(stage: EngagementStage) -> LocationUpdate {
    LocationUpdate {
        location: Coordinate {
            latitude: -37.8136,
            longitude: 144.9631,
        },
        stage,
        distance_from_home_km: 6.0,
        distance_from_workplace_km: 0.5,
    }
}

#[test]
fn matching_cleaner_scores_at_least_eighty_five_with_any_jitter() {
    let deterministic = MatchScorer::deterministic().score(&office_clean(), &cleaner());
    assert!(deterministic >= 85, "score was {deterministic}");

    let world = world();
    let ranked = world
        .engine
        .rank_job(&office_clean().id, &RankFilters::default(), RankingMode::QuickSearch)
        .expect("ranking");
    let entry = ranked.entry_for(&cleaner().id).expect("cleaner ranked");
    assert!(entry.match_percentage >= 85);
    assert_eq!(ranked.entries[0].candidate_id, cleaner().id);
}

#[test]
fn pro_only_filter_narrows_the_ranking() {
    let world = world();
    let filters = RankFilters {
        minimum_badge: None,
        pro_only: true,
    };

    let ranked = world
        .engine
        .rank_job(&office_clean().id, &filters, RankingMode::ManualSearch)
        .expect("ranking");

    assert_eq!(ranked.candidate_ids(), vec![barista().id]);
}

#[test]
fn returned_snapshots_do_not_move_when_reputation_changes() {
    let world = world();
    let ranked = world
        .engine
        .rank_job(&office_clean().id, &RankFilters::default(), RankingMode::QuickSearch)
        .expect("ranking");
    let before = ranked.clone();

    world
        .engine
        .reputation()
        .seed(&cleaner().id, 40)
        .expect("seed");

    assert_eq!(ranked, before);
    let stored = world
        .engine
        .ranker()
        .snapshot(&office_clean().id)
        .expect("read")
        .expect("present");
    assert_eq!(stored, before);
}

#[test]
fn accepted_offer_runs_through_a_billed_engagement() {
    let world = world();
    let engine = &world.engine;
    engine
        .rank_job(&office_clean().id, &RankFilters::default(), RankingMode::QuickSearch)
        .expect("ranking");

    let offer = engine
        .offers()
        .send(SendOffer::new(office_clean().id, cleaner().id))
        .expect("offer sent");
    world.clock.advance(Duration::hours(3));
    let resolution = engine
        .offers()
        .resolve(&offer.id, ResolveOutcome::Accepted, ResponseDetails::default())
        .expect("accepted");
    let engagement = resolution.engagement.expect("engagement opened");
    assert_eq!(engagement.timer.hourly_rate, 20.0);

    let engagements = engine.engagements();
    for stage in [
        EngagementStage::Preparing,
        EngagementStage::EnRoute,
        EngagementStage::Approaching,
        EngagementStage::Arrived,
        EngagementStage::InProgress,
    ] {
        world.clock.advance(Duration::minutes(10));
        engagements
            .update_location(&engagement.id, update(stage))
            .expect("stage advance");
    }

    engagements
        .start_timer(&engagement.id, None, Some(2.0))
        .expect("start");
    world.clock.advance(Duration::hours(1));
    engagements
        .stop_timer(&engagement.id, Party::Jobseeker, false)
        .expect("break");
    world.clock.advance(Duration::minutes(20));
    engagements
        .request_payment(&engagement.id, Party::Recruiter)
        .expect("code");
    assert!(engagements
        .verify_payment(&engagement.id, CODE)
        .expect("verify"));
    engagements
        .resume_timer(&engagement.id, None, true)
        .expect("resume");
    world.clock.advance(Duration::minutes(30));

    let done = engagements
        .complete(&engagement.id, Party::Recruiter)
        .expect("complete");

    assert_eq!(done.stage, EngagementStage::Completed);
    let reading = done.timer.reading(world.clock.now());
    assert_eq!(reading.elapsed_seconds, 5400);
    assert_eq!(reading.total_cost, 30.0);
    assert_eq!(
        engine.offers().get(&offer.id).expect("offer").status,
        OfferStatus::Accepted
    );
    assert_eq!(
        world.sink.names(),
        vec![
            "offer_sent",
            "offer_resolved",
            "engagement_stage_changed",
            "engagement_stage_changed",
            "engagement_stage_changed",
            "engagement_stage_changed",
            "engagement_stage_changed",
            "payment_code_issued",
            "engagement_stage_changed",
            "timer_completed",
        ]
    );
}

async fn call(world: &World, request: Request<Body>) -> (StatusCode, Value) {
    let response = engine_router(world.engine.clone())
        .oneshot(request)
        .await
        .expect("router responds");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json")
    };
    (status, body)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("encode")))
        .expect("request")
}

#[tokio::test]
async fn engagement_lifecycle_over_http() {
    let world = world();

    let (status, offer) = call(
        &world,
        post(
            "/api/v1/offers",
            json!({ "job_id": "job-office-clean", "candidate_id": "cand-ava", "auto_sent": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let offer_id = offer["id"].as_str().expect("id").to_string();

    let (status, resolution) = call(
        &world,
        post(
            &format!("/api/v1/offers/{offer_id}/resolve"),
            json!({ "outcome": "accepted", "note": "See you there" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolution["offer"]["response"]["note"], "See you there");
    let engagement_id = resolution["engagement"]["id"]
        .as_str()
        .expect("engagement id")
        .to_string();
    let base = format!("/api/v1/engagements/{engagement_id}");

    let (status, _) = call(
        &world,
        post(
            &format!("{base}/location"),
            serde_json::to_value(update(EngagementStage::Approaching)).expect("encode"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &world,
        post(
            &format!("{base}/location"),
            serde_json::to_value(update(EngagementStage::Preparing)).expect("encode"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().expect("message").contains("preparing"));

    let (status, issue) = call(
        &world,
        post(
            &format!("{base}/payment/request"),
            json!({ "party": "recruiter" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(issue["code"], CODE);

    let (_, verdict) = call(
        &world,
        post(&format!("{base}/payment/verify"), json!({ "code": "111111" })),
    )
    .await;
    assert_eq!(verdict["verified"], false);
    let (_, verdict) = call(
        &world,
        post(&format!("{base}/payment/verify"), json!({ "code": CODE })),
    )
    .await;
    assert_eq!(verdict["verified"], true);

    let (status, _) = call(&world, post(&format!("{base}/timer/start"), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    world.clock.advance(Duration::seconds(3600));
    let (_, reading) = call(
        &world,
        post(
            &format!("{base}/timer/stop"),
            json!({ "stopped_by": "recruiter", "requires_code": true }),
        ),
    )
    .await;
    assert_eq!(reading["elapsed_seconds"], 3600);
    assert_eq!(reading["total_cost"], 20.0);

    let (status, done) = call(
        &world,
        post(&format!("{base}/complete"), json!({ "party": "jobseeker" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["stage"], "completed");

    let (status, _) = call(&world, post(&format!("{base}/timer/resume"), json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &world,
        Request::get("/api/v1/engagements/eng-unknown")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[test]
fn config_defaults_drive_the_offer_window() {
    let world = world();
    let offer = world
        .engine
        .offers()
        .send(SendOffer::new(office_clean().id, barista().id))
        .expect("offer sent");

    assert_eq!(offer.expires_at, opened_at() + Duration::days(30));
    world.clock.advance(Duration::days(30) + Duration::seconds(1));
    let report = world.engine.sweeper().sweep_now().expect("sweep");
    assert_eq!(report.expired, vec![offer.id]);
}
