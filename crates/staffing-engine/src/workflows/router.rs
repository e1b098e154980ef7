use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::engagement::{
    EngagementId, EngagementView, LocationUpdate, Party, PaymentCodeIssue, TimerReading,
};
use super::engine::StaffingEngine;
use super::matching::{JobId, RankFilters, RankedSnapshot, RankingMode};
use super::offers::{Offer, OfferId, ResolveOutcome, ResponseDetails, SendOffer, SweepReport};
use super::reputation::ReputationChange;
use crate::error::EngineError;

/// HTTP surface over the engine. Errors render through `EngineError`'s status mapping.
pub fn engine_router(engine: Arc<StaffingEngine>) -> Router {
    Router::new()
        .route("/api/v1/jobs/:job_id/rankings", post(rank_handler))
        .route("/api/v1/offers", post(send_handler))
        .route("/api/v1/offers/sweep", post(sweep_handler))
        .route("/api/v1/offers/:offer_id", get(offer_handler))
        .route("/api/v1/offers/:offer_id/resolve", post(resolve_handler))
        .route("/api/v1/offers/:offer_id/cancel", post(cancel_handler))
        .route("/api/v1/engagements/:engagement_id", get(engagement_handler))
        .route(
            "/api/v1/engagements/:engagement_id/location",
            post(location_handler),
        )
        .route(
            "/api/v1/engagements/:engagement_id/payment/request",
            post(payment_request_handler),
        )
        .route(
            "/api/v1/engagements/:engagement_id/payment/direct",
            post(payment_direct_handler),
        )
        .route(
            "/api/v1/engagements/:engagement_id/payment/verify",
            post(payment_verify_handler),
        )
        .route(
            "/api/v1/engagements/:engagement_id/timer",
            get(timer_status_handler),
        )
        .route(
            "/api/v1/engagements/:engagement_id/timer/start",
            post(timer_start_handler),
        )
        .route(
            "/api/v1/engagements/:engagement_id/timer/resume",
            post(timer_resume_handler),
        )
        .route(
            "/api/v1/engagements/:engagement_id/timer/stop",
            post(timer_stop_handler),
        )
        .route(
            "/api/v1/engagements/:engagement_id/complete",
            post(complete_handler),
        )
        .with_state(engine)
}

#[derive(Debug, Default, Deserialize)]
pub struct RankRequest {
    #[serde(default)]
    pub mode: Option<RankingMode>,
    #[serde(default)]
    pub filters: RankFilters,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub outcome: ResolveOutcome,
    #[serde(flatten)]
    pub details: ResponseDetails,
}

#[derive(Debug, Deserialize)]
pub struct PartyRequest {
    pub party: Party,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub offer: Offer,
    pub engagement: Option<EngagementView>,
    pub reputation: Option<ReputationChange>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub verified: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct StartTimerRequest {
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    #[serde(default)]
    pub expected_hours: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResumeTimerRequest {
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    #[serde(default)]
    pub requires_code: bool,
}

#[derive(Debug, Deserialize)]
pub struct StopTimerRequest {
    pub stopped_by: Party,
    #[serde(default)]
    pub requires_code: bool,
}

async fn rank_handler(
    State(engine): State<Arc<StaffingEngine>>,
    Path(job_id): Path<String>,
    Json(request): Json<RankRequest>,
) -> Result<Json<RankedSnapshot>, EngineError> {
    let mode = request.mode.unwrap_or(RankingMode::QuickSearch);
    let snapshot = engine.rank_job(&JobId(job_id), &request.filters, mode)?;
    Ok(Json(snapshot))
}

async fn send_handler(
    State(engine): State<Arc<StaffingEngine>>,
    Json(request): Json<SendOffer>,
) -> Result<(StatusCode, Json<Offer>), EngineError> {
    let offer = engine.offers().send(request)?;
    Ok((StatusCode::CREATED, Json(offer)))
}

async fn sweep_handler(
    State(engine): State<Arc<StaffingEngine>>,
) -> Result<Json<SweepReport>, EngineError> {
    Ok(Json(engine.sweeper().sweep_now()?))
}

async fn offer_handler(
    State(engine): State<Arc<StaffingEngine>>,
    Path(offer_id): Path<String>,
) -> Result<Json<Offer>, EngineError> {
    Ok(Json(engine.offers().get(&OfferId(offer_id))?))
}

async fn resolve_handler(
    State(engine): State<Arc<StaffingEngine>>,
    Path(offer_id): Path<String>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>, EngineError> {
    let resolution = engine
        .offers()
        .resolve(&OfferId(offer_id), request.outcome, request.details)?;
    let engagement = resolution
        .engagement
        .as_ref()
        .map(|engagement| engine.engagements().present(engagement));
    Ok(Json(ResolveResponse {
        offer: resolution.offer,
        engagement,
        reputation: resolution.reputation,
    }))
}

async fn cancel_handler(
    State(engine): State<Arc<StaffingEngine>>,
    Path(offer_id): Path<String>,
) -> Result<Json<Offer>, EngineError> {
    Ok(Json(engine.offers().cancel(&OfferId(offer_id))?))
}

async fn engagement_handler(
    State(engine): State<Arc<StaffingEngine>>,
    Path(engagement_id): Path<String>,
) -> Result<Json<EngagementView>, EngineError> {
    Ok(Json(engine.engagements().view(&EngagementId(engagement_id))?))
}

async fn location_handler(
    State(engine): State<Arc<StaffingEngine>>,
    Path(engagement_id): Path<String>,
    Json(update): Json<LocationUpdate>,
) -> Result<Json<EngagementView>, EngineError> {
    let engagement = engine
        .engagements()
        .update_location(&EngagementId(engagement_id), update)?;
    Ok(Json(engine.engagements().present(&engagement)))
}

async fn payment_request_handler(
    State(engine): State<Arc<StaffingEngine>>,
    Path(engagement_id): Path<String>,
    Json(request): Json<PartyRequest>,
) -> Result<(StatusCode, Json<PaymentCodeIssue>), EngineError> {
    let issue = engine
        .engagements()
        .request_payment(&EngagementId(engagement_id), request.party)?;
    Ok((StatusCode::CREATED, Json(issue)))
}

async fn payment_direct_handler(
    State(engine): State<Arc<StaffingEngine>>,
    Path(engagement_id): Path<String>,
    Json(request): Json<PartyRequest>,
) -> Result<Json<EngagementView>, EngineError> {
    let engagement = engine
        .engagements()
        .select_direct_payment(&EngagementId(engagement_id), request.party)?;
    Ok(Json(engine.engagements().present(&engagement)))
}

async fn payment_verify_handler(
    State(engine): State<Arc<StaffingEngine>>,
    Path(engagement_id): Path<String>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, EngineError> {
    let verified = engine
        .engagements()
        .verify_payment(&EngagementId(engagement_id), &request.code)?;
    Ok(Json(VerifyResponse { verified }))
}

async fn timer_status_handler(
    State(engine): State<Arc<StaffingEngine>>,
    Path(engagement_id): Path<String>,
) -> Result<Json<TimerReading>, EngineError> {
    let reading = engine
        .engagements()
        .timer_status(&EngagementId(engagement_id))?;
    Ok(Json(reading))
}

async fn timer_start_handler(
    State(engine): State<Arc<StaffingEngine>>,
    Path(engagement_id): Path<String>,
    Json(request): Json<StartTimerRequest>,
) -> Result<Json<TimerReading>, EngineError> {
    let reading = engine.engagements().start_timer(
        &EngagementId(engagement_id),
        request.hourly_rate,
        request.expected_hours,
    )?;
    Ok(Json(reading))
}

async fn timer_resume_handler(
    State(engine): State<Arc<StaffingEngine>>,
    Path(engagement_id): Path<String>,
    Json(request): Json<ResumeTimerRequest>,
) -> Result<Json<TimerReading>, EngineError> {
    let reading = engine.engagements().resume_timer(
        &EngagementId(engagement_id),
        request.hourly_rate,
        request.requires_code,
    )?;
    Ok(Json(reading))
}

async fn timer_stop_handler(
    State(engine): State<Arc<StaffingEngine>>,
    Path(engagement_id): Path<String>,
    Json(request): Json<StopTimerRequest>,
) -> Result<Json<TimerReading>, EngineError> {
    let reading = engine.engagements().stop_timer(
        &EngagementId(engagement_id),
        request.stopped_by,
        request.requires_code,
    )?;
    Ok(Json(reading))
}

async fn complete_handler(
    State(engine): State<Arc<StaffingEngine>>,
    Path(engagement_id): Path<String>,
    Json(request): Json<PartyRequest>,
) -> Result<Json<EngagementView>, EngineError> {
    let engagement = engine
        .engagements()
        .complete(&EngagementId(engagement_id), request.party)?;
    Ok(Json(engine.engagements().present(&engagement)))
}
