use crate::infra::{build_engine, parse_timestamp, sample_directory, SAMPLE_JOB};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use staffing_engine::clock::{Clock, ManualClock};
use staffing_engine::config::EngineConfig;
use staffing_engine::error::AppError;
use staffing_engine::workflows::engagement::{
    ActiveEngagement, Coordinate, EngagementStage, LocationUpdate, Party,
};
use staffing_engine::workflows::matching::{JobId, RankFilters, RankedSnapshot, RankingMode};
use staffing_engine::workflows::notifications::TracingSink;
use staffing_engine::workflows::offers::{
    DeclineReason, ResolveOutcome, ResponseDetails, SendOffer,
};
use staffing_engine::workflows::StaffingEngine;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Simulated start instant (RFC 3339). Defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) start: Option<DateTime<Utc>>,
    /// Seed for match-score jitter so repeated runs rank identically
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Billable minutes to simulate on the engagement timer
    #[arg(long, default_value_t = 90)]
    pub(crate) minutes: i64,
    /// Use manual search ranking instead of quick search
    #[arg(long)]
    pub(crate) manual: bool,
}

#[derive(Args, Debug)]
pub(crate) struct SweepArgs {
    /// Simulated start instant (RFC 3339). Defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) start: Option<DateTime<Utc>>,
    /// How far to move the clock before sweeping
    #[arg(long, default_value_t = 31)]
    pub(crate) days_ahead: i64,
}

struct Simulation {
    engine: StaffingEngine,
    clock: Arc<ManualClock>,
}

fn simulation(start: Option<DateTime<Utc>>, seed: Option<u64>) -> Simulation {
    let clock = Arc::new(ManualClock::new(start.unwrap_or_else(Utc::now)));
    let config = EngineConfig {
        jitter_seed: seed.or(Some(7)),
        ..EngineConfig::default()
    };
    let engine = build_engine(
        &config,
        Arc::new(sample_directory()),
        clock.clone(),
        Arc::new(TracingSink),
    );
    Simulation { engine, clock }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        start,
        seed,
        minutes,
        manual,
    } = args;
    let Simulation { engine, clock } = simulation(start, seed);
    let job_id = JobId(SAMPLE_JOB.to_string());
    let mode = if manual {
        RankingMode::ManualSearch
    } else {
        RankingMode::QuickSearch
    };

    println!("Staffing engine demo ({})", clock.now().to_rfc3339());
    let snapshot = engine.rank_job(&job_id, &RankFilters::default(), mode)?;
    render_snapshot(&snapshot);

    let mut ranked = snapshot.entries.iter();
    let Some(first) = ranked.next() else {
        println!("No candidates matched {job_id}; nothing to offer.");
        return Ok(());
    };

    let offer = engine
        .offers()
        .send(SendOffer::new(job_id.clone(), first.candidate_id.clone()))?;
    println!(
        "\nOffer {} sent to {} ({}% match, expires {})",
        offer.id,
        offer.candidate_id,
        offer.match_percentage,
        offer.expires_at.to_rfc3339()
    );

    if let Some(second) = ranked.next() {
        let declined = engine
            .offers()
            .send(SendOffer::new(job_id.clone(), second.candidate_id.clone()))?;
        let resolution = engine.offers().resolve(
            &declined.id,
            ResolveOutcome::Declined,
            ResponseDetails {
                reason: Some(DeclineReason {
                    code: Some("schedule".to_string()),
                    text: "Already booked that day".to_string(),
                    is_valid: false,
                }),
                note: None,
            },
        )?;
        match resolution.reputation {
            Some(change) => println!(
                "Offer {} declined by {}: reputation {} -> {}",
                declined.id, change.candidate_id, change.previous, change.current
            ),
            None => println!(
                "Offer {} declined by {} ({}% match, no reputation change)",
                declined.id, declined.candidate_id, declined.match_percentage
            ),
        }
    }

    clock.advance(Duration::hours(2));
    let resolution = engine.offers().resolve(
        &offer.id,
        ResolveOutcome::Accepted,
        ResponseDetails {
            reason: None,
            note: Some("See you there".to_string()),
        },
    )?;
    if let Some(change) = &resolution.reputation {
        println!(
            "Offer {} accepted: reputation {} -> {}",
            offer.id, change.previous, change.current
        );
    }
    let Some(engagement) = resolution.engagement else {
        println!("Offer {} accepted without an engagement.", offer.id);
        return Ok(());
    };
    println!(
        "Engagement {} opened at ${:.2}/h",
        engagement.id, engagement.timer.hourly_rate
    );

    drive_engagement(&engine, &clock, &engagement, minutes)?;

    clock.advance(engine.offers().policy().offer_ttl());
    let report = engine.sweeper().sweep_now()?;
    println!(
        "\nSweep after the offer window: {} pending scanned, {} expired",
        report.scanned,
        report.expired_count()
    );
    Ok(())
}

fn drive_engagement(
    engine: &StaffingEngine,
    clock: &ManualClock,
    engagement: &ActiveEngagement,
    minutes: i64,
) -> Result<(), AppError> {
    let engagements = engine.engagements();
    let route = [
        (EngagementStage::Preparing, 9.0),
        (EngagementStage::EnRoute, 6.5),
        (EngagementStage::Approaching, 1.2),
        (EngagementStage::Arrived, 0.0),
        (EngagementStage::InProgress, 0.0),
    ];
    println!("Journey:");
    for (stage, remaining_km) in route {
        clock.advance(Duration::minutes(10));
        let updated = engagements.update_location(
            &engagement.id,
            LocationUpdate {
                location: Coordinate {
                    latitude: -33.8688,
                    longitude: 151.2093,
                },
                stage,
                distance_from_home_km: 9.0 - remaining_km,
                distance_from_workplace_km: remaining_km,
            },
        )?;
        println!("  - {} ({remaining_km:.1} km to go)", updated.stage);
    }

    let issue = engagements.request_payment(&engagement.id, Party::Recruiter)?;
    println!(
        "Payment code issued (expires {})",
        issue.expires_at.to_rfc3339()
    );
    let verified = engagements.verify_payment(&engagement.id, &issue.code)?;
    println!("Payment code verified: {verified}");

    engagements.start_timer(&engagement.id, None, Some(minutes as f64 / 60.0))?;
    clock.advance(Duration::minutes(minutes));
    let reading = engagements.stop_timer(&engagement.id, Party::Jobseeker, true)?;
    println!(
        "Timer stopped after {}s: ${:.2} at ${:.2}/h",
        reading.elapsed_seconds, reading.total_cost, reading.hourly_rate
    );

    let archived = engagements.complete(&engagement.id, Party::Recruiter)?;
    println!(
        "Engagement {} completed by {:?}",
        archived.id,
        archived.completed_by.unwrap_or(Party::Recruiter)
    );
    Ok(())
}

pub(crate) fn run_sweep(args: SweepArgs) -> Result<(), AppError> {
    let SweepArgs { start, days_ahead } = args;
    let Simulation { engine, clock } = simulation(start, None);
    let job_id = JobId(SAMPLE_JOB.to_string());

    let snapshot = engine.rank_job(&job_id, &RankFilters::default(), RankingMode::ManualSearch)?;
    for entry in &snapshot.entries {
        engine
            .offers()
            .send(SendOffer::new(job_id.clone(), entry.candidate_id.clone()))?;
    }
    let pending = engine.offers().pending_offers()?;
    println!(
        "{} offers pending at {}",
        pending.len(),
        clock.now().to_rfc3339()
    );

    clock.advance(Duration::days(days_ahead));
    let report = engine.sweeper().sweep_now()?;
    println!(
        "Swept at {}: scanned {}, expired {}",
        clock.now().to_rfc3339(),
        report.scanned,
        report.expired_count()
    );
    for id in &report.expired {
        println!("  - {id}");
    }
    Ok(())
}

fn render_snapshot(snapshot: &RankedSnapshot) {
    println!(
        "Ranking for {} ({:?}, {} candidates):",
        snapshot.job_id,
        snapshot.mode,
        snapshot.entries.len()
    );
    for (position, entry) in snapshot.entries.iter().enumerate() {
        println!(
            "  {}. {} match {}% | reputation {} | combined {:.1}",
            position + 1,
            entry.candidate_id,
            entry.match_percentage,
            entry.reputation_score,
            entry.combined_score
        );
    }
}
