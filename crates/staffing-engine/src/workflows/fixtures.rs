//! Shared test harness: an in-memory engine on a manual clock with deterministic scoring.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use super::engagement::{ActiveEngagement, CodeGenerator};
use super::engine::StaffingEngine;
use super::matching::{
    BadgeTier, CandidateId, CandidateProfile, InMemoryDirectory, JobId, JobPosting, NoJitter,
    PayRange, TaxType,
};
use super::notifications::RecordingSink;
use super::offers::{Offer, ResolveOutcome, ResponseDetails, SendOffer};
use crate::clock::{Clock, ManualClock};
use crate::config::EngineConfig;

pub(crate) const PAYMENT_CODE: &str = "482913";

#[derive(Debug)]
pub(crate) struct FixedCodes(pub &'static str);

impl CodeGenerator for FixedCodes {
    fn generate(&self) -> String {
        self.0.to_string()
    }
}

pub(crate) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap()
}

pub(crate) fn cleaning_job() -> JobPosting {
    JobPosting {
        id: JobId("job-cleaning".to_string()),
        industry: "Cleaning".to_string(),
        title: "Commercial Cleaner".to_string(),
        tax_type: TaxType::Abn,
        search_radius_km: 10.0,
        salary: PayRange::new(24.0, 32.0),
        required_experience_years: 3,
        staff_required: 2,
    }
}

/// Scores 100 against [`cleaning_job`].
pub(crate) fn strong_candidate() -> CandidateProfile {
    CandidateProfile {
        id: CandidateId("cand-strong".to_string()),
        industries: vec!["Cleaning".to_string()],
        preferred_roles: vec!["Cleaner".to_string()],
        tax_types: vec![TaxType::Abn],
        service_radius_km: 12.0,
        pay_preference: PayRange::new(22.0, 28.0),
        experience_years: 3,
        badge: BadgeTier::Gold,
    }
}

/// Scores 85 against [`cleaning_job`].
pub(crate) fn solid_candidate() -> CandidateProfile {
    CandidateProfile {
        id: CandidateId("cand-solid".to_string()),
        industries: vec!["Cleaning".to_string()],
        preferred_roles: Vec::new(),
        tax_types: vec![TaxType::Abn, TaxType::Tfn],
        service_radius_km: 12.0,
        pay_preference: PayRange::new(22.0, 28.0),
        experience_years: 8,
        badge: BadgeTier::Silver,
    }
}

/// Scores 50 against [`cleaning_job`].
pub(crate) fn weak_candidate() -> CandidateProfile {
    CandidateProfile {
        id: CandidateId("cand-weak".to_string()),
        industries: vec!["Hospitality".to_string()],
        preferred_roles: vec!["Bartender".to_string()],
        tax_types: vec![TaxType::Tfn],
        service_radius_km: 15.0,
        pay_preference: PayRange::new(40.0, 50.0),
        experience_years: 10,
        badge: BadgeTier::Bronze,
    }
}

pub(crate) struct Harness {
    pub engine: Arc<StaffingEngine>,
    pub clock: Arc<ManualClock>,
    pub sink: RecordingSink,
    pub directory: Arc<InMemoryDirectory>,
}

pub(crate) fn harness() -> Harness {
    let clock = Arc::new(ManualClock::new(start()));
    let sink = RecordingSink::default();
    let directory = Arc::new(InMemoryDirectory::new(
        vec![cleaning_job()],
        vec![
            vec![strong_candidate(), solid_candidate()],
            vec![weak_candidate()],
        ],
    ));
    let engine = StaffingEngine::builder(EngineConfig::default())
        .directory(directory.clone())
        .clock(clock.clone())
        .jitter(Arc::new(NoJitter))
        .code_generator(Arc::new(FixedCodes(PAYMENT_CODE)))
        .notifications(Arc::new(sink.clone()))
        .build();
    Harness {
        engine: Arc::new(engine),
        clock,
        sink,
        directory,
    }
}

impl Harness {
    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn send_to(&self, candidate: &CandidateProfile) -> Offer {
        self.engine
            .offers()
            .send(SendOffer::new(cleaning_job().id, candidate.id.clone()))
            .expect("offer sent")
    }

    pub(crate) fn accepted_engagement(&self) -> ActiveEngagement {
        let offer = self.send_to(&strong_candidate());
        self.engine
            .offers()
            .resolve(&offer.id, ResolveOutcome::Accepted, ResponseDetails::default())
            .expect("offer accepted")
            .engagement
            .expect("engagement opened")
    }
}
