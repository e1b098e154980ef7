use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use staffing_engine::clock::Clock;
use staffing_engine::config::EngineConfig;
use staffing_engine::workflows::matching::{
    BadgeTier, CandidateId, CandidateProfile, InMemoryDirectory, JobId, JobPosting, PayRange,
    TaxType,
};
use staffing_engine::workflows::notifications::NotificationSink;
use staffing_engine::workflows::StaffingEngine;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn build_engine(
    config: &EngineConfig,
    directory: Arc<InMemoryDirectory>,
    clock: Arc<dyn Clock>,
    notifications: Arc<dyn NotificationSink>,
) -> StaffingEngine {
    StaffingEngine::builder(config.clone())
        .directory(directory)
        .clock(clock)
        .notifications(notifications)
        .build()
}

fn job(
    id: &str,
    industry: &str,
    title: &str,
    tax_type: TaxType,
    radius: f64,
    salary: (f64, f64),
) -> JobPosting {
    JobPosting {
        id: JobId(id.to_string()),
        industry: industry.to_string(),
        title: title.to_string(),
        tax_type,
        search_radius_km: radius,
        salary: PayRange::new(salary.0, salary.1),
        required_experience_years: 2,
        staff_required: 1,
    }
}

struct Seeker {
    id: &'static str,
    industries: &'static [&'static str],
    roles: &'static [&'static str],
    tax_types: &'static [TaxType],
    radius: f64,
    pay: (f64, f64),
    experience: u8,
    badge: BadgeTier,
}

impl Seeker {
    fn profile(&self) -> CandidateProfile {
        CandidateProfile {
            id: CandidateId(self.id.to_string()),
            industries: self.industries.iter().map(|s| s.to_string()).collect(),
            preferred_roles: self.roles.iter().map(|s| s.to_string()).collect(),
            tax_types: self.tax_types.to_vec(),
            service_radius_km: self.radius,
            pay_preference: PayRange::new(self.pay.0, self.pay.1),
            experience_years: self.experience,
            badge: self.badge,
        }
    }
}

const NEARBY: &[Seeker] = &[
    Seeker {
        id: "cand-ava",
        industries: &["Cleaning"],
        roles: &["Cleaner"],
        tax_types: &[TaxType::Abn],
        radius: 12.0,
        pay: (22.0, 28.0),
        experience: 3,
        badge: BadgeTier::Gold,
    },
    Seeker {
        id: "cand-noah",
        industries: &["Cleaning", "Hospitality"],
        roles: &["Housekeeper"],
        tax_types: &[TaxType::Abn, TaxType::Tfn],
        radius: 8.0,
        pay: (24.0, 30.0),
        experience: 1,
        badge: BadgeTier::Silver,
    },
];

const PRO_POOL: &[Seeker] = &[Seeker {
    id: "cand-mia",
    industries: &["Hospitality"],
    roles: &["Barista", "Waiter"],
    tax_types: &[TaxType::Tfn],
    radius: 20.0,
    pay: (26.0, 34.0),
    experience: 5,
    badge: BadgeTier::Pro,
}];

const BROWSE_POOL: &[Seeker] = &[Seeker {
    id: "cand-leo",
    industries: &["Warehousing"],
    roles: &["Forklift Operator"],
    tax_types: &[TaxType::Tfn],
    radius: 30.0,
    pay: (28.0, 38.0),
    experience: 6,
    badge: BadgeTier::Bronze,
}];

pub(crate) const SAMPLE_JOB: &str = "job-office-clean";

/// Sample marketplace: two jobs and three candidate pools merged into one directory.
pub(crate) fn sample_directory() -> InMemoryDirectory {
    let jobs = vec![
        job(
            SAMPLE_JOB,
            "Cleaning",
            "Office Cleaner",
            TaxType::Abn,
            10.0,
            (24.0, 32.0),
        ),
        job(
            "job-cafe-shift",
            "Hospitality",
            "Weekend Barista",
            TaxType::Tfn,
            15.0,
            (27.0, 33.0),
        ),
    ];
    let pools = [NEARBY, PRO_POOL, BROWSE_POOL]
        .iter()
        .map(|pool| pool.iter().map(Seeker::profile).collect())
        .collect();
    InMemoryDirectory::new(jobs, pools)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}
