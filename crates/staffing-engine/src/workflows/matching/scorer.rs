use std::fmt;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::domain::{CandidateProfile, JobPosting};

pub const BASE_SCORE: u8 = 45;
pub const MIN_SCORE: u8 = 40;
pub const MAX_SCORE: u8 = 100;
pub const MAX_JITTER: u8 = 5;

/// Tie-breaking noise added on top of the deterministic score.
pub trait JitterSource: Send + Sync + fmt::Debug {
    /// A value in `0..=MAX_JITTER`.
    fn draw(&self) -> u8;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn draw(&self) -> u8 {
        0
    }
}

/// Uniform jitter from a seedable generator.
#[derive(Debug)]
pub struct SeededJitter {
    rng: Mutex<StdRng>,
}

impl SeededJitter {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl JitterSource for SeededJitter {
    fn draw(&self) -> u8 {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_range(0..=MAX_JITTER)
    }
}

/// Factors contributing to a match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFactor {
    Base,
    Industry,
    RoleTitle,
    TaxType,
    Radius,
    Pay,
    Experience,
    Jitter,
}

/// Discrete contribution to a match score, kept for audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchComponent {
    pub factor: MatchFactor,
    pub points: u8,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchBreakdown {
    pub components: Vec<MatchComponent>,
    pub raw_total: u16,
    pub match_percentage: u8,
}

/// Additive job/candidate fit model.
#[derive(Debug, Clone)]
pub struct MatchScorer {
    jitter: Arc<dyn JitterSource>,
}

impl MatchScorer {
    pub fn new(jitter: Arc<dyn JitterSource>) -> Self {
        Self { jitter }
    }

    pub fn deterministic() -> Self {
        Self::new(Arc::new(NoJitter))
    }

    pub fn score(&self, job: &JobPosting, candidate: &CandidateProfile) -> u8 {
        self.breakdown(job, candidate).match_percentage
    }

    pub fn breakdown(&self, job: &JobPosting, candidate: &CandidateProfile) -> MatchBreakdown {
        let mut components = vec![MatchComponent {
            factor: MatchFactor::Base,
            points: BASE_SCORE,
            notes: "base score".to_string(),
        }];

        let industry = job.industry.trim();
        if candidate
            .industries
            .iter()
            .any(|entry| entry.trim().eq_ignore_ascii_case(industry))
        {
            components.push(MatchComponent {
                factor: MatchFactor::Industry,
                points: 20,
                notes: format!("works in {industry}"),
            });
        }

        let title = job.title.trim().to_lowercase();
        if let Some(role) = candidate.preferred_roles.iter().find(|role| {
            let role = role.trim().to_lowercase();
            !role.is_empty()
                && !title.is_empty()
                && (title.contains(&role) || role.contains(&title))
        }) {
            components.push(MatchComponent {
                factor: MatchFactor::RoleTitle,
                points: 10,
                notes: format!("preferred role '{role}' matches '{}'", job.title),
            });
        }

        if candidate.tax_types.contains(&job.tax_type) {
            components.push(MatchComponent {
                factor: MatchFactor::TaxType,
                points: 10,
                notes: format!("accepts {:?}", job.tax_type),
            });
        }

        if job.search_radius_km <= candidate.service_radius_km {
            components.push(MatchComponent {
                factor: MatchFactor::Radius,
                points: 5,
                notes: format!(
                    "search radius {:.1}km within service radius {:.1}km",
                    job.search_radius_km, candidate.service_radius_km
                ),
            });
        }

        if candidate.pay_preference.overlaps(&job.salary) {
            components.push(MatchComponent {
                factor: MatchFactor::Pay,
                points: 5,
                notes: format!(
                    "pay preference {:.2}-{:.2} overlaps {:.2}-{:.2}",
                    candidate.pay_preference.min,
                    candidate.pay_preference.max,
                    job.salary.min,
                    job.salary.max
                ),
            });
        }

        let gap = candidate
            .experience_years
            .abs_diff(job.required_experience_years);
        let experience_points = match gap {
            0..=1 => 5,
            2..=3 => 3,
            _ => 0,
        };
        if experience_points > 0 {
            components.push(MatchComponent {
                factor: MatchFactor::Experience,
                points: experience_points,
                notes: format!("experience within {gap} year(s) of requirement"),
            });
        }

        let jitter = self.jitter.draw().min(MAX_JITTER);
        if jitter > 0 {
            components.push(MatchComponent {
                factor: MatchFactor::Jitter,
                points: jitter,
                notes: "tie-breaker".to_string(),
            });
        }

        let raw_total: u16 = components
            .iter()
            .map(|component| u16::from(component.points))
            .sum();
        let match_percentage = raw_total.clamp(u16::from(MIN_SCORE), u16::from(MAX_SCORE)) as u8;

        MatchBreakdown {
            components,
            raw_total,
            match_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::matching::domain::{
        BadgeTier, CandidateId, JobId, PayRange, TaxType,
    };
    use proptest::prelude::*;

    fn cleaning_job() -> JobPosting {
        JobPosting {
            id: JobId("job-cleaning".to_string()),
            industry: "Cleaning".to_string(),
            title: "Commercial Cleaner".to_string(),
            tax_type: TaxType::Abn,
            search_radius_km: 10.0,
            salary: PayRange::new(20.0, 30.0),
            required_experience_years: 3,
            staff_required: 2,
        }
    }

    fn candidate() -> CandidateProfile {
        CandidateProfile {
            id: CandidateId("cand-1".to_string()),
            industries: vec!["Cleaning".to_string()],
            preferred_roles: vec!["Barista".to_string()],
            tax_types: vec![TaxType::Abn],
            service_radius_km: 8.0,
            pay_preference: PayRange::new(22.0, 28.0),
            experience_years: 4,
            badge: BadgeTier::Gold,
        }
    }

    #[derive(Debug)]
    struct FixedJitter(u8);

    impl JitterSource for FixedJitter {
        fn draw(&self) -> u8 {
            self.0
        }
    }

    #[test]
    fn additive_model_reaches_expected_floor() {
        let scorer = MatchScorer::deterministic();
        assert_eq!(scorer.score(&cleaning_job(), &candidate()), 85);
    }

    #[test]
    fn jitter_is_added_but_total_stays_clamped() {
        let scorer = MatchScorer::new(Arc::new(FixedJitter(5)));
        assert_eq!(scorer.score(&cleaning_job(), &candidate()), 90);

        let mut perfect = candidate();
        perfect.preferred_roles = vec!["cleaner".to_string()];
        perfect.service_radius_km = 15.0;
        let breakdown = scorer.breakdown(&cleaning_job(), &perfect);
        assert_eq!(breakdown.raw_total, 105);
        assert_eq!(breakdown.match_percentage, 100);
    }

    #[test]
    fn role_title_match_is_case_insensitive() {
        let scorer = MatchScorer::deterministic();
        let mut profile = candidate();
        profile.preferred_roles = vec!["COMMERCIAL cleaner".to_string()];
        let breakdown = scorer.breakdown(&cleaning_job(), &profile);
        assert!(breakdown
            .components
            .iter()
            .any(|component| component.factor == MatchFactor::RoleTitle));
    }

    #[test]
    fn blank_job_title_earns_no_role_points() {
        let scorer = MatchScorer::deterministic();
        let mut job = cleaning_job();
        job.title = "   ".to_string();
        let breakdown = scorer.breakdown(&job, &candidate());
        assert!(!breakdown
            .components
            .iter()
            .any(|component| component.factor == MatchFactor::RoleTitle));
    }

    #[test]
    fn experience_bonus_is_graduated() {
        let scorer = MatchScorer::deterministic();
        let mut profile = candidate();
        let job = cleaning_job();

        profile.experience_years = 3;
        let exact = scorer.score(&job, &profile);
        profile.experience_years = 6;
        let near = scorer.score(&job, &profile);
        profile.experience_years = 10;
        let far = scorer.score(&job, &profile);

        assert_eq!(exact - near, 2);
        assert_eq!(near - far, 3);
    }

    #[test]
    fn unrelated_candidate_scores_base() {
        let scorer = MatchScorer::deterministic();
        let profile = CandidateProfile {
            id: CandidateId("cand-far".to_string()),
            industries: vec!["Hospitality".to_string()],
            preferred_roles: Vec::new(),
            tax_types: vec![TaxType::Tfn],
            service_radius_km: 1.0,
            pay_preference: PayRange::new(60.0, 80.0),
            experience_years: 20,
            badge: BadgeTier::Bronze,
        };
        assert_eq!(scorer.score(&cleaning_job(), &profile), BASE_SCORE);
    }

    #[test]
    fn seeded_jitter_is_reproducible_and_bounded() {
        let first = SeededJitter::from_seed(7);
        let second = SeededJitter::from_seed(7);
        for _ in 0..64 {
            let a = first.draw();
            assert_eq!(a, second.draw());
            assert!(a <= MAX_JITTER);
        }
    }

    proptest! {
        #[test]
        fn score_is_always_within_bounds(
            radius in 0.0f64..200.0,
            service_radius in 0.0f64..200.0,
            job_min in 0.0f64..100.0,
            job_span in 0.0f64..50.0,
            pay_min in 0.0f64..100.0,
            pay_span in 0.0f64..50.0,
            required in 0u8..40,
            experience in 0u8..60,
            same_industry in any::<bool>(),
            same_tax in any::<bool>(),
            jitter in 0u8..=MAX_JITTER,
        ) {
            let job = JobPosting {
                search_radius_km: radius,
                salary: PayRange::new(job_min, job_min + job_span),
                required_experience_years: required,
                ..cleaning_job()
            };
            let profile = CandidateProfile {
                industries: if same_industry { vec!["cleaning".to_string()] } else { Vec::new() },
                tax_types: if same_tax { vec![TaxType::Abn] } else { vec![TaxType::Tfn] },
                service_radius_km: service_radius,
                pay_preference: PayRange::new(pay_min, pay_min + pay_span),
                experience_years: experience,
                ..candidate()
            };

            let deterministic = MatchScorer::deterministic().score(&job, &profile);
            prop_assert!((MIN_SCORE..=MAX_SCORE).contains(&deterministic));

            let jittered = MatchScorer::new(Arc::new(FixedJitter(jitter))).score(&job, &profile);
            prop_assert!((MIN_SCORE..=MAX_SCORE).contains(&jittered));
        }
    }
}
