use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{ActiveEngagement, EngagementId, EngagementStage, LocationTracking, Party};
use super::payment::{PaymentHandshake, PaymentMethod};
use super::timer::BillingTimer;
use crate::workflows::matching::{CandidateId, JobId};
use crate::workflows::offers::OfferId;

/// Outward-facing engagement read. The payment code never leaves the engine through this view,
/// and timer accrual is evaluated at the instant the view is taken.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementView {
    pub id: EngagementId,
    pub offer_id: OfferId,
    pub job_id: JobId,
    pub candidate_id: CandidateId,
    pub stage: EngagementStage,
    pub location: LocationTracking,
    pub payment: PaymentView,
    pub timer: TimerView,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<Party>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentView {
    pub method: PaymentMethod,
    pub requested: bool,
    pub requested_by: Option<Party>,
    pub code_outstanding: bool,
    pub code_issued_at: Option<DateTime<Utc>>,
    pub code_expiry: Option<DateTime<Utc>>,
    pub code_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerView {
    pub is_running: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub elapsed_seconds: u64,
    pub hourly_rate: f64,
    pub expected_hours: Option<f64>,
    pub total_cost: f64,
    pub stopped_by: Option<Party>,
}

impl PaymentView {
    fn at(payment: &PaymentHandshake, now: DateTime<Utc>) -> Self {
        Self {
            method: payment.method,
            requested: payment.requested,
            requested_by: payment.requested_by,
            code_outstanding: payment.active_code(now).is_some(),
            code_issued_at: payment.code_issued_at,
            code_expiry: payment.code_expiry,
            code_verified: payment.code_verified,
        }
    }
}

impl TimerView {
    fn at(timer: &BillingTimer, now: DateTime<Utc>) -> Self {
        let reading = timer.reading(now);
        Self {
            is_running: reading.is_running,
            start_time: timer.start_time,
            elapsed_seconds: reading.elapsed_seconds,
            hourly_rate: reading.hourly_rate,
            expected_hours: timer.expected_hours,
            total_cost: reading.total_cost,
            stopped_by: timer.stopped_by,
        }
    }
}

impl EngagementView {
    pub fn at(engagement: &ActiveEngagement, now: DateTime<Utc>) -> Self {
        Self {
            id: engagement.id.clone(),
            offer_id: engagement.offer_id.clone(),
            job_id: engagement.job_id.clone(),
            candidate_id: engagement.candidate_id.clone(),
            stage: engagement.stage,
            location: engagement.location.clone(),
            payment: PaymentView::at(&engagement.payment, now),
            timer: TimerView::at(&engagement.timer, now),
            created_at: engagement.created_at,
            updated_at: engagement.updated_at,
            completed_at: engagement.completed_at,
            completed_by: engagement.completed_by,
        }
    }
}
