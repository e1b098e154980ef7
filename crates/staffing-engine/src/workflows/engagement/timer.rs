use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::Party;
use crate::error::EngineError;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Pausable billing clock. `elapsed_seconds` holds time accrued by closed segments; the open
/// segment (if running) is always derived from `start_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingTimer {
    pub is_running: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub elapsed_seconds: u64,
    pub hourly_rate: f64,
    pub expected_hours: Option<f64>,
    total_cost: f64,
    pub stopped_by: Option<Party>,
}

/// Live view of a timer at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimerReading {
    pub is_running: bool,
    pub elapsed_seconds: u64,
    pub hourly_rate: f64,
    pub total_cost: f64,
}

pub fn cost_for(elapsed_seconds: u64, hourly_rate: f64) -> f64 {
    elapsed_seconds as f64 / SECONDS_PER_HOUR * hourly_rate
}

fn checked_rate(hourly_rate: Option<f64>) -> Result<Option<f64>, EngineError> {
    match hourly_rate {
        Some(rate) if !rate.is_finite() || rate < 0.0 => Err(EngineError::invalid_state(format!(
            "hourly rate {rate} must be a finite, non-negative amount"
        ))),
        other => Ok(other),
    }
}

impl BillingTimer {
    pub fn idle(hourly_rate: f64) -> Self {
        Self {
            is_running: false,
            start_time: None,
            elapsed_seconds: 0,
            hourly_rate,
            expected_hours: None,
            total_cost: 0.0,
            stopped_by: None,
        }
    }

    /// Accrued seconds including the running segment. The single source of truth for accrual.
    pub fn elapsed_now(&self, now: DateTime<Utc>) -> u64 {
        match (self.is_running, self.start_time) {
            (true, Some(start)) => {
                let segment = (now - start).num_seconds().max(0) as u64;
                self.elapsed_seconds + segment
            }
            _ => self.elapsed_seconds,
        }
    }

    /// Cost at `now`: recomputed while running, frozen once stopped.
    pub fn cost_now(&self, now: DateTime<Utc>) -> f64 {
        if self.is_running {
            cost_for(self.elapsed_now(now), self.hourly_rate)
        } else {
            self.total_cost
        }
    }

    pub fn reading(&self, now: DateTime<Utc>) -> TimerReading {
        TimerReading {
            is_running: self.is_running,
            elapsed_seconds: self.elapsed_now(now),
            hourly_rate: self.hourly_rate,
            total_cost: self.cost_now(now),
        }
    }

    pub fn start(
        &mut self,
        now: DateTime<Utc>,
        hourly_rate: Option<f64>,
        expected_hours: Option<f64>,
    ) -> Result<(), EngineError> {
        if self.is_running {
            return Err(EngineError::invalid_state("timer is already running"));
        }
        if self.elapsed_seconds > 0 {
            return Err(EngineError::invalid_state(
                "timer has accrued time; resume it instead of starting again",
            ));
        }
        if let Some(rate) = checked_rate(hourly_rate)? {
            self.hourly_rate = rate;
        }
        if expected_hours.is_some() {
            self.expected_hours = expected_hours;
        }
        self.is_running = true;
        self.start_time = Some(now);
        self.elapsed_seconds = 0;
        self.total_cost = 0.0;
        self.stopped_by = None;
        Ok(())
    }

    pub fn resume(&mut self, now: DateTime<Utc>, hourly_rate: Option<f64>) -> Result<(), EngineError> {
        if self.is_running {
            return Err(EngineError::invalid_state("timer is already running"));
        }
        if self.elapsed_seconds == 0 {
            return Err(EngineError::invalid_state(
                "timer has no accrued time to resume",
            ));
        }
        if let Some(rate) = checked_rate(hourly_rate)? {
            self.hourly_rate = rate;
        }
        self.is_running = true;
        self.start_time = Some(now);
        self.stopped_by = None;
        Ok(())
    }

    pub fn stop(&mut self, stopped_by: Party, now: DateTime<Utc>) -> Result<(), EngineError> {
        if !self.is_running {
            return Err(EngineError::invalid_state("timer is not running"));
        }
        self.accrue_and_halt(stopped_by, now);
        Ok(())
    }

    pub(crate) fn accrue_and_halt(&mut self, stopped_by: Party, now: DateTime<Utc>) {
        self.elapsed_seconds = self.elapsed_now(now);
        self.total_cost = cost_for(self.elapsed_seconds, self.hourly_rate);
        self.is_running = false;
        self.stopped_by = Some(stopped_by);
    }
}
