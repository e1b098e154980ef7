use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::domain::Party;
use crate::error::EngineError;

pub const PAYMENT_CODE_DIGITS: usize = 6;

/// Source of one-time payment codes.
pub trait CodeGenerator: Send + Sync + fmt::Debug {
    /// A zero-padded numeric code of [`PAYMENT_CODE_DIGITS`] digits.
    fn generate(&self) -> String;
}

/// Draws codes from the operating system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsCodeGenerator;

impl CodeGenerator for OsCodeGenerator {
    fn generate(&self) -> String {
        let value: u32 = OsRng.gen_range(0..1_000_000);
        format!("{value:06}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    None,
    Platform,
    Direct,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentHandshake {
    pub method: PaymentMethod,
    pub requested: bool,
    pub requested_by: Option<Party>,
    code: Option<String>,
    pub code_issued_at: Option<DateTime<Utc>>,
    pub code_expiry: Option<DateTime<Utc>>,
    pub code_verified: bool,
}

impl Default for PaymentHandshake {
    fn default() -> Self {
        Self {
            method: PaymentMethod::None,
            requested: false,
            requested_by: None,
            code: None,
            code_issued_at: None,
            code_expiry: None,
            code_verified: false,
        }
    }
}

impl PaymentHandshake {
    /// The issued code while it is still redeemable.
    pub fn active_code(&self, now: DateTime<Utc>) -> Option<&str> {
        match (&self.code, self.code_expiry) {
            (Some(code), Some(expiry)) if self.method == PaymentMethod::Platform && now <= expiry => {
                Some(code.as_str())
            }
            _ => None,
        }
    }

    fn code_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.method == PaymentMethod::Platform
            && !self.code_verified
            && self.code_expiry.map(|expiry| now > expiry).unwrap_or(true)
    }

    /// Issue a platform code. Allowed from `None`, or to replace a code that lapsed unverified.
    pub fn issue(
        &mut self,
        code: String,
        requested_by: Party,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<DateTime<Utc>, EngineError> {
        let reissue = self.code_lapsed(now);
        if self.method != PaymentMethod::None && !reissue {
            return Err(EngineError::invalid_state(format!(
                "payment already arranged via {:?}",
                self.method
            )));
        }
        let expiry = now + ttl;
        self.method = PaymentMethod::Platform;
        self.requested = true;
        self.requested_by = Some(requested_by);
        self.code = Some(code);
        self.code_issued_at = Some(now);
        self.code_expiry = Some(expiry);
        self.code_verified = false;
        Ok(expiry)
    }

    pub fn choose_direct(&mut self, requested_by: Party) -> Result<(), EngineError> {
        if self.method != PaymentMethod::None {
            return Err(EngineError::invalid_state(format!(
                "payment already arranged via {:?}",
                self.method
            )));
        }
        self.method = PaymentMethod::Direct;
        self.requested = true;
        self.requested_by = Some(requested_by);
        Ok(())
    }

    /// Redeem `supplied`; a successful redemption consumes the code.
    pub fn verify(&mut self, supplied: &str, now: DateTime<Utc>) -> bool {
        let matches = self
            .active_code(now)
            .map(|code| code == supplied.trim())
            .unwrap_or(false);
        if matches {
            self.code_verified = true;
            self.code = None;
        }
        matches
    }
}
