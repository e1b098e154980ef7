//! Active engagement lifecycle: stage progression, payment-code handshake and billing timer.

pub mod domain;
pub mod payment;
pub mod repository;
pub mod service;
pub mod timer;
pub mod view;

#[cfg(test)]
mod tests;

pub use domain::{
    ActiveEngagement, Coordinate, EngagementId, EngagementStage, LocationTracking, LocationUpdate,
    Party,
};
pub use payment::{CodeGenerator, OsCodeGenerator, PaymentHandshake, PaymentMethod};
pub use repository::{EngagementRepository, InMemoryEngagementRepository};
pub use service::{EngagementManager, PaymentCodeIssue};
pub use timer::{BillingTimer, TimerReading};
pub use view::{EngagementView, PaymentView, TimerView};
