//! Offer state machine, resolution side effects, and expiry sweeping.

pub mod domain;
pub mod policy;
pub mod repository;
pub mod service;
pub mod sweeper;

pub use domain::{
    DeclineReason, Offer, OfferId, OfferResponse, OfferStatus, ResolveOutcome, ResponseDetails,
    SendOffer,
};
pub use policy::OfferPolicy;
pub use repository::{InMemoryOfferRepository, OfferRepository};
pub use service::{OfferCollaborators, OfferManager, Resolution};
pub use sweeper::{ExpirySweeper, SweepReport};

#[cfg(test)]
mod tests;
