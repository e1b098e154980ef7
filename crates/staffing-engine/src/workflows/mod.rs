pub mod engagement;
pub mod engine;
pub mod matching;
pub mod notifications;
pub mod offers;
pub mod reputation;
pub mod router;
pub mod store;

#[cfg(test)]
pub(crate) mod fixtures;

pub use engine::{StaffingEngine, StaffingEngineBuilder};
pub use router::engine_router;
