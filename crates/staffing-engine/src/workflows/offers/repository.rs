use super::domain::{Offer, OfferId};
use crate::error::{EngineError, EntityKind};
use crate::workflows::matching::{CandidateId, JobId};
use crate::workflows::store::{EntityStore, RepositoryError};

/// Append-only offer storage. Offers are never deleted.
pub trait OfferRepository: Send + Sync {
    fn insert(&self, offer: Offer) -> Result<Offer, RepositoryError>;
    fn fetch(&self, id: &OfferId) -> Result<Option<Offer>, RepositoryError>;
    /// Mutate one offer under its own lock; nothing is written when `apply` fails.
    fn modify(
        &self,
        id: &OfferId,
        apply: &mut dyn FnMut(&mut Offer) -> Result<(), EngineError>,
    ) -> Result<Offer, EngineError>;
    fn pending(&self) -> Result<Vec<Offer>, RepositoryError>;
    fn for_job(&self, job_id: &JobId) -> Result<Vec<Offer>, RepositoryError>;
    fn for_candidate(&self, candidate_id: &CandidateId) -> Result<Vec<Offer>, RepositoryError>;
}

#[derive(Default)]
pub struct InMemoryOfferRepository {
    offers: EntityStore<OfferId, Offer>,
}

fn by_creation(mut offers: Vec<Offer>) -> Vec<Offer> {
    offers.sort_by(|left, right| {
        left.created_at
            .cmp(&right.created_at)
            .then_with(|| left.id.cmp(&right.id))
    });
    offers
}

impl OfferRepository for InMemoryOfferRepository {
    fn insert(&self, offer: Offer) -> Result<Offer, RepositoryError> {
        self.offers.insert(offer.id.clone(), offer.clone())?;
        Ok(offer)
    }

    fn fetch(&self, id: &OfferId) -> Result<Option<Offer>, RepositoryError> {
        self.offers.fetch(id)
    }

    fn modify(
        &self,
        id: &OfferId,
        apply: &mut dyn FnMut(&mut Offer) -> Result<(), EngineError>,
    ) -> Result<Offer, EngineError> {
        self.offers
            .modify(id, |offer| apply(offer))?
            .map(|(offer, ())| offer)
            .ok_or_else(|| EngineError::not_found(EntityKind::Offer, id.0.clone()))
    }

    fn pending(&self) -> Result<Vec<Offer>, RepositoryError> {
        self.offers.select(Offer::is_pending).map(by_creation)
    }

    fn for_job(&self, job_id: &JobId) -> Result<Vec<Offer>, RepositoryError> {
        self.offers
            .select(|offer| &offer.job_id == job_id)
            .map(by_creation)
    }

    fn for_candidate(&self, candidate_id: &CandidateId) -> Result<Vec<Offer>, RepositoryError> {
        self.offers
            .select(|offer| &offer.candidate_id == candidate_id)
            .map(by_creation)
    }
}
