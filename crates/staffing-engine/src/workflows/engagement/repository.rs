use std::collections::HashMap;
use std::sync::Mutex;

use super::domain::{ActiveEngagement, EngagementId};
use crate::error::{EngineError, EntityKind};
use crate::workflows::offers::OfferId;
use crate::workflows::store::{EntityStore, RepositoryError};

/// Storage abstraction for active and completed engagements.
pub trait EngagementRepository: Send + Sync {
    /// Insert a new engagement; fails with `Conflict` when the offer already has one.
    fn insert(&self, engagement: ActiveEngagement) -> Result<ActiveEngagement, RepositoryError>;
    fn fetch_active(&self, id: &EngagementId) -> Result<Option<ActiveEngagement>, RepositoryError>;
    fn fetch_completed(
        &self,
        id: &EngagementId,
    ) -> Result<Option<ActiveEngagement>, RepositoryError>;
    fn find_by_offer(&self, offer_id: &OfferId) -> Result<Option<EngagementId>, RepositoryError>;
    /// Mutate an active engagement under its own lock; nothing is written when `apply` fails.
    fn modify(
        &self,
        id: &EngagementId,
        apply: &mut dyn FnMut(&mut ActiveEngagement) -> Result<(), EngineError>,
    ) -> Result<ActiveEngagement, EngineError>;
    /// Move an engagement from the active set to completed history.
    fn archive(&self, id: &EngagementId) -> Result<ActiveEngagement, RepositoryError>;
}

#[derive(Default)]
pub struct InMemoryEngagementRepository {
    active: EntityStore<EngagementId, ActiveEngagement>,
    completed: EntityStore<EngagementId, ActiveEngagement>,
    by_offer: Mutex<HashMap<OfferId, EngagementId>>,
}

impl EngagementRepository for InMemoryEngagementRepository {
    fn insert(&self, engagement: ActiveEngagement) -> Result<ActiveEngagement, RepositoryError> {
        let mut by_offer = self
            .by_offer
            .lock()
            .map_err(|_| RepositoryError::Unavailable("offer index lock poisoned".to_string()))?;
        if by_offer.contains_key(&engagement.offer_id) {
            return Err(RepositoryError::Conflict);
        }
        self.active
            .insert(engagement.id.clone(), engagement.clone())?;
        by_offer.insert(engagement.offer_id.clone(), engagement.id.clone());
        Ok(engagement)
    }

    fn fetch_active(&self, id: &EngagementId) -> Result<Option<ActiveEngagement>, RepositoryError> {
        self.active.fetch(id)
    }

    fn fetch_completed(
        &self,
        id: &EngagementId,
    ) -> Result<Option<ActiveEngagement>, RepositoryError> {
        self.completed.fetch(id)
    }

    fn find_by_offer(&self, offer_id: &OfferId) -> Result<Option<EngagementId>, RepositoryError> {
        let by_offer = self
            .by_offer
            .lock()
            .map_err(|_| RepositoryError::Unavailable("offer index lock poisoned".to_string()))?;
        Ok(by_offer.get(offer_id).cloned())
    }

    fn modify(
        &self,
        id: &EngagementId,
        apply: &mut dyn FnMut(&mut ActiveEngagement) -> Result<(), EngineError>,
    ) -> Result<ActiveEngagement, EngineError> {
        self.active
            .modify(id, |engagement| apply(engagement))?
            .map(|(engagement, ())| engagement)
            .ok_or_else(|| EngineError::not_found(EntityKind::Engagement, id.0.clone()))
    }

    /// History is written before the active entry is dropped, so a concurrent read always
    /// finds the engagement in one of the two sets.
    fn archive(&self, id: &EngagementId) -> Result<ActiveEngagement, RepositoryError> {
        let engagement = self.active.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        self.completed.insert(id.clone(), engagement.clone())?;
        self.active.remove(id)?;
        Ok(engagement)
    }
}
