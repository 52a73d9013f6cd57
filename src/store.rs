use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::gateway::PredictionGateway;
use crate::risk::{self, PatientCohort};

/// Session-scoped access to the prediction listing.
///
/// Every display reads through one store, so a session issues a single
/// listing request until `refresh` is called.
pub struct PredictionStore<G> {
    gateway: G,
    cached: RefCell<Option<Rc<PatientCohort>>>,
    generation: Cell<u64>,
}

impl<G: PredictionGateway> PredictionStore<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            cached: RefCell::new(None),
            generation: Cell::new(0),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Returns the cached cohort, fetching it first if needed.
    ///
    /// A failed listing is logged and yields an empty cohort, which is not
    /// cached. A listing issued before the last `refresh` is returned to
    /// its caller but never cached.
    pub async fn load(&self) -> Rc<PatientCohort> {
        if let Some(cohort) = self.cached.borrow().as_ref() {
            return Rc::clone(cohort);
        }

        let issued_at = self.generation.get();
        let records = match self.gateway.list_predictions().await {
            Ok(records) => records,
            Err(err) => {
                log::error!("Error fetching predictions: {err}");
                return Rc::new(PatientCohort::default());
            }
        };

        let cohort = Rc::new(risk::aggregate(records));
        if self.generation.get() == issued_at {
            log::info!("Loaded {} predictions", cohort.len());
            *self.cached.borrow_mut() = Some(Rc::clone(&cohort));
        } else {
            log::debug!("Discarding listing issued before the last refresh");
        }
        cohort
    }

    /// Drops the cached cohort; the next `load` fetches again.
    pub fn refresh(&self) {
        self.generation.set(self.generation.get() + 1);
        self.cached.borrow_mut().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::gateway::fake::FakeGateway;
    use crate::risk::sample_record;

    #[tokio::test]
    async fn views_share_one_listing_per_session() {
        let gateway = FakeGateway::default();
        gateway.queue_listing(Ok(vec![
            sample_record("John", 87.0),
            sample_record("Sarah", 23.0),
        ]));
        let store = PredictionStore::new(gateway);

        let table = store.load().await;
        let report = store.load().await;

        assert_eq!(store.gateway().listing_calls(), 1);
        assert_eq!(table.len(), 2);
        assert!(Rc::ptr_eq(&table, &report));
    }

    #[tokio::test]
    async fn refresh_fetches_again() {
        let gateway = FakeGateway::default();
        gateway.queue_listing(Ok(vec![sample_record("John", 87.0)]));
        gateway.queue_listing(Ok(vec![
            sample_record("John", 87.0),
            sample_record("Emily", 18.0),
        ]));
        let store = PredictionStore::new(gateway);

        assert_eq!(store.load().await.len(), 1);
        store.refresh();
        assert_eq!(store.load().await.len(), 2);
        assert_eq!(store.gateway().listing_calls(), 2);
    }

    #[tokio::test]
    async fn failed_listing_falls_back_to_empty_and_retries() {
        let gateway = FakeGateway::default();
        gateway.queue_listing(Err(ClientError::Network("connection reset".to_string())));
        gateway.queue_listing(Ok(vec![sample_record("Michael", 65.0)]));
        let store = PredictionStore::new(gateway);

        let first = store.load().await;
        assert!(first.is_empty());
        assert_eq!(first.summary().total(), 0);

        let second = store.load().await;
        assert_eq!(second.len(), 1);
        assert_eq!(store.gateway().listing_calls(), 2);
    }

    #[tokio::test]
    async fn listing_overtaken_by_refresh_is_not_cached() {
        let gateway = FakeGateway::default();
        gateway.queue_listing(Ok(vec![sample_record("Stale", 50.0)]));
        gateway.queue_listing(Ok(vec![sample_record("Fresh", 60.0)]));
        let store = PredictionStore::new(gateway);

        let (stale, ()) = tokio::join!(store.load(), async { store.refresh() });
        assert_eq!(stale.records()[0].record.patient_name, "Stale");

        let fresh = store.load().await;
        assert_eq!(fresh.records()[0].record.patient_name, "Fresh");
        assert_eq!(store.gateway().listing_calls(), 2);
    }
}
