//! Standing filters matched against every new record.

use indexmap::IndexMap;
use tracing::warn;

use crate::{
    criteria::{self, Criteria},
    document::Document,
    parser::ParseError,
};

/// A destination plus the filter deciding which records it receives.
///
/// A subscription without criteria receives everything.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: String,
    destination: String,
    criteria: Option<Criteria>,
}

impl Subscription {
    pub fn new(id: impl Into<String>, destination: impl Into<String>) -> Self {
        Subscription {
            id: id.into(),
            destination: destination.into(),
            criteria: None,
        }
    }

    /// Compile `filter` into the subscription's criteria. An empty filter
    /// leaves the subscription unfiltered.
    pub fn with_filter(mut self, filter: &str) -> Result<Self, ParseError> {
        self.criteria = match filter.trim() {
            "" => None,
            text => Some(Criteria::parse(text)?),
        };
        Ok(self)
    }

    pub fn with_criteria(mut self, criteria: Criteria) -> Self {
        self.criteria = Some(criteria);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn criteria(&self) -> Option<&Criteria> {
        self.criteria.as_ref()
    }

    pub fn matches(&self, record: &Document) -> bool {
        criteria::meets(self.criteria.as_ref(), record)
    }
}

/// Active subscriptions keyed by id, in registration order.
///
/// Matching only reads the set, so a shared `&SubscriptionSet` can serve
/// several consumer threads at once.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionSet {
    subscriptions: IndexMap<String, Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription, replacing any with the same id.
    pub fn insert(&mut self, subscription: Subscription) -> Option<Subscription> {
        self.subscriptions
            .insert(subscription.id.clone(), subscription)
    }

    /// Register `(id, destination, filter)` triples, skipping those whose
    /// filter does not compile. Returns how many were registered.
    pub fn extend_from_filters<I, S>(&mut self, definitions: I) -> usize
    where
        I: IntoIterator<Item = (S, S, S)>,
        S: AsRef<str>,
    {
        let mut registered = 0;
        for (id, destination, filter) in definitions {
            let (id, filter) = (id.as_ref(), filter.as_ref());
            match Subscription::new(id, destination.as_ref()).with_filter(filter) {
                Ok(subscription) => {
                    self.insert(subscription);
                    registered += 1;
                }
                Err(error) => {
                    warn!(subscription = id, filter, %error, "skipping subscription with invalid filter");
                }
            }
        }
        registered
    }

    pub fn remove(&mut self, id: &str) -> Option<Subscription> {
        self.subscriptions.shift_remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Subscription> {
        self.subscriptions.get(id)
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subscription> {
        self.subscriptions.values()
    }

    /// Every subscription whose criteria meets `record`.
    pub fn matching(&self, record: &Document) -> Vec<&Subscription> {
        self.subscriptions
            .values()
            .filter(|s| s.matches(record))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Subscription>();
        assert_send_sync::<SubscriptionSet>();
    }

    #[test]
    fn invalid_filters_are_skipped() {
        let mut set = SubscriptionSet::new();
        let registered = set.extend_from_filters([
            ("a", "queue.a", "kind==alert"),
            ("b", "queue.b", "kind=bogus=alert"),
            ("c", "queue.c", ""),
        ]);
        assert_eq!(registered, 2);
        assert!(set.get("b").is_none());
        assert!(set.get("c").unwrap().criteria().is_none());
    }

    #[test]
    fn reinserting_replaces() {
        let mut set = SubscriptionSet::new();
        set.insert(Subscription::new("a", "one"));
        let old = set.insert(Subscription::new("a", "two"));
        assert_eq!(old.unwrap().destination(), "one");
        assert_eq!(set.len(), 1);
    }
}
