//! Query-intent routing.
//!
//! One call to the classification collaborator with the strict closed
//! label set decides whether retrieval runs at all. Every failure mode —
//! no classifier configured, transport error, out-of-set label, blank
//! query — falls back to the conservative retrieval-requiring intent,
//! never to the no-context intent: silently answering without evidence is
//! the one mistake the router must not make.

use fuserag_core::models::Intent;
use fuserag_llm::ports::IntentClassifier;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::models::DegradedStage;

/// Query router with a bounded memo-cache
pub struct QueryRouter {
    classifier: Option<Arc<dyn IntentClassifier>>,
    cache: Mutex<MemoCache>,
}

/// Bounded LRU cache keyed by the exact, case-sensitive query string.
/// Keying on the unnormalized query is deliberate: normalization could
/// merge queries the classifier treats differently.
struct MemoCache {
    capacity: usize,
    map: HashMap<String, Intent>,
    order: VecDeque<String>,
}

impl MemoCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            map: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    fn get(&mut self, query: &str) -> Option<Intent> {
        let intent = self.map.get(query).copied()?;
        // Refresh recency
        if let Some(pos) = self.order.iter().position(|q| q == query) {
            let key = self.order.remove(pos).unwrap();
            self.order.push_back(key);
        }
        Some(intent)
    }

    fn insert(&mut self, query: String, intent: Intent) {
        if self.capacity == 0 {
            return;
        }

        if self.map.contains_key(&query) {
            self.map.insert(query, intent);
            return;
        }

        if self.map.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
            }
        }

        self.map.insert(query.clone(), intent);
        self.order.push_back(query);
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

impl QueryRouter {
    /// Create a router. Without a classifier every query falls back to
    /// the conservative intent.
    pub fn new(classifier: Option<Arc<dyn IntentClassifier>>, cache_capacity: usize) -> Self {
        Self {
            classifier,
            cache: Mutex::new(MemoCache::new(cache_capacity)),
        }
    }

    /// Classify a query into the closed intent set.
    ///
    /// Never fails; returns the fallback intent plus a degradation marker
    /// when the classifier was configured but did not produce an in-set
    /// label.
    pub async fn classify(&self, query: &str) -> (Intent, Option<DegradedStage>) {
        if query.trim().is_empty() {
            return (Intent::fallback(), None);
        }

        if let Some(intent) = self.cache.lock().unwrap().get(query) {
            return (intent, None);
        }

        let Some(classifier) = &self.classifier else {
            // Running without a classifier is a supported configuration.
            return (Intent::fallback(), None);
        };

        match classifier.classify(query, &Intent::LABELS).await {
            Ok(label) => match Intent::from_label(&label) {
                Some(intent) => {
                    self.cache.lock().unwrap().insert(query.to_string(), intent);
                    (intent, None)
                }
                None => {
                    tracing::warn!(label = %label, "Classifier returned an out-of-set label");
                    (Intent::fallback(), Some(DegradedStage::Router))
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Classification call failed");
                (Intent::fallback(), Some(DegradedStage::Router))
            }
        }
    }

    /// Number of memoized classifications
    pub fn cached_len(&self) -> usize {
        self.cache.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fuserag_core::error::{FuseragError, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed label and counts calls
    struct FixedClassifier {
        label: String,
        calls: AtomicUsize,
    }

    impl FixedClassifier {
        fn new(label: &str) -> Self {
            Self { label: label.to_string(), calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl IntentClassifier for FixedClassifier {
        async fn classify(&self, _query: &str, _labels: &[&str]) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.label.clone())
        }
    }

    struct FailingClassifier;

    #[async_trait]
    impl IntentClassifier for FailingClassifier {
        async fn classify(&self, _query: &str, _labels: &[&str]) -> Result<String> {
            Err(FuseragError::ClassificationFailed { reason: "timeout".to_string() })
        }
    }

    #[tokio::test]
    async fn test_in_set_label_routes() {
        let router = QueryRouter::new(Some(Arc::new(FixedClassifier::new("ANALYSIS"))), 10);
        let (intent, degraded) = router.classify("compare the two procedures").await;
        assert_eq!(intent, Intent::Analysis);
        assert_eq!(degraded, None);
    }

    #[tokio::test]
    async fn test_out_of_set_label_falls_back_conservatively() {
        let router = QueryRouter::new(Some(Arc::new(FixedClassifier::new("SUMMARIZE"))), 10);
        let (intent, degraded) = router.classify("what is this?").await;
        assert_eq!(intent, Intent::Precision);
        assert_ne!(intent, Intent::Chat);
        assert_eq!(degraded, Some(DegradedStage::Router));
    }

    #[tokio::test]
    async fn test_classifier_failure_falls_back_conservatively() {
        let router = QueryRouter::new(Some(Arc::new(FailingClassifier)), 10);
        let (intent, degraded) = router.classify("what is this?").await;
        assert_eq!(intent, Intent::Precision);
        assert_eq!(degraded, Some(DegradedStage::Router));
    }

    #[tokio::test]
    async fn test_no_classifier_is_supported_not_degraded() {
        let router = QueryRouter::new(None, 10);
        let (intent, degraded) = router.classify("anything").await;
        assert_eq!(intent, Intent::Precision);
        assert_eq!(degraded, None);
    }

    #[tokio::test]
    async fn test_blank_query_falls_back() {
        let router = QueryRouter::new(Some(Arc::new(FixedClassifier::new("CHAT"))), 10);
        let (intent, _) = router.classify("   ").await;
        assert_eq!(intent, Intent::Precision);
    }

    #[tokio::test]
    async fn test_cache_avoids_repeat_calls() {
        let classifier = Arc::new(FixedClassifier::new("PRECISION"));
        let router = QueryRouter::new(Some(classifier.clone()), 10);

        router.classify("same query").await;
        router.classify("same query").await;
        router.classify("same query").await;

        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_is_case_sensitive() {
        let classifier = Arc::new(FixedClassifier::new("PRECISION"));
        let router = QueryRouter::new(Some(classifier.clone()), 10);

        router.classify("Same Query").await;
        router.classify("same query").await;

        assert_eq!(classifier.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_stays_bounded() {
        let classifier = Arc::new(FixedClassifier::new("PRECISION"));
        let router = QueryRouter::new(Some(classifier.clone()), 3);

        for i in 0..10 {
            router.classify(&format!("query {}", i)).await;
        }

        assert_eq!(router.cached_len(), 3);
    }
}
