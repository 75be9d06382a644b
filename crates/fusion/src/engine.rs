use crate::adapters::{AdapterError, SourceAdapter};
use crate::config::FusionConfig;
use crate::error::{FusionError, Result};
use crate::expansion::{expanded_query_text, extract_expansion_terms};
use crate::merge::{merge_candidate_lists, score_results, sort_results};
use crate::rerank::{query_terms, rerank};
use crate::summary::build_summary;
use knowledge_protocol::{
    Candidate, CanonicalKey, EnabledSources, FusedResult, FusionWeights, RetrievalQuery, SourceKind,
};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Caller-side context consumed by the re-ranker.
#[derive(Debug, Clone, Default)]
pub struct RetrievalContext {
    /// Ordered domain names; the leading entries count as preferred.
    pub domain_preferences: Vec<String>,
}

/// Terminal state of one retrieval call. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStatus {
    Complete,
    /// Every adapter failed or returned nothing.
    EmptyResultSet,
    /// Expansion was requested but no terms could be extracted; the phase-1
    /// results were returned unchanged.
    ExpansionSkipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Ok,
    Failed,
    TimedOut,
}

/// Per-source observability record for one call.
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub kind: SourceKind,
    pub state: SourceState,
    pub candidates: usize,
}

/// What one retrieval call returns.
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub results: Vec<FusedResult>,
    pub summary: knowledge_protocol::KnowledgeSummary,
    pub status: RetrievalStatus,
    pub sources: Vec<SourceOutcome>,
}

enum Fetch {
    Ok(Vec<Candidate>),
    Failed(AdapterError),
    TimedOut,
}

/// The fusion engine: concurrent fan-out to source adapters, single-threaded
/// merge and scoring afterwards.
///
/// Fusion weights are the only process-wide mutable state; every call reads
/// one snapshot up front, so a mid-call [`FusionEngine::update_weights`] only
/// affects subsequent calls.
pub struct FusionEngine {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    weights: RwLock<FusionWeights>,
    config: FusionConfig,
}

impl FusionEngine {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>, config: FusionConfig) -> Self {
        if config.confidence_threshold > config.score_ceiling() {
            log::warn!(
                "confidence threshold {} exceeds the attainable score ceiling {:.3}; \
                 re-ranked calls will filter out every result",
                config.confidence_threshold,
                config.score_ceiling()
            );
        }
        Self {
            adapters,
            weights: RwLock::new(FusionWeights::default()),
            config,
        }
    }

    /// Replace the starting weights; invalid weights are renormalized or
    /// rejected exactly like [`FusionEngine::update_weights`].
    pub fn with_weights(self, weights: FusionWeights) -> Result<Self> {
        self.update_weights(weights)?;
        Ok(self)
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    pub fn current_weights(&self) -> FusionWeights {
        *self.weights.read().expect("weights lock poisoned")
    }

    /// Atomically apply new fusion weights, renormalizing proportionally when
    /// the sum drifts outside tolerance. Returns the weights as applied.
    pub fn update_weights(&self, weights: FusionWeights) -> Result<FusionWeights> {
        let applied = weights.normalized()?;
        if applied != weights {
            log::warn!(
                "fusion weights summed to {:.3}; renormalized proportionally",
                weights.sum()
            );
        }
        *self.weights.write().expect("weights lock poisoned") = applied;
        Ok(applied)
    }

    /// One full fusion pass: fan-out, merge, score, optional re-rank, sort,
    /// truncate, summarize.
    pub async fn retrieve(
        &self,
        query: &RetrievalQuery,
        context: &RetrievalContext,
    ) -> Result<RetrievalOutcome> {
        if query.text.trim().is_empty() {
            return Err(FusionError::EmptyQuery);
        }
        if query.top_k == 0 {
            return Err(FusionError::InvalidTopK);
        }

        // Snapshot once; calls in flight never observe a weights update.
        let weights = self.current_weights();
        let limit = self.config.oversample.max(1) * query.top_k;

        let (lists, sources) = self
            .fan_out(&query.text, query.domain.as_deref(), query.sources, limit)
            .await;

        let merged = merge_candidate_lists(&lists, &weights, self.config.rrf_k);
        let fused_empty = merged.is_empty();
        let mut results = score_results(merged, &weights, &self.config);

        if query.rerank {
            let terms = query_terms(&query.text);
            rerank(&mut results, &terms, &context.domain_preferences, &self.config);
        }

        sort_results(&mut results);
        results.truncate(query.top_k);

        let status = if fused_empty {
            RetrievalStatus::EmptyResultSet
        } else {
            RetrievalStatus::Complete
        };
        let summary = build_summary(&results);

        log::debug!(
            "retrieve '{}': {} results, status {:?}",
            query.text,
            results.len(),
            status
        );

        Ok(RetrievalOutcome {
            results,
            summary,
            status,
            sources,
        })
    }

    /// Two-phase retrieval: a small seeding pass, term extraction from its
    /// top results, then a second full pass over the expanded query. Both
    /// phases are merged by canonical key without double-counting, and the
    /// outcome lists both phases' source records in phase order.
    pub async fn retrieve_expanded(
        &self,
        query: &RetrievalQuery,
        context: &RetrievalContext,
    ) -> Result<RetrievalOutcome> {
        if query.top_k == 0 {
            return Err(FusionError::InvalidTopK);
        }

        let expansion = &self.config.expansion;
        let seed_query = RetrievalQuery {
            top_k: expansion.seed_top_k,
            ..query.clone()
        };
        let phase1 = self.retrieve(&seed_query, context).await?;

        let terms = extract_expansion_terms(
            &phase1.results,
            &query.text,
            expansion.seed_window,
            expansion.max_terms,
        );
        if terms.is_empty() {
            // Expansion is best-effort; hand back the seeding pass as-is.
            let mut results = phase1.results;
            results.truncate(query.top_k);
            let summary = build_summary(&results);
            return Ok(RetrievalOutcome {
                results,
                summary,
                status: RetrievalStatus::ExpansionSkipped,
                sources: phase1.sources,
            });
        }

        let expanded_text = expanded_query_text(&query.text, &terms);
        log::debug!("expanded query '{}' -> '{}'", query.text, expanded_text);
        let expanded_query = RetrievalQuery {
            text: expanded_text,
            ..query.clone()
        };
        let phase2 = self.retrieve(&expanded_query, context).await?;

        let mut sources = phase1.sources;
        sources.extend(phase2.sources);

        // Duplicates keep the higher hybrid score; scores never add across
        // phases.
        let mut by_key: BTreeMap<CanonicalKey, FusedResult> = BTreeMap::new();
        for result in phase1.results.into_iter().chain(phase2.results) {
            match by_key.entry(result.key.clone()) {
                std::collections::btree_map::Entry::Vacant(entry) => {
                    entry.insert(result);
                }
                std::collections::btree_map::Entry::Occupied(mut entry) => {
                    if result.hybrid_score > entry.get().hybrid_score {
                        entry.insert(result);
                    }
                }
            }
        }

        let mut results: Vec<FusedResult> = by_key.into_values().collect();
        sort_results(&mut results);
        results.truncate(query.top_k);

        let status = if results.is_empty() {
            RetrievalStatus::EmptyResultSet
        } else {
            RetrievalStatus::Complete
        };
        let summary = build_summary(&results);

        Ok(RetrievalOutcome {
            results,
            summary,
            status,
            sources,
        })
    }

    /// Fan out to every enabled adapter concurrently. Each invocation carries
    /// its own timeout; a timeout drops the in-flight retrieve future and the
    /// merge proceeds with whatever completed. Failures never propagate.
    async fn fan_out(
        &self,
        text: &str,
        domain: Option<&str>,
        sources: EnabledSources,
        limit: usize,
    ) -> (Vec<Vec<Candidate>>, Vec<SourceOutcome>) {
        let budget = Duration::from_millis(self.config.adapter_timeout_ms);

        let mut handles = Vec::with_capacity(self.adapters.len());
        for adapter in &self.adapters {
            let kind = adapter.kind();
            if !sources.enabled(kind) {
                continue;
            }
            let adapter = Arc::clone(adapter);
            let text = text.to_string();
            let domain = domain.map(str::to_string);
            handles.push((
                kind,
                tokio::spawn(async move {
                    match tokio::time::timeout(
                        budget,
                        adapter.retrieve(&text, domain.as_deref(), limit),
                    )
                    .await
                    {
                        Ok(Ok(candidates)) => Fetch::Ok(candidates),
                        Ok(Err(err)) => Fetch::Failed(err),
                        Err(_) => Fetch::TimedOut,
                    }
                }),
            ));
        }

        let mut lists = Vec::with_capacity(handles.len());
        let mut outcomes = Vec::with_capacity(handles.len());
        for (kind, handle) in handles {
            let fetch = match handle.await {
                Ok(fetch) => fetch,
                Err(err) => Fetch::Failed(AdapterError(format!("adapter task panicked: {err}"))),
            };
            match fetch {
                Fetch::Ok(candidates) => {
                    outcomes.push(SourceOutcome {
                        kind,
                        state: SourceState::Ok,
                        candidates: candidates.len(),
                    });
                    lists.push(candidates);
                }
                Fetch::Failed(err) => {
                    log::warn!("{kind} adapter failed: {err}; continuing without it");
                    outcomes.push(SourceOutcome {
                        kind,
                        state: SourceState::Failed,
                        candidates: 0,
                    });
                    lists.push(Vec::new());
                }
                Fetch::TimedOut => {
                    log::warn!(
                        "{kind} adapter exceeded its {}ms budget; dropped",
                        self.config.adapter_timeout_ms
                    );
                    outcomes.push(SourceOutcome {
                        kind,
                        state: SourceState::TimedOut,
                        candidates: 0,
                    });
                    lists.push(Vec::new());
                }
            }
        }

        (lists, outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::AdapterResult;
    use async_trait::async_trait;
    use knowledge_protocol::CandidateContent;

    /// Adapter that replays a fixed candidate list.
    struct ListAdapter {
        kind: SourceKind,
        candidates: Vec<Candidate>,
    }

    impl ListAdapter {
        fn texts(kind: SourceKind, items: &[(&str, f32)]) -> Arc<dyn SourceAdapter> {
            let candidates = items
                .iter()
                .enumerate()
                .map(|(rank, (body, score))| {
                    Candidate::new(CandidateContent::text(*body), *score, rank, kind, None)
                })
                .collect();
            Arc::new(Self { kind, candidates })
        }
    }

    #[async_trait]
    impl SourceAdapter for ListAdapter {
        fn kind(&self) -> SourceKind {
            self.kind
        }

        async fn retrieve(&self, _: &str, _: Option<&str>, limit: usize) -> AdapterResult {
            Ok(self.candidates.iter().take(limit).cloned().collect())
        }
    }

    struct FailingAdapter(SourceKind);

    #[async_trait]
    impl SourceAdapter for FailingAdapter {
        fn kind(&self) -> SourceKind {
            self.0
        }

        async fn retrieve(&self, _: &str, _: Option<&str>, _: usize) -> AdapterResult {
            Err(AdapterError("backend unavailable".into()))
        }
    }

    fn raw_query(text: &str, top_k: usize) -> RetrievalQuery {
        RetrievalQuery::new(text).with_top_k(top_k).with_rerank(false)
    }

    #[tokio::test]
    async fn empty_query_is_rejected_before_dispatch() {
        let engine = FusionEngine::new(vec![], FusionConfig::default());
        let err = engine
            .retrieve(&RetrievalQuery::new("   "), &RetrievalContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FusionError::EmptyQuery));
    }

    #[tokio::test]
    async fn zero_top_k_is_rejected() {
        let engine = FusionEngine::new(vec![], FusionConfig::default());
        let err = engine
            .retrieve(&raw_query("q", 0), &RetrievalContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FusionError::InvalidTopK));
    }

    #[tokio::test]
    async fn single_source_ordering_is_preserved() {
        let adapter = ListAdapter::texts(
            SourceKind::Similarity,
            &[("first", 0.9), ("second", 0.7), ("third", 0.5)],
        );
        let engine = FusionEngine::new(vec![adapter], FusionConfig::default());
        let outcome = engine
            .retrieve(&raw_query("q", 10), &RetrievalContext::default())
            .await
            .unwrap();

        let order: Vec<&str> = outcome
            .results
            .iter()
            .map(|r| r.content.display_text())
            .collect();
        assert_eq!(order, vec!["first", "second", "third"]);
        assert_eq!(outcome.status, RetrievalStatus::Complete);
    }

    #[tokio::test]
    async fn failed_adapter_degrades_instead_of_erroring() {
        let engine = FusionEngine::new(
            vec![
                Arc::new(FailingAdapter(SourceKind::Similarity)),
                ListAdapter::texts(SourceKind::Document, &[("survivor", 0.8)]),
            ],
            FusionConfig::default(),
        );
        let outcome = engine
            .retrieve(&raw_query("q", 5), &RetrievalContext::default())
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 1);
        let failed = outcome
            .sources
            .iter()
            .find(|s| s.kind == SourceKind::Similarity)
            .unwrap();
        assert_eq!(failed.state, SourceState::Failed);
        assert_eq!(failed.candidates, 0);
    }

    #[tokio::test]
    async fn disabled_sources_are_not_invoked() {
        let engine = FusionEngine::new(
            vec![
                ListAdapter::texts(SourceKind::Similarity, &[("sim", 0.9)]),
                ListAdapter::texts(SourceKind::Document, &[("doc", 0.9)]),
            ],
            FusionConfig::default(),
        );
        let query = raw_query("q", 5).with_sources(EnabledSources {
            similarity: false,
            ..EnabledSources::all()
        });
        let outcome = engine.retrieve(&query, &RetrievalContext::default()).await.unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].content.display_text(), "doc");
        assert!(outcome.sources.iter().all(|s| s.kind != SourceKind::Similarity));
    }

    #[tokio::test]
    async fn weight_updates_are_renormalized_and_visible() {
        let engine = FusionEngine::new(vec![], FusionConfig::default());
        let applied = engine
            .update_weights(FusionWeights::new(0.5, 0.3, 0.3))
            .unwrap();
        assert!((applied.sum() - 1.0).abs() < 1e-6);
        assert_eq!(engine.current_weights(), applied);

        assert!(engine.update_weights(FusionWeights::new(0.0, 0.0, 0.0)).is_err());
        // The failed update leaves the previous weights in place.
        assert_eq!(engine.current_weights(), applied);
    }
}
