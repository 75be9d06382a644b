use crate::error::Result;
use crate::{domain_matches, terms};
use async_trait::async_trait;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// One entity matched in the relationship graph, with its outgoing relations.
#[derive(Debug, Clone)]
pub struct EntityHit {
    pub name: String,
    /// (predicate, target entity name) pairs for outgoing edges.
    pub relations: Vec<(String, String)>,
    /// Lexical match strength in [0, 1].
    pub score: f32,
    pub domain: Option<String>,
}

/// Relationship-graph backend: entities relevant to a query plus their edges.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn neighbors(
        &self,
        query: &str,
        domain: Option<&str>,
        limit: usize,
    ) -> Result<Vec<EntityHit>>;
}

#[derive(Debug, Clone)]
struct EntityNode {
    name: String,
    domain: Option<String>,
    term_set: HashSet<String>,
}

#[derive(Debug, Clone)]
struct RelationEdge {
    predicate: String,
}

/// In-memory relationship graph over a petgraph `DiGraph`.
///
/// Entities are matched by term overlap between the query and the entity
/// name; relations are reported from outgoing edges only.
#[derive(Default)]
pub struct InMemoryGraphStore {
    graph: DiGraph<EntityNode, RelationEdge>,
    by_name: HashMap<String, NodeIndex>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity if absent; returns its node index either way.
    pub fn add_entity(&mut self, name: &str, domain: Option<&str>) -> NodeIndex {
        if let Some(&idx) = self.by_name.get(name) {
            return idx;
        }
        let node = EntityNode {
            name: name.to_string(),
            domain: domain.map(str::to_string),
            term_set: terms(name).into_iter().collect(),
        };
        let idx = self.graph.add_node(node);
        self.by_name.insert(name.to_string(), idx);
        idx
    }

    /// Add a directed relation; both entities are created on demand.
    pub fn relate(&mut self, from: &str, predicate: &str, to: &str) {
        let from = self.add_entity(from, None);
        let to = self.add_entity(to, None);
        self.graph.add_edge(
            from,
            to,
            RelationEdge {
                predicate: predicate.to_string(),
            },
        );
    }

    pub fn entity_count(&self) -> usize {
        self.graph.node_count()
    }

    fn relations_of(&self, idx: NodeIndex) -> Vec<(String, String)> {
        let mut relations: Vec<(String, String)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|edge| {
                (
                    edge.weight().predicate.clone(),
                    self.graph[edge.target()].name.clone(),
                )
            })
            .collect();
        relations.sort();
        relations
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn neighbors(
        &self,
        query: &str,
        domain: Option<&str>,
        limit: usize,
    ) -> Result<Vec<EntityHit>> {
        let query_terms: HashSet<String> = terms(query).into_iter().collect();
        if query_terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<EntityHit> = self
            .graph
            .node_indices()
            .filter_map(|idx| {
                let node = &self.graph[idx];
                if !domain_matches(node.domain.as_deref(), domain) {
                    return None;
                }
                if node.term_set.is_empty() {
                    return None;
                }
                let matched = node.term_set.intersection(&query_terms).count();
                if matched == 0 {
                    return None;
                }
                let score = matched as f32 / node.term_set.len() as f32;
                Some(EntityHit {
                    name: node.name.clone(),
                    relations: self.relations_of(idx),
                    score: score.clamp(0.0, 1.0),
                    domain: node.domain.clone(),
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
        hits.truncate(limit);
        log::debug!("graph: {} entities for {:?}", hits.len(), query);
        Ok(hits)
    }
}
