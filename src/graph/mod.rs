//! In-memory directed multigraph of companies and discovered edges.
//!
//! Storage is arena style: a slug-ordered node table where each node carries
//! the ids of its incident edges, and an id-keyed edge table. Removing a node
//! walks only its own edge ids, and [`SynergyGraph::link`] refuses to create an
//! edge whose endpoints are not both present, so no edge can outlive a node.

mod adjacency;

pub use adjacency::AdjacencyMatrix;

use std::collections::{btree_map, BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::error::{EdgeSide, EntityKind, Result, SynergyError};
use crate::models::{CompanyProfile, EngagementChannel};

pub type EdgeId = u64;

/// Directed edge: `source` seeks what `target` provides.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub id: EdgeId,
    pub source: String,
    pub target: String,
    pub need: String,
    pub offer: String,
    pub weight: f64,
    pub label: String,
    pub engagement_channels: Vec<EngagementChannel>,
}

/// Edge payload supplied to [`SynergyGraph::link`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkSpec {
    pub need: String,
    pub offer: String,
    pub weight: f64,
    pub label: String,
    pub engagement_channels: Vec<EngagementChannel>,
}

impl LinkSpec {
    pub fn new(need: impl Into<String>, offer: impl Into<String>, weight: f64) -> Self {
        Self {
            need: need.into(),
            offer: offer.into(),
            weight,
            label: String::new(),
            engagement_channels: Vec::new(),
        }
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_channels(mut self, channels: Vec<EngagementChannel>) -> Self {
        self.engagement_channels = channels;
        self
    }
}

#[derive(Debug, Clone)]
struct Node {
    profile: CompanyProfile,
    outgoing: BTreeSet<EdgeId>,
    incoming: BTreeSet<EdgeId>,
}

impl Node {
    fn new(profile: CompanyProfile) -> Self {
        Self {
            profile,
            outgoing: BTreeSet::new(),
            incoming: BTreeSet::new(),
        }
    }

    fn degree(&self) -> usize {
        self.outgoing.len() + self.incoming.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SynergyGraph {
    nodes: BTreeMap<String, Node>,
    edges: BTreeMap<EdgeId, GraphEdge>,
    next_edge_id: EdgeId,
}

impl SynergyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.nodes.contains_key(slug)
    }

    /// Inserts or overwrites (last-write-wins) the profile under its slug,
    /// generating the slug from the name when absent. Returns the slug.
    pub fn upsert_company(&mut self, mut profile: CompanyProfile) -> Result<String> {
        let slug = profile.resolve_slug()?.to_string();
        match self.nodes.entry(slug.clone()) {
            btree_map::Entry::Occupied(mut entry) => {
                debug!(slug = %slug, "overwriting company profile");
                entry.get_mut().profile = profile;
            }
            btree_map::Entry::Vacant(entry) => {
                entry.insert(Node::new(profile));
            }
        }
        Ok(slug)
    }

    /// Strict insert: fails when the slug is already registered.
    pub fn insert_company(&mut self, mut profile: CompanyProfile) -> Result<String> {
        let slug = profile.resolve_slug()?.to_string();
        if self.nodes.contains_key(&slug) {
            return Err(SynergyError::DuplicateNode(slug));
        }
        self.nodes.insert(slug.clone(), Node::new(profile));
        Ok(slug)
    }

    pub fn company(&self, slug: &str) -> Result<&CompanyProfile> {
        self.nodes
            .get(slug)
            .map(|node| &node.profile)
            .ok_or_else(|| SynergyError::not_found(EntityKind::Company, slug))
    }

    /// Profiles in slug order.
    pub fn companies(&self) -> impl Iterator<Item = &CompanyProfile> + '_ {
        self.nodes.values().map(|node| &node.profile)
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes.keys().map(String::as_str)
    }

    /// Cloned profile set for callers that need a stable view while the
    /// graph keeps changing.
    pub fn snapshot(&self) -> Vec<CompanyProfile> {
        self.companies().cloned().collect()
    }

    /// Removes the node and every edge touching it, in either direction.
    pub fn remove_company(&mut self, slug: &str) -> Result<CompanyProfile> {
        let node = self
            .nodes
            .remove(slug)
            .ok_or_else(|| SynergyError::not_found(EntityKind::Company, slug))?;
        let incident: BTreeSet<EdgeId> = node.outgoing.union(&node.incoming).copied().collect();
        for id in &incident {
            if let Some(edge) = self.edges.remove(id) {
                let other = if edge.source == slug {
                    &edge.target
                } else {
                    &edge.source
                };
                if let Some(neighbour) = self.nodes.get_mut(other) {
                    neighbour.outgoing.remove(id);
                    neighbour.incoming.remove(id);
                }
            }
        }
        debug!(slug, removed_edges = incident.len(), "removed company");
        Ok(node.profile)
    }

    /// Adds a directed edge. Both endpoints must exist; nothing is mutated
    /// otherwise.
    pub fn link(&mut self, source: &str, target: &str, spec: LinkSpec) -> Result<EdgeId> {
        if !self.nodes.contains_key(source) {
            return Err(SynergyError::DanglingEdge {
                side: EdgeSide::Source,
                slug: source.to_string(),
            });
        }
        if !self.nodes.contains_key(target) {
            return Err(SynergyError::DanglingEdge {
                side: EdgeSide::Target,
                slug: target.to_string(),
            });
        }
        let id = self.next_edge_id;
        self.next_edge_id += 1;
        self.edges.insert(
            id,
            GraphEdge {
                id,
                source: source.to_string(),
                target: target.to_string(),
                need: spec.need,
                offer: spec.offer,
                weight: spec.weight,
                label: spec.label,
                engagement_channels: spec.engagement_channels,
            },
        );
        if let Some(node) = self.nodes.get_mut(source) {
            node.outgoing.insert(id);
        }
        if let Some(node) = self.nodes.get_mut(target) {
            node.incoming.insert(id);
        }
        Ok(id)
    }

    /// Drops every edge, keeping the nodes.
    pub fn clear_edges(&mut self) {
        self.edges.clear();
        for node in self.nodes.values_mut() {
            node.outgoing.clear();
            node.incoming.clear();
        }
    }

    /// Edges touching `slug` in either direction, in edge-id order. Empty for
    /// unlinked or unknown companies.
    pub fn matches_for(&self, slug: &str) -> Vec<GraphEdge> {
        let Some(node) = self.nodes.get(slug) else {
            return Vec::new();
        };
        node.outgoing
            .union(&node.incoming)
            .filter_map(|id| self.edges.get(id))
            .cloned()
            .collect()
    }

    pub fn degree(&self, slug: &str) -> usize {
        self.nodes.get(slug).map(Node::degree).unwrap_or(0)
    }

    /// Lazy, restartable iterator over every edge in id order.
    pub fn edges(&self) -> Edges<'_> {
        Edges {
            inner: self.edges.values(),
        }
    }

    pub fn adjacency_matrix(&self) -> AdjacencyMatrix {
        AdjacencyMatrix::from_graph(self)
    }

    /// Bulk upsert. Every profile is validated before any mutation, so a bad
    /// profile fails the whole call and leaves the graph untouched.
    pub fn ingest<I>(&mut self, profiles: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = CompanyProfile>,
    {
        let mut prepared = Vec::new();
        for (index, mut profile) in profiles.into_iter().enumerate() {
            profile.resolve_slug().map_err(|err| match err {
                SynergyError::Validation(message) => {
                    SynergyError::validation(format!("profile at index {index}: {message}"))
                }
                other => other,
            })?;
            prepared.push(profile);
        }
        let mut slugs = Vec::with_capacity(prepared.len());
        for profile in prepared {
            slugs.push(self.upsert_company(profile)?);
        }
        debug!(count = slugs.len(), "ingested companies");
        Ok(slugs)
    }

    /// Verifies that every edge references live nodes and that node edge-id
    /// sets agree with the edge table.
    pub fn check_consistency(&self) -> Result<()> {
        for edge in self.edges.values() {
            let source = self.nodes.get(&edge.source).ok_or_else(|| {
                SynergyError::DanglingEdge {
                    side: EdgeSide::Source,
                    slug: edge.source.clone(),
                }
            })?;
            let target = self.nodes.get(&edge.target).ok_or_else(|| {
                SynergyError::DanglingEdge {
                    side: EdgeSide::Target,
                    slug: edge.target.clone(),
                }
            })?;
            if !source.outgoing.contains(&edge.id) || !target.incoming.contains(&edge.id) {
                return Err(SynergyError::Inconsistent(format!(
                    "edge {} is not registered on its endpoints",
                    edge.id
                )));
            }
        }
        for (slug, node) in &self.nodes {
            if let Some(id) = node
                .outgoing
                .union(&node.incoming)
                .find(|id| !self.edges.contains_key(id))
            {
                return Err(SynergyError::Inconsistent(format!(
                    "company `{slug}` references missing edge {id}"
                )));
            }
        }
        Ok(())
    }
}

/// Iterator returned by [`SynergyGraph::edges`]. Cloning restarts from the
/// clone's current position.
#[derive(Clone)]
pub struct Edges<'a> {
    inner: btree_map::Values<'a, EdgeId, GraphEdge>,
}

impl<'a> Iterator for Edges<'a> {
    type Item = &'a GraphEdge;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Edges<'_> {}
