//! Matching engine: registers profiles, finds complementary pairs, composes
//! triads and produces prioritized opportunities.
//!
//! A run is a synchronous pipeline over the registered profile set. The term
//! index is rebuilt from scratch whenever that set changes.

pub mod index;
pub mod opportunities;
pub mod pairs;
pub mod triads;

pub use index::{TermIndex, TermRole};
pub use opportunities::OpportunityBuilder;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::graph::{LinkSpec, SynergyGraph};
use crate::models::{CompanyProfile, ComplementaryPair, Opportunity, Priority, SynergyMatch};
use crate::templates::ProfileTemplateLibrary;

/// Output of one [`SynergyEngine::analyze`] call.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRun {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub pairs: Vec<ComplementaryPair>,
    pub opportunities: Vec<Opportunity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<BTreeMap<String, Vec<String>>>,
}

impl AnalysisRun {
    /// Every need/offer match behind the run's pairs.
    pub fn matches(&self) -> impl Iterator<Item = &SynergyMatch> {
        self.pairs.iter().flat_map(ComplementaryPair::matches)
    }

    pub fn opportunities_for<'a>(&'a self, slug: &'a str) -> impl Iterator<Item = &'a Opportunity> {
        self.opportunities
            .iter()
            .filter(move |opportunity| opportunity.involves(slug))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SynergyEngine {
    graph: SynergyGraph,
    index: TermIndex,
    config: EngineConfig,
}

impl SynergyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graph(&self) -> &SynergyGraph {
        &self.graph
    }

    pub fn index(&self) -> &TermIndex {
        &self.index
    }

    /// Atomic bulk upsert followed by an index rebuild.
    pub fn register_companies<I>(&mut self, profiles: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = CompanyProfile>,
    {
        let slugs = self.graph.ingest(profiles)?;
        self.rebuild_index();
        Ok(slugs)
    }

    pub fn register_company(&mut self, profile: CompanyProfile) -> Result<String> {
        let slug = self.graph.upsert_company(profile)?;
        self.rebuild_index();
        Ok(slug)
    }

    pub fn remove_company(&mut self, slug: &str) -> Result<CompanyProfile> {
        let removed = self.graph.remove_company(slug)?;
        self.rebuild_index();
        Ok(removed)
    }

    pub fn profile(&self, slug: &str) -> Result<&CompanyProfile> {
        self.graph.company(slug)
    }

    fn rebuild_index(&mut self) {
        self.index = TermIndex::build(self.graph.companies());
        debug!(companies = self.graph.len(), "rebuilt term index");
    }

    /// Deduplicated company pairs, highest score first. Fewer than two
    /// companies yield an empty list.
    pub fn find_complementary_pairs(&self) -> Result<Vec<ComplementaryPair>> {
        if self.graph.len() < 2 {
            return Ok(Vec::new());
        }
        let matches = pairs::collect_matches(&self.graph, &self.index, &self.config.scoring)?;
        Ok(pairs::group_pairs(matches))
    }

    /// Pair opportunities in final ranking order.
    pub fn build_opportunities(&self, pairs: &[ComplementaryPair]) -> Result<Vec<Opportunity>> {
        let mut opportunities = OpportunityBuilder::new(&self.graph, &self.config).build(pairs)?;
        opportunities.sort_by(Opportunity::ranking_cmp);
        Ok(opportunities)
    }

    pub fn compose_triads(&self, pairs: &[ComplementaryPair]) -> Result<Vec<Opportunity>> {
        if pairs.len() < 2 {
            return Ok(Vec::new());
        }
        let pair_opportunities = OpportunityBuilder::new(&self.graph, &self.config).build(pairs)?;
        triads::compose(&pair_opportunities, &self.graph, &self.config)
    }

    /// Deterministic priority class for an opportunity's score, impact and
    /// confidence.
    pub fn priority_scoring(&self, opportunity: &Opportunity) -> Priority {
        opportunities::priority_for(
            opportunity.score,
            opportunity.impact,
            opportunity.confidence,
            &self.config.priority,
        )
    }

    /// Full run: pairs, relinked graph edges, triads and ranked opportunities.
    pub fn analyze(&mut self) -> Result<AnalysisRun> {
        self.rebuild_index();
        let pairs = self.find_complementary_pairs()?;
        self.relink(&pairs)?;

        let builder = OpportunityBuilder::new(&self.graph, &self.config);
        let mut opportunities = builder.build(&pairs)?;
        let triads = triads::compose(&opportunities, &self.graph, &self.config)?;
        opportunities.extend(triads);
        opportunities.sort_by(Opportunity::ranking_cmp);

        let run = AnalysisRun {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            pairs,
            opportunities,
            groups: None,
        };
        info!(
            run_id = %run.run_id,
            companies = self.graph.len(),
            pairs = run.pairs.len(),
            edges = self.graph.edge_count(),
            opportunities = run.opportunities.len(),
            "synergy analysis complete"
        );
        Ok(run)
    }

    /// [`Self::analyze`] plus tier grouping of the registered companies.
    pub fn analyze_with_tiers(&mut self, library: &ProfileTemplateLibrary) -> Result<AnalysisRun> {
        let mut run = self.analyze()?;
        run.groups = Some(library.group_companies(self.graph.companies()));
        Ok(run)
    }

    fn relink(&mut self, pairs: &[ComplementaryPair]) -> Result<()> {
        self.graph.clear_edges();
        for found in pairs.iter().flat_map(ComplementaryPair::matches) {
            let spec = LinkSpec::new(found.need.clone(), found.offer.clone(), found.raw_score)
                .labeled(found.description.clone())
                .with_channels(found.engagement_channels.clone());
            self.graph.link(&found.seeker, &found.provider, spec)?;
        }
        debug!(edges = self.graph.edge_count(), "relinked synergy graph");
        Ok(())
    }
}
