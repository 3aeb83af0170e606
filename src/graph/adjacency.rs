use serde::Serialize;

use super::SynergyGraph;

/// Square weight matrix over the graph's node order. Parallel edges sum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjacencyMatrix {
    pub slugs: Vec<String>,
    pub weights: Vec<Vec<f64>>,
}

impl AdjacencyMatrix {
    pub(super) fn from_graph(graph: &SynergyGraph) -> Self {
        let slugs: Vec<String> = graph.slugs().map(str::to_string).collect();
        let mut weights = vec![vec![0.0; slugs.len()]; slugs.len()];
        for edge in graph.edges() {
            let (Some(row), Some(col)) = (
                slugs.binary_search(&edge.source).ok(),
                slugs.binary_search(&edge.target).ok(),
            ) else {
                continue;
            };
            weights[row][col] += edge.weight;
        }
        Self { slugs, weights }
    }

    pub fn dimension(&self) -> usize {
        self.slugs.len()
    }

    pub fn weight(&self, source: &str, target: &str) -> Option<f64> {
        let row = self.position(source)?;
        let col = self.position(target)?;
        Some(self.weights[row][col])
    }

    fn position(&self, slug: &str) -> Option<usize> {
        self.slugs.binary_search_by(|candidate| candidate.as_str().cmp(slug)).ok()
    }
}
