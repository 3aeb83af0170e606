//! Executive-ready renderings of an analysis run.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::matching::opportunities::channel_list;
use crate::models::{CompanyProfile, Opportunity};

pub const DEFAULT_SUMMARY_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSection {
    pub title: String,
    pub body: String,
}

/// Formats opportunities for dashboards, documents or slide decks.
#[derive(Debug, Clone)]
pub struct OpportunityReport<'a> {
    opportunities: &'a [Opportunity],
}

impl<'a> OpportunityReport<'a> {
    pub fn new(opportunities: &'a [Opportunity]) -> Self {
        Self { opportunities }
    }

    /// Headline list of the first `limit` opportunities.
    pub fn executive_summary(&self, limit: usize) -> String {
        let mut lines = vec!["Top synergy opportunities:".to_string()];
        if self.opportunities.is_empty() {
            lines.push("- none found".to_string());
        }
        for opportunity in self.opportunities.iter().take(limit) {
            lines.push(format!(
                "- {} ({}, score {:.2}): {}",
                opportunity.name, opportunity.priority, opportunity.score, opportunity.summary
            ));
        }
        lines.join("\n")
    }

    pub fn detail_sections(&self) -> Vec<ReportSection> {
        self.opportunities.iter().map(detail_section).collect()
    }

    pub fn highlight_company(company: &CompanyProfile) -> ReportSection {
        let or_na = |items: Vec<String>| {
            if items.is_empty() {
                "n/a".to_string()
            } else {
                items.join(", ")
            }
        };
        let mut body_lines = Vec::new();
        if let Some(description) = &company.description {
            body_lines.push(description.clone());
        }
        body_lines.push(format!(
            "Mission: {}",
            company.mission.as_deref().unwrap_or("n/a")
        ));
        body_lines.push(format!(
            "Region: {}",
            company.effective_region().unwrap_or("n/a")
        ));
        body_lines.push(format!(
            "Key capabilities: {}",
            or_na(company.capabilities.iter().cloned().collect())
        ));
        body_lines.push(format!("Plugin points: {}", or_na(company.plugin_points())));
        body_lines.push(format!("Plugs: {}", or_na(company.plugs())));
        ReportSection {
            title: company.name.clone(),
            body: body_lines.join("\n"),
        }
    }

    /// Summary followed by every detail section, as Markdown.
    pub fn render_markdown(&self, limit: usize) -> String {
        let mut out = String::from("# Synergy report\n\n");
        out.push_str(&self.executive_summary(limit));
        out.push('\n');
        for section in self.detail_sections() {
            out.push_str(&format!("\n## {}\n\n{}\n", section.title, section.body));
        }
        out
    }

    /// Writes [`Self::render_markdown`] to `path`, creating parent
    /// directories.
    pub fn write_markdown(&self, path: &Path, limit: usize) -> Result<PathBuf> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render_markdown(limit))
            .with_context(|| format!("Failed to write report {:?}", path))?;
        Ok(path.to_path_buf())
    }
}

fn detail_section(opportunity: &Opportunity) -> ReportSection {
    let breakdown = &opportunity.breakdown;
    let mut body_lines = vec![
        format!("Participants: {}", opportunity.participants.join(", ")),
        format!("Priority: {}", opportunity.priority),
        format!(
            "Score {:.2} | impact {:.2} | confidence {:.2}",
            opportunity.score, opportunity.impact, opportunity.confidence
        ),
        format!(
            "Engagement channels: {}",
            channel_list(&breakdown.engagement_channels)
        ),
        format!("Alignment: {}", breakdown.alignment),
    ];
    push_bullets(&mut body_lines, "Resources:", &breakdown.resources);
    push_bullets(&mut body_lines, "Risks:", &breakdown.risks);
    push_bullets(&mut body_lines, "Rationale:", &breakdown.rationale);
    push_bullets(
        &mut body_lines,
        "Expected outcomes:",
        &opportunity.expected_outcomes,
    );
    ReportSection {
        title: opportunity.name.clone(),
        body: body_lines.join("\n"),
    }
}

fn push_bullets(lines: &mut Vec<String>, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    lines.push(heading.to_string());
    lines.extend(items.iter().map(|item| format!("  - {item}")));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::SynergyEngine;
    use crate::models::{Level, Need, Offer};
    use tempfile::TempDir;

    fn opportunities() -> Vec<Opportunity> {
        let mut engine = SynergyEngine::new();
        engine
            .register_companies(vec![
                CompanyProfile::new("Aqua Reach")
                    .with_need(Need::new("Power storage", Level::High).tagged(["energy"])),
                CompanyProfile::new("Grid Wise")
                    .with_offer(Offer::new("Microgrid analytics", Level::Med).tagged(["energy"])),
            ])
            .unwrap();
        engine.analyze().unwrap().opportunities
    }

    #[test]
    fn summary_lists_top_opportunities() {
        let opportunities = opportunities();
        let report = OpportunityReport::new(&opportunities);
        let summary = report.executive_summary(DEFAULT_SUMMARY_LIMIT);
        assert!(summary.starts_with("Top synergy opportunities:"));
        assert!(summary.contains("Aqua Reach & Grid Wise strategic lane"));
        assert_eq!(summary.lines().count(), 2);
        assert!(OpportunityReport::new(&[]).executive_summary(3).contains("none found"));
    }

    #[test]
    fn detail_sections_cover_breakdown() {
        let opportunities = opportunities();
        let sections = OpportunityReport::new(&opportunities).detail_sections();
        assert_eq!(sections.len(), 1);
        let body = &sections[0].body;
        assert!(body.contains("Participants: aqua-reach, grid-wise"));
        assert!(body.contains("Alignment: Need 'Power storage' aligns with offer 'Microgrid analytics'"));
        assert!(body.contains("Risks:"));
        assert!(body.contains("Expected outcomes:"));
    }

    #[test]
    fn highlight_marks_missing_fields() {
        let section = OpportunityReport::highlight_company(&CompanyProfile::new("Bare"));
        assert_eq!(section.title, "Bare");
        assert!(section.body.contains("Mission: n/a"));
        assert!(section.body.contains("Plugs: n/a"));
    }

    #[test]
    fn markdown_is_written_to_disk() {
        let opportunities = opportunities();
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out").join("report.md");
        OpportunityReport::new(&opportunities)
            .write_markdown(&path, 5)
            .unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Synergy report"));
        assert!(written.contains("## Aqua Reach & Grid Wise strategic lane"));
    }
}
