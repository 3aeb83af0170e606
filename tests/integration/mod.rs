use std::env;
use std::path::Path;
use tempfile::TempDir;

pub struct IntegrationHarness {
    workspace: TempDir,
}

impl IntegrationHarness {
    pub fn new() -> Self {
        let workspace = TempDir::new().expect("failed to create temp workspace");
        env::set_var("SYNERGIZER_HOME", workspace.path());
        Self { workspace }
    }

    pub fn workspace_path(&self) -> &Path {
        self.workspace.path()
    }
}

mod api_requests;
mod cli_runs;
mod config_home;
mod dataset_service;
mod synergy_scenarios;
mod template_bundles;
pub mod support;
