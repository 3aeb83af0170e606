pub mod api;
pub mod config;
pub mod error;
pub mod graph;
pub mod matching;
pub mod models;
pub mod reports;
pub mod templates;

// Re-export commonly used types for convenience.
pub use api::dataset::{DatasetPayload, GraphService, OpportunityFilter, OpportunityStatus};
pub use api::{analyze, AnalyzeRequest, AnalyzeResponse};
pub use config::EngineConfig;
pub use error::{ErrorCategory, Result, SynergyError};
pub use graph::SynergyGraph;
pub use matching::{AnalysisRun, SynergyEngine};
pub use models::{CompanyProfile, Opportunity, Priority};
pub use reports::OpportunityReport;
pub use templates::ProfileTemplateLibrary;
