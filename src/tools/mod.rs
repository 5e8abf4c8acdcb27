//! Harvest operations exposed as tools, one per `HarvestApi` method.

pub mod adapter;
pub mod applications;
pub mod candidates;
pub mod jobs;
pub mod notes;
pub mod organization;

use std::sync::Arc;

pub use adapter::{HarvestTool, HarvestToolAdapter, input_schema};

use crate::harvest::HarvestApi;
use crate::tool::{DynTool, ToolRegistry};

/// Every Harvest tool bound to `api`.
pub fn harvest_tools(api: Arc<dyn HarvestApi>) -> Vec<DynTool> {
    vec![
        HarvestToolAdapter::boxed(api.clone(), jobs::ListJobs),
        HarvestToolAdapter::boxed(api.clone(), jobs::GetJob),
        HarvestToolAdapter::boxed(api.clone(), jobs::ListJobStages),
        HarvestToolAdapter::boxed(api.clone(), jobs::GetJobStage),
        HarvestToolAdapter::boxed(api.clone(), candidates::ListCandidates),
        HarvestToolAdapter::boxed(api.clone(), candidates::GetCandidate),
        HarvestToolAdapter::boxed(api.clone(), candidates::CreateCandidate),
        HarvestToolAdapter::boxed(api.clone(), candidates::UpdateCandidate),
        HarvestToolAdapter::boxed(api.clone(), applications::ListApplications),
        HarvestToolAdapter::boxed(api.clone(), applications::GetApplication),
        HarvestToolAdapter::boxed(api.clone(), applications::AdvanceApplication),
        HarvestToolAdapter::boxed(api.clone(), applications::RejectApplication),
        HarvestToolAdapter::boxed(api.clone(), notes::AddNoteToCandidate),
        HarvestToolAdapter::boxed(api.clone(), notes::AddNoteToApplication),
        HarvestToolAdapter::boxed(api.clone(), organization::ListDepartments),
        HarvestToolAdapter::boxed(api.clone(), organization::ListOffices),
        HarvestToolAdapter::boxed(api, organization::ListUsers),
    ]
}

/// Builds a registry holding every Harvest tool.
pub fn registry(api: Arc<dyn HarvestApi>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for tool in harvest_tools(api) {
        registry.register(tool);
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::MockHarvestApi;

    #[test]
    fn test_every_endpoint_has_a_tool() {
        let registry = registry(Arc::new(MockHarvestApi::new()));

        assert_eq!(
            registry.names(),
            vec![
                "add_note_to_application",
                "add_note_to_candidate",
                "advance_application",
                "create_candidate",
                "get_application",
                "get_candidate",
                "get_job",
                "get_job_stage",
                "list_applications",
                "list_candidates",
                "list_departments",
                "list_job_stages",
                "list_jobs",
                "list_offices",
                "list_users",
                "reject_application",
                "update_candidate",
            ]
        );
    }

    #[test]
    fn test_every_tool_has_an_object_schema_and_description() {
        let registry = registry(Arc::new(MockHarvestApi::new()));

        for definition in registry.to_tool_definitions() {
            assert_eq!(definition.input_schema["type"], "object", "{}", definition.name);
            assert!(!definition.description.is_empty(), "{}", definition.name);
        }
    }
}
