//! Application tools, including the advance and reject workflow actions.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::adapter::{HarvestTool, default_page, default_per_page};
use crate::harvest::models::{Application, read_as, record_count};
use crate::harvest::{
    AdvanceRequest, ApplicationQuery, ApplicationStatus, HarvestApi, HarvestError, Pagination,
    RejectRequest,
};
use crate::tool::ToolContext;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListApplicationsArgs {
    /// Number of results per page (max 500)
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Page number to retrieve
    #[serde(default = "default_page")]
    pub page: u32,
    /// Filter by job ID
    pub job_id: Option<u64>,
    /// Filter by candidate ID
    pub candidate_id: Option<u64>,
    /// Filter by application status (active, converted, hired, rejected)
    pub status: Option<ApplicationStatus>,
    /// ISO 8601 date to filter applications created after
    pub created_after: Option<String>,
    /// ISO 8601 date to filter applications created before
    pub created_before: Option<String>,
}

pub struct ListApplications;

#[async_trait]
impl HarvestTool for ListApplications {
    type Args = ListApplicationsArgs;

    fn name(&self) -> &'static str {
        "list_applications"
    }

    fn description(&self) -> &'static str {
        "List applications in Greenhouse. Returns a list of application objects."
    }

    async fn call(
        &self,
        api: &dyn HarvestApi,
        args: ListApplicationsArgs,
        ctx: &ToolContext,
    ) -> Result<Value, HarvestError> {
        let query = ApplicationQuery {
            pagination: Pagination::new(args.per_page, args.page),
            created_before: args.created_before,
            created_after: args.created_after,
            job_id: args.job_id,
            candidate_id: args.candidate_id,
            status: args.status,
        };
        let applications = api.list_applications(query).await?;
        ctx.info(format!("Retrieved {} applications", record_count(&applications)));
        Ok(applications)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetApplicationArgs {
    /// The ID of the application to retrieve
    pub application_id: u64,
}

pub struct GetApplication;

#[async_trait]
impl HarvestTool for GetApplication {
    type Args = GetApplicationArgs;

    fn name(&self) -> &'static str {
        "get_application"
    }

    fn description(&self) -> &'static str {
        "Get detailed information about a specific application, including current_stage."
    }

    async fn call(
        &self,
        api: &dyn HarvestApi,
        args: GetApplicationArgs,
        ctx: &ToolContext,
    ) -> Result<Value, HarvestError> {
        let application = api.get_application(args.application_id).await?;
        match read_as::<Application>(&application).and_then(|a| a.current_stage) {
            Some(stage) => ctx.info(format!(
                "Retrieved application ID: {} (stage: {})",
                args.application_id, stage.name
            )),
            None => ctx.info(format!("Retrieved application ID: {}", args.application_id)),
        }
        Ok(application)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AdvanceApplicationArgs {
    /// ID of the application to advance
    pub application_id: u64,
    /// Current stage ID (must match the application's current stage)
    pub from_stage_id: u64,
    /// Target stage ID (if not provided, advances to the next stage)
    pub to_stage_id: Option<u64>,
}

pub struct AdvanceApplication;

#[async_trait]
impl HarvestTool for AdvanceApplication {
    type Args = AdvanceApplicationArgs;

    fn name(&self) -> &'static str {
        "advance_application"
    }

    fn description(&self) -> &'static str {
        "Advance an application to the next stage in the hiring process."
    }

    async fn call(
        &self,
        api: &dyn HarvestApi,
        args: AdvanceApplicationArgs,
        ctx: &ToolContext,
    ) -> Result<Value, HarvestError> {
        let request = AdvanceRequest::new(args.from_stage_id).to_stage(args.to_stage_id);
        let result = api.advance_application(args.application_id, request).await?;
        ctx.info(format!("Advanced application {}", args.application_id));
        Ok(result)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RejectApplicationArgs {
    /// ID of the application to reject
    pub application_id: u64,
    /// ID of the rejection reason
    pub rejection_reason_id: Option<u64>,
    /// Additional notes about the rejection
    pub notes: Option<String>,
    /// ID of the email template to send to the candidate
    pub rejection_email_id: Option<u64>,
}

pub struct RejectApplication;

#[async_trait]
impl HarvestTool for RejectApplication {
    type Args = RejectApplicationArgs;

    fn name(&self) -> &'static str {
        "reject_application"
    }

    fn description(&self) -> &'static str {
        "Reject an application, optionally with a reason, notes and a rejection email."
    }

    async fn call(
        &self,
        api: &dyn HarvestApi,
        args: RejectApplicationArgs,
        ctx: &ToolContext,
    ) -> Result<Value, HarvestError> {
        let request = RejectRequest::new()
            .reason(args.rejection_reason_id)
            .notes(args.notes)
            .email_template(args.rejection_email_id);
        let result = api.reject_application(args.application_id, request).await?;
        ctx.info(format!("Rejected application {}", args.application_id));
        Ok(result)
    }
}
