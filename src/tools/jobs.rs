//! Job and job stage tools.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::adapter::{HarvestTool, default_page, default_per_page};
use crate::harvest::models::{Job, JobStage, read_as, record_count};
use crate::harvest::{HarvestApi, HarvestError, JobQuery, JobStageQuery, JobStatus, Pagination};
use crate::tool::ToolContext;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListJobsArgs {
    /// Number of results per page (max 500)
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Page number to retrieve
    #[serde(default = "default_page")]
    pub page: u32,
    /// Filter by job status (open, closed, draft)
    pub status: Option<JobStatus>,
    /// ISO 8601 date to filter jobs created after
    pub created_after: Option<String>,
    /// ISO 8601 date to filter jobs created before
    pub created_before: Option<String>,
}

pub struct ListJobs;

#[async_trait]
impl HarvestTool for ListJobs {
    type Args = ListJobsArgs;

    fn name(&self) -> &'static str {
        "list_jobs"
    }

    fn description(&self) -> &'static str {
        "List all jobs in Greenhouse. Returns a list of job objects."
    }

    async fn call(
        &self,
        api: &dyn HarvestApi,
        args: ListJobsArgs,
        ctx: &ToolContext,
    ) -> Result<Value, HarvestError> {
        let query = JobQuery {
            pagination: Pagination::new(args.per_page, args.page),
            created_before: args.created_before,
            created_after: args.created_after,
            status: args.status,
        };
        let jobs = api.list_jobs(query).await?;
        ctx.info(format!("Retrieved {} jobs", record_count(&jobs)));
        Ok(jobs)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetJobArgs {
    /// The ID of the job to retrieve
    pub job_id: u64,
}

pub struct GetJob;

#[async_trait]
impl HarvestTool for GetJob {
    type Args = GetJobArgs;

    fn name(&self) -> &'static str {
        "get_job"
    }

    fn description(&self) -> &'static str {
        "Get detailed information about a specific job."
    }

    async fn call(
        &self,
        api: &dyn HarvestApi,
        args: GetJobArgs,
        ctx: &ToolContext,
    ) -> Result<Value, HarvestError> {
        let job = api.get_job(args.job_id).await?;
        let name = read_as::<Job>(&job).map(|job| job.name);
        ctx.info(format!(
            "Retrieved job: {}",
            name.as_deref().filter(|n| !n.is_empty()).unwrap_or("Unknown")
        ));
        Ok(job)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListJobStagesArgs {
    /// Number of results per page (max 500)
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Page number to retrieve
    #[serde(default = "default_page")]
    pub page: u32,
    /// Filter by job ID to get stages for a specific job
    pub job_id: Option<u64>,
    /// ISO 8601 date to filter stages created after
    pub created_after: Option<String>,
    /// ISO 8601 date to filter stages created before
    pub created_before: Option<String>,
}

pub struct ListJobStages;

#[async_trait]
impl HarvestTool for ListJobStages {
    type Args = ListJobStagesArgs;

    fn name(&self) -> &'static str {
        "list_job_stages"
    }

    fn description(&self) -> &'static str {
        "List hiring pipeline stages across all jobs, or for a single job when job_id is given. \
         Returns job stage objects with id, name and job_id."
    }

    async fn call(
        &self,
        api: &dyn HarvestApi,
        args: ListJobStagesArgs,
        ctx: &ToolContext,
    ) -> Result<Value, HarvestError> {
        let query = JobStageQuery {
            pagination: Pagination::new(args.per_page, args.page),
            job_id: args.job_id,
            created_before: args.created_before,
            created_after: args.created_after,
        };
        let stages = api.list_job_stages(query).await?;
        ctx.info(format!("Retrieved {} job stages", record_count(&stages)));
        Ok(stages)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetJobStageArgs {
    /// The job stage ID, e.g. `current_stage.id` of an application
    pub job_stage_id: u64,
}

pub struct GetJobStage;

#[async_trait]
impl HarvestTool for GetJobStage {
    type Args = GetJobStageArgs;

    fn name(&self) -> &'static str {
        "get_job_stage"
    }

    fn description(&self) -> &'static str {
        "Get a job stage by ID, including its interviews array (id, name, estimated_minutes). \
         Use get_application to find current_stage.id, then this tool to see which \
         interviews that stage requires."
    }

    async fn call(
        &self,
        api: &dyn HarvestApi,
        args: GetJobStageArgs,
        ctx: &ToolContext,
    ) -> Result<Value, HarvestError> {
        let stage = api.get_job_stage(args.job_stage_id).await?;
        match read_as::<JobStage>(&stage) {
            Some(parsed) => ctx.info(format!(
                "Retrieved job stage: {} ({} interviews)",
                parsed.name,
                parsed.interviews.len()
            )),
            None => ctx.info("Retrieved job stage: Unknown (0 interviews)"),
        }
        Ok(stage)
    }
}
