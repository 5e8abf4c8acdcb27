//! Candidate tools.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::adapter::{HarvestTool, default_page, default_per_page};
use crate::harvest::models::{Candidate, read_as, record_count};
use crate::harvest::{CandidatePayload, CandidateQuery, HarvestApi, HarvestError, Pagination};
use crate::tool::ToolContext;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListCandidatesArgs {
    /// Number of results per page (max 500)
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Page number to retrieve
    #[serde(default = "default_page")]
    pub page: u32,
    /// Filter by candidate email address
    pub email: Option<String>,
    /// Specific candidate IDs to retrieve
    pub candidate_ids: Option<Vec<u64>>,
    /// ISO 8601 date to filter candidates created after
    pub created_after: Option<String>,
    /// ISO 8601 date to filter candidates created before
    pub created_before: Option<String>,
}

pub struct ListCandidates;

#[async_trait]
impl HarvestTool for ListCandidates {
    type Args = ListCandidatesArgs;

    fn name(&self) -> &'static str {
        "list_candidates"
    }

    fn description(&self) -> &'static str {
        "List candidates in Greenhouse. Returns a list of candidate objects."
    }

    async fn call(
        &self,
        api: &dyn HarvestApi,
        args: ListCandidatesArgs,
        ctx: &ToolContext,
    ) -> Result<Value, HarvestError> {
        let query = CandidateQuery {
            pagination: Pagination::new(args.per_page, args.page),
            created_before: args.created_before,
            created_after: args.created_after,
            email: args.email,
            candidate_ids: args.candidate_ids.unwrap_or_default(),
        };
        let candidates = api.list_candidates(query).await?;
        ctx.info(format!("Retrieved {} candidates", record_count(&candidates)));
        Ok(candidates)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetCandidateArgs {
    /// The ID of the candidate to retrieve
    pub candidate_id: u64,
}

pub struct GetCandidate;

#[async_trait]
impl HarvestTool for GetCandidate {
    type Args = GetCandidateArgs;

    fn name(&self) -> &'static str {
        "get_candidate"
    }

    fn description(&self) -> &'static str {
        "Get detailed information about a specific candidate."
    }

    async fn call(
        &self,
        api: &dyn HarvestApi,
        args: GetCandidateArgs,
        ctx: &ToolContext,
    ) -> Result<Value, HarvestError> {
        let candidate = api.get_candidate(args.candidate_id).await?;
        let name = read_as::<Candidate>(&candidate).and_then(|c| c.full_name());
        ctx.info(format!(
            "Retrieved candidate: {}",
            name.as_deref().unwrap_or("Unknown")
        ));
        Ok(candidate)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateCandidateArgs {
    /// Candidate's first name
    pub first_name: String,
    /// Candidate's last name
    pub last_name: String,
    /// Candidate's email address
    pub email: Option<String>,
    /// Candidate's phone number
    pub phone: Option<String>,
    /// Current company
    pub company: Option<String>,
    /// Current job title
    pub title: Option<String>,
    /// Tags to apply to the candidate
    pub tags: Option<Vec<String>>,
}

pub struct CreateCandidate;

#[async_trait]
impl HarvestTool for CreateCandidate {
    type Args = CreateCandidateArgs;

    fn name(&self) -> &'static str {
        "create_candidate"
    }

    fn description(&self) -> &'static str {
        "Create a new candidate in Greenhouse. Returns the created candidate object."
    }

    async fn call(
        &self,
        api: &dyn HarvestApi,
        args: CreateCandidateArgs,
        ctx: &ToolContext,
    ) -> Result<Value, HarvestError> {
        let display_name = format!("{} {}", args.first_name, args.last_name);
        let payload = CandidatePayload::new(args.first_name, args.last_name)
            .email(args.email)
            .phone(args.phone)
            .company(args.company)
            .title(args.title)
            .tags(args.tags);

        let candidate = api.create_candidate(payload).await?;
        ctx.info(format!("Created candidate: {}", display_name));
        Ok(candidate)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateCandidateArgs {
    /// ID of the candidate to update
    pub candidate_id: u64,
    /// Updated first name
    pub first_name: Option<String>,
    /// Updated last name
    pub last_name: Option<String>,
    /// Updated email address
    pub email: Option<String>,
    /// Updated phone number
    pub phone: Option<String>,
    /// Updated company
    pub company: Option<String>,
    /// Updated job title
    pub title: Option<String>,
    /// Updated list of tags
    pub tags: Option<Vec<String>>,
}

pub struct UpdateCandidate;

#[async_trait]
impl HarvestTool for UpdateCandidate {
    type Args = UpdateCandidateArgs;

    fn name(&self) -> &'static str {
        "update_candidate"
    }

    fn description(&self) -> &'static str {
        "Update an existing candidate in Greenhouse. Only the fields given are changed. \
         Returns the updated candidate object."
    }

    async fn call(
        &self,
        api: &dyn HarvestApi,
        args: UpdateCandidateArgs,
        ctx: &ToolContext,
    ) -> Result<Value, HarvestError> {
        let payload = CandidatePayload::default()
            .first_name(args.first_name)
            .last_name(args.last_name)
            .email(args.email)
            .phone(args.phone)
            .company(args.company)
            .title(args.title)
            .tags(args.tags);

        let candidate = api.update_candidate(args.candidate_id, payload).await?;
        ctx.info(format!("Updated candidate ID: {}", args.candidate_id));
        Ok(candidate)
    }
}
