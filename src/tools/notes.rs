//! Note tools for candidates and applications.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::adapter::HarvestTool;
use crate::harvest::models::{Note, read_as};
use crate::harvest::{HarvestApi, HarvestError, NoteRequest, Visibility};
use crate::tool::ToolContext;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddCandidateNoteArgs {
    /// ID of the candidate
    pub candidate_id: u64,
    /// The note content
    pub note: String,
    /// Note visibility (admin_only, private, or public)
    #[serde(default)]
    pub visibility: Visibility,
}

pub struct AddNoteToCandidate;

#[async_trait]
impl HarvestTool for AddNoteToCandidate {
    type Args = AddCandidateNoteArgs;

    fn name(&self) -> &'static str {
        "add_note_to_candidate"
    }

    fn description(&self) -> &'static str {
        "Add a note to a candidate's activity feed. Returns the created note object."
    }

    async fn call(
        &self,
        api: &dyn HarvestApi,
        args: AddCandidateNoteArgs,
        ctx: &ToolContext,
    ) -> Result<Value, HarvestError> {
        let note = NoteRequest::new(args.note, args.visibility);
        let created = api.add_note_to_candidate(args.candidate_id, note).await?;
        let visibility = read_as::<Note>(&created).map_or(args.visibility, |n| n.visibility);
        ctx.info(format!("Added {} note to candidate {}", visibility, args.candidate_id));
        Ok(created)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddApplicationNoteArgs {
    /// ID of the application
    pub application_id: u64,
    /// The note content
    pub note: String,
    /// Note visibility (admin_only, private, or public)
    #[serde(default)]
    pub visibility: Visibility,
}

pub struct AddNoteToApplication;

#[async_trait]
impl HarvestTool for AddNoteToApplication {
    type Args = AddApplicationNoteArgs;

    fn name(&self) -> &'static str {
        "add_note_to_application"
    }

    fn description(&self) -> &'static str {
        "Add a note to an application. Returns the created note object."
    }

    async fn call(
        &self,
        api: &dyn HarvestApi,
        args: AddApplicationNoteArgs,
        ctx: &ToolContext,
    ) -> Result<Value, HarvestError> {
        let note = NoteRequest::new(args.note, args.visibility);
        let created = api.add_note_to_application(args.application_id, note).await?;
        let visibility = read_as::<Note>(&created).map_or(args.visibility, |n| n.visibility);
        ctx.info(format!("Added {} note to application {}", visibility, args.application_id));
        Ok(created)
    }
}
