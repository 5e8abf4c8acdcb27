//! Typed query and body builders for Harvest endpoints.
//!
//! Queries render into `(key, value)` pairs that always carry pagination and
//! only carry a filter once it has been set. Bodies skip unset fields when
//! serialized.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Query string pairs in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(&'static str, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair unconditionally.
    pub fn push(mut self, key: &'static str, value: impl ToString) -> Self {
        self.0.push((key, value.to_string()));
        self
    }

    /// Appends a pair only when a non-empty value is present.
    pub fn push_opt<V: ToString>(self, key: &'static str, value: Option<V>) -> Self {
        match value.map(|v| v.to_string()) {
            Some(value) if !value.is_empty() => self.push(key, value),
            _ => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn as_slice(&self) -> &[(&'static str, String)] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Page selection shared by every list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub per_page: u32,
    pub page: u32,
}

impl Pagination {
    pub fn new(per_page: u32, page: u32) -> Self {
        Self { per_page, page }
    }

    pub fn to_query(self) -> QueryParams {
        QueryParams::new()
            .push("per_page", self.per_page)
            .push("page", self.page)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            per_page: 50,
            page: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Open,
    Closed,
    Draft,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            JobStatus::Open => "open",
            JobStatus::Closed => "closed",
            JobStatus::Draft => "draft",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Active,
    Converted,
    Hired,
    Rejected,
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ApplicationStatus::Active => "active",
            ApplicationStatus::Converted => "converted",
            ApplicationStatus::Hired => "hired",
            ApplicationStatus::Rejected => "rejected",
        })
    }
}

/// Filters for `GET jobs`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobQuery {
    pub pagination: Pagination,
    pub created_before: Option<String>,
    pub created_after: Option<String>,
    pub status: Option<JobStatus>,
}

impl JobQuery {
    pub fn new(pagination: Pagination) -> Self {
        Self {
            pagination,
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_created_after(mut self, timestamp: impl Into<String>) -> Self {
        self.created_after = Some(timestamp.into());
        self
    }

    pub fn with_created_before(mut self, timestamp: impl Into<String>) -> Self {
        self.created_before = Some(timestamp.into());
        self
    }

    pub fn to_query(&self) -> QueryParams {
        self.pagination
            .to_query()
            .push_opt("created_before", self.created_before.as_deref())
            .push_opt("created_after", self.created_after.as_deref())
            .push_opt("status", self.status)
    }
}

/// Filters for `GET job_stages` and `GET jobs/{id}/stages`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobStageQuery {
    pub pagination: Pagination,
    pub job_id: Option<u64>,
    pub created_before: Option<String>,
    pub created_after: Option<String>,
}

impl JobStageQuery {
    pub fn new(pagination: Pagination) -> Self {
        Self {
            pagination,
            ..Self::default()
        }
    }

    pub fn for_job(mut self, job_id: u64) -> Self {
        self.job_id = Some(job_id);
        self
    }

    /// Endpoint path; scoped to the job when one is set.
    pub fn endpoint(&self) -> String {
        match self.job_id {
            Some(job_id) => format!("jobs/{}/stages", job_id),
            None => "job_stages".to_string(),
        }
    }

    pub fn to_query(&self) -> QueryParams {
        self.pagination
            .to_query()
            .push_opt("created_before", self.created_before.as_deref())
            .push_opt("created_after", self.created_after.as_deref())
    }
}

/// Filters for `GET candidates`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateQuery {
    pub pagination: Pagination,
    pub created_before: Option<String>,
    pub created_after: Option<String>,
    pub email: Option<String>,
    pub candidate_ids: Vec<u64>,
}

impl CandidateQuery {
    pub fn new(pagination: Pagination) -> Self {
        Self {
            pagination,
            ..Self::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_candidate_ids(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.candidate_ids = ids.into_iter().collect();
        self
    }

    pub fn to_query(&self) -> QueryParams {
        let ids = (!self.candidate_ids.is_empty()).then(|| {
            self.candidate_ids
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(",")
        });

        self.pagination
            .to_query()
            .push_opt("created_before", self.created_before.as_deref())
            .push_opt("created_after", self.created_after.as_deref())
            .push_opt("email", self.email.as_deref())
            .push_opt("candidate_ids", ids)
    }
}

/// Filters for `GET applications`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationQuery {
    pub pagination: Pagination,
    pub created_before: Option<String>,
    pub created_after: Option<String>,
    pub job_id: Option<u64>,
    pub candidate_id: Option<u64>,
    pub status: Option<ApplicationStatus>,
}

impl ApplicationQuery {
    pub fn new(pagination: Pagination) -> Self {
        Self {
            pagination,
            ..Self::default()
        }
    }

    pub fn for_job(mut self, job_id: u64) -> Self {
        self.job_id = Some(job_id);
        self
    }

    pub fn for_candidate(mut self, candidate_id: u64) -> Self {
        self.candidate_id = Some(candidate_id);
        self
    }

    pub fn with_status(mut self, status: ApplicationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn to_query(&self) -> QueryParams {
        self.pagination
            .to_query()
            .push_opt("created_before", self.created_before.as_deref())
            .push_opt("created_after", self.created_after.as_deref())
            .push_opt("job_id", self.job_id)
            .push_opt("candidate_id", self.candidate_id)
            .push_opt("status", self.status)
    }
}

/// Filters for `GET users`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserQuery {
    pub pagination: Pagination,
    pub email: Option<String>,
}

impl UserQuery {
    pub fn new(pagination: Pagination) -> Self {
        Self {
            pagination,
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn to_query(&self) -> QueryParams {
        self.pagination
            .to_query()
            .push_opt("email", self.email.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactType {
    Personal,
    Work,
    Home,
    Mobile,
    Skype,
    Other,
}

/// An email address or phone number as Harvest nests them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactValue {
    pub value: String,
    #[serde(rename = "type")]
    pub kind: ContactType,
}

impl ContactValue {
    pub fn new(value: impl Into<String>, kind: ContactType) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }
}

/// Body for `POST candidates` and `PATCH candidates/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CandidatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_addresses: Option<Vec<ContactValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_numbers: Option<Vec<ContactValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl CandidatePayload {
    /// Payload for a new candidate; first and last name are mandatory there.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            ..Self::default()
        }
    }

    pub fn first_name(mut self, first_name: Option<String>) -> Self {
        self.first_name = non_empty(first_name).or(self.first_name);
        self
    }

    pub fn last_name(mut self, last_name: Option<String>) -> Self {
        self.last_name = non_empty(last_name).or(self.last_name);
        self
    }

    pub fn company(mut self, company: Option<String>) -> Self {
        self.company = non_empty(company);
        self
    }

    pub fn title(mut self, title: Option<String>) -> Self {
        self.title = non_empty(title);
        self
    }

    /// Sets a single personal email address.
    pub fn email(mut self, email: Option<String>) -> Self {
        self.email_addresses =
            non_empty(email).map(|email| vec![ContactValue::new(email, ContactType::Personal)]);
        self
    }

    /// Sets a single mobile phone number.
    pub fn phone(mut self, phone: Option<String>) -> Self {
        self.phone_numbers =
            non_empty(phone).map(|phone| vec![ContactValue::new(phone, ContactType::Mobile)]);
        self
    }

    pub fn tags(mut self, tags: Option<Vec<String>>) -> Self {
        self.tags = tags.filter(|tags| !tags.is_empty());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Body for `POST applications/{id}/advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdvanceRequest {
    pub from_stage_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_stage_id: Option<u64>,
}

impl AdvanceRequest {
    pub fn new(from_stage_id: u64) -> Self {
        Self {
            from_stage_id,
            to_stage_id: None,
        }
    }

    pub fn to_stage(mut self, to_stage_id: Option<u64>) -> Self {
        self.to_stage_id = to_stage_id;
        self
    }
}

/// Template to send with a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RejectionEmail {
    pub email_template_id: u64,
}

/// Body for `POST applications/{id}/reject`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RejectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_email: Option<RejectionEmail>,
}

impl RejectRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reason(mut self, rejection_reason_id: Option<u64>) -> Self {
        self.rejection_reason_id = rejection_reason_id;
        self
    }

    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = non_empty(notes);
        self
    }

    pub fn email_template(mut self, email_template_id: Option<u64>) -> Self {
        self.rejection_email = email_template_id.map(|email_template_id| RejectionEmail {
            email_template_id,
        });
        self
    }
}

/// Who can see a note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    AdminOnly,
    #[default]
    Private,
    Public,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Visibility::AdminOnly => "admin_only",
            Visibility::Private => "private",
            Visibility::Public => "public",
        })
    }
}

/// Body for candidate and application notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteRequest {
    pub body: String,
    pub visibility: Visibility,
}

impl NoteRequest {
    pub fn new(body: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            body: body.into(),
            visibility,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_queries_always_paginate() {
        let query = JobQuery::new(Pagination::new(100, 3)).to_query();

        assert_eq!(query.get("per_page"), Some("100"));
        assert_eq!(query.get("page"), Some("3"));
        assert_eq!(query.len(), 2);
    }

    #[test]
    fn test_unset_filters_are_omitted() {
        let query = ApplicationQuery::new(Pagination::default()).for_job(7).to_query();

        assert_eq!(query.get("job_id"), Some("7"));
        for key in ["created_before", "created_after", "candidate_id", "status"] {
            assert!(!query.contains_key(key), "{} should be absent", key);
        }
    }

    #[test]
    fn test_empty_strings_are_treated_as_unset() {
        let query = UserQuery::new(Pagination::default()).with_email("").to_query();

        assert!(!query.contains_key("email"));
    }

    #[test]
    fn test_candidate_ids_are_comma_joined() {
        let query = CandidateQuery::new(Pagination::default())
            .with_candidate_ids([1, 2, 3])
            .to_query();

        assert_eq!(query.get("candidate_ids"), Some("1,2,3"));

        let empty = CandidateQuery::new(Pagination::default())
            .with_candidate_ids(Vec::new())
            .to_query();
        assert!(!empty.contains_key("candidate_ids"));
    }

    #[test]
    fn test_job_status_renders_lowercase() {
        let query = JobQuery::default().with_status(JobStatus::Draft).to_query();

        assert_eq!(query.get("status"), Some("draft"));
    }

    #[test]
    fn test_job_stage_endpoint_scopes_to_job() {
        assert_eq!(JobStageQuery::default().endpoint(), "job_stages");
        assert_eq!(JobStageQuery::default().for_job(12).endpoint(), "jobs/12/stages");
        assert!(!JobStageQuery::default().for_job(12).to_query().contains_key("job_id"));
    }

    #[test]
    fn test_candidate_payload_shapes_contacts() {
        let payload = CandidatePayload::new("Ada", "Lovelace").email(Some("a@x.com".into()));
        let body = serde_json::to_value(&payload).unwrap();

        assert_eq!(
            body,
            json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email_addresses": [{"value": "a@x.com", "type": "personal"}]
            })
        );
        assert!(body.get("phone_numbers").is_none());
    }

    #[test]
    fn test_candidate_update_payload_can_be_partial() {
        let payload = CandidatePayload::default()
            .phone(Some("555-0100".into()))
            .tags(Some(vec![]));

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"phone_numbers": [{"value": "555-0100", "type": "mobile"}]})
        );
        assert!(CandidatePayload::default().is_empty());
    }

    #[test]
    fn test_advance_request_to_stage_is_optional() {
        let body = serde_json::to_value(AdvanceRequest::new(10)).unwrap();
        assert_eq!(body, json!({"from_stage_id": 10}));

        let body = serde_json::to_value(AdvanceRequest::new(10).to_stage(Some(20))).unwrap();
        assert_eq!(body, json!({"from_stage_id": 10, "to_stage_id": 20}));
    }

    #[test]
    fn test_reject_request_includes_only_present_fields() {
        let body = serde_json::to_value(RejectRequest::new()).unwrap();
        assert_eq!(body, json!({}));

        let body = serde_json::to_value(
            RejectRequest::new()
                .reason(Some(4))
                .notes(Some("Position filled".into()))
                .email_template(Some(9)),
        )
        .unwrap();
        assert_eq!(
            body,
            json!({
                "rejection_reason_id": 4,
                "notes": "Position filled",
                "rejection_email": {"email_template_id": 9}
            })
        );
    }

    #[test]
    fn test_note_visibility_serializes_snake_case() {
        let body = serde_json::to_value(NoteRequest::new("hi", Visibility::AdminOnly)).unwrap();
        assert_eq!(body, json!({"body": "hi", "visibility": "admin_only"}));
        assert_eq!(Visibility::default(), Visibility::Private);
    }
}
