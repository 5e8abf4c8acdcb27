//! Expected shapes of Harvest records.
//!
//! The client forwards raw JSON; these types are only read back to describe
//! a response (names, counts) and never replace what the caller receives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::request::{ContactValue, Visibility};

/// Nested record the client does not interpret.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub departments: Vec<Record>,
    #[serde(default)]
    pub offices: Vec<Record>,
    pub created_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub requisition_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: u64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub company: Option<String>,
    pub title: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub email_addresses: Vec<ContactValue>,
    #[serde(default)]
    pub phone_numbers: Vec<ContactValue>,
    #[serde(default)]
    pub addresses: Vec<Record>,
    #[serde(default)]
    pub applications: Vec<Record>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_fields: Record,
}

impl Candidate {
    /// "First Last", or `None` when both parts are blank.
    pub fn full_name(&self) -> Option<String> {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}

/// Pipeline stage reference embedded in an application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRef {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: u64,
    pub candidate_id: Option<u64>,
    #[serde(default)]
    pub prospect: bool,
    pub applied_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub source: Option<Record>,
    pub credited_to: Option<Record>,
    pub rejection_reason: Option<Record>,
    pub rejection_details: Option<Record>,
    #[serde(default)]
    pub jobs: Vec<Record>,
    pub job_post_id: Option<u64>,
    #[serde(default)]
    pub status: String,
    pub current_stage: Option<StageRef>,
    #[serde(default)]
    pub answers: Vec<Record>,
    #[serde(default)]
    pub custom_fields: Record,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub body: String,
    #[serde(default)]
    pub visibility: Visibility,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interview {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub estimated_minutes: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStage {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub job_id: Option<u64>,
    #[serde(default)]
    pub interviews: Vec<Interview>,
}

/// Reads `value` as `T`, or `None` if it does not have that shape.
pub fn read_as<T: serde::de::DeserializeOwned>(value: &Value) -> Option<T> {
    T::deserialize(value).ok()
}

/// Number of records in a list response; 0 for anything that is not a list.
pub fn record_count(value: &Value) -> usize {
    value.as_array().map_or(0, Vec::len)
}
