pub mod client;
pub mod http;
pub mod models;
pub mod rate_limit;
pub mod request;

pub use client::{HarvestApi, HarvestClientBuilder, HarvestError};
pub use http::HarvestClient;
pub use rate_limit::{RateLimitConfig, RateLimiter, RetryPolicy};
pub use request::{
    AdvanceRequest, ApplicationQuery, ApplicationStatus, CandidatePayload, CandidateQuery,
    ContactType, ContactValue, JobQuery, JobStageQuery, JobStatus, NoteRequest, Pagination,
    QueryParams, RejectRequest, UserQuery, Visibility,
};

#[cfg(test)]
pub use client::MockHarvestApi;
