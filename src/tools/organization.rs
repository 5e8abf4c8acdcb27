//! Departments, offices and users.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::adapter::{HarvestTool, default_page, default_per_page};
use crate::harvest::models::record_count;
use crate::harvest::{HarvestApi, HarvestError, Pagination, UserQuery};
use crate::tool::ToolContext;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PageArgs {
    /// Number of results per page
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Page number to retrieve
    #[serde(default = "default_page")]
    pub page: u32,
}

impl PageArgs {
    fn pagination(&self) -> Pagination {
        Pagination::new(self.per_page, self.page)
    }
}

pub struct ListDepartments;

#[async_trait]
impl HarvestTool for ListDepartments {
    type Args = PageArgs;

    fn name(&self) -> &'static str {
        "list_departments"
    }

    fn description(&self) -> &'static str {
        "List all departments in Greenhouse."
    }

    async fn call(
        &self,
        api: &dyn HarvestApi,
        args: PageArgs,
        ctx: &ToolContext,
    ) -> Result<Value, HarvestError> {
        let departments = api.list_departments(args.pagination()).await?;
        ctx.info(format!("Retrieved {} departments", record_count(&departments)));
        Ok(departments)
    }
}

pub struct ListOffices;

#[async_trait]
impl HarvestTool for ListOffices {
    type Args = PageArgs;

    fn name(&self) -> &'static str {
        "list_offices"
    }

    fn description(&self) -> &'static str {
        "List all offices in Greenhouse."
    }

    async fn call(
        &self,
        api: &dyn HarvestApi,
        args: PageArgs,
        ctx: &ToolContext,
    ) -> Result<Value, HarvestError> {
        let offices = api.list_offices(args.pagination()).await?;
        ctx.info(format!("Retrieved {} offices", record_count(&offices)));
        Ok(offices)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListUsersArgs {
    /// Number of results per page
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Page number to retrieve
    #[serde(default = "default_page")]
    pub page: u32,
    /// Filter by user email address
    pub email: Option<String>,
}

pub struct ListUsers;

#[async_trait]
impl HarvestTool for ListUsers {
    type Args = ListUsersArgs;

    fn name(&self) -> &'static str {
        "list_users"
    }

    fn description(&self) -> &'static str {
        "List users in Greenhouse."
    }

    async fn call(
        &self,
        api: &dyn HarvestApi,
        args: ListUsersArgs,
        ctx: &ToolContext,
    ) -> Result<Value, HarvestError> {
        let query = UserQuery {
            pagination: Pagination::new(args.per_page, args.page),
            email: args.email,
        };
        let users = api.list_users(query).await?;
        ctx.info(format!("Retrieved {} users", record_count(&users)));
        Ok(users)
    }
}
