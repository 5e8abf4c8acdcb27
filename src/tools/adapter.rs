use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use schemars::r#gen::SchemaSettings;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::harvest::{HarvestApi, HarvestError};
use crate::tool::{DynTool, Tool, ToolContext, ToolError, ToolResult};

/// A Harvest operation with typed arguments.
///
/// The argument type's JSON Schema, including field doc comments and serde
/// defaults, is what the caller sees as the tool's parameters.
#[async_trait]
pub trait HarvestTool: Send + Sync + 'static {
    type Args: DeserializeOwned + JsonSchema + Send;

    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;

    async fn call(
        &self,
        api: &dyn HarvestApi,
        args: Self::Args,
        ctx: &ToolContext,
    ) -> Result<Value, HarvestError>;
}

/// Adapter that exposes a `HarvestTool` as a `Tool`.
pub struct HarvestToolAdapter<T> {
    api: Arc<dyn HarvestApi>,
    tool: T,
    schema: Value,
}

impl<T: HarvestTool> HarvestToolAdapter<T> {
    /// Creates a new adapter bound to `api`.
    pub fn new(api: Arc<dyn HarvestApi>, tool: T) -> Self {
        Self {
            api,
            tool,
            schema: input_schema::<T::Args>(),
        }
    }

    /// Boxes the adapter for registration.
    pub fn boxed(api: Arc<dyn HarvestApi>, tool: T) -> DynTool {
        Arc::new(Self::new(api, tool))
    }
}

impl<T: HarvestTool> std::fmt::Debug for HarvestToolAdapter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HarvestToolAdapter")
            .field("tool", &self.tool.name())
            .finish()
    }
}

#[async_trait]
impl<T: HarvestTool> Tool for HarvestToolAdapter<T> {
    fn name(&self) -> &str {
        self.tool.name()
    }

    fn description(&self) -> &str {
        self.tool.description()
    }

    fn parameters_schema(&self) -> Value {
        self.schema.clone()
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        // Callers may omit `arguments` entirely for tools without required
        // parameters.
        let args = if args.is_null() { json!({}) } else { args };
        let args: T::Args = serde_json::from_value(args)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        match self.tool.call(self.api.as_ref(), args, ctx).await {
            Ok(value) => Ok(ToolResult::json(value)),
            Err(e) => {
                ctx.error(format!("{} failed: {}", self.tool.name(), e));
                Err(ToolError::Harvest(e))
            }
        }
    }
}

/// JSON Schema for a tool's argument type, inlined and without the
/// `$schema`/`title` keys.
pub fn input_schema<A: JsonSchema>() -> Value {
    let generator = SchemaSettings::draft07()
        .with(|settings| {
            settings.inline_subschemas = true;
            settings.option_add_null_type = false;
        })
        .into_generator();
    let schema = generator.into_root_schema_for::<A>();

    let mut value = serde_json::to_value(schema).unwrap_or_else(|_| json!({"type": "object"}));
    if let Some(object) = value.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
        object.remove("definitions");
    }
    value
}

/// Shared defaults for list arguments.
pub(crate) fn default_per_page() -> u32 {
    50
}

pub(crate) fn default_page() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::MockHarvestApi;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct EchoArgs {
        /// The ID of the job to retrieve
        job_id: u64,
        /// Page number to retrieve
        #[serde(default = "default_page")]
        page: u32,
    }

    struct Echo;

    #[async_trait]
    impl HarvestTool for Echo {
        type Args = EchoArgs;

        fn name(&self) -> &'static str {
            "echo"
        }

        fn description(&self) -> &'static str {
            "Echo a job"
        }

        async fn call(
            &self,
            api: &dyn HarvestApi,
            args: EchoArgs,
            ctx: &ToolContext,
        ) -> Result<Value, HarvestError> {
            let job = api.get_job(args.job_id).await?;
            ctx.info(format!("Echoed job {} (page {})", args.job_id, args.page));
            Ok(job)
        }
    }

    #[test]
    fn test_schema_carries_descriptions_defaults_and_required() {
        let schema = input_schema::<EchoArgs>();

        assert_eq!(schema["type"], "object");
        assert_eq!(
            schema["properties"]["job_id"]["description"],
            "The ID of the job to retrieve"
        );
        assert_eq!(schema["properties"]["page"]["default"], 1);
        assert_eq!(schema["required"], json!(["job_id"]));
        assert!(schema.get("$schema").is_none());
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_rejected_before_calling_api() {
        let mut api = MockHarvestApi::new();
        api.expect_get_job().never();
        let tool = HarvestToolAdapter::new(Arc::new(api), Echo);

        let err = tool
            .execute(json!({"job_id": "seven"}), &ToolContext::detached("echo"))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn test_api_errors_are_logged_and_propagated_unchanged() {
        let mut api = MockHarvestApi::new();
        api.expect_get_job().returning(|_| {
            Err(HarvestError::Api {
                status: 404,
                body: r#"{"message":"Resource not found"}"#.to_string(),
            })
        });
        let tool = HarvestToolAdapter::new(Arc::new(api), Echo);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let ctx = ToolContext::with_sink("echo", tx);

        let err = tool.execute(json!({"job_id": 7}), &ctx).await.unwrap_err();

        match err {
            ToolError::Harvest(HarvestError::Api { status, body }) => {
                assert_eq!(status, 404);
                assert!(body.contains("Resource not found"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        let event = rx.try_recv().unwrap();
        assert_eq!(event.level, crate::tool::LogLevel::Error);
        assert!(event.message.starts_with("echo failed"));
    }

    #[tokio::test]
    async fn test_success_keeps_structured_output() {
        let mut api = MockHarvestApi::new();
        api.expect_get_job()
            .withf(|job_id| *job_id == 7)
            .returning(|_| Ok(json!({"id": 7, "name": "Engineer"})));
        let tool = HarvestToolAdapter::new(Arc::new(api), Echo);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let result = tool
            .execute(json!({"job_id": 7}), &ToolContext::with_sink("echo", tx))
            .await
            .unwrap();

        assert_eq!(result.structured, Some(json!({"id": 7, "name": "Engineer"})));
        assert!(result.output.contains("Engineer"));
        assert_eq!(rx.try_recv().unwrap().message, "Echoed job 7 (page 1)");
    }
}
