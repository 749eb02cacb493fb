//! Helpers shared by the tool definitions.

use std::num::NonZeroUsize;

use rmcp::{handler::server::tool::cached_schema_for_type, model::Tool};
use schemars::JsonSchema;

/// Build the Tool model (metadata) for a tool with params type `P`.
pub fn tool_model<P>(name: &'static str, description: &'static str) -> Tool
where
    P: JsonSchema + std::any::Any,
{
    Tool {
        name: name.into(),
        description: Some(description.into()),
        input_schema: cached_schema_for_type::<P>(),
        annotations: None,
        output_schema: None,
        icons: None,
        meta: None,
        title: None,
    }
}

/// Default sample size.
pub fn default_sample_limit() -> NonZeroUsize {
    NonZeroUsize::MIN
}
