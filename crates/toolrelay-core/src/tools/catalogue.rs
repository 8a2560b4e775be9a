//! Flattened per-turn view of every provider's tools

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Tool;
use super::naming::qualify;

/// One tool of one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub provider_id: String,
    pub local_name: String,
    /// `provider_id` + `_` + `local_name`
    pub qualified_name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn new(provider_id: impl Into<String>, tool: Tool) -> Self {
        let provider_id = provider_id.into();
        Self {
            qualified_name: qualify(&provider_id, &tool.name),
            provider_id,
            local_name: tool.name,
            description: tool.description,
            input_schema: tool
                .input_schema
                .unwrap_or_else(|| serde_json::json!({"type": "object", "properties": {}})),
        }
    }

    /// The catalogue entry the model sees
    pub fn to_model_tool(&self) -> Tool {
        Tool {
            name: self.qualified_name.clone(),
            description: format!("[{}] {}", self.provider_id, self.description),
            input_schema: Some(self.input_schema.clone()),
        }
    }
}

/// Tool names of one connected provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderTools {
    pub provider_id: String,
    pub tool_names: Vec<String>,
}

/// Descriptors plus a structured route for every qualified name
#[derive(Debug, Clone, Default)]
pub struct ToolCatalogue {
    descriptors: Vec<ToolDescriptor>,
    routes: HashMap<String, usize>,
}

impl ToolCatalogue {
    /// The first descriptor with a given qualified name wins
    pub fn from_descriptors(descriptors: Vec<ToolDescriptor>) -> Self {
        let mut routes = HashMap::with_capacity(descriptors.len());
        for (index, descriptor) in descriptors.iter().enumerate() {
            routes.entry(descriptor.qualified_name.clone()).or_insert(index);
        }
        Self { descriptors, routes }
    }

    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, qualified_name: &str) -> Option<&ToolDescriptor> {
        self.routes.get(qualified_name).map(|&i| &self.descriptors[i])
    }

    /// (provider_id, local_name) for a qualified name
    pub fn route(&self, qualified_name: &str) -> Option<(&str, &str)> {
        self.get(qualified_name)
            .map(|d| (d.provider_id.as_str(), d.local_name.as_str()))
    }

    pub fn model_tools(&self) -> Vec<Tool> {
        self.descriptors.iter().map(ToolDescriptor::to_model_tool).collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
