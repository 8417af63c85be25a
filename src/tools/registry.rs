use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::Arc,
};

use super::{Tool, ToolError};

/// Name-to-tool mapping used for dispatch, kept in registration order for prompts.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Result<Self, ToolError> {
        let mut registry = Self::default();
        for tool in tools {
            let name = tool.name();
            if registry.index.contains_key(&name) {
                return Err(ToolError::DuplicateName(name));
            }
            registry.index.insert(name, registry.tools.len());
            registry.tools.push(tool);
        }
        Ok(registry)
    }

    pub fn lookup(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// `name: description` lines, one per tool.
    pub fn descriptions(&self) -> String {
        self.tools
            .iter()
            .map(|tool| tool.to_plain_description())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Checks that `allowed` names exactly this set of tools, ignoring order.
    pub fn check_allowed(&self, allowed: &[String]) -> Result<(), ToolError> {
        let allowed_set = allowed.iter().map(String::as_str).collect::<HashSet<_>>();
        let provided_set = self.index.keys().map(String::as_str).collect::<HashSet<_>>();

        if allowed_set != provided_set {
            return Err(ToolError::NotAllowed {
                allowed: allowed.to_vec(),
                provided: self.names(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
