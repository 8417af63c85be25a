use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_OUTPUT_KEY: &str = "output";

/// Terminal result of an agent run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFinish {
    pub return_values: HashMap<String, String>,
    pub log: String,
}

impl AgentFinish {
    pub fn new(return_values: HashMap<String, String>, log: impl Into<String>) -> Self {
        Self {
            return_values,
            log: log.into(),
        }
    }

    /// Finish carrying a single value under `key`.
    pub fn with_output(
        key: impl Into<String>,
        output: impl Into<String>,
        log: impl Into<String>,
    ) -> Self {
        Self::new(HashMap::from([(key.into(), output.into())]), log)
    }

    pub fn output(&self) -> Option<&str> {
        self.return_values
            .get(DEFAULT_OUTPUT_KEY)
            .map(String::as_str)
    }
}
