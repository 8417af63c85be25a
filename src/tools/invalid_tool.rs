use super::{Tool, ToolError};

/// Fallback for actions naming a tool that is not registered.
///
/// Its input is the requested tool name.
pub struct InvalidTool;

impl Tool for InvalidTool {
    fn name(&self) -> String {
        "invalid_tool".into()
    }

    fn description(&self) -> String {
        "Called when tool name is invalid.".into()
    }

    fn run(&self, tool_name: &str) -> Result<String, ToolError> {
        Ok(format!("{tool_name} is not a valid tool, try another one."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_tool_observation() {
        assert_eq!(
            InvalidTool.run("Search").unwrap(),
            "Search is not a valid tool, try another one."
        );
    }
}
