use crate::{
    agent::{AgentBehavior, AgentError, AgentType, PromptParts},
    output_parser::{AgentOutputParser, ReActOutputParser, FINAL_ANSWER_ACTION},
    template::SCRATCHPAD_VARIABLE,
    tools::ToolRegistry,
};

use super::prompt::{FORMAT_INSTRUCTIONS, PREFIX, SUFFIX};

pub const FINAL_ANSWER_TOOL: &str = "Final Answer";

/// Single question answering over tools, ending with `Final Answer:`.
///
/// It has no fix-up, so unparsable output ends the run with a parse error.
#[derive(Debug, Clone, Default)]
pub struct QaAgent {
    parser: ReActOutputParser,
}

impl QaAgent {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AgentBehavior for QaAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::Qa
    }

    fn finish_tool_name(&self) -> &str {
        FINAL_ANSWER_TOOL
    }

    fn finish_marker(&self) -> &str {
        FINAL_ANSWER_ACTION
    }

    fn output_parser(&self) -> &dyn AgentOutputParser {
        &self.parser
    }

    fn default_prompt_parts(&self) -> PromptParts {
        PromptParts::new(
            PREFIX,
            FORMAT_INSTRUCTIONS,
            SUFFIX,
            ["input", SCRATCHPAD_VARIABLE],
        )
    }

    fn validate_tools(&self, tools: &ToolRegistry) -> Result<(), AgentError> {
        for tool in tools.iter() {
            if tool.description().trim().is_empty() {
                return Err(AgentError::ToolValidation(format!(
                    "Got a tool {} without a description. For this agent, a description must always be provided.",
                    tool.name()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::{
        output_parser::ParsedOutput,
        schemas::{AgentAction, AgentStep},
        tools::{Calculator, Tool, ToolError},
    };

    use super::*;

    struct Undocumented;

    #[async_trait]
    impl Tool for Undocumented {
        fn name(&self) -> String {
            "Mystery".into()
        }

        fn description(&self) -> String {
            "  ".into()
        }

        fn run(&self, input: &str) -> Result<String, ToolError> {
            Ok(input.into())
        }
    }

    #[test]
    fn test_create_prompt() {
        let agent = QaAgent::new();
        let tools = ToolRegistry::new([Calculator::default().into_shared()]).unwrap();
        let prompt = agent
            .create_prompt(&tools, &agent.default_prompt_parts())
            .unwrap();

        assert!(prompt.template().starts_with(PREFIX));
        assert!(prompt.template().contains(
            "\n\nCalculator: Useful for when you need to answer questions about math"
        ));
        assert!(prompt
            .template()
            .contains("should be one of [Calculator]"));
        assert!(prompt.template().ends_with("Thought:{agent_scratchpad}"));
        assert_eq!(prompt.input_variables(), ["input", "agent_scratchpad"]);
    }

    struct JsonLookup;

    #[async_trait]
    impl Tool for JsonLookup {
        fn name(&self) -> String {
            "Lookup".into()
        }

        fn description(&self) -> String {
            r#"Input is JSON like {"q": {"k": 1}}. Echoes {input} back."#.into()
        }

        fn run(&self, input: &str) -> Result<String, ToolError> {
            Ok(input.into())
        }
    }

    #[test]
    fn test_braces_in_description_render_verbatim() {
        let agent = QaAgent::new();
        let tools = ToolRegistry::new([JsonLookup.into_shared()]).unwrap();
        let parts = agent
            .default_prompt_parts()
            .with_prefix("Answer with {{\"answer\": ...}} when done.");
        let prompt = agent.create_prompt(&tools, &parts).unwrap();

        let rendered = prompt
            .format(&crate::text_replacements! {
                "input" => "USERQ",
                "agent_scratchpad" => "",
            })
            .unwrap();

        assert!(rendered.contains(r#"Lookup: Input is JSON like {"q": {"k": 1}}. Echoes {input} back."#));
        assert!(rendered.starts_with(r#"Answer with {"answer": ...} when done."#));
        assert!(rendered.contains("Question: USERQ"));
        assert_eq!(rendered.matches("USERQ").count(), 1);
    }

    #[test]
    fn test_custom_suffix_without_scratchpad_is_repaired() {
        let agent = QaAgent::new();
        let tools = ToolRegistry::new([Calculator::default().into_shared()]).unwrap();
        let parts = agent
            .default_prompt_parts()
            .with_suffix("Question: {input}")
            .with_input_variables(["input"]);
        let prompt = agent.create_prompt(&tools, &parts).unwrap();

        assert!(prompt.template().ends_with("Question: {input}\n{agent_scratchpad}"));
        assert!(prompt.has_variable(SCRATCHPAD_VARIABLE));
    }

    #[test]
    fn test_rejects_tool_without_description() {
        let agent = QaAgent::new();
        let tools = ToolRegistry::new([Arc::new(Undocumented) as Arc<dyn Tool>]).unwrap();

        assert!(matches!(
            agent.validate_tools(&tools),
            Err(AgentError::ToolValidation(_))
        ));
    }

    #[test]
    fn test_no_fix_text() {
        assert_eq!(QaAgent::new().fix_text("garbage"), None);
    }

    #[test]
    fn test_stop_words_and_scratchpad() {
        let agent = QaAgent::new();
        assert_eq!(agent.stop_words(), vec!["\nObservation:", "\n\tObservation:"]);

        let steps = vec![AgentStep::new(
            AgentAction::new("Calculator", "2+2", " I should add.\nAction: Calculator\nAction Input: 2+2"),
            "4",
        )];
        assert_eq!(
            agent.construct_scratchpad(&steps),
            " I should add.\nAction: Calculator\nAction Input: 2+2\nObservation: 4\nThought:"
        );
    }

    #[test]
    fn test_extract_finish() {
        let agent = QaAgent::new();
        assert_eq!(
            agent
                .extract_action("I now know the final answer\nFinal Answer: 4")
                .unwrap(),
            ParsedOutput::Finish("4".into())
        );
    }
}
