use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use super::{AgentOutputParser, OutputParseError, ParsedOutput};

pub const FINAL_ANSWER_ACTION: &str = "Final Answer:";

const ACTION_PATTERN: &str = r"Action: (.*?)[\n]*Action Input: (.*)";

static MULTILINE_ACTION_RE: LazyLock<Regex> = LazyLock::new(|| action_regex(true));
static SINGLE_LINE_ACTION_RE: LazyLock<Regex> = LazyLock::new(|| action_regex(false));

fn action_regex(dot_matches_new_line: bool) -> Regex {
    RegexBuilder::new(ACTION_PATTERN)
        .dot_matches_new_line(dot_matches_new_line)
        .build()
        .expect("Static regex is valid")
}

/// Parser for the `Action: <tool>` / `Action Input: <input>` text protocol.
///
/// The finish marker is checked first: when present anywhere, everything after its last
/// occurrence is the final answer, even if an action block appears earlier.
#[derive(Debug, Clone)]
pub struct ReActOutputParser {
    finish_marker: String,
    action_re: &'static Regex,
}

impl ReActOutputParser {
    /// `multiline_input` lets `.` match newlines, so the action input runs to the end of
    /// the text instead of the end of its line.
    pub fn new(finish_marker: impl Into<String>, multiline_input: bool) -> Self {
        let action_re = if multiline_input {
            &*MULTILINE_ACTION_RE
        } else {
            &*SINGLE_LINE_ACTION_RE
        };

        Self {
            finish_marker: finish_marker.into(),
            action_re,
        }
    }

    pub fn finish_marker(&self) -> &str {
        &self.finish_marker
    }
}

impl Default for ReActOutputParser {
    fn default() -> Self {
        Self::new(FINAL_ANSWER_ACTION, true)
    }
}

impl AgentOutputParser for ReActOutputParser {
    fn parse(&self, text: &str) -> Result<ParsedOutput, OutputParseError> {
        if !self.finish_marker.is_empty() {
            if let Some(idx) = text.rfind(&self.finish_marker) {
                let answer = &text[idx + self.finish_marker.len()..];
                return Ok(ParsedOutput::Finish(answer.trim().to_string()));
            }
        }

        let caps = self
            .action_re
            .captures(text)
            .ok_or_else(|| OutputParseError::NoMatch(text.to_string()))?;

        let tool = caps.get(1).map_or("", |m| m.as_str()).trim();
        let tool_input = caps.get(2).map_or("", |m| m.as_str());

        Ok(ParsedOutput::Action {
            tool: tool.to_string(),
            tool_input: strip_quotes(tool_input.trim()).to_string(),
        })
    }
}

/// Removes one pair of surrounding double quotes.
fn strip_quotes(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}
