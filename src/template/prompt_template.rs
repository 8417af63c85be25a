use std::{collections::HashSet, sync::LazyLock};

use regex::{Captures, Regex};

use crate::{schemas::TextReplacements, template::TemplateError};

/// Name of the variable that receives the agent's prior thoughts and observations.
pub const SCRATCHPAD_VARIABLE: &str = "agent_scratchpad";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{|\}\}|\{(\w+)\}").expect("Static regex is valid"));

/// A text prompt with `{variable}` placeholders.
///
/// `{{` and `}}` render as literal braces. Substitution is single pass, so values
/// containing placeholder syntax are inserted as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
    input_variables: Vec<String>,
}

impl PromptTemplate {
    pub fn new<S: Into<String>>(
        template: impl Into<String>,
        input_variables: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            template: template.into(),
            input_variables: input_variables.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a template whose input variables are every placeholder found in the text,
    /// in order of first appearance.
    pub fn from_template(template: impl Into<String>) -> Self {
        let template = template.into();
        let mut seen = HashSet::new();
        let input_variables = placeholders_in(&template)
            .into_iter()
            .filter(|v| seen.insert(v.clone()))
            .collect();
        Self {
            template,
            input_variables,
        }
    }

    /// Escapes braces so `text` renders verbatim when inserted into a template.
    pub fn escape(text: &str) -> String {
        text.replace('{', "{{").replace('}', "}}")
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn input_variables(&self) -> &[String] {
        &self.input_variables
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.input_variables.iter().any(|v| v == name)
    }

    /// Placeholders that actually appear in the template text.
    pub fn placeholders(&self) -> HashSet<String> {
        placeholders_in(&self.template).into_iter().collect()
    }

    /// Makes sure the scratchpad variable is part of the template, appending it on a
    /// new line when it is missing.
    pub fn ensure_scratchpad(mut self) -> Self {
        let declared = self.has_variable(SCRATCHPAD_VARIABLE);
        let rendered = self.placeholders().contains(SCRATCHPAD_VARIABLE);
        if declared && rendered {
            return self;
        }

        log::warn!(
            "`{SCRATCHPAD_VARIABLE}` should be a variable in the prompt. Did not find it, so adding it at the end."
        );
        if !declared {
            self.input_variables.push(SCRATCHPAD_VARIABLE.into());
        }
        if !rendered {
            self.template.push_str(&format!("\n{{{SCRATCHPAD_VARIABLE}}}"));
        }
        self
    }

    /// Substitutes `input` into the template.
    ///
    /// Every declared input variable must be present. Placeholders that are neither
    /// declared nor supplied are left untouched.
    pub fn format(&self, input: &TextReplacements) -> Result<String, TemplateError> {
        self.validate_input(input)?;

        let rendered = PLACEHOLDER_RE.replace_all(&self.template, |caps: &Captures| {
            match caps.get(1) {
                Some(name) => match input.get(name.as_str()) {
                    Some(value) => value.clone(),
                    None => caps[0].to_string(),
                },
                None if &caps[0] == "{{" => "{".to_string(),
                None => "}".to_string(),
            }
        });

        Ok(rendered.into_owned())
    }

    pub fn validate_input(&self, input: &TextReplacements) -> Result<(), TemplateError> {
        let missing_variables = self
            .input_variables
            .iter()
            .filter(|v| !input.contains_key(v.as_str()))
            .cloned()
            .collect::<Vec<_>>();

        if !missing_variables.is_empty() {
            return Err(TemplateError::MissingVariable(missing_variables.join(", ")));
        }

        Ok(())
    }
}

fn placeholders_in(template: &str) -> Vec<String> {
    PLACEHOLDER_RE
        .captures_iter(template)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect()
}
