use std::{iter::Peekable, str::Chars};

use crate::tools::{Tool, ToolError};

/// Evaluates arithmetic expressions such as `(2 + 3) * 4 ^ 2`.
///
/// Supports `+ - * / %`, `^` (or `**`) for powers, unary signs and parentheses.
#[derive(Debug, Clone)]
pub struct Calculator {
    return_direct: bool,
}

impl Calculator {
    pub fn new() -> Self {
        Self {
            return_direct: false,
        }
    }

    pub fn with_return_direct(mut self, return_direct: bool) -> Self {
        self.return_direct = return_direct;
        self
    }

    pub fn evaluate(expression: &str) -> Result<f64, ToolError> {
        let mut parser = ExpressionParser {
            chars: expression.chars().peekable(),
        };
        let value = parser.expression()?;
        parser.skip_whitespace();
        if let Some(c) = parser.chars.peek() {
            return Err(ToolError::InvalidInput(format!(
                "unexpected character '{c}' in `{expression}`"
            )));
        }
        if !value.is_finite() {
            return Err(ToolError::InvalidInput(format!(
                "`{expression}` does not evaluate to a finite number"
            )));
        }
        Ok(value)
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for Calculator {
    fn name(&self) -> String {
        "Calculator".into()
    }

    fn description(&self) -> String {
        "Useful for when you need to answer questions about math. The input should be a single arithmetic expression, e.g. `(3 + 4) * 2`.".into()
    }

    fn return_direct(&self) -> bool {
        self.return_direct
    }

    fn run(&self, input: &str) -> Result<String, ToolError> {
        Calculator::evaluate(input).map(format_number)
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

struct ExpressionParser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl ExpressionParser<'_> {
    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.chars.peek().copied()
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<f64, ToolError> {
        let mut value = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek() {
            self.chars.next();
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    // term := power (('*' | '/' | '%') power)*
    fn term(&mut self) -> Result<f64, ToolError> {
        let mut value = self.power()?;
        loop {
            match self.peek() {
                Some('*') => {
                    self.chars.next();
                    if self.chars.next_if_eq(&'*').is_some() {
                        let exponent = self.power()?;
                        value = value.powf(exponent);
                    } else {
                        value *= self.power()?;
                    }
                }
                Some(op @ ('/' | '%')) => {
                    self.chars.next();
                    let rhs = self.power()?;
                    if rhs == 0.0 {
                        return Err(ToolError::InvalidInput("division by zero".into()));
                    }
                    value = if op == '/' { value / rhs } else { value % rhs };
                }
                _ => return Ok(value),
            }
        }
    }

    // power := unary ('^' power)?
    fn power(&mut self) -> Result<f64, ToolError> {
        let base = self.unary()?;
        if self.peek() == Some('^') {
            self.chars.next();
            let exponent = self.power()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn unary(&mut self) -> Result<f64, ToolError> {
        match self.peek() {
            Some('-') => {
                self.chars.next();
                Ok(-self.unary()?)
            }
            Some('+') => {
                self.chars.next();
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<f64, ToolError> {
        match self.peek() {
            Some('(') => {
                self.chars.next();
                let value = self.expression()?;
                if self.peek() != Some(')') {
                    return Err(ToolError::InvalidInput("missing closing parenthesis".into()));
                }
                self.chars.next();
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) => Err(ToolError::InvalidInput(format!("unexpected character '{c}'"))),
            None => Err(ToolError::InvalidInput("unexpected end of expression".into())),
        }
    }

    fn number(&mut self) -> Result<f64, ToolError> {
        let mut literal = String::new();
        while let Some(c) = self
            .chars
            .next_if(|c| c.is_ascii_digit() || *c == '.' || *c == '_' || *c == ',')
        {
            if c != '_' && c != ',' {
                literal.push(c);
            }
        }
        literal
            .parse::<f64>()
            .map_err(|_| ToolError::InvalidInput(format!("invalid number '{literal}'")))
    }
}
