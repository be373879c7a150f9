//! Calculator tool for safe math expression evaluation.

use async_trait::async_trait;
use tracing::debug;

use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// Characters that may appear in an inline arithmetic expression.
const EXPRESSION_CHARS: &str = "0123456789.+-*/^() ";

/// Binary operators the trigger looks for.
const OPERATORS: &str = "+-*/^";

/// Find the longest arithmetic expression embedded in a message.
///
/// A run of digits and operators qualifies if it contains at least one
/// operator. Dash-only runs without spaces ("555-1234", "2024-01-01") are
/// phone numbers or dates, not subtraction.
fn extract_expression(text: &str) -> Option<String> {
    let mut best: Option<&str> = None;

    for run in text.split(|c: char| !EXPRESSION_CHARS.contains(c)) {
        let candidate = run.trim();
        if !candidate.chars().any(|c| c.is_ascii_digit()) {
            continue;
        }

        let operators: Vec<char> = candidate.chars().filter(|c| OPERATORS.contains(*c)).collect();
        if operators.is_empty() {
            continue;
        }
        if operators.iter().all(|c| *c == '-') && !candidate.contains(' ') {
            continue;
        }
        // Must start and end on an operand
        let operand = |c: char| c.is_ascii_digit() || c == '(' || c == ')';
        if !candidate.starts_with(operand) || !candidate.ends_with(operand) {
            continue;
        }

        if best.map_or(true, |b| candidate.len() > b.len()) {
            best = Some(candidate);
        }
    }

    best.map(str::to_string)
}

/// Calculator tool that safely evaluates mathematical expressions.
///
/// Uses the `meval` crate for parsing and evaluation, which only supports
/// mathematical operations (no code execution, no side effects).
///
/// # Parameters
///
/// - `expression` (required): The mathematical expression to evaluate.
///
/// # Examples
///
/// ```json
/// {"expression": "2 + 2 * 3"}
/// {"expression": "sqrt(16) + sin(3.14159/2)"}
/// {"expression": "(10 - 5) / 2"}
/// ```
///
/// Triggers on messages containing an inline expression such as
/// "what is 15 * 4 + 2?".
pub struct Calculator;

impl Calculator {
    /// Create a new calculator tool.
    pub fn new() -> Self {
        Self
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for Calculator {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluates mathematical expressions safely. Supports basic arithmetic, \
         trigonometric functions (sin, cos, tan), logarithms (ln, log), \
         powers (^), roots (sqrt), and constants (pi, e)."
    }

    fn trigger(&self, text: &str) -> Option<ToolArgs> {
        extract_expression(text).map(|expression| ToolArgs::single("expression", expression))
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let expression = args.get_string("expression")?;

        debug!("Evaluating expression: {}", expression);

        // Use meval for safe expression evaluation
        match meval::eval_str(&expression) {
            Ok(result) => {
                // Format the result nicely
                let formatted = if result.fract() == 0.0 && result.abs() < 1e15 {
                    // Integer-like result
                    format!("{:.0}", result)
                } else {
                    // Floating point result
                    format!("{}", result)
                };

                debug!("Result: {}", formatted);
                Ok(ToolOutput::success(format!("{} = {}", expression, formatted)))
            }
            Err(e) => {
                debug!("Evaluation error: {}", e);
                Err(ToolError::EvalError(format!(
                    "Failed to evaluate '{}': {}",
                    expression, e
                )))
            }
        }
    }
}
