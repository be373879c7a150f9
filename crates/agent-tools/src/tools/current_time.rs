//! Current date and time tool.

use async_trait::async_trait;
use chrono::{FixedOffset, Utc};

use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolOutput};

const TRIGGER_PHRASES: &[&str] = &[
    "what time",
    "current time",
    "time is it",
    "today's date",
    "todays date",
    "what day",
    "what's the date",
    "what is the date",
];

/// Reports the current date and time.
///
/// # Parameters
///
/// - `utc_offset` (optional, default: 0): Offset from UTC in hours, e.g. `-5`.
pub struct CurrentTime;

impl CurrentTime {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CurrentTime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CurrentTime {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Reports the current date and time, in UTC or at a fixed UTC offset."
    }

    fn trigger(&self, text: &str) -> Option<ToolArgs> {
        let lowered = text.to_lowercase();
        TRIGGER_PHRASES
            .iter()
            .any(|phrase| lowered.contains(phrase))
            .then(ToolArgs::default)
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let hours = args.get_number_opt("utc_offset")?.unwrap_or(0.0);
        let offset = FixedOffset::east_opt((hours * 3600.0) as i32).ok_or_else(|| {
            ToolError::InvalidParameter {
                name: "utc_offset".to_string(),
                reason: format!("{} hours is out of range", hours),
            }
        })?;

        let now = Utc::now().with_timezone(&offset);
        Ok(ToolOutput::success(format!(
            "Current time: {} (UTC{})",
            now.format("%A, %B %-d, %Y %H:%M"),
            offset
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger() {
        let tool = CurrentTime::new();
        assert!(tool.trigger("Hey, what time is it?").is_some());
        assert!(tool.trigger("What's the date today").is_some());
        assert!(tool.trigger("I need a website").is_none());
    }

    #[tokio::test]
    async fn test_execute_utc() {
        let output = CurrentTime::new()
            .execute(ToolArgs::default())
            .await
            .unwrap();
        assert!(output.success);
        assert!(output.content.ends_with("(UTC+00:00)"));
    }

    #[tokio::test]
    async fn test_execute_offset() {
        let args = ToolArgs::default().with("utc_offset", serde_json::json!(-5));
        let output = CurrentTime::new().execute(args).await.unwrap();
        assert!(output.content.ends_with("(UTC-05:00)"));

        let args = ToolArgs::default().with("utc_offset", serde_json::json!(48));
        assert!(CurrentTime::new().execute(args).await.is_err());
    }
}
