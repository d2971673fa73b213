mod repair;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::MalformedOutput;

pub use repair::RepairStep;

pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tier", content = "repair", rename_all = "snake_case")]
pub enum ExtractionTier {
    Direct,
    Braced,
    Repaired(RepairStep),
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: Record,
    pub tier: ExtractionTier,
}

#[derive(Debug)]
pub struct Extractor {
    fence: Regex,
}

impl Extractor {
    pub fn new() -> Result<Self> {
        let fence = Regex::new(r"(?s)^```[A-Za-z0-9_+\-]*[ \t]*\r?\n?(.*?)\s*```$")
            .context("failed to compile code fence regex")?;
        Ok(Self { fence })
    }

    pub fn extract(&self, raw: &str) -> Result<Extraction, MalformedOutput> {
        let unfenced = self.strip_fence(raw);

        let original_error = match parse_record(unfenced) {
            Ok(record) => {
                return Ok(Extraction {
                    record,
                    tier: ExtractionTier::Direct,
                });
            }
            Err(err) => err,
        };

        let candidate = match braced_span(unfenced) {
            Some(span) => {
                if let Ok(record) = parse_record(span) {
                    return Ok(Extraction {
                        record,
                        tier: ExtractionTier::Braced,
                    });
                }
                span
            }
            None => unfenced,
        };

        let mut repaired = candidate.to_string();
        for step in RepairStep::SEQUENCE {
            repaired = step.apply(&repaired);
            match parse_record(&repaired) {
                Ok(record) => {
                    debug!(repair = step.as_str(), "provider output parsed after repair");
                    return Ok(Extraction {
                        record,
                        tier: ExtractionTier::Repaired(step),
                    });
                }
                Err(err) => debug!(repair = step.as_str(), error = %err, "repair did not help"),
            }
        }

        Err(MalformedOutput {
            parse_error: original_error,
            text: raw.to_string(),
        })
    }

    /// Removes a surrounding code fence only when both markers are present.
    fn strip_fence<'a>(&self, raw: &'a str) -> &'a str {
        let trimmed = raw.trim();
        if trimmed.len() < 6 || !trimmed.starts_with("```") || !trimmed.ends_with("```") {
            return trimmed;
        }

        self.fence
            .captures(trimmed)
            .and_then(|captures| captures.get(1))
            .map(|body| body.as_str().trim())
            .unwrap_or(trimmed)
    }
}

fn parse_record(text: &str) -> Result<Record, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(other) => Err(format!("top-level value is {}, not an object", value_kind(&other))),
        Err(err) => Err(err.to_string()),
    }
}

fn braced_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
