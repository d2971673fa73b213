//! Requirement-level judgments as providers report them.
//!
//! Providers are prompted for the Chinese field names below, but replies
//! drift: identifiers arrive as numbers or numeric strings, clause lists as
//! objects or bare sentences, notes as strings or lists. Deserialization here
//! is lenient about shape and strict about nothing else.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DETAILED_ANALYSIS_KEYS: [&str; 2] = ["详细分析", "detailed_analysis"];
pub const FINDINGS_KEYS: [&str; 2] = ["关键发现", "key_findings"];
pub const RECOMMENDATIONS_KEYS: [&str; 3] = ["合规建议", "recommendations", "compliance_recommendations"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoverageLevel {
    #[serde(rename = "完全覆盖")]
    Full,
    #[serde(rename = "部分覆盖")]
    Partial,
    #[serde(rename = "未覆盖")]
    NotCovered,
    #[serde(rename = "未提及")]
    NotMentioned,
    #[serde(rename = "不适用")]
    NotApplicable,
}

impl CoverageLevel {
    pub const ALL: [CoverageLevel; 5] = [
        Self::Full,
        Self::Partial,
        Self::NotCovered,
        Self::NotMentioned,
        Self::NotApplicable,
    ];

    pub fn rank(self) -> u8 {
        match self {
            Self::Full => 3,
            Self::Partial => 2,
            Self::NotCovered => 1,
            Self::NotMentioned | Self::NotApplicable => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "完全覆盖",
            Self::Partial => "部分覆盖",
            Self::NotCovered => "未覆盖",
            Self::NotMentioned => "未提及",
            Self::NotApplicable => "不适用",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        if let Some(level) = Self::ALL.into_iter().find(|level| level.as_str() == trimmed) {
            return Some(level);
        }

        let folded = trimmed
            .to_ascii_lowercase()
            .replace([' ', '-'], "_");
        match folded.as_str() {
            "fully_covered" | "full" | "covered" => Some(Self::Full),
            "partially_covered" | "partial" => Some(Self::Partial),
            "not_covered" | "uncovered" => Some(Self::NotCovered),
            "not_mentioned" => Some(Self::NotMentioned),
            "not_applicable" | "n/a" => Some(Self::NotApplicable),
            _ => None,
        }
    }
}

impl fmt::Display for CoverageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClauseEvidence {
    #[serde(rename = "条款编号", alias = "section", default, deserialize_with = "lenient_text")]
    pub clause_no: String,
    #[serde(rename = "具体要求", default, deserialize_with = "lenient_text")]
    pub requirement: String,
    #[serde(rename = "强制等级", default, deserialize_with = "lenient_text")]
    pub mandatory_level: String,
    #[serde(rename = "适用对象", default, deserialize_with = "lenient_text")]
    pub subjects: String,
    #[serde(rename = "原文内容", alias = "sentence", default, deserialize_with = "lenient_text")]
    pub original_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAnalysisItem {
    #[serde(
        rename = "框架要求编号",
        alias = "requirement_number",
        alias = "要求编号",
        default,
        deserialize_with = "lenient_label_id"
    )]
    pub requirement_id: Option<u32>,
    #[serde(
        rename = "框架要求名称",
        alias = "requirement_name",
        alias = "要求名称",
        default,
        deserialize_with = "lenient_optional_text"
    )]
    pub requirement_name: Option<String>,
    #[serde(
        rename = "法规覆盖情况",
        alias = "coverage_level",
        default,
        deserialize_with = "lenient_optional_text"
    )]
    pub coverage: Option<String>,
    #[serde(
        rename = "法规要求内容",
        alias = "relevant_sentences",
        default,
        deserialize_with = "lenient_clauses"
    )]
    pub clauses: Vec<ClauseEvidence>,
    #[serde(rename = "实施要求", default, deserialize_with = "lenient_text")]
    pub implementation: String,
    #[serde(rename = "处罚措施", default, deserialize_with = "lenient_text")]
    pub penalty: String,
}

impl RawAnalysisItem {
    pub fn coverage_level(&self) -> Option<CoverageLevel> {
        self.coverage.as_deref().and_then(CoverageLevel::parse)
    }

    pub fn label(&self) -> String {
        match (self.requirement_id, self.requirement_name.as_deref()) {
            (Some(id), Some(name)) => format!("{id}. {name}"),
            (Some(id), None) => id.to_string(),
            (None, Some(name)) => name.to_string(),
            (None, None) => "<unlabeled>".to_string(),
        }
    }
}

/// Flattens a JSON value into display text. Lists are joined with `；`.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.trim().to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(values) => values
            .iter()
            .map(value_to_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<String>>()
            .join("；"),
        Value::Object(_) => value.to_string(),
    }
}

/// Reads a free-text list field: a list of strings, or one string.
pub fn value_to_text_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(values) => values
            .iter()
            .map(value_to_text)
            .filter(|text| !text.is_empty())
            .collect(),
        other => {
            let text = value_to_text(other);
            if text.is_empty() { Vec::new() } else { vec![text] }
        }
    }
}

pub fn parse_label_id(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => {
            if let Some(id) = number.as_u64() {
                return u32::try_from(id).ok();
            }
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0 && *float >= 0.0 && *float <= f64::from(u32::MAX))
                .map(|float| float as u32)
        }
        Value::String(text) => text.trim().parse::<u32>().ok(),
        _ => None,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(&value))
}

fn lenient_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let text = value_to_text(&value);
    Ok(if text.is_empty() { None } else { Some(text) })
}

fn lenient_label_id<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_label_id(&value))
}

fn lenient_clauses<'de, D>(deserializer: D) -> Result<Vec<ClauseEvidence>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let entries = match value {
        Value::Array(values) => values,
        Value::Null => Vec::new(),
        other => vec![other],
    };

    Ok(entries.into_iter().filter_map(clause_from_value).collect())
}

fn clause_from_value(value: Value) -> Option<ClauseEvidence> {
    match value {
        Value::Object(_) => serde_json::from_value(value).ok(),
        Value::Null => None,
        other => {
            let text = value_to_text(&other);
            if text.is_empty() {
                return None;
            }
            Some(ClauseEvidence {
                original_text: text,
                ..ClauseEvidence::default()
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn coverage_ranks_follow_conflict_order() {
        assert_eq!(CoverageLevel::NotMentioned.rank(), 0);
        assert_eq!(CoverageLevel::NotApplicable.rank(), 0);
        assert_eq!(CoverageLevel::NotCovered.rank(), 1);
        assert_eq!(CoverageLevel::Partial.rank(), 2);
        assert_eq!(CoverageLevel::Full.rank(), 3);
    }

    #[test]
    fn coverage_parse_accepts_chinese_and_english_labels() {
        assert_eq!(CoverageLevel::parse(" 部分覆盖 "), Some(CoverageLevel::Partial));
        assert_eq!(CoverageLevel::parse("Fully Covered"), Some(CoverageLevel::Full));
        assert_eq!(CoverageLevel::parse("not-applicable"), Some(CoverageLevel::NotApplicable));
        assert_eq!(CoverageLevel::parse("高"), None);
        assert_eq!(
            serde_json::to_string(&CoverageLevel::NotCovered).expect("serialize"),
            "\"未覆盖\""
        );
    }

    #[test]
    fn item_deserializes_chinese_field_names() {
        let item: RawAnalysisItem = serde_json::from_value(json!({
            "框架要求编号": "7",
            "框架要求名称": "风险识别评估与分级管理办法",
            "法规覆盖情况": "部分覆盖",
            "法规要求内容": [
                {"条款编号": "第十条", "具体要求": "开展国别风险评估", "强制等级": "强制"}
            ],
            "实施要求": "建立风险清单",
            "处罚措施": "未明确"
        }))
        .expect("item should deserialize");

        assert_eq!(item.requirement_id, Some(7));
        assert_eq!(item.coverage_level(), Some(CoverageLevel::Partial));
        assert_eq!(item.clauses.len(), 1);
        assert_eq!(item.clauses[0].clause_no, "第十条");
        assert_eq!(item.clauses[0].mandatory_level, "强制");
        assert_eq!(item.penalty, "未明确");
    }

    #[test]
    fn item_deserializes_english_field_names_and_sentences() {
        let item: RawAnalysisItem = serde_json::from_value(json!({
            "requirement_number": 13.0,
            "requirement_name": "反腐败与反贿赂政策",
            "coverage_level": "完全覆盖",
            "relevant_sentences": ["企业不得行贿", ""],
            "sections": ["第五条"]
        }))
        .expect("item should deserialize");

        assert_eq!(item.requirement_id, Some(13));
        assert_eq!(item.clauses.len(), 1);
        assert_eq!(item.clauses[0].original_text, "企业不得行贿");
        assert!(item.implementation.is_empty());
    }

    #[test]
    fn non_numeric_identifier_is_treated_as_missing() {
        let item: RawAnalysisItem = serde_json::from_value(json!({
            "框架要求编号": "七",
            "框架要求名称": "",
            "法规覆盖情况": null
        }))
        .expect("item should deserialize");

        assert_eq!(item.requirement_id, None);
        assert_eq!(item.requirement_name, None);
        assert_eq!(item.coverage_level(), None);
        assert_eq!(item.label(), "<unlabeled>");
    }

    #[test]
    fn text_list_accepts_single_string_and_nested_values() {
        assert_eq!(value_to_text_list(&json!("单条")), vec!["单条".to_string()]);
        assert_eq!(
            value_to_text_list(&json!(["甲", " ", ["乙", "丙"]])),
            vec!["甲".to_string(), "乙；丙".to_string()]
        );
        assert!(value_to_text_list(&Value::Null).is_empty());
    }
}
