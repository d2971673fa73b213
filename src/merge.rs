use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::analysis::{
    DETAILED_ANALYSIS_KEYS, FINDINGS_KEYS, RECOMMENDATIONS_KEYS, RawAnalysisItem,
    value_to_text_list,
};
use crate::error::MalformedOutput;
use crate::extract::{Extraction, ExtractionTier, Record};

/// Keys the run itself owns; a provider echoing them is ignored.
const RESERVED_KEYS: [&str; 7] = [
    "文档名称",
    "分析日期",
    "provider",
    "model",
    "document_name",
    "analysis_date",
    "chunks",
];

#[derive(Debug, Clone)]
pub struct ProviderRun {
    pub provider: String,
    pub model: Option<String>,
    pub document_name: String,
    pub analysis_date: String,
}

#[derive(Debug)]
pub struct ChunkOutcome {
    pub chunk: usize,
    pub source: String,
    pub result: Result<Extraction, MalformedOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub chunk: usize,
    pub source: String,
    pub merged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<ExtractionTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    Succeeded,
    Partial,
    Failed,
}

impl ProviderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidatedProviderResult {
    #[serde(default)]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub document_name: String,
    #[serde(default)]
    pub analysis_date: String,
    #[serde(default)]
    pub chunks: Vec<ChunkRecord>,
    #[serde(flatten)]
    pub merged: Record,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnreadableItem {
    pub provider: String,
    pub category: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ProviderItems {
    pub items: Vec<(String, RawAnalysisItem)>,
    pub unreadable: Vec<UnreadableItem>,
}

impl ConsolidatedProviderResult {
    pub fn chunks_merged(&self) -> usize {
        self.chunks.iter().filter(|chunk| chunk.merged).count()
    }

    pub fn chunks_failed(&self) -> usize {
        self.chunks.len() - self.chunks_merged()
    }

    pub fn status(&self) -> ProviderStatus {
        match (self.chunks_merged(), self.chunks_failed()) {
            (0, _) => ProviderStatus::Failed,
            (_, 0) => ProviderStatus::Succeeded,
            _ => ProviderStatus::Partial,
        }
    }

    /// Every item under the detailed-analysis mapping, category by category.
    pub fn analysis_items(&self) -> ProviderItems {
        let mut out = ProviderItems::default();
        let Some(Value::Object(categories)) = first_present(&self.merged, &DETAILED_ANALYSIS_KEYS)
        else {
            return out;
        };

        for (category, value) in categories {
            let entries = match value {
                Value::Array(values) => values.iter().collect::<Vec<&Value>>(),
                Value::Object(_) => vec![value],
                Value::Null => Vec::new(),
                _ => {
                    out.unreadable.push(self.unreadable(category, "category value is not a list"));
                    continue;
                }
            };

            for entry in entries {
                if !entry.is_object() {
                    out.unreadable.push(self.unreadable(category, "item is not an object"));
                    continue;
                }
                match serde_json::from_value::<RawAnalysisItem>(entry.clone()) {
                    Ok(item) => out.items.push((category.clone(), item)),
                    Err(err) => out.unreadable.push(self.unreadable(category, &err.to_string())),
                }
            }
        }

        out
    }

    pub fn findings(&self) -> Vec<String> {
        first_present(&self.merged, &FINDINGS_KEYS)
            .map(value_to_text_list)
            .unwrap_or_default()
    }

    pub fn recommendations(&self) -> Vec<String> {
        first_present(&self.merged, &RECOMMENDATIONS_KEYS)
            .map(value_to_text_list)
            .unwrap_or_default()
    }

    fn unreadable(&self, category: &str, reason: &str) -> UnreadableItem {
        UnreadableItem {
            provider: self.provider.clone(),
            category: category.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn first_present<'a>(record: &'a Record, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| record.get(*key))
}

/// Folds one provider's chunk replies into a single result. Failed chunks are
/// logged and recorded; they never stop the remaining chunks from merging.
pub fn merge_chunks(run: ProviderRun, outcomes: Vec<ChunkOutcome>) -> ConsolidatedProviderResult {
    let mut merged = Record::new();
    let mut chunks = Vec::with_capacity(outcomes.len());

    for outcome in outcomes {
        match outcome.result {
            Ok(extraction) => {
                debug!(
                    provider = %run.provider,
                    chunk = outcome.chunk,
                    keys = extraction.record.len(),
                    "merging chunk"
                );
                let mut fragment = extraction.record;
                for key in RESERVED_KEYS {
                    fragment.remove(key);
                }
                merge_record(&mut merged, fragment);
                chunks.push(ChunkRecord {
                    chunk: outcome.chunk,
                    source: outcome.source,
                    merged: true,
                    tier: Some(extraction.tier),
                    error: None,
                });
            }
            Err(err) => {
                warn!(
                    provider = %run.provider,
                    chunk = outcome.chunk,
                    source = %outcome.source,
                    error = %err,
                    excerpt = %err.excerpt(120),
                    "chunk reply unusable; treating as empty"
                );
                chunks.push(ChunkRecord {
                    chunk: outcome.chunk,
                    source: outcome.source,
                    merged: false,
                    tier: None,
                    error: Some(err.to_string()),
                });
            }
        }
    }

    ConsolidatedProviderResult {
        provider: run.provider,
        model: run.model,
        document_name: run.document_name,
        analysis_date: run.analysis_date,
        chunks,
        merged,
    }
}

/// Mappings merge by key union, sequences concatenate, anything else is
/// replaced by the incoming value. An incoming null leaves the existing value
/// in place: a chunk that reports a field as null must not erase what another
/// chunk found, so a null and a value merge to the value in either order.
/// A null still lands on a key nobody has filled yet.
pub fn merge_record(acc: &mut Record, incoming: Record) {
    for (key, value) in incoming {
        match acc.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                acc.insert(key, value);
            }
        }
    }
}

fn merge_value(acc: &mut Value, incoming: Value) {
    match (acc, incoming) {
        (_, Value::Null) => {}
        (Value::Object(existing), Value::Object(incoming)) => merge_record(existing, incoming),
        (Value::Array(existing), Value::Array(incoming)) => existing.extend(incoming),
        (slot, other) => *slot = other,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn ok(chunk: usize, value: Value) -> ChunkOutcome {
        ChunkOutcome {
            chunk,
            source: format!("chunk_{chunk}.txt"),
            result: Ok(Extraction {
                record: record(value),
                tier: ExtractionTier::Direct,
            }),
        }
    }

    fn failed(chunk: usize) -> ChunkOutcome {
        ChunkOutcome {
            chunk,
            source: format!("chunk_{chunk}.txt"),
            result: Err(MalformedOutput {
                parse_error: "expected value at line 1 column 1".to_string(),
                text: "not json".to_string(),
            }),
        }
    }

    fn run() -> ProviderRun {
        ProviderRun {
            provider: "deepseek".to_string(),
            model: Some("deepseek-chat".to_string()),
            document_name: "境外投资管理办法.txt".to_string(),
            analysis_date: "2026-10-14 09:00:00".to_string(),
        }
    }

    fn chunk_values() -> Vec<Value> {
        vec![
            json!({
                "详细分析": {"一、治理与战略": [{"框架要求编号": 1, "法规覆盖情况": "完全覆盖"}]},
                "关键发现": ["甲"],
                "文档标题": "境外投资管理办法"
            }),
            json!({
                "详细分析": {"二、全面风险管理": [{"框架要求编号": 5, "法规覆盖情况": "部分覆盖"}]},
                "关键发现": ["乙"],
                "合规建议": ["建立制度"]
            }),
            json!({
                "详细分析": {"二、全面风险管理": [{"框架要求编号": 6, "法规覆盖情况": "未覆盖"}]},
                "关键发现": null
            }),
        ]
    }

    fn sorted_items(result: &ConsolidatedProviderResult) -> Vec<(String, Option<u32>)> {
        let mut items = result
            .analysis_items()
            .items
            .into_iter()
            .map(|(category, item)| (category, item.requirement_id))
            .collect::<Vec<(String, Option<u32>)>>();
        items.sort();
        items
    }

    #[test]
    fn chunks_merge_by_union_and_concatenation() {
        let outcomes = chunk_values()
            .into_iter()
            .enumerate()
            .map(|(idx, value)| ok(idx, value))
            .collect();
        let result = merge_chunks(run(), outcomes);

        assert_eq!(result.chunks_merged(), 3);
        assert_eq!(result.status(), ProviderStatus::Succeeded);
        assert_eq!(result.findings(), vec!["甲".to_string(), "乙".to_string()]);
        assert_eq!(result.recommendations(), vec!["建立制度".to_string()]);
        assert_eq!(
            sorted_items(&result),
            vec![
                ("一、治理与战略".to_string(), Some(1)),
                ("二、全面风险管理".to_string(), Some(5)),
                ("二、全面风险管理".to_string(), Some(6)),
            ]
        );
        assert_eq!(result.merged.get("文档标题"), Some(&json!("境外投资管理办法")));
    }

    #[test]
    fn merge_result_does_not_depend_on_chunk_order() {
        let forward = merge_chunks(
            run(),
            chunk_values().into_iter().enumerate().map(|(i, v)| ok(i, v)).collect(),
        );
        let reversed = merge_chunks(
            run(),
            chunk_values()
                .into_iter()
                .enumerate()
                .rev()
                .map(|(i, v)| ok(i, v))
                .collect(),
        );

        let keys = |result: &ConsolidatedProviderResult| {
            result.merged.keys().cloned().collect::<Vec<String>>()
        };
        assert_eq!(keys(&forward), keys(&reversed));
        assert_eq!(sorted_items(&forward), sorted_items(&reversed));

        let mut forward_findings = forward.findings();
        let mut reversed_findings = reversed.findings();
        forward_findings.sort();
        reversed_findings.sort();
        assert_eq!(forward_findings, reversed_findings);
    }

    #[test]
    fn failed_chunk_contributes_nothing_and_is_recorded() {
        let values = chunk_values();
        let outcomes = vec![ok(0, values[0].clone()), failed(1), ok(2, values[2].clone())];
        let result = merge_chunks(run(), outcomes);

        assert_eq!(result.chunks_merged(), 2);
        assert_eq!(result.chunks_failed(), 1);
        assert_eq!(result.status(), ProviderStatus::Partial);
        assert!(result.chunks[1].error.is_some());
        assert_eq!(sorted_items(&result).len(), 2);
    }

    #[test]
    fn all_chunks_failing_yields_empty_failed_result() {
        let result = merge_chunks(run(), vec![failed(0), failed(1)]);
        assert_eq!(result.status(), ProviderStatus::Failed);
        assert!(result.merged.is_empty());
        assert!(result.analysis_items().items.is_empty());
    }

    #[test]
    fn nested_scalars_take_the_incoming_value() {
        let mut acc = record(json!({"meta": {"a": 1, "b": {"c": 1}}, "n": 1}));
        merge_record(&mut acc, record(json!({"meta": {"b": {"c": 2, "d": 3}}, "n": [1]})));
        assert_eq!(
            Value::Object(acc),
            json!({"meta": {"a": 1, "b": {"c": 2, "d": 3}}, "n": [1]})
        );
    }

    #[test]
    fn incoming_null_keeps_the_existing_value() {
        let mut acc = record(json!({"关键发现": ["甲"], "meta": {"a": 1}}));
        merge_record(&mut acc, record(json!({"关键发现": null, "meta": {"a": null}, "b": null})));
        assert_eq!(
            Value::Object(acc.clone()),
            json!({"关键发现": ["甲"], "meta": {"a": 1}, "b": null})
        );

        merge_record(&mut acc, record(json!({"b": 2})));
        assert_eq!(acc["b"], json!(2));
    }

    #[test]
    fn reserved_keys_are_not_taken_from_fragments() {
        let result = merge_chunks(
            run(),
            vec![ok(0, json!({"文档名称": "provider says", "chunks": 3, "x": 1}))],
        );
        assert_eq!(result.document_name, "境外投资管理办法.txt");
        assert!(!result.merged.contains_key("文档名称"));
        assert!(!result.merged.contains_key("chunks"));
    }

    #[test]
    fn unreadable_items_are_reported_not_dropped_silently() {
        let result = merge_chunks(
            run(),
            vec![ok(
                0,
                json!({"详细分析": {"一、治理与战略": ["just text", {"框架要求编号": 2}], "错": 5}}),
            )],
        );
        let items = result.analysis_items();
        assert_eq!(items.items.len(), 1);
        assert_eq!(items.unreadable.len(), 2);
    }

    #[test]
    fn consolidated_result_serializes_provider_keys_alongside_metadata() {
        let result = merge_chunks(run(), vec![ok(0, json!({"关键发现": ["甲"]}))]);
        let value = serde_json::to_value(&result).expect("serialize");
        assert_eq!(value["provider"], json!("deepseek"));
        assert_eq!(value["关键发现"], json!(["甲"]));

        let back: ConsolidatedProviderResult = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back.findings(), vec!["甲".to_string()]);
        assert_eq!(back.chunks.len(), 1);
    }
}
