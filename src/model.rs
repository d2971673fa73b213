use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::merge::ConsolidatedProviderResult;
use crate::taxonomy::CategorySpec;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source: String,
    pub category_count: usize,
    pub requirement_count: usize,
    pub categories: Vec<CategorySpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedChunk {
    pub index: usize,
    pub categories: Vec<String>,
    pub requirement_ids: Vec<u32>,
    pub chunk_path: String,
    pub prompt_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub mode: String,
    pub document: String,
    pub document_chars: usize,
    pub truncated: bool,
    pub categories_per_call: usize,
    pub chunks: Vec<PlannedChunk>,
}

/// Every provider's consolidated result for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedAnalysis {
    pub document_name: String,
    pub analysis_date: String,
    pub mode: String,
    pub providers: BTreeMap<String, ConsolidatedProviderResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyFile {
    pub provider: String,
    pub chunk: usize,
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderUsage {
    pub provider: String,
    pub model: Option<String>,
    pub chunks_total: usize,
    pub chunks_merged: usize,
    pub chunks_failed: usize,
    pub status: String,
    pub result_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolutionCounts {
    pub items_seen: usize,
    pub identifier: usize,
    pub exact_name: usize,
    pub normalized_name: usize,
    pub fuzzy: usize,
    pub numeric_fallback: usize,
    pub unresolved: usize,
    pub unknown_coverage: usize,
    pub unreadable: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverageCounts {
    pub full: usize,
    pub partial: usize,
    pub not_covered: usize,
    pub not_mentioned: usize,
    pub not_applicable: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewPaths {
    pub output_root: String,
    pub run_dir: String,
    pub document_dir: String,
    pub replies_root: String,
    pub taxonomy_path: Option<String>,
    pub consolidated_path: Option<String>,
    pub coverage_path: String,
    pub scores_path: String,
    pub report_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub mode: String,
    pub document: String,
    pub paths: ReviewPaths,
    pub providers: Vec<ProviderUsage>,
    pub resolution: ResolutionCounts,
    pub coverage: CoverageCounts,
    pub reply_hashes: Vec<ReplyFile>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestRunPointer {
    pub run_id: String,
    pub manifest_path: String,
    pub updated_at: String,
}
