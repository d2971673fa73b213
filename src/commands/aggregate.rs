use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::aggregate::{CoverageReport, aggregate};
use crate::analysis::CoverageLevel;
use crate::cli::AggregateArgs;
use crate::commands::load_registry;
use crate::merge::ConsolidatedProviderResult;
use crate::model::{CombinedAnalysis, CoverageCounts, ResolutionCounts};
use crate::resolve::{ResolutionMethod, Resolver};
use crate::scoring::{ScoreMatrix, ScoreSummary, render_score_report, score_matrix};
use crate::taxonomy::NameIndex;
use crate::util::{document_stem, read_json, write_json_pretty, write_text};

pub fn run(args: AggregateArgs) -> Result<()> {
    let registry = load_registry(args.taxonomy_path.as_deref())?;
    let index = NameIndex::build(&registry).context("failed to build requirement name index")?;
    let resolver = Resolver::new(&registry, &index)?;

    let combined: CombinedAnalysis = read_json(&args.consolidated_path)?;
    let output_dir = args.output_dir.clone().unwrap_or_else(|| {
        args.consolidated_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| args.output_root.clone())
    });

    info!(
        path = %args.consolidated_path.display(),
        providers = combined.providers.len(),
        "re-aggregating consolidated analysis"
    );

    let document = document_stem(Path::new(&combined.document_name));
    let outputs = write_coverage_outputs(&output_dir, &document, &combined.providers, &resolver)?;
    let counts = outputs.coverage_counts();

    info!(
        full = counts.full,
        partial = counts.partial,
        not_covered = counts.not_covered,
        resolved = outputs.report.diagnostics.resolved_total(),
        unresolved = outputs.report.diagnostics.resolution_loss,
        "aggregate completed"
    );

    Ok(())
}

#[derive(Serialize)]
struct ScoresFile<'a> {
    document: &'a str,
    matrix: &'a ScoreMatrix,
    summary: &'a ScoreSummary,
}

pub struct CoverageOutputs {
    pub report: CoverageReport,
    pub coverage_path: PathBuf,
    pub scores_path: PathBuf,
    pub report_path: PathBuf,
}

impl CoverageOutputs {
    pub fn coverage_counts(&self) -> CoverageCounts {
        let matrix = &self.report.coverage;
        CoverageCounts {
            full: matrix.count_by_level(CoverageLevel::Full),
            partial: matrix.count_by_level(CoverageLevel::Partial),
            not_covered: matrix.count_by_level(CoverageLevel::NotCovered),
            not_mentioned: matrix.count_by_level(CoverageLevel::NotMentioned),
            not_applicable: matrix.count_by_level(CoverageLevel::NotApplicable),
        }
    }

    pub fn resolution_counts(&self) -> ResolutionCounts {
        let diagnostics = &self.report.diagnostics;
        ResolutionCounts {
            items_seen: diagnostics.items_seen,
            identifier: diagnostics.resolved_by(ResolutionMethod::Identifier),
            exact_name: diagnostics.resolved_by(ResolutionMethod::ExactName),
            normalized_name: diagnostics.resolved_by(ResolutionMethod::NormalizedName),
            fuzzy: diagnostics.resolved_by(ResolutionMethod::Fuzzy),
            numeric_fallback: diagnostics.resolved_by(ResolutionMethod::NumericFallback),
            unresolved: diagnostics.resolution_loss,
            unknown_coverage: diagnostics.unknown_coverage.len(),
            unreadable: diagnostics.unreadable.len(),
        }
    }
}

/// Aggregates, scores and writes `coverage.json`, `scores.json` and
/// `score_report.txt` into `dir`.
pub fn write_coverage_outputs(
    dir: &Path,
    document: &str,
    results: &BTreeMap<String, ConsolidatedProviderResult>,
    resolver: &Resolver<'_>,
) -> Result<CoverageOutputs> {
    let report = aggregate(results, resolver);
    let matrix = score_matrix(results, resolver);
    let summary = matrix.summary();

    let coverage_path = dir.join("coverage.json");
    let scores_path = dir.join("scores.json");
    let report_path = dir.join("score_report.txt");

    write_json_pretty(&coverage_path, &report)?;
    write_json_pretty(
        &scores_path,
        &ScoresFile {
            document,
            matrix: &matrix,
            summary: &summary,
        },
    )?;
    write_text(&report_path, &render_score_report(document, &summary))?;

    info!(path = %coverage_path.display(), "wrote coverage report");
    info!(path = %scores_path.display(), "wrote relevance scores");

    Ok(CoverageOutputs {
        report,
        coverage_path,
        scores_path,
        report_path,
    })
}
