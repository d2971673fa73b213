use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::ReviewArgs;
use crate::error::MalformedOutput;
use crate::commands::aggregate::write_coverage_outputs;
use crate::commands::load_registry;
use crate::extract::Extractor;
use crate::merge::{ChunkOutcome, ConsolidatedProviderResult, ProviderRun, ProviderStatus, merge_chunks};
use crate::model::{
    CombinedAnalysis, LatestRunPointer, ProviderUsage, ReplyFile, ReviewPaths, ReviewRunManifest,
};
use crate::resolve::Resolver;
use crate::taxonomy::{NameIndex, split_taxonomy};
use crate::util::{
    document_stem, ensure_directory, file_name_string, now_utc_string, sha256_hex,
    utc_compact_string, write_json_pretty,
};

pub fn run(args: ReviewArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let compact = utc_compact_string(started_ts);
    let run_id = format!("run-{compact}");

    // Taxonomy problems abort before any reply is read.
    let registry = load_registry(args.taxonomy_path.as_deref())?;
    let index = NameIndex::build(&registry).context("failed to build requirement name index")?;
    let resolver = Resolver::new(&registry, &index)?;
    let extractor = Extractor::new()?;
    let models = parse_models(&args.models)?;
    let expected_chunks = split_taxonomy(&registry, args.categories_per_call).len();

    let document_name = file_name_string(&args.document);
    let run_dir = args
        .output_root
        .join(format!("{}_{compact}", args.mode.as_str()));
    let document_dir = run_dir.join(document_stem(&args.document));
    let manifest_dir = args.output_root.join("manifests");
    ensure_directory(&document_dir)?;
    ensure_directory(&manifest_dir)?;

    info!(
        run_id = %run_id,
        document = %document_name,
        replies_root = %args.replies_root.display(),
        "starting review"
    );

    let provider_dirs = discover_provider_dirs(&args.replies_root)?;
    if provider_dirs.is_empty() {
        bail!(
            "no provider reply directories found in {}",
            args.replies_root.display()
        );
    }

    let mut warnings = Vec::new();
    let mut reply_hashes = Vec::new();
    let mut usage = Vec::new();
    let mut results = BTreeMap::new();

    for (provider, dir) in provider_dirs {
        let files = discover_reply_files(&dir)?;
        if files.is_empty() {
            warn!(provider = %provider, path = %dir.display(), "no reply files; provider skipped");
            warnings.push(format!("provider {provider} has no reply files"));
            continue;
        }
        if files.len() != expected_chunks {
            warn!(
                provider = %provider,
                replies = files.len(),
                expected = expected_chunks,
                "reply count differs from planned chunk count"
            );
            warnings.push(format!(
                "provider {provider} has {} replies for {expected_chunks} planned chunks",
                files.len()
            ));
        }

        let mut outcomes = Vec::with_capacity(files.len());
        for (chunk, path) in files.iter().enumerate() {
            let (outcome, hash) = read_reply(&extractor, &provider, chunk, path);
            if let Some(sha256) = hash {
                reply_hashes.push(ReplyFile {
                    provider: provider.clone(),
                    chunk,
                    path: path.display().to_string(),
                    sha256,
                });
            } else {
                warnings.push(format!(
                    "provider {provider}: reply {} could not be read",
                    path.display()
                ));
            }
            outcomes.push(outcome);
        }

        let result = merge_chunks(
            ProviderRun {
                provider: provider.clone(),
                model: models.get(&provider).cloned(),
                document_name: document_name.clone(),
                analysis_date: started_at.clone(),
            },
            outcomes,
        );
        let status = result.status();
        info!(
            provider = %provider,
            merged = result.chunks_merged(),
            failed = result.chunks_failed(),
            status = status.as_str(),
            "provider replies merged"
        );

        if result.chunks_failed() > 0 {
            warnings.push(format!(
                "provider {provider}: {} of {} chunks unusable",
                result.chunks_failed(),
                result.chunks.len()
            ));
        }

        let result_path = if args.no_individual_results || status == ProviderStatus::Failed {
            None
        } else {
            let path = document_dir.join(format!("{provider}.json"));
            write_json_pretty(&path, &result)?;
            Some(path.display().to_string())
        };

        usage.push(ProviderUsage {
            provider: provider.clone(),
            model: result.model.clone(),
            chunks_total: result.chunks.len(),
            chunks_merged: result.chunks_merged(),
            chunks_failed: result.chunks_failed(),
            status: status.as_str().to_string(),
            result_path,
        });
        results.insert(provider, result);
    }

    let combined = CombinedAnalysis {
        document_name: document_name.clone(),
        analysis_date: started_at.clone(),
        mode: args.mode.as_str().to_string(),
        providers: results,
    };
    let consolidated_path = if args.no_consolidated_results {
        None
    } else {
        let path = document_dir.join("consolidated.json");
        write_json_pretty(&path, &combined)?;
        info!(path = %path.display(), "wrote consolidated analysis");
        Some(path.display().to_string())
    };

    let outputs = write_coverage_outputs(
        &document_dir,
        &document_stem(&args.document),
        &combined.providers,
        &resolver,
    )?;
    let diagnostics = &outputs.report.diagnostics;
    if diagnostics.resolution_loss > 0 {
        warnings.push(format!(
            "{} provider items could not be matched to a requirement",
            diagnostics.resolution_loss
        ));
    }
    if !diagnostics.fuzzy_matches.is_empty() {
        warnings.push(format!(
            "{} provider items matched by substring; review diagnostics",
            diagnostics.fuzzy_matches.len()
        ));
    }

    let status = overall_status(&combined.providers);
    let manifest = ReviewRunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        status: status.to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_review_command(&args),
        mode: args.mode.as_str().to_string(),
        document: document_name,
        paths: ReviewPaths {
            output_root: args.output_root.display().to_string(),
            run_dir: run_dir.display().to_string(),
            document_dir: document_dir.display().to_string(),
            replies_root: args.replies_root.display().to_string(),
            taxonomy_path: args
                .taxonomy_path
                .as_ref()
                .map(|path| path.display().to_string()),
            consolidated_path,
            coverage_path: outputs.coverage_path.display().to_string(),
            scores_path: outputs.scores_path.display().to_string(),
            report_path: outputs.report_path.display().to_string(),
        },
        providers: usage,
        resolution: outputs.resolution_counts(),
        coverage: outputs.coverage_counts(),
        reply_hashes,
        warnings,
    };

    let manifest_path = manifest_dir.join(format!("review_run_{compact}.json"));
    write_json_pretty(&manifest_path, &manifest)?;
    write_json_pretty(
        &manifest_dir.join("latest_run.json"),
        &LatestRunPointer {
            run_id: run_id.clone(),
            manifest_path: manifest_path.display().to_string(),
            updated_at: manifest.updated_at.clone(),
        },
    )?;

    info!(path = %manifest_path.display(), "wrote review run manifest");
    info!(
        run_id = %run_id,
        status,
        providers = manifest.providers.len(),
        warnings = manifest.warnings.len(),
        "review completed"
    );

    Ok(())
}

/// Reads and extracts one reply. An unreadable file becomes a failed chunk
/// with no hash instead of stopping the run.
fn read_reply(
    extractor: &Extractor,
    provider: &str,
    chunk: usize,
    path: &Path,
) -> (ChunkOutcome, Option<String>) {
    let source = file_name_string(path);
    match fs::read(path) {
        Ok(raw) => {
            let hash = sha256_hex(&raw);
            let outcome = ChunkOutcome {
                chunk,
                source,
                result: extractor.extract(&String::from_utf8_lossy(&raw)),
            };
            (outcome, Some(hash))
        }
        Err(err) => {
            warn!(
                provider = %provider,
                chunk,
                path = %path.display(),
                error = %err,
                "failed to read reply; treating as empty"
            );
            let outcome = ChunkOutcome {
                chunk,
                source,
                result: Err(MalformedOutput {
                    parse_error: format!("failed to read reply: {err}"),
                    text: String::new(),
                }),
            };
            (outcome, None)
        }
    }
}

/// Parses repeated `provider=model` flags.
fn parse_models(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    let mut models = BTreeMap::new();
    for pair in pairs {
        let Some((provider, model)) = pair.split_once('=') else {
            bail!("--model expects provider=model, got '{pair}'");
        };
        let (provider, model) = (provider.trim(), model.trim());
        if provider.is_empty() || model.is_empty() {
            bail!("--model expects provider=model, got '{pair}'");
        }
        models.insert(provider.to_string(), model.to_string());
    }
    Ok(models)
}

fn overall_status(results: &BTreeMap<String, ConsolidatedProviderResult>) -> &'static str {
    let statuses = results
        .values()
        .map(ConsolidatedProviderResult::status)
        .collect::<Vec<ProviderStatus>>();
    if statuses.is_empty() || statuses.iter().all(|status| *status == ProviderStatus::Failed) {
        "failed"
    } else if statuses.iter().all(|status| *status == ProviderStatus::Succeeded) {
        "completed"
    } else {
        "completed_with_gaps"
    }
}

fn render_review_command(args: &ReviewArgs) -> String {
    let mut parts = vec![
        "regcover review".to_string(),
        format!("--output-root {}", args.output_root.display()),
        format!("--document {}", args.document.display()),
        format!("--replies-root {}", args.replies_root.display()),
        format!("--mode {}", args.mode.as_str()),
        format!("--categories-per-call {}", args.categories_per_call),
    ];
    if let Some(path) = &args.taxonomy_path {
        parts.push(format!("--taxonomy-path {}", path.display()));
    }
    for model in &args.models {
        parts.push(format!("--model {model}"));
    }
    if args.no_individual_results {
        parts.push("--no-individual-results".to_string());
    }
    if args.no_consolidated_results {
        parts.push("--no-consolidated-results".to_string());
    }
    parts.join(" ")
}

fn discover_provider_dirs(replies_root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut dirs = Vec::new();
    let entries = fs::read_dir(replies_root)
        .with_context(|| format!("failed to read {}", replies_root.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", replies_root.display()))?;
        let path = entry.path();
        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_dir()
        {
            continue;
        }
        let name = file_name_string(&path);
        if name.starts_with('.') {
            continue;
        }
        dirs.push((name, path));
    }

    dirs.sort();
    Ok(dirs)
}

/// Reply files in name order; the position in that order is the chunk index.
fn discover_reply_files(provider_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries = fs::read_dir(provider_dir)
        .with_context(|| format!("failed to read {}", provider_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", provider_dir.display()))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?;
        if !(file_type.is_file() || file_type.is_symlink()) {
            continue;
        }
        if file_name_string(&path).starts_with('.') {
            continue;
        }
        files.push(path);
    }

    files.sort();
    Ok(files)
}
