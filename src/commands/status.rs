use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::{LatestRunPointer, ReviewRunManifest, TaxonomyManifest};
use crate::util::read_json;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.output_root.join("manifests");
    let latest_path = manifest_dir.join("latest_run.json");
    let taxonomy_path = manifest_dir.join("taxonomy.json");

    info!(output_root = %args.output_root.display(), "status requested");

    if latest_path.exists() {
        let pointer: LatestRunPointer = read_json(&latest_path)?;
        let manifest: ReviewRunManifest = read_json(Path::new(&pointer.manifest_path))?;

        info!(
            run_id = %manifest.run_id,
            status = %manifest.status,
            mode = %manifest.mode,
            document = %manifest.document,
            started_at = %manifest.started_at,
            updated_at = %manifest.updated_at,
            document_dir = %manifest.paths.document_dir,
            full = manifest.coverage.full,
            partial = manifest.coverage.partial,
            not_covered = manifest.coverage.not_covered,
            unresolved = manifest.resolution.unresolved,
            fuzzy = manifest.resolution.fuzzy,
            warnings = manifest.warnings.len(),
            "loaded latest review run"
        );

        for provider in &manifest.providers {
            info!(
                provider = %provider.provider,
                model = %provider.model.clone().unwrap_or_default(),
                status = %provider.status,
                chunks_total = provider.chunks_total,
                chunks_merged = provider.chunks_merged,
                chunks_failed = provider.chunks_failed,
                "provider usage"
            );
        }

        for warning in &manifest.warnings {
            warn!(warning = %warning, "review warning");
        }
    } else {
        warn!(path = %latest_path.display(), "no review run recorded");
    }

    if taxonomy_path.exists() {
        let taxonomy: TaxonomyManifest = read_json(&taxonomy_path)?;
        info!(
            generated_at = %taxonomy.generated_at,
            source = %taxonomy.source,
            categories = taxonomy.category_count,
            requirements = taxonomy.requirement_count,
            "loaded taxonomy manifest"
        );
    } else {
        warn!(path = %taxonomy_path.display(), "taxonomy manifest missing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tolerates_an_empty_output_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        run(StatusArgs {
            output_root: dir.path().to_path_buf(),
        })
        .expect("status succeeds without manifests");
    }

    #[test]
    fn status_fails_on_a_dangling_pointer() {
        let dir = tempfile::tempdir().expect("tempdir");
        crate::util::write_json_pretty(
            &dir.path().join("manifests").join("latest_run.json"),
            &LatestRunPointer {
                run_id: "run-20261014T090000Z".to_string(),
                manifest_path: dir.path().join("missing.json").display().to_string(),
                updated_at: "2026-10-14T09:00:00Z".to_string(),
            },
        )
        .expect("write pointer");

        let err = run(StatusArgs {
            output_root: dir.path().to_path_buf(),
        })
        .expect_err("missing manifest is an error");
        assert!(err.to_string().contains("failed to read"));
    }
}
