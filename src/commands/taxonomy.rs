use anyhow::Result;
use tracing::info;

use crate::cli::TaxonomyArgs;
use crate::commands::load_registry;
use crate::model::TaxonomyManifest;
use crate::taxonomy::TaxonomyRegistry;
use crate::util::{now_utc_string, write_json_pretty};

pub fn run(args: TaxonomyArgs) -> Result<()> {
    let registry = load_registry(args.taxonomy_path.as_deref())?;

    let source = args
        .taxonomy_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "builtin".to_string());
    let manifest = build_manifest(&registry, source);

    if args.dry_run {
        info!(
            categories = manifest.category_count,
            requirements = manifest.requirement_count,
            source = %manifest.source,
            "taxonomy dry-run complete"
        );
        return Ok(());
    }

    let output_path = args
        .output_path
        .unwrap_or_else(|| args.output_root.join("manifests").join("taxonomy.json"));

    write_json_pretty(&output_path, &manifest)?;
    info!(path = %output_path.display(), "wrote taxonomy manifest");
    info!(
        categories = manifest.category_count,
        requirements = manifest.requirement_count,
        "taxonomy validated"
    );

    Ok(())
}

pub fn build_manifest(registry: &TaxonomyRegistry, source: String) -> TaxonomyManifest {
    TaxonomyManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source,
        category_count: registry.categories().len(),
        requirement_count: registry.requirement_count(),
        categories: registry.to_specs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::read_json;

    #[test]
    fn written_manifest_loads_back_as_custom_taxonomy() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = TaxonomyArgs {
            output_root: dir.path().to_path_buf(),
            taxonomy_path: None,
            output_path: None,
            dry_run: false,
        };
        run(args).expect("taxonomy command succeeds");

        let path = dir.path().join("manifests").join("taxonomy.json");
        let manifest: TaxonomyManifest = read_json(&path).expect("manifest parses");
        assert_eq!(manifest.category_count, 8);
        assert_eq!(manifest.requirement_count, 35);
        assert_eq!(manifest.source, "builtin");

        let reloaded = load_registry(Some(&path)).expect("manifest reloads");
        let builtin = TaxonomyRegistry::builtin().expect("valid");
        assert_eq!(reloaded.categories(), builtin.categories());
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = TaxonomyArgs {
            output_root: dir.path().to_path_buf(),
            taxonomy_path: None,
            output_path: None,
            dry_run: true,
        };
        run(args).expect("dry run succeeds");
        assert!(!dir.path().join("manifests").exists());
    }
}
