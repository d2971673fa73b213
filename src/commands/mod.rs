pub mod aggregate;
pub mod plan;
pub mod review;
pub mod status;
pub mod taxonomy;

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::model::TaxonomyManifest;
use crate::taxonomy::{CategorySpec, TaxonomyRegistry};
use crate::util::read_json;

#[derive(Deserialize)]
#[serde(untagged)]
enum TaxonomyFile {
    Manifest(TaxonomyManifest),
    Categories(Vec<CategorySpec>),
}

/// The built-in taxonomy, or the one at `path` (a bare category list or a
/// manifest written by the `taxonomy` command).
pub(crate) fn load_registry(path: Option<&Path>) -> Result<TaxonomyRegistry> {
    let Some(path) = path else {
        return TaxonomyRegistry::builtin().context("built-in taxonomy failed validation");
    };

    let specs = match read_json::<TaxonomyFile>(path)? {
        TaxonomyFile::Manifest(manifest) => manifest.categories,
        TaxonomyFile::Categories(categories) => categories,
    };
    let registry = TaxonomyRegistry::from_categories(specs)
        .with_context(|| format!("taxonomy failed validation: {}", path.display()))?;

    info!(
        path = %path.display(),
        categories = registry.categories().len(),
        requirements = registry.requirement_count(),
        "loaded custom taxonomy"
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::write_json_pretty;

    #[test]
    fn custom_taxonomy_loads_from_bare_category_list() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("taxonomy.json");
        write_json_pretty(
            &path,
            &serde_json::json!([
                {"category": "甲类", "requirements": [{"number": 1, "name": "制度一"}]},
                {"category": "乙类", "requirements": [{"number": 2, "name": "制度二", "keyPoints": "要点"}]}
            ]),
        )
        .expect("write taxonomy");

        let registry = load_registry(Some(&path)).expect("taxonomy loads");
        assert_eq!(registry.requirement_count(), 2);
        assert_eq!(registry.get(2).map(|r| r.key_points.as_str()), Some("要点"));
    }

    #[test]
    fn invalid_custom_taxonomy_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("taxonomy.json");
        write_json_pretty(
            &path,
            &serde_json::json!([
                {"category": "甲类", "requirements": [{"number": 1, "name": "制度一"}, {"number": 1, "name": "制度二"}]}
            ]),
        )
        .expect("write taxonomy");

        let err = load_registry(Some(&path)).expect_err("duplicate id must fail");
        assert!(format!("{err:#}").contains("requirement identifier 1 appears in both"));
    }

    #[test]
    fn missing_path_uses_builtin_taxonomy() {
        let registry = load_registry(None).expect("builtin loads");
        assert_eq!(registry.requirement_count(), 35);
    }
}
