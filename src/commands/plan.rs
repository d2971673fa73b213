use anyhow::Result;
use tracing::{info, warn};

use crate::cli::PlanArgs;
use crate::commands::load_registry;
use crate::model::{PlanManifest, PlannedChunk};
use crate::prompt::{SYSTEM_MESSAGE, render_analysis_prompt, truncate_chars};
use crate::taxonomy::split_taxonomy;
use crate::util::{
    document_stem, ensure_directory, file_name_string, now_utc_string, read_text, write_json_pretty,
    write_text,
};

pub fn run(args: PlanArgs) -> Result<()> {
    let registry = load_registry(args.taxonomy_path.as_deref())?;
    let text = read_text(&args.document)?;
    let document_chars = text.chars().count();
    let content = truncate_chars(&text, args.max_content_chars);
    let truncated = content.len() < text.len();

    if truncated {
        warn!(
            path = %args.document.display(),
            chars = document_chars,
            max_chars = args.max_content_chars,
            "document truncated for prompting"
        );
    }
    if args.categories_per_call == 0 {
        warn!("categories-per-call of 0 treated as 1");
    }

    let plan_dir = args.plan_dir.clone().unwrap_or_else(|| {
        args.output_root.join("plans").join(format!(
            "{}_{}",
            args.mode.as_str(),
            document_stem(&args.document)
        ))
    });
    ensure_directory(&plan_dir)?;
    write_text(&plan_dir.join("system_prompt.txt"), SYSTEM_MESSAGE)?;

    let chunks = split_taxonomy(&registry, args.categories_per_call);
    let mut planned = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        let chunk_path = plan_dir.join(format!("chunk_{:02}.json", chunk.index));
        let prompt_path = plan_dir.join(format!("chunk_{:02}.prompt.txt", chunk.index));

        write_json_pretty(&chunk_path, chunk)?;
        write_text(&prompt_path, &render_analysis_prompt(args.mode, content, chunk)?)?;

        planned.push(PlannedChunk {
            index: chunk.index,
            categories: chunk
                .categories
                .iter()
                .map(|category| category.name.clone())
                .collect(),
            requirement_ids: chunk.requirement_ids(),
            chunk_path: chunk_path.display().to_string(),
            prompt_path: prompt_path.display().to_string(),
        });
    }

    let manifest = PlanManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        mode: args.mode.as_str().to_string(),
        document: file_name_string(&args.document),
        document_chars,
        truncated,
        categories_per_call: args.categories_per_call.max(1),
        chunks: planned,
    };
    let manifest_path = plan_dir.join("plan.json");
    write_json_pretty(&manifest_path, &manifest)?;

    info!(path = %manifest_path.display(), "wrote plan manifest");
    info!(
        chunks = manifest.chunks.len(),
        requirements = registry.requirement_count(),
        "plan completed"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::cli::ReviewMode;
    use crate::util::read_json;

    #[test]
    fn plan_writes_one_chunk_and_prompt_per_category_group() {
        let dir = tempfile::tempdir().expect("tempdir");
        let document = dir.path().join("境外投资管理办法.txt");
        fs::write(&document, "第一条 为规范境外投资，制定本办法。").expect("write document");

        let args = PlanArgs {
            output_root: dir.path().to_path_buf(),
            taxonomy_path: None,
            document: document.clone(),
            mode: ReviewMode::Regulation,
            categories_per_call: 3,
            max_content_chars: 4,
            plan_dir: None,
        };
        run(args).expect("plan succeeds");

        let plan_dir = dir.path().join("plans").join("regulation_境外投资管理办法");
        let manifest: PlanManifest = read_json(&plan_dir.join("plan.json")).expect("plan parses");
        assert_eq!(manifest.chunks.len(), 3);
        assert!(manifest.truncated);
        assert_eq!(manifest.document, "境外投资管理办法.txt");

        let mut ids = manifest
            .chunks
            .iter()
            .flat_map(|chunk| chunk.requirement_ids.iter().copied())
            .collect::<Vec<u32>>();
        ids.sort_unstable();
        assert_eq!(ids, (1..=35).collect::<Vec<u32>>());

        let prompt = fs::read_to_string(plan_dir.join("chunk_00.prompt.txt")).expect("prompt");
        assert!(prompt.contains("法规内容:\n第一条 \n"));
        assert!(plan_dir.join("chunk_02.json").exists());
        assert!(plan_dir.join("system_prompt.txt").exists());
    }
}
