use anyhow::{Context, Result};

use crate::cli::ReviewMode;
use crate::taxonomy::TaxonomyChunk;

pub const SYSTEM_MESSAGE: &str = "你是一名合规审查专家，请严格按照要求的 JSON 格式并使用中文回复。";

const RESPONSE_SHAPE: &str = r#"{
  "详细分析": {
    "分类名称": [
      {
        "框架要求编号": 1,
        "框架要求名称": "框架要求名称",
        "法规覆盖情况": "完全覆盖/部分覆盖/未覆盖/未提及/不适用",
        "法规要求内容": [
          {
            "条款编号": "第X条",
            "具体要求": "要求摘要",
            "强制等级": "强制/推荐/指导",
            "适用对象": "适用主体",
            "原文内容": "原文句子"
          }
        ],
        "实施要求": "实施要求说明",
        "处罚措施": "处罚措施或未明确"
      }
    ]
  },
  "关键发现": ["发现"],
  "合规建议": ["建议"]
}"#;

/// Cuts `text` to at most `max_chars` characters without splitting one.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

pub fn render_analysis_prompt(
    mode: ReviewMode,
    document: &str,
    chunk: &TaxonomyChunk<'_>,
) -> Result<String> {
    let framework = serde_json::to_string_pretty(chunk)
        .with_context(|| format!("failed to serialize taxonomy chunk {}", chunk.index))?;

    let (role, subject, tasks) = match mode {
        ReviewMode::Regulation => (
            "你是一名境外经营合规监管专家，请根据以下风险梳理框架审阅给出的法规内容，判断法规对各项框架要求的覆盖情况。",
            "法规内容",
            [
                "对每项框架要求说明法规是否提及，并给出覆盖等级；",
                "列出对应的条款编号、具体要求、强制等级、适用对象和原文内容；",
                "概括法规提出的实施要求与处罚措施，法规未规定时写“未明确”；",
                "总结关键发现并给出合规建议。",
            ],
        ),
        ReviewMode::Documentation => (
            "你是一名企业内控制度评审专家，请根据以下风险梳理框架审阅给出的企业制度文件，判断制度是否满足各项框架要求。",
            "制度内容",
            [
                "对每项框架要求说明制度是否已作出规定，并给出覆盖等级；",
                "列出制度中对应的条款编号、具体要求、强制等级、适用对象和原文内容；",
                "说明制度落实该要求的实施要求与违规处罚，制度未规定时写“未明确”；",
                "总结关键发现并给出制度完善建议。",
            ],
        ),
    };

    let mut prompt = String::new();
    prompt.push_str(role);
    prompt.push_str("\n\n");
    prompt.push_str(subject);
    prompt.push_str(":\n");
    prompt.push_str(document);
    prompt.push_str("\n\n分析框架:\n");
    prompt.push_str(&framework);
    prompt.push_str("\n\n分析要求:\n");
    for (idx, task) in tasks.iter().enumerate() {
        prompt.push_str(&format!("{}. {task}\n", idx + 1));
    }
    prompt.push_str("\n仅分析上述框架中的要求，框架要求编号必须与框架一致。请按照以下 JSON 格式返回结果，不要输出其他内容：\n");
    prompt.push_str(RESPONSE_SHAPE);
    prompt.push('\n');

    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::{TaxonomyRegistry, split_taxonomy};

    #[test]
    fn truncation_respects_character_boundaries() {
        assert_eq!(truncate_chars("境外投资管理", 2), "境外");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn prompt_lists_only_the_chunk_requirements() {
        let registry = TaxonomyRegistry::builtin().expect("valid");
        let chunks = split_taxonomy(&registry, 2);
        let prompt = render_analysis_prompt(ReviewMode::Regulation, "第一条 总则", &chunks[0])
            .expect("prompt renders");

        assert!(prompt.contains("法规内容:\n第一条 总则"));
        assert!(prompt.contains("一、治理与战略"));
        assert!(prompt.contains("二、全面风险管理"));
        assert!(!prompt.contains("三、"));
        for key in ["详细分析", "框架要求编号", "法规覆盖情况", "处罚措施", "关键发现", "合规建议"] {
            assert!(prompt.contains(key), "missing {key}");
        }
    }

    #[test]
    fn documentation_mode_reviews_internal_policies() {
        let registry = TaxonomyRegistry::builtin().expect("valid");
        let chunks = split_taxonomy(&registry, 8);
        let prompt = render_analysis_prompt(ReviewMode::Documentation, "制度正文", &chunks[0])
            .expect("prompt renders");
        assert!(prompt.contains("制度内容:\n制度正文"));
        assert!(prompt.contains("八、社会责任与人力"));
    }
}
