use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::analysis::{CoverageLevel, RawAnalysisItem};
use crate::merge::ConsolidatedProviderResult;
use crate::resolve::Resolver;

pub const MAX_SCORE: u32 = 100;
pub const HIGH_SCORE: u32 = 60;
const TOP_COUNT: usize = 5;
const UNSPECIFIED_PENALTIES: [&str; 2] = ["未明确", "未明确规定"];
const ABSENT_PENALTIES: [&str; 3] = ["不适用", "无", ""];

/// Relevance of one provider item on a 0..=100 scale.
pub fn relevance_score(item: &RawAnalysisItem) -> u32 {
    let coverage = match item.coverage_level() {
        Some(CoverageLevel::Full) => 40,
        Some(CoverageLevel::Partial) => 25,
        Some(CoverageLevel::NotApplicable) => 5,
        _ => 0,
    };

    let mentions = (item.clauses.len() as u32).saturating_mul(10).min(20);

    let enforcement = item
        .clauses
        .iter()
        .map(|clause| match clause.mandatory_level.trim() {
            "强制" => 25,
            "推荐" => 15,
            "指导" => 10,
            _ => 0,
        })
        .max()
        .unwrap_or(0);

    let penalty_text = item.penalty.trim();
    let penalty = if UNSPECIFIED_PENALTIES.contains(&penalty_text) {
        5
    } else if ABSENT_PENALTIES.contains(&penalty_text) {
        0
    } else {
        15
    };

    (coverage + mentions + enforcement + penalty).min(MAX_SCORE)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRow {
    pub id: u32,
    pub name: String,
    pub category: String,
    pub scores: BTreeMap<String, u32>,
}

impl ScoreRow {
    pub fn score(&self, provider: &str) -> u32 {
        self.scores.get(provider).copied().unwrap_or(0)
    }

    pub fn best(&self) -> u32 {
        self.scores.values().copied().max().unwrap_or(0)
    }
}

/// Requirement × provider relevance scores, rows in registry order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreMatrix {
    pub providers: Vec<String>,
    pub rows: Vec<ScoreRow>,
}

pub fn score_matrix(
    results: &BTreeMap<String, ConsolidatedProviderResult>,
    resolver: &Resolver<'_>,
) -> ScoreMatrix {
    let registry = resolver.registry();
    let providers = results.keys().cloned().collect::<Vec<String>>();
    let mut rows = registry
        .requirements()
        .map(|requirement| ScoreRow {
            id: requirement.id,
            name: requirement.name.clone(),
            category: requirement.category.clone(),
            scores: providers.iter().map(|provider| (provider.clone(), 0)).collect(),
        })
        .collect::<Vec<ScoreRow>>();
    let positions = rows
        .iter()
        .enumerate()
        .map(|(position, row)| (row.id, position))
        .collect::<BTreeMap<u32, usize>>();

    for (provider, result) in results {
        for (_, item) in result.analysis_items().items {
            let Some(resolution) =
                resolver.resolve(item.requirement_id, item.requirement_name.as_deref())
            else {
                continue;
            };
            let Some(&position) = positions.get(&resolution.id) else {
                continue;
            };
            let score = relevance_score(&item);
            if let Some(slot) = rows[position].scores.get_mut(provider) {
                *slot = (*slot).max(score);
            }
        }
    }

    ScoreMatrix { providers, rows }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderScoreSummary {
    pub provider: String,
    pub average: f64,
    pub coverage_rate: f64,
    pub high_score_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryProviderScore {
    pub provider: String,
    pub average: f64,
    pub max: u32,
    pub coverage_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScoreSummary {
    pub category: String,
    pub providers: Vec<CategoryProviderScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopScore {
    pub id: u32,
    pub name: String,
    pub provider: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub providers: Vec<ProviderScoreSummary>,
    pub categories: Vec<CategoryScoreSummary>,
    pub top: Vec<TopScore>,
    pub unscored: Vec<String>,
}

fn average(scores: &[u32]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    f64::from(scores.iter().sum::<u32>()) / scores.len() as f64
}

fn coverage_rate(scores: &[u32]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().filter(|score| **score > 0).count() as f64 * 100.0 / scores.len() as f64
}

impl ScoreMatrix {
    fn column<'a>(&self, rows: impl Iterator<Item = &'a ScoreRow>, provider: &str) -> Vec<u32> {
        rows.map(|row| row.score(provider)).collect()
    }

    pub fn summary(&self) -> ScoreSummary {
        let providers = self
            .providers
            .iter()
            .map(|provider| {
                let scores = self.column(self.rows.iter(), provider);
                ProviderScoreSummary {
                    provider: provider.clone(),
                    average: average(&scores),
                    coverage_rate: coverage_rate(&scores),
                    high_score_count: scores.iter().filter(|score| **score >= HIGH_SCORE).count(),
                }
            })
            .collect();

        let mut category_names: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !category_names.contains(&row.category.as_str()) {
                category_names.push(&row.category);
            }
        }
        let categories = category_names
            .into_iter()
            .map(|category| CategoryScoreSummary {
                category: category.to_string(),
                providers: self
                    .providers
                    .iter()
                    .map(|provider| {
                        let scores = self.column(
                            self.rows.iter().filter(|row| row.category == category),
                            provider,
                        );
                        CategoryProviderScore {
                            provider: provider.clone(),
                            average: average(&scores),
                            max: scores.iter().copied().max().unwrap_or(0),
                            coverage_rate: coverage_rate(&scores),
                        }
                    })
                    .collect(),
            })
            .collect();

        let mut top = self
            .rows
            .iter()
            .flat_map(|row| {
                self.providers.iter().filter_map(move |provider| {
                    let score = row.score(provider);
                    (score > 0).then(|| TopScore {
                        id: row.id,
                        name: row.name.clone(),
                        provider: provider.clone(),
                        score,
                    })
                })
            })
            .collect::<Vec<TopScore>>();
        top.sort_by_key(|entry| Reverse(entry.score));
        top.truncate(TOP_COUNT);

        let unscored = self
            .rows
            .iter()
            .filter(|row| row.best() == 0)
            .map(|row| format!("{}. {}", row.id, row.name))
            .collect();

        ScoreSummary {
            providers,
            categories,
            top,
            unscored,
        }
    }
}

/// Plain-text report of a score summary, headed by the document name.
pub fn render_score_report(document: &str, summary: &ScoreSummary) -> String {
    let rule = "=".repeat(80);
    let thin = "-".repeat(40);
    let mut out = String::new();

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "{document} 法规合规覆盖分析报告");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out);

    let _ = writeln!(out, "一、总体统计");
    let _ = writeln!(out, "{thin}");
    for provider in &summary.providers {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}:", provider.provider.to_uppercase());
        let _ = writeln!(out, "  - 平均得分: {:.1}", provider.average);
        let _ = writeln!(out, "  - 覆盖率: {:.1}%", provider.coverage_rate);
        let _ = writeln!(out, "  - 高分项目数 (≥{HIGH_SCORE}): {}", provider.high_score_count);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "二、类别分析");
    let _ = writeln!(out, "{thin}");
    for category in &summary.categories {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}:", category.category);
        for stats in &category.providers {
            let _ = writeln!(
                out,
                "  {}: 平均{:.1}分, 最高{}分, 覆盖{:.0}%",
                stats.provider, stats.average, stats.max, stats.coverage_rate
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "三、重点发现");
    let _ = writeln!(out, "{thin}");
    let _ = writeln!(out);
    let _ = writeln!(out, "最高覆盖的要求 (Top {TOP_COUNT}):");
    for entry in &summary.top {
        let _ = writeln!(
            out,
            "  - {}. {} ({}): {}分",
            entry.id, entry.name, entry.provider, entry.score
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "未覆盖的要求:");
    for label in &summary.unscored {
        let _ = writeln!(out, "  - {label}");
    }

    out
}
