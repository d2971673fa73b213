mod matrix;

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::analysis::CoverageLevel;
use crate::merge::{ConsolidatedProviderResult, UnreadableItem};
use crate::resolve::{ResolutionMethod, Resolver};

use matrix::{CategoryCoverage, CategoryEvidence, RequirementCoverage, RequirementEvidence};

pub use matrix::{CoverageMatrix, EvidenceBag, EvidenceEntry};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnresolvedLabel {
    pub provider: String,
    pub category: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuzzyMatch {
    pub provider: String,
    pub label: String,
    pub resolved_id: u32,
    pub resolved_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnknownCoverage {
    pub provider: String,
    pub requirement_id: u32,
    pub value: Option<String>,
}

/// What the resolver did with every provider item that reached it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolutionDiagnostics {
    pub items_seen: usize,
    pub resolved: BTreeMap<ResolutionMethod, usize>,
    pub resolution_loss: usize,
    pub unresolved: Vec<UnresolvedLabel>,
    pub fuzzy_matches: Vec<FuzzyMatch>,
    pub unknown_coverage: Vec<UnknownCoverage>,
    pub unreadable: Vec<UnreadableItem>,
}

impl ResolutionDiagnostics {
    pub fn resolved_by(&self, method: ResolutionMethod) -> usize {
        self.resolved.get(&method).copied().unwrap_or(0)
    }

    pub fn resolved_total(&self) -> usize {
        self.resolved.values().sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverageReport {
    #[serde(rename = "coverage_matrix")]
    pub coverage: CoverageMatrix,
    pub evidence: EvidenceBag,
    #[serde(rename = "key_findings")]
    pub findings: Vec<String>,
    pub recommendations: Vec<String>,
    pub diagnostics: ResolutionDiagnostics,
}

struct Observation<'a> {
    level: CoverageLevel,
    provider: &'a str,
}

/// Reconciles every provider's consolidated result into one coverage matrix.
///
/// Providers are visited in key order, so a rank tie keeps the level from the
/// provider whose name sorts first. Every registered requirement appears in
/// the matrix; requirements nobody mentioned default to `未覆盖`.
pub fn aggregate(
    results: &BTreeMap<String, ConsolidatedProviderResult>,
    resolver: &Resolver<'_>,
) -> CoverageReport {
    let registry = resolver.registry();
    let mut diagnostics = ResolutionDiagnostics::default();
    let mut observed: HashMap<u32, Observation<'_>> = HashMap::new();
    let mut evidence: HashMap<u32, Vec<EvidenceEntry>> = HashMap::new();
    let mut findings = Vec::new();
    let mut recommendations = Vec::new();

    for (provider, result) in results {
        let items = result.analysis_items();
        diagnostics.unreadable.extend(items.unreadable);

        for (category, item) in items.items {
            diagnostics.items_seen += 1;
            let Some(resolution) =
                resolver.resolve(item.requirement_id, item.requirement_name.as_deref())
            else {
                warn!(
                    provider = %provider,
                    category = %category,
                    label = %item.label(),
                    "could not resolve requirement label"
                );
                diagnostics.resolution_loss += 1;
                diagnostics.unresolved.push(UnresolvedLabel {
                    provider: provider.clone(),
                    category,
                    label: item.label(),
                });
                continue;
            };

            *diagnostics.resolved.entry(resolution.method).or_insert(0) += 1;
            debug!(
                provider = %provider,
                label = %item.label(),
                requirement = resolution.id,
                method = resolution.method.as_str(),
                "label resolved"
            );
            if resolution.method == ResolutionMethod::Fuzzy {
                let resolved_name = registry
                    .get(resolution.id)
                    .map(|requirement| requirement.name.clone())
                    .unwrap_or_default();
                diagnostics.fuzzy_matches.push(FuzzyMatch {
                    provider: provider.clone(),
                    label: item.label(),
                    resolved_id: resolution.id,
                    resolved_name,
                });
            }

            let Some(level) = item.coverage_level() else {
                warn!(
                    provider = %provider,
                    requirement = resolution.id,
                    value = item.coverage.as_deref().unwrap_or(""),
                    "unrecognized coverage level; item dropped"
                );
                diagnostics.unknown_coverage.push(UnknownCoverage {
                    provider: provider.clone(),
                    requirement_id: resolution.id,
                    value: item.coverage.clone(),
                });
                continue;
            };

            observed
                .entry(resolution.id)
                .and_modify(|current| {
                    if level.rank() > current.level.rank() {
                        current.level = level;
                        current.provider = provider.as_str();
                    }
                })
                .or_insert(Observation {
                    level,
                    provider: provider.as_str(),
                });

            evidence.entry(resolution.id).or_default().push(EvidenceEntry {
                provider: Some(provider.clone()),
                coverage: level,
                clauses: item.clauses,
                implementation: item.implementation,
                penalty: item.penalty,
                resolution: Some(resolution.method),
            });
        }

        findings.extend(result.findings());
        recommendations.extend(result.recommendations());
    }

    let mut coverage = CoverageMatrix::default();
    let mut bag = EvidenceBag::default();
    for category in registry.categories() {
        let mut levels = Vec::with_capacity(category.requirements.len());
        let mut entries = Vec::with_capacity(category.requirements.len());
        for requirement in &category.requirements {
            let observation = observed.get(&requirement.id);
            if let Some(observation) = observation {
                debug!(
                    requirement = requirement.id,
                    level = %observation.level,
                    provider = observation.provider,
                    "requirement level decided"
                );
            }
            levels.push(RequirementCoverage {
                id: requirement.id,
                name: requirement.name.clone(),
                level: observation.map_or(CoverageLevel::NotCovered, |o| o.level),
                observed: observation.is_some(),
            });
            entries.push(RequirementEvidence {
                id: requirement.id,
                name: requirement.name.clone(),
                entries: evidence
                    .remove(&requirement.id)
                    .unwrap_or_else(|| vec![EvidenceEntry::placeholder()]),
            });
        }
        coverage.categories.push(CategoryCoverage {
            category: category.name.clone(),
            requirements: levels,
        });
        bag.categories.push(CategoryEvidence {
            category: category.name.clone(),
            requirements: entries,
        });
    }

    CoverageReport {
        coverage,
        evidence: bag,
        findings: dedup_preserving_order(findings),
        recommendations: dedup_preserving_order(recommendations),
        diagnostics,
    }
}

pub fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}
