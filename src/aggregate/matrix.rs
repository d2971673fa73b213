use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::analysis::{ClauseEvidence, CoverageLevel};
use crate::resolve::ResolutionMethod;

pub const PLACEHOLDER_IMPLEMENTATION: &str = "该法规未涉及此要求";
pub const PLACEHOLDER_PENALTY: &str = "不适用";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementCoverage {
    pub id: u32,
    pub name: String,
    pub level: CoverageLevel,
    /// False when the level is the `未覆盖` default for an unmentioned requirement.
    pub observed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCoverage {
    pub category: String,
    pub requirements: Vec<RequirementCoverage>,
}

/// Category → requirement name → winning level, in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageMatrix {
    pub(super) categories: Vec<CategoryCoverage>,
}

impl CoverageMatrix {
    pub fn requirements(&self) -> impl Iterator<Item = &RequirementCoverage> {
        self.categories
            .iter()
            .flat_map(|category| category.requirements.iter())
    }

    #[cfg(test)]
    pub fn level(&self, id: u32) -> Option<CoverageLevel> {
        self.requirements()
            .find(|requirement| requirement.id == id)
            .map(|requirement| requirement.level)
    }

    #[cfg(test)]
    pub fn level_by_name(&self, category: &str, name: &str) -> Option<CoverageLevel> {
        self.categories
            .iter()
            .find(|entry| entry.category == category)?
            .requirements
            .iter()
            .find(|requirement| requirement.name == name)
            .map(|requirement| requirement.level)
    }

    pub fn count_by_level(&self, level: CoverageLevel) -> usize {
        self.requirements()
            .filter(|requirement| requirement.level == level)
            .count()
    }
}

impl Serialize for CoverageMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for category in &self.categories {
            map.serialize_entry(&category.category, &LevelsByName(&category.requirements))?;
        }
        map.end()
    }
}

struct LevelsByName<'a>(&'a [RequirementCoverage]);

impl Serialize for LevelsByName<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.0
                .iter()
                .map(|requirement| (requirement.name.as_str(), requirement.level)),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(rename = "覆盖情况")]
    pub coverage: CoverageLevel,
    #[serde(rename = "法规要求内容")]
    pub clauses: Vec<ClauseEvidence>,
    #[serde(rename = "实施要求")]
    pub implementation: String,
    #[serde(rename = "处罚措施")]
    pub penalty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ResolutionMethod>,
}

impl EvidenceEntry {
    pub fn placeholder() -> Self {
        Self {
            provider: None,
            coverage: CoverageLevel::NotCovered,
            clauses: Vec::new(),
            implementation: PLACEHOLDER_IMPLEMENTATION.to_string(),
            penalty: PLACEHOLDER_PENALTY.to_string(),
            resolution: None,
        }
    }

    #[cfg(test)]
    pub fn is_placeholder(&self) -> bool {
        self.provider.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequirementEvidence {
    pub id: u32,
    pub name: String,
    pub entries: Vec<EvidenceEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryEvidence {
    pub category: String,
    pub requirements: Vec<RequirementEvidence>,
}

/// Category → requirement name → one entry per provider mention.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvidenceBag {
    pub(super) categories: Vec<CategoryEvidence>,
}

#[cfg(test)]
impl EvidenceBag {
    pub fn entries(&self, id: u32) -> Option<&[EvidenceEntry]> {
        self.categories
            .iter()
            .flat_map(|category| category.requirements.iter())
            .find(|requirement| requirement.id == id)
            .map(|requirement| requirement.entries.as_slice())
    }
}

impl Serialize for EvidenceBag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for category in &self.categories {
            map.serialize_entry(&category.category, &EntriesByName(&category.requirements))?;
        }
        map.end()
    }
}

struct EntriesByName<'a>(&'a [RequirementEvidence]);

impl Serialize for EntriesByName<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.0
                .iter()
                .map(|requirement| (requirement.name.as_str(), &requirement.entries)),
        )
    }
}
