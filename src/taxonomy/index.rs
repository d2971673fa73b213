use std::collections::HashMap;

use crate::error::TaxonomyIntegrityError;

use super::TaxonomyRegistry;

const STRIPPED_PUNCTUATION: [char; 3] = ['（', '）', '、'];

pub fn normalize_requirement_name(name: &str) -> String {
    name.chars()
        .filter(|ch| !STRIPPED_PUNCTUATION.contains(ch))
        .collect::<String>()
        .trim()
        .to_string()
}

#[derive(Debug, Clone)]
pub struct NameIndex {
    exact: HashMap<String, u32>,
    normalized: HashMap<String, u32>,
    canonical: Vec<(String, u32)>,
}

impl NameIndex {
    pub fn build(registry: &TaxonomyRegistry) -> Result<Self, TaxonomyIntegrityError> {
        let mut exact = HashMap::new();
        let mut normalized = HashMap::<String, u32>::new();
        let mut canonical = Vec::with_capacity(registry.requirement_count());

        for requirement in registry.requirements() {
            exact.insert(requirement.name.clone(), requirement.id);
            canonical.push((requirement.name.clone(), requirement.id));

            let key = normalize_requirement_name(&requirement.name);
            if let Some(&first_id) = normalized.get(&key) {
                if first_id != requirement.id {
                    return Err(TaxonomyIntegrityError::CollidingNormalizedName {
                        normalized: key,
                        first_id,
                        second_id: requirement.id,
                    });
                }
            }
            normalized.insert(key, requirement.id);
        }

        Ok(Self {
            exact,
            normalized,
            canonical,
        })
    }

    pub fn exact(&self, name: &str) -> Option<u32> {
        self.exact.get(name).copied()
    }

    pub fn normalized(&self, name: &str) -> Option<u32> {
        self.normalized
            .get(&normalize_requirement_name(name))
            .copied()
    }

    /// Canonical names in registry order.
    pub fn canonical_names(&self) -> impl Iterator<Item = (&str, u32)> {
        self.canonical.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_full_width_parentheses_and_list_separator() {
        assert_eq!(
            normalize_requirement_name("全球合规管理体系文件（ISO 37301 对标）"),
            "全球合规管理体系文件ISO 37301 对标"
        );
        assert_eq!(normalize_requirement_name("规避、降低"), "规避降低");
        assert_eq!(
            normalize_requirement_name("危机管理与业务连续性计划(BCP)制度"),
            "危机管理与业务连续性计划(BCP)制度"
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in [
            "（甲、乙）",
            "  环境与气候变化管理办法（ESG） ",
            "（ 甲）",
            "乙 、",
            "plain",
            "",
        ] {
            let once = normalize_requirement_name(raw);
            assert_eq!(normalize_requirement_name(&once), once, "{raw:?}");
        }
        assert_eq!(normalize_requirement_name("（ 甲）"), "甲");
    }

    #[test]
    fn index_resolves_exact_and_normalized_names() {
        let registry = TaxonomyRegistry::builtin().expect("valid");
        let index = NameIndex::build(&registry).expect("valid");
        assert_eq!(index.exact("反腐败与反贿赂政策"), Some(13));
        assert_eq!(index.exact("全球合规管理体系文件ISO 37301 对标"), None);
        assert_eq!(index.normalized("全球合规管理体系文件ISO 37301 对标"), Some(12));
        assert_eq!(index.normalized("环境与气候变化管理办法ESG"), Some(23));
        assert_eq!(index.canonical_names().count(), 35);
        assert_eq!(index.canonical_names().next(), Some(("海外业务治理与决策管理办法", 1)));
    }
}
