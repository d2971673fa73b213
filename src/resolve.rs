use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;

use crate::taxonomy::{NameIndex, TaxonomyRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    Identifier,
    ExactName,
    NormalizedName,
    Fuzzy,
    NumericFallback,
}

impl ResolutionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::ExactName => "exact_name",
            Self::NormalizedName => "normalized_name",
            Self::Fuzzy => "fuzzy",
            Self::NumericFallback => "numeric_fallback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub id: u32,
    pub method: ResolutionMethod,
}

/// Maps provider labels onto registry identifiers. Identifiers win over
/// names; names fall back from exact to normalized to substring to the
/// first embedded number.
#[derive(Debug)]
pub struct Resolver<'a> {
    registry: &'a TaxonomyRegistry,
    index: &'a NameIndex,
    digits: Regex,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a TaxonomyRegistry, index: &'a NameIndex) -> Result<Self> {
        let digits = Regex::new(r"[0-9]+").context("failed to compile digit regex")?;
        Ok(Self {
            registry,
            index,
            digits,
        })
    }

    pub fn registry(&self) -> &'a TaxonomyRegistry {
        self.registry
    }

    pub fn resolve(&self, label_id: Option<u32>, label_name: Option<&str>) -> Option<Resolution> {
        if let Some(id) = label_id.filter(|id| self.registry.contains(*id)) {
            return Some(Resolution {
                id,
                method: ResolutionMethod::Identifier,
            });
        }

        let name = label_name.map(str::trim).filter(|name| !name.is_empty())?;

        if let Some(id) = self.index.exact(name) {
            return Some(Resolution {
                id,
                method: ResolutionMethod::ExactName,
            });
        }
        if let Some(id) = self.index.normalized(name) {
            return Some(Resolution {
                id,
                method: ResolutionMethod::NormalizedName,
            });
        }

        // First hit in registry order; a short label can land on the wrong
        // requirement, which is why fuzzy hits are reported separately.
        if let Some((_, id)) = self
            .index
            .canonical_names()
            .find(|(canonical, _)| canonical.contains(name) || name.contains(canonical))
        {
            return Some(Resolution {
                id,
                method: ResolutionMethod::Fuzzy,
            });
        }

        self.digits
            .find(name)
            .and_then(|digits| digits.as_str().parse::<u32>().ok())
            .filter(|id| self.registry.contains(*id))
            .map(|id| Resolution {
                id,
                method: ResolutionMethod::NumericFallback,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(label_id: Option<u32>, label_name: Option<&str>) -> Option<Resolution> {
        let registry = TaxonomyRegistry::builtin().expect("valid");
        let index = NameIndex::build(&registry).expect("valid");
        let resolver = Resolver::new(&registry, &index).expect("resolver builds");
        resolver.resolve(label_id, label_name)
    }

    #[test]
    fn identifier_takes_precedence_over_name() {
        assert_eq!(
            resolve(Some(5), Some("totally unrelated text")),
            Some(Resolution {
                id: 5,
                method: ResolutionMethod::Identifier
            })
        );
        assert_eq!(
            resolve(Some(5), Some("反腐败与反贿赂政策")).map(|r| r.id),
            Some(5)
        );
    }

    #[test]
    fn unknown_identifier_falls_back_to_name() {
        assert_eq!(
            resolve(Some(99), Some("反腐败与反贿赂政策")),
            Some(Resolution {
                id: 13,
                method: ResolutionMethod::ExactName
            })
        );
    }

    #[test]
    fn normalized_name_matches_without_full_width_punctuation() {
        assert_eq!(
            resolve(None, Some("全球合规管理体系文件ISO 37301 对标")),
            Some(Resolution {
                id: 12,
                method: ResolutionMethod::NormalizedName
            })
        );
        assert_eq!(
            resolve(None, Some("（ 全球合规管理体系文件ISO 37301 对标）")),
            Some(Resolution {
                id: 12,
                method: ResolutionMethod::NormalizedName
            })
        );
    }

    #[test]
    fn method_names_match_their_serialized_form() {
        for method in [
            ResolutionMethod::Identifier,
            ResolutionMethod::ExactName,
            ResolutionMethod::NormalizedName,
            ResolutionMethod::Fuzzy,
            ResolutionMethod::NumericFallback,
        ] {
            assert_eq!(
                serde_json::to_value(method).expect("serialize"),
                serde_json::Value::from(method.as_str())
            );
        }
    }

    #[test]
    fn numbered_label_resolves_to_its_requirement() {
        let resolution = resolve(None, Some("7. 风险识别评估与分级管理办法")).expect("resolves");
        assert_eq!(resolution.id, 7);
        assert_eq!(resolution.method, ResolutionMethod::Fuzzy);
    }

    #[test]
    fn substring_match_uses_registry_order() {
        assert_eq!(
            resolve(None, Some("风险")),
            Some(Resolution {
                id: 2,
                method: ResolutionMethod::Fuzzy
            })
        );
        assert_eq!(
            resolve(None, Some("外汇风险管理")).map(|r| r.id),
            Some(18)
        );
    }

    #[test]
    fn digits_are_the_last_resort() {
        assert_eq!(
            resolve(None, Some("第7项要求")),
            Some(Resolution {
                id: 7,
                method: ResolutionMethod::NumericFallback
            })
        );
        assert_eq!(resolve(None, Some("第36项要求")), None);
    }

    #[test]
    fn empty_or_missing_labels_are_unresolved() {
        assert_eq!(resolve(None, None), None);
        assert_eq!(resolve(None, Some("   ")), None);
        assert_eq!(resolve(Some(0), Some("")), None);
    }
}
