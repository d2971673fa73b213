mod catalog;
mod index;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::TaxonomyIntegrityError;

pub use index::NameIndex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementDefinition {
    pub id: u32,
    pub name: String,
    pub category: String,
    pub scope: String,
    pub key_points: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub requirements: Vec<RequirementDefinition>,
}

/// On-disk shape of one category, as accepted by `--taxonomy-path` and
/// written by the `taxonomy` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySpec {
    pub category: String,
    pub requirements: Vec<RequirementSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementSpec {
    pub number: u32,
    pub name: String,
    #[serde(default)]
    pub scope: String,
    #[serde(rename = "keyPoints", default)]
    pub key_points: String,
}

impl From<&RequirementDefinition> for RequirementSpec {
    fn from(requirement: &RequirementDefinition) -> Self {
        Self {
            number: requirement.id,
            name: requirement.name.clone(),
            scope: requirement.scope.clone(),
            key_points: requirement.key_points.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaxonomyRegistry {
    categories: Vec<Category>,
    positions: HashMap<u32, (usize, usize)>,
}

impl TaxonomyRegistry {
    pub fn builtin() -> Result<Self, TaxonomyIntegrityError> {
        let specs = catalog::BUILTIN_CATALOG
            .iter()
            .map(|(category, rows)| CategorySpec {
                category: (*category).to_string(),
                requirements: rows
                    .iter()
                    .map(|(number, name, scope, key_points)| RequirementSpec {
                        number: *number,
                        name: (*name).to_string(),
                        scope: (*scope).to_string(),
                        key_points: (*key_points).to_string(),
                    })
                    .collect(),
            })
            .collect();
        Self::from_categories(specs)
    }

    pub fn from_categories(specs: Vec<CategorySpec>) -> Result<Self, TaxonomyIntegrityError> {
        let mut categories = Vec::with_capacity(specs.len());
        let mut positions = HashMap::new();
        let mut names = HashMap::<String, u32>::new();

        for (category_idx, spec) in specs.into_iter().enumerate() {
            if categories
                .iter()
                .any(|existing: &Category| existing.name == spec.category)
            {
                return Err(TaxonomyIntegrityError::DuplicateCategory(spec.category));
            }

            let mut requirements = Vec::with_capacity(spec.requirements.len());
            for (requirement_idx, requirement) in spec.requirements.into_iter().enumerate() {
                if requirement.number == 0 {
                    return Err(TaxonomyIntegrityError::ZeroIdentifier {
                        category: spec.category,
                        name: requirement.name,
                    });
                }

                if let Some(&(first_cat, _)) = positions.get(&requirement.number) {
                    let first_category = if first_cat == category_idx {
                        spec.category.clone()
                    } else {
                        let existing: &Category = &categories[first_cat];
                        existing.name.clone()
                    };
                    return Err(TaxonomyIntegrityError::DuplicateIdentifier {
                        id: requirement.number,
                        first_category,
                        second_category: spec.category,
                    });
                }

                if let Some(&first_id) = names.get(&requirement.name) {
                    return Err(TaxonomyIntegrityError::DuplicateName {
                        name: requirement.name,
                        first_id,
                        second_id: requirement.number,
                    });
                }

                names.insert(requirement.name.clone(), requirement.number);
                positions.insert(requirement.number, (category_idx, requirement_idx));
                requirements.push(RequirementDefinition {
                    id: requirement.number,
                    name: requirement.name,
                    category: spec.category.clone(),
                    scope: requirement.scope,
                    key_points: requirement.key_points,
                });
            }

            categories.push(Category {
                name: spec.category,
                requirements,
            });
        }

        let registry = Self {
            categories,
            positions,
        };
        // Normalized-name collisions are checked by building the index once.
        NameIndex::build(&registry)?;
        Ok(registry)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Requirements in registry order (category order, then list order).
    pub fn requirements(&self) -> impl Iterator<Item = &RequirementDefinition> {
        self.categories
            .iter()
            .flat_map(|category| category.requirements.iter())
    }

    pub fn get(&self, id: u32) -> Option<&RequirementDefinition> {
        let &(category_idx, requirement_idx) = self.positions.get(&id)?;
        self.categories
            .get(category_idx)
            .and_then(|category| category.requirements.get(requirement_idx))
    }

    pub fn contains(&self, id: u32) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn requirement_count(&self) -> usize {
        self.positions.len()
    }

    pub fn to_specs(&self) -> Vec<CategorySpec> {
        self.categories
            .iter()
            .map(|category| CategorySpec {
                category: category.name.clone(),
                requirements: category
                    .requirements
                    .iter()
                    .map(RequirementSpec::from)
                    .collect(),
            })
            .collect()
    }
}

/// A sub-range of the taxonomy sent to a provider in one call.
#[derive(Debug, Clone, Serialize)]
pub struct TaxonomyChunk<'a> {
    pub index: usize,
    #[serde(serialize_with = "serialize_chunk_categories")]
    pub categories: Vec<&'a Category>,
}

impl TaxonomyChunk<'_> {
    pub fn requirement_ids(&self) -> Vec<u32> {
        self.categories
            .iter()
            .flat_map(|category| category.requirements.iter().map(|requirement| requirement.id))
            .collect()
    }
}

fn serialize_chunk_categories<S>(categories: &[&Category], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_map(categories.iter().map(|category| {
        let rows = category
            .requirements
            .iter()
            .map(RequirementSpec::from)
            .collect::<Vec<RequirementSpec>>();
        (category.name.as_str(), rows)
    }))
}

/// Consecutive runs of whole categories; every requirement lands in exactly
/// one chunk.
pub fn split_taxonomy(registry: &TaxonomyRegistry, categories_per_call: usize) -> Vec<TaxonomyChunk<'_>> {
    let size = categories_per_call.max(1);
    registry
        .categories()
        .chunks(size)
        .enumerate()
        .map(|(index, group)| TaxonomyChunk {
            index,
            categories: group.iter().collect(),
        })
        .collect()
}
