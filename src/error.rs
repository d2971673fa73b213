use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxonomyIntegrityError {
    #[error("requirement identifier must be positive (category '{category}', name '{name}')")]
    ZeroIdentifier { category: String, name: String },

    #[error("requirement identifier {id} appears in both '{first_category}' and '{second_category}'")]
    DuplicateIdentifier {
        id: u32,
        first_category: String,
        second_category: String,
    },

    #[error("requirement name '{name}' is used by identifiers {first_id} and {second_id}")]
    DuplicateName {
        name: String,
        first_id: u32,
        second_id: u32,
    },

    #[error(
        "requirements {first_id} and {second_id} both normalize to '{normalized}'"
    )]
    CollidingNormalizedName {
        normalized: String,
        first_id: u32,
        second_id: u32,
    },

    #[error("category name '{0}' appears more than once")]
    DuplicateCategory(String),
}

/// A reply that stayed unparseable after every repair tier.
#[derive(Debug, Clone, Error)]
#[error("malformed provider output: {parse_error}")]
pub struct MalformedOutput {
    pub parse_error: String,
    pub text: String,
}

impl MalformedOutput {
    pub fn excerpt(&self, max_chars: usize) -> String {
        let mut out: String = self.text.chars().take(max_chars).collect();
        if self.text.chars().count() > max_chars {
            out.push('…');
        }
        out
    }
}
