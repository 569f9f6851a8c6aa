use regex::Regex;
use uuid::Uuid;

use crate::{error::ApiError, models::Category, repository::RepositoryState};

// Description words this short carry too little signal to discriminate
// between categories.
const MIN_DESCRIPTION_WORD_LEN: usize = 5;

/// match_categories
///
/// The pure matching core: returns the ids of every category whose name, or
/// failing that one of the significant words of its description, appears as a
/// whole word (case-insensitive) in `content`.
///
/// Per category, a name hit short-circuits — the description is not scanned.
/// Otherwise the description is split on whitespace, words shorter than five
/// characters are dropped, and the first matching word includes the category.
///
/// Deterministic and side-effect free: the same content and category set
/// always yield the same id set, regardless of enumeration order.
pub fn match_categories(content: &str, categories: &[Category]) -> Vec<Uuid> {
    let mut matched = Vec::new();

    for category in categories {
        if word_match(content, &category.name) {
            matched.push(category.id);
            continue;
        }

        if let Some(description) = &category.description {
            let hit = description
                .split_whitespace()
                .filter(|word| word.chars().count() >= MIN_DESCRIPTION_WORD_LEN)
                .any(|word| word_match(content, word));
            if hit {
                matched.push(category.id);
            }
        }
    }

    matched
}

/// Whole-word, case-insensitive containment check. The term is escaped, so
/// category names and description words are always treated literally.
fn word_match(content: &str, term: &str) -> bool {
    let term = term.trim();
    if term.is_empty() {
        return false;
    }
    let pattern = format!(r"(?i)\b{}\b", regex::escape(term));
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(content),
        // Unreachable with an escaped term; treated as a non-match.
        Err(_) => false,
    }
}

/// CategoryMatcher
///
/// The service wrapper the lifecycle engine calls whenever note content
/// changes. Loads the full (small) category set from the repository and runs
/// the pure matcher over it.
#[derive(Clone)]
pub struct CategoryMatcher {
    repo: RepositoryState,
}

impl CategoryMatcher {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// assign_categories
    ///
    /// Computes the category id set for `content`. Any failure while reading
    /// the category set propagates to the caller — a partial result is never
    /// reported as success.
    pub async fn assign_categories(&self, content: &str) -> Result<Vec<Uuid>, ApiError> {
        let categories = self.repo.get_categories().await?;
        Ok(match_categories(content, &categories))
    }
}
