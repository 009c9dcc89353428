//! Ranked recipe search for item pickers.

use std::cmp::Ordering;

use craftwise_core::{ItemId, Recipe};
use serde::{Deserialize, Serialize};

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMatch {
    pub id: ItemId,
    pub name: String,
    pub is_base: bool,
    /// Display label, e.g. `Plank (Base)`.
    pub label: String,
    #[serde(skip)]
    kind: MatchKind,
    #[serde(skip)]
    offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
enum MatchKind {
    #[default]
    Exact,
    Prefix,
    Substring,
}

impl SearchMatch {
    fn new(recipe: &Recipe, kind: MatchKind, offset: usize) -> Self {
        let suffix = if recipe.is_base { "Base" } else { "Craft" };
        Self {
            id: recipe.id.clone(),
            name: recipe.name.clone(),
            is_base: recipe.is_base,
            label: format!("{} ({})", recipe.name, suffix),
            kind,
            offset,
        }
    }

    fn rank(&self, other: &Self) -> Ordering {
        self.kind
            .cmp(&other.kind)
            .then(self.offset.cmp(&other.offset))
            .then_with(|| self.name.to_lowercase().cmp(&other.name.to_lowercase()))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Case-insensitive search over recipe names.
///
/// Exact matches rank first, then prefixes, then substrings ordered by where
/// the query occurs. An empty query lists everything by name.
pub fn search_recipes<'a>(
    recipes: impl IntoIterator<Item = &'a Recipe>,
    query: &str,
    limit: usize,
) -> Vec<SearchMatch> {
    let needle = query.trim().to_lowercase();

    let mut matches: Vec<SearchMatch> = recipes
        .into_iter()
        .filter_map(|recipe| {
            let name = recipe.name.to_lowercase();
            if needle.is_empty() {
                return Some(SearchMatch::new(recipe, MatchKind::Substring, 0));
            }
            let offset = name.find(&needle)?;
            let kind = if name == needle {
                MatchKind::Exact
            } else if offset == 0 {
                MatchKind::Prefix
            } else {
                MatchKind::Substring
            };
            Some(SearchMatch::new(recipe, kind, offset))
        })
        .collect();

    matches.sort_by(SearchMatch::rank);
    matches.truncate(limit);
    matches
}
