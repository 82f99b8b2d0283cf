//! Local filtering over an already-loaded snippet list.

use crate::models::language::Language;
use crate::models::snippet::Snippet;

/// Search term and language filter, AND-combined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnippetFilter {
    pub search: String,
    pub language: Option<Language>,
}

impl SnippetFilter {
    pub fn is_active(&self) -> bool {
        !self.search.is_empty() || self.language.is_some()
    }

    pub fn matches(&self, snippet: &Snippet) -> bool {
        self.matches_search(snippet) && self.matches_language(snippet)
    }

    /// Case-insensitive substring match on title or description.
    fn matches_search(&self, snippet: &Snippet) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        snippet.title.to_lowercase().contains(&needle)
            || snippet.description.to_lowercase().contains(&needle)
    }

    fn matches_language(&self, snippet: &Snippet) -> bool {
        self.language
            .as_ref()
            .is_none_or(|lang| *lang == snippet.language)
    }

    /// The matching subset, in list order.
    pub fn apply<'a>(&self, snippets: &'a [Snippet]) -> Vec<&'a Snippet> {
        snippets.iter().filter(|s| self.matches(s)).collect()
    }
}

/// Distinct languages in first-seen order.
pub fn languages_present(snippets: &[Snippet]) -> Vec<Language> {
    let mut seen: Vec<Language> = Vec::new();
    for snippet in snippets {
        if !seen.contains(&snippet.language) {
            seen.push(snippet.language.clone());
        }
    }
    seen
}
