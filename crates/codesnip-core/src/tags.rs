//! Tag text conversions between the editor's single text field and the
//! stored tag sequence.

/// Split a comma-separated tag field, trimming each entry and dropping
/// empties. Order is preserved and duplicates are kept.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join stored tags back into the editor's text field.
pub fn join_tags(tags: &[String]) -> String {
    tags.join(", ")
}
