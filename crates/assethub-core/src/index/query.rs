//! Query tokenization and FTS5 match expression building.

/// Tokenize query text the way indexed text is tokenized: case-fold, split
/// on non-alphanumeric boundaries, drop empty tokens. No stemming.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build an FTS5 match expression from free query text.
///
/// Tokens are OR-ed with prefix matching ("oak chair" => `oak* OR chair*`);
/// relevance ranking decides the order of multi-token matches. Returns
/// `None` when the text contains no tokens.
pub fn build_match_expr(text: &str) -> Option<String> {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return None;
    }
    Some(
        tokens
            .iter()
            .map(|token| format!("{token}*"))
            .collect::<Vec<_>>()
            .join(" OR "),
    )
}
