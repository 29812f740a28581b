//! Keyword payload encoding and recovery.
//!
//! New rows always store the canonical JSON array-of-strings encoding.
//! Historical writers of the `generated_keywords` column were not as
//! disciplined: bracketed pseudo-arrays, comma-joined text and single bare
//! values all occur in old databases. All read paths go through
//! [`parse_stored_keywords`], which accepts every historical shape and never
//! fails.

/// Encodes a keyword sequence in the canonical storage form.
pub fn encode_keywords(keywords: &[String]) -> String {
    serde_json::to_string(keywords).unwrap_or_else(|_| "[]".to_string())
}

/// Decodes a stored keyword payload, whatever era wrote it.
///
/// Resolution order: canonical JSON array, bracketed pseudo-array text,
/// comma-separated text, single bare value, empty. Total on every input.
pub fn parse_stored_keywords(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    if let Ok(decoded) = serde_json::from_str::<Vec<String>>(raw) {
        return decoded;
    }

    let text = raw.trim();

    if let Some(inner) = text.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        return split_pieces(inner);
    }

    if text.contains(',') {
        return split_pieces(text);
    }

    if text.is_empty() {
        Vec::new()
    } else {
        vec![text.to_string()]
    }
}

fn split_pieces(text: &str) -> Vec<String> {
    text.split(',')
        .map(|piece| {
            piece
                .trim()
                .trim_matches(|ch| ch == '"' || ch == '\'')
                .trim()
                .to_string()
        })
        .filter(|piece| !piece.is_empty())
        .collect()
}
