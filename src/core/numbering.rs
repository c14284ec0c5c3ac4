//! Human record numbers of the form `PREFIX-YYYY-NNN`

/// Next free number for `prefix` in `year`.
///
/// One above the highest sequence already used for that prefix and year;
/// numbers with another prefix, another year or an unparsable sequence are
/// ignored. The sequence is zero-padded to three digits and keeps growing
/// past 999.
pub fn next_number<'a>(
    prefix: &str,
    year: i32,
    existing: impl IntoIterator<Item = &'a str>,
) -> String {
    let prefix = prefix.trim().to_ascii_uppercase();
    let head = format!("{}-{}-", prefix, year);

    let highest = existing
        .into_iter()
        .filter_map(|n| n.trim().strip_prefix(head.as_str()))
        .filter_map(|seq| seq.parse::<u64>().ok())
        .max()
        .unwrap_or(0);

    format!("{}{:03}", head, highest.saturating_add(1))
}

/// Upper-case code for a document type, used as a document number prefix
/// (e.g. "Work Instruction" -> "WI", "SOP" -> "SOP")
pub fn document_prefix(document_type: &str) -> String {
    let words: Vec<&str> = document_type
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    match words.as_slice() {
        [] => "DOC".to_string(),
        [single] => single.to_ascii_uppercase(),
        many => many
            .iter()
            .filter_map(|w| w.chars().next())
            .map(|c| c.to_ascii_uppercase())
            .collect(),
    }
}
