//! Content de-duplication by content ID

use crate::store::ContentRow;
use std::collections::HashSet;

/// Deduplicate rows by id, keeping the first occurrence
///
/// # Arguments
/// * `rows` - Content rows as listed by the store, possibly with repeats
///
/// # Returns
/// Deduplicated rows, maintaining listing order
pub fn deduplicate_rows(rows: Vec<ContentRow>) -> Vec<ContentRow> {
    let mut seen: HashSet<String> = HashSet::new();

    rows.into_iter()
        .filter(|row| seen.insert(row.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deduplication() {
        let rows = vec![
            ContentRow::new("1", "text1").with_embedding(vec![1.0]),
            ContentRow::new("2", "text2"),
            ContentRow::new("1", "text1 edited"), // Duplicate
        ];

        let deduped = deduplicate_rows(rows);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].id, "1");
        assert_eq!(deduped[0].text, "text1"); // Keeps first
        assert_eq!(deduped[1].id, "2");
    }
}
