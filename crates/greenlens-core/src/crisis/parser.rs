//! Year-block parser for generated scenario documents
//!
//! A document is a sequence of sections introduced by `### `. The first four
//! characters after each marker are the year label; the rest of the section,
//! trimmed, is its text. Anything before the first marker is ignored.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Section marker the text provider is asked to emit
pub const YEAR_MARKER: &str = "### ";

/// Characters taken from the start of a section as its year label
const YEAR_TOKEN_LEN: usize = 4;

/// One year's scenario text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearBlock {
    pub year: String,
    pub text: String,
}

impl YearBlock {
    pub fn new(year: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            text: text.into(),
        }
    }
}

/// Split a generated document into year blocks
///
/// Blocks come back in order of first appearance. A year that appears twice
/// keeps its first position and takes the text of its last occurrence. A
/// document without any marker yields no blocks.
pub fn parse_year_blocks(document: &str) -> Vec<YearBlock> {
    let mut blocks: IndexMap<&str, &str> = IndexMap::new();

    for section in document.split(YEAR_MARKER).skip(1) {
        let (year, text) = split_token(section);
        *blocks.entry(year).or_default() = text.trim();
    }

    blocks
        .into_iter()
        .map(|(year, text)| YearBlock::new(year, text))
        .collect()
}

/// Labels of the parsed blocks, in order
pub fn block_years(blocks: &[YearBlock]) -> Vec<String> {
    blocks.iter().map(|b| b.year.clone()).collect()
}

/// Split off the first four characters (not bytes) of a section
fn split_token(section: &str) -> (&str, &str) {
    match section.char_indices().nth(YEAR_TOKEN_LEN) {
        Some((idx, _)) => section.split_at(idx),
        None => (section, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_years_in_order() {
        let doc = "Intro text\n\n### 2030\nRivers shrink.\n\n### 2050\nCities ration water.\n\n### 2100\nNew aquifers.\n";
        let blocks = parse_year_blocks(doc);
        assert_eq!(block_years(&blocks), vec!["2030", "2050", "2100"]);
        assert_eq!(blocks[0].text, "Rivers shrink.");
        assert_eq!(blocks[1].text, "Cities ration water.");
        assert_eq!(blocks[2].text, "New aquifers.");
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_year_blocks("").is_empty());
    }

    #[test]
    fn test_document_without_marker() {
        assert!(parse_year_blocks("2030: something\n2050: something else").is_empty());
        assert!(parse_year_blocks("## 2030\nonly two hashes").is_empty());
    }

    #[test]
    fn test_preamble_is_discarded() {
        let blocks = parse_year_blocks("Here are your scenarios:\n### 2030 text");
        assert_eq!(blocks, vec![YearBlock::new("2030", "text")]);
    }

    #[test]
    fn test_token_is_exactly_four_characters() {
        let blocks = parse_year_blocks("### 2030s were hot");
        assert_eq!(blocks[0].year, "2030");
        assert_eq!(blocks[0].text, "s were hot");

        let blocks = parse_year_blocks("### Year 2030\nbody");
        assert_eq!(blocks[0].year, "Year");
        assert_eq!(blocks[0].text, "2030\nbody");
    }

    #[test]
    fn test_token_counts_characters_not_bytes() {
        let blocks = parse_year_blocks("### Yıl1 kuraklık");
        assert_eq!(blocks[0].year, "Yıl1");
        assert_eq!(blocks[0].text, "kuraklık");
    }

    #[test]
    fn test_short_section() {
        let blocks = parse_year_blocks("### 20");
        assert_eq!(blocks, vec![YearBlock::new("20", "")]);

        let blocks = parse_year_blocks("### 2030");
        assert_eq!(blocks, vec![YearBlock::new("2030", "")]);
    }

    #[test]
    fn test_repeated_year_keeps_first_position_last_text() {
        let doc = "### 2030\nfirst\n### 2050\nmiddle\n### 2030\nsecond";
        let blocks = parse_year_blocks(doc);
        assert_eq!(block_years(&blocks), vec!["2030", "2050"]);
        assert_eq!(blocks[0].text, "second");
        assert_eq!(blocks[1].text, "middle");
    }

    #[test]
    fn test_text_is_trimmed() {
        let blocks = parse_year_blocks("### 2100   \n\n  Sea walls.  \n\n");
        assert_eq!(blocks[0].text, "Sea walls.");
    }
}
