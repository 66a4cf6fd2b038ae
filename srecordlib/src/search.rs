use crate::block::Block;
use regex::bytes::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchType {
    Hex(Vec<u8>),
    Ascii(String),
    Regex(String),
}

/// Searches for a pattern in the block data.
pub fn search<'a>(blocks: impl Iterator<Item = &'a Block>, search_type: &SearchType) -> Vec<u64> {
    match search_type {
        SearchType::Hex(p) => search_bytes(blocks, p),
        SearchType::Ascii(s) => search_bytes(blocks, s.as_bytes()),
        SearchType::Regex(p) => search_regex(blocks, p),
    }
}

/// Lowest address at or after `start_address` where `pattern` occurs inside one block.
pub fn find_first<'a>(
    blocks: impl Iterator<Item = &'a Block>,
    pattern: &[u8],
    start_address: u64,
) -> Option<u64> {
    if pattern.is_empty() {
        return None;
    }

    for block in blocks.filter(|b| b.eadr() > start_address) {
        let skip = usize::try_from(start_address.saturating_sub(block.sadr())).ok()?;
        let hit = block.bytes()[skip..]
            .windows(pattern.len())
            .position(|window| window == pattern);
        if let Some(offset) = hit {
            return Some(block.sadr() + (skip + offset) as u64);
        }
    }
    None
}

/// Slide window search over all blocks.
/// Returns the starting addresses of all matches.
fn search_bytes<'a>(blocks: impl Iterator<Item = &'a Block>, pattern: &[u8]) -> Vec<u64> {
    let size = pattern.len();
    if size == 0 {
        return vec![];
    }

    let mut matches = Vec::new();

    for block in blocks {
        // Gaps hold no data, so a match never spans two blocks.
        for (offset, window) in block.bytes().windows(size).enumerate() {
            if window == pattern {
                matches.push(block.sadr() + offset as u64);
            }
        }
    }

    matches
}

/// Regex search over all blocks.
/// Returns the starting addresses of all matches.
fn search_regex<'a>(blocks: impl Iterator<Item = &'a Block>, pattern: &str) -> Vec<u64> {
    let Ok(re) = Regex::new(pattern) else {
        return vec![];
    };
    let mut matches = Vec::new();

    for block in blocks {
        for mtch in re.find_iter(block.bytes()) {
            matches.push(block.sadr() + mtch.start() as u64);
        }
    }

    matches
}
