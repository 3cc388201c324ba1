use crate::country::{CountryHit, CountryRecord, CountrySet, name_key};

/// How a query matched a country, best first.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchKind {
    Exact,
    Prefix,
    WordPrefix,
    Substring,
    IsoCode,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SearchMatch<'a> {
    pub hit: CountryHit<'a>,
    pub kind: MatchKind,
}

/// Search-as-you-type over country names and ISO codes.
///
/// Ordering contract:
/// - Better `MatchKind` first; equal kinds keep dataset order.
/// - Hits are positioned at the country centroid, so selecting one bypasses the hit-test.
///
/// A blank query or `limit == 0` returns nothing.
pub fn search_countries<'a>(set: &'a CountrySet, query: &str, limit: usize) -> Vec<SearchMatch<'a>> {
    let needle = name_key(query);
    if needle.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut matches: Vec<(MatchKind, usize, &CountryRecord)> = set
        .indexed()
        .filter_map(|(index, record)| match_kind(record, &needle).map(|kind| (kind, index, record)))
        .collect();
    matches.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    matches.truncate(limit);

    matches
        .into_iter()
        .map(|(kind, index, record)| SearchMatch {
            hit: CountryHit::new(index, record, record.centroid),
            kind,
        })
        .collect()
}

fn match_kind(record: &CountryRecord, needle: &str) -> Option<MatchKind> {
    let name = name_key(&record.name);
    if name == needle {
        return Some(MatchKind::Exact);
    }
    if name.starts_with(needle) {
        return Some(MatchKind::Prefix);
    }
    if name
        .split(|c: char| c.is_whitespace() || c == '-' || c == '(')
        .skip(1)
        .any(|word| word.starts_with(needle))
    {
        return Some(MatchKind::WordPrefix);
    }
    if name.contains(needle) {
        return Some(MatchKind::Substring);
    }
    if !record.iso_code.is_empty() && record.iso_code.eq_ignore_ascii_case(needle) {
        return Some(MatchKind::IsoCode);
    }
    None
}
