//! Segment-aware ordering for dotted ids and mixed text/number names.

use std::cmp::Ordering;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Compare two dotted ids segment by segment.
///
/// Segments that both parse as integers compare numerically, anything else compares as text.
/// A shorter id that is a prefix of the longer one sorts first.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = compare_segment(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn compare_segment(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

/// Optional dotted ids; `None` sorts before any id.
pub fn compare_opt_ids(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => compare_ids(x, y),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

fn chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits: Option<bool> = None;
    for (i, ch) in s.char_indices() {
        let is_digit = ch.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != is_digit => {
                out.push(make_chunk(&s[start..i], prev));
                start = i;
            }
            _ => {}
        }
        in_digits = Some(is_digit);
    }
    if let Some(prev) = in_digits {
        out.push(make_chunk(&s[start..], prev));
    }
    out
}

fn make_chunk(s: &str, digits: bool) -> Chunk<'_> {
    if digits { Chunk::Digits(s) } else { Chunk::Text(s) }
}

/// Natural ordering for free text such as country or variable names.
///
/// Digit runs compare numerically, text runs compare case- and accent-insensitively, and the raw
/// strings break remaining ties so the order is total.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let ca = chunks(a);
    let cb = chunks(b);
    for (x, y) in ca.iter().zip(cb.iter()) {
        let ord = match (x, y) {
            (Chunk::Digits(x), Chunk::Digits(y)) => {
                let xv = x.trim_start_matches('0');
                let yv = y.trim_start_matches('0');
                xv.len().cmp(&yv.len()).then_with(|| xv.cmp(yv))
            }
            (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
            (Chunk::Text(x), Chunk::Text(y)) => fold(x).cmp(&fold(y)),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    ca.len().cmp(&cb.len()).then_with(|| a.cmp(b))
}

/// Lowercase with diacritics stripped: "São" -> "sao".
fn fold(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn sort_ids<S: AsRef<str>>(ids: &mut [S]) {
    ids.sort_by(|a, b| compare_ids(a.as_ref(), b.as_ref()));
}

pub fn sort_names<S: AsRef<str>>(names: &mut [S]) {
    names.sort_by(|a, b| compare_names(a.as_ref(), b.as_ref()));
}

#[cfg(test)]
mod tests {
    use super::{compare_ids, compare_names, compare_opt_ids, sort_ids, sort_names};
    use std::cmp::Ordering;

    #[test]
    fn numeric_segments_sort_numerically() {
        let mut ids = vec!["2.9", "2.10", "2.2"];
        sort_ids(&mut ids);
        assert_eq!(ids, vec!["2.2", "2.9", "2.10"]);

        assert_eq!(compare_ids("2.9", "2.10"), Ordering::Less);
        assert_eq!(compare_ids("2.2", "2.10"), Ordering::Less);
        assert_eq!(compare_ids("10", "9"), Ordering::Greater);
    }

    #[test]
    fn prefix_sorts_first() {
        assert_eq!(compare_ids("3", "3.1"), Ordering::Less);
        assert_eq!(compare_ids("3.1.1", "3.1"), Ordering::Greater);
        assert_eq!(compare_ids("3.1", "3.1"), Ordering::Equal);
    }

    #[test]
    fn non_numeric_segments_fall_back_to_text() {
        assert_eq!(compare_ids("3.a", "3.b"), Ordering::Less);
        assert_eq!(compare_opt_ids(None, Some("1")), Ordering::Less);
    }

    #[test]
    fn names_sort_naturally() {
        let mut names = vec!["item10", "Item2", "item1", "Brazil", "argentina"];
        sort_names(&mut names);
        assert_eq!(
            names,
            vec!["argentina", "Brazil", "item1", "Item2", "item10"]
        );
        assert_eq!(compare_names("Guinea", "Guinea-Bissau"), Ordering::Less);
    }

    #[test]
    fn accents_do_not_push_names_to_the_end() {
        let mut names = vec![
            "Saudi Arabia",
            "São Tomé and Príncipe",
            "Croatia",
            "Côte d'Ivoire",
            "Senegal",
        ];
        sort_names(&mut names);
        assert_eq!(
            names,
            vec![
                "Côte d'Ivoire",
                "Croatia",
                "São Tomé and Príncipe",
                "Saudi Arabia",
                "Senegal",
            ]
        );
        assert_eq!(compare_names("Sao", "São"), Ordering::Less);
    }
}
