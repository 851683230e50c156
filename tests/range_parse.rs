use sheetbinder::{
    error::ParseError,
    range::{parse_numbering_overrides, parse_range, parse_ratio, parse_skip},
};
use std::collections::{BTreeMap, BTreeSet};

fn set(v: &[u32]) -> BTreeSet<u32> {
    v.iter().copied().collect()
}

#[test]
fn ranges_and_singles() {
    assert_eq!(parse_range("1-3,5").unwrap(), set(&[1, 2, 3, 5]));
    assert_eq!(parse_skip("2,4-5,7").unwrap(), set(&[2, 4, 5, 7]));
    assert_eq!(parse_range(" 1 - 2 , , 9 ").unwrap(), set(&[1, 2, 9]));
    assert!(parse_range("").unwrap().is_empty());
}

#[test]
fn malformed_range_fails_whole_expression() {
    assert!(matches!(
        parse_range("1,x,3"),
        Err(ParseError::InvalidNumber { .. })
    ));
    assert!(matches!(
        parse_range("5-3"),
        Err(ParseError::DescendingRange { .. })
    ));
    assert!(parse_skip("2-").is_err());
}

#[test]
fn overrides_map_ranges_onto_consecutive_numbers() {
    let got = parse_numbering_overrides("1-3:10");
    let want: BTreeMap<u32, u32> = [(1, 10), (2, 11), (3, 12)].into_iter().collect();
    assert_eq!(got, want);
}

#[test]
fn overrides_drop_bad_tokens_and_keep_the_rest() {
    let got = parse_numbering_overrides("abc, 4:x, 7, 2:20, 6-5:1");
    let want: BTreeMap<u32, u32> = [(2, 20)].into_iter().collect();
    assert_eq!(got, want);
}

#[test]
fn later_override_wins() {
    let got = parse_numbering_overrides("1-2:5, 2:40");
    assert_eq!(got.get(&1), Some(&5));
    assert_eq!(got.get(&2), Some(&40));
}

#[test]
fn ratio_forms() {
    assert_eq!(parse_ratio("1/8").unwrap(), 0.125);
    assert_eq!(parse_ratio(" 0.25 ").unwrap(), 0.25);
    assert!(parse_ratio("1/0").is_err());
    assert!(parse_ratio("3/2").is_err());
    assert!(parse_ratio("half").is_err());
}

#[test]
fn override_past_u32_max_is_dropped() {
    let got = parse_numbering_overrides("1-2:4294967295, 5:1, 7:4294967295");
    let want: BTreeMap<u32, u32> = [(5, 1), (7, u32::MAX)].into_iter().collect();
    assert_eq!(got, want);
}

#[test]
fn over_wide_spans_are_rejected() {
    assert!(matches!(
        parse_skip("1-4000000000"),
        Err(ParseError::SpanTooWide { .. })
    ));
    assert!(matches!(
        parse_range("3, 10-20000"),
        Err(ParseError::SpanTooWide { .. })
    ));
    let got = parse_numbering_overrides("1-4000000000:1, 2:9");
    let want: BTreeMap<u32, u32> = [(2, 9)].into_iter().collect();
    assert_eq!(got, want);
}
