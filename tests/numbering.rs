use sheetbinder::{
    batch::InputImage,
    config::{Config, StripRule},
    numbering::{Numbering, NumberingPlan, NumberingResolver},
    strip::StripPolicy,
};
use std::collections::{BTreeMap, BTreeSet};

#[test]
fn override_skip_and_counter() {
    let overrides: BTreeMap<u32, u32> = [(2, 50)].into_iter().collect();
    let skip: BTreeSet<u32> = [3].into_iter().collect();
    let mut r = NumberingResolver::new(overrides, skip);
    let got: Vec<_> = (1..=4).map(|p| r.resolve(p)).collect();
    assert_eq!(
        got,
        [
            Numbering::Number(1),
            Numbering::Number(50),
            Numbering::Skipped,
            Numbering::Number(2),
        ]
    );
}

#[test]
fn override_beats_skip() {
    let overrides: BTreeMap<u32, u32> = [(1, 7)].into_iter().collect();
    let skip: BTreeSet<u32> = [1].into_iter().collect();
    let mut r = NumberingResolver::new(overrides, skip);
    assert_eq!(r.resolve(1), Numbering::Number(7));
    assert_eq!(r.resolve(2), Numbering::Number(1));
}

#[test]
fn plan_attaches_strip_by_display_number() {
    let mut cfg = Config::default();
    cfg.numbering.overrides = "1:4".into();
    cfg.strip = vec![StripRule {
        questions: "4".into(),
        ratio: "1/4".into(),
    }];
    let images: Vec<_> = ["a1", "a2"]
        .iter()
        .map(|n| InputImage::new(*n, Vec::new()))
        .collect();

    let mut resolver = NumberingResolver::from_config(&cfg).unwrap();
    let strip = StripPolicy::from_config(&cfg).unwrap();
    let plan = NumberingPlan::build(&mut resolver, &strip, &images);

    assert_eq!(plan.entries[0].numbering, Numbering::Number(4));
    assert_eq!(plan.entries[0].strip_fraction, Some(0.25));
    assert_eq!(plan.entries[1].numbering, Numbering::Number(1));
    assert_eq!(plan.entries[1].strip_fraction, None);
}

#[test]
fn malformed_skip_is_fatal() {
    let mut cfg = Config::default();
    cfg.numbering.skip = "3-1".into();
    assert!(NumberingResolver::from_config(&cfg).is_err());
}
