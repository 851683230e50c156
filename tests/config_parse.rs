use sheetbinder::config::{Alignment, Config};

#[test]
fn parse_example_config() {
    let raw = include_str!("../sheetbinder.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.layout.page_width, 2481);
    assert_eq!(cfg.layout.alignment, Alignment::Center);
    assert!(cfg.strip.len() <= 3);
    assert!(!cfg.paths.out_dir.is_empty());
    cfg.validate().expect("example config is valid");
}

#[test]
fn default_config_is_valid() {
    Config::default().validate().expect("defaults are valid");
}

#[test]
fn rejects_overlap_larger_than_usable_height() {
    let mut cfg = Config::default();
    cfg.layout.page_height = 300;
    cfg.layout.top_margin_subsequent_pages = 100;
    cfg.layout.bottom_margin = 100;
    cfg.layout.overlap_pixels = 100;
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_bad_skip_expression() {
    let mut cfg = Config::default();
    cfg.numbering.skip = "1,x".into();
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("numbering.skip"));
}

#[test]
fn rejects_non_finite_resolution() {
    let mut cfg = Config::default();
    cfg.layout.resolution_dpi = f32::NAN;
    assert!(cfg.validate().is_err());
    cfg.layout.resolution_dpi = f32::INFINITY;
    assert!(cfg.validate().is_err());
}
