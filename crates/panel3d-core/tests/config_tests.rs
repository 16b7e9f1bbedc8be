mod common;

use common::attrs;
use panel3d_core::config::parse_bool;
use panel3d_core::constants::{STARS_DEFAULT_COUNT, STARS_MAX_COUNT};
use panel3d_core::gears::{Axis, GearConfig};
use panel3d_core::*;

#[test]
fn empty_attributes_yield_documented_defaults() {
    let cfg = ViewerConfig::from_attributes(&Attributes::new());
    assert_eq!(cfg.model, None);
    assert!(!cfg.autorotate);
    assert_eq!(cfg.zoom, 1.0);
    assert_eq!(cfg.background, None);
    assert!(!cfg.shadows);
    assert!(cfg.ground.is_none());
    assert_eq!(cfg.exposure, 1.0);
    assert!(cfg.stars.is_none());
    assert_eq!(cfg.clear_color(), ClearColor::TRANSPARENT);
    assert!(!cfg.shadow_map_enabled());
}

#[test]
fn malformed_numbers_fail_closed() {
    let cfg = ViewerConfig::from_attributes(&attrs(&[
        ("zoom", "-2"),
        ("exposure", "bright"),
        ("ground", "true"),
        ("ground-opacity", "NaN"),
        ("stars", ""),
        ("stars-count", "lots"),
        ("stars-size", "0"),
    ]));
    assert_eq!(cfg.zoom, 1.0);
    assert_eq!(cfg.exposure, 1.0);
    assert_eq!(cfg.ground.as_ref().map(|g| g.opacity), Some(0.25));
    let stars = cfg.stars.expect("stars enabled by bare attribute");
    assert_eq!(stars.count, 900);
    assert_eq!(stars.size, 0.8);
    assert_eq!(stars.radius, 50.0);
}

#[test]
fn ground_opacity_is_capped_at_one() {
    let cfg = ViewerConfig::from_attributes(&attrs(&[("ground", "1"), ("ground-opacity", "3")]));
    assert_eq!(cfg.ground.map(|g| g.opacity), Some(1.0));
}

#[test]
fn both_shadow_spellings_enable_shadows() {
    for key in ["shadow", "shadows"] {
        let cfg = ViewerConfig::from_attributes(&attrs(&[(key, "true")]));
        assert!(cfg.shadows, "{key}");
        assert!(cfg.shadow_map_enabled());
    }
}

#[test]
fn ground_alone_turns_the_shadow_map_on() {
    let cfg = ViewerConfig::from_attributes(&attrs(&[("ground", "yes")]));
    assert!(!cfg.shadows);
    assert!(cfg.shadow_map_enabled());
}

#[test]
fn clear_color_precedence() {
    let explicit = ViewerConfig::from_attributes(&attrs(&[
        ("bg-color", "#ffffff"),
        ("bg-alpha", "0.5"),
        ("stars", "true"),
    ]));
    let c = explicit.clear_color();
    assert_eq!(c.rgb, [1.0, 1.0, 1.0]);
    assert_eq!(c.alpha, 0.5);

    let starry = ViewerConfig::from_attributes(&attrs(&[("stars", "true")]));
    assert_eq!(starry.clear_color(), ClearColor::OPAQUE_BLACK);
}

#[test]
fn color_forms() {
    assert_eq!(Rgb::parse("#fff"), Some(Rgb::WHITE));
    assert_eq!(Rgb::parse("0x000000"), Some(Rgb::BLACK));
    assert_eq!(Rgb::parse("FF0000"), Some(Rgb::new(1.0, 0.0, 0.0)));
    assert_eq!(Rgb::parse(" White "), Some(Rgb::WHITE));
    assert_eq!(Rgb::parse("#12345"), None);
    assert_eq!(Rgb::parse("teal"), None);
}

#[test]
fn bool_forms() {
    assert!(parse_bool(Some(""), false));
    assert!(parse_bool(Some("YES"), false));
    assert!(!parse_bool(Some("0"), true));
    assert!(parse_bool(Some("maybe"), true));
    assert!(!parse_bool(None, false));
}

#[test]
fn gear_defaults() {
    let g = GearConfig::from_attributes(&Attributes::new());
    assert!(g.names.is_empty());
    assert_eq!(g.pattern, None);
    assert!(g.auto);
    assert_eq!(g.max_count, 12);
    assert_eq!(g.tolerance, 0.18);
    assert_eq!(g.flatness, 1.4);
    assert_eq!(g.axis, Axis::Z);
    assert_eq!(g.speed, 2.0);
    assert!(g.alternate);
    assert!(!g.log_tree);
    assert!(!g.force_procedural);
}

#[test]
fn gear_attributes_parse() {
    let g = GearConfig::from_attributes(&attrs(&[
        ("gear-names", " Big , Small,, "),
        ("gear-match", "/cog/i"),
        ("gear-auto", "false"),
        ("gear-axis", "Y"),
        ("gear-speed", "-1.5"),
        ("gear-alternate-dir", "no"),
        ("use-built-in-anim", "false"),
    ]));
    assert_eq!(g.names, vec!["Big".to_owned(), "Small".to_owned()]);
    assert_eq!(g.pattern.as_deref(), Some("/cog/i"));
    assert!(!g.auto);
    assert_eq!(g.axis, Axis::Y);
    assert_eq!(g.speed, -1.5);
    assert!(!g.alternate);
    assert!(g.force_procedural);
    assert_eq!(g.resolvers().len(), 2);
}

#[test]
fn oversized_star_count_falls_back_to_default() {
    let cfg = ViewerConfig::from_attributes(&attrs(&[
        ("stars", "true"),
        ("stars-count", "18446744073709551615"),
    ]));
    assert_eq!(cfg.stars.map(|s| s.count), Some(STARS_DEFAULT_COUNT));

    let at_max = STARS_MAX_COUNT.to_string();
    let cfg = ViewerConfig::from_attributes(&attrs(&[
        ("stars", "true"),
        ("stars-count", at_max.as_str()),
    ]));
    assert_eq!(cfg.stars.map(|s| s.count), Some(STARS_MAX_COUNT));
}
