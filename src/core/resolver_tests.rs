use std::collections::HashMap;
use std::fs;

use crate::config::rules::PrecedenceRule;
use crate::config::MediaConfig;

use super::*;

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"").unwrap();
}

fn media_config(root: &Path, rules: &[(&str, &str)]) -> MediaConfig {
    let mut precedence = HashMap::new();
    for (action, rule) in rules {
        precedence.insert(action.to_string(), PrecedenceRule::parse(action, rule));
    }
    MediaConfig {
        media_path: root.to_path_buf(),
        default_image: "default.png".to_string(),
        video_file_extensions: vec![".mp4".to_string(), ".mkv".to_string()],
        arcade_system_enabled: false,
        arcade_systems: Vec::new(),
        precedence,
    }
}

fn event(action: &str, pairs: &[(&str, &str)]) -> Event {
    let params = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    Event::new(action, params)
}

#[test]
fn s1_rom_match_is_case_insensitive() {
    let tmp = tempfile::tempdir().unwrap();
    touch(tmp.path(), "mame/chasehq.png");

    let media = media_config(
        tmp.path(),
        &[("rungame", "rom scraped publisher system genre generic")],
    );
    let ev = event(
        "rungame",
        &[
            ("SystemId", "mame"),
            ("GamePath", "/roms/mame/chaseHQ.zip"),
            ("Publisher", "Taito"),
        ],
    );

    let result = resolve(&media, &ev);
    assert_eq!(result, MediaSet::single(tmp.path().join("mame/chasehq.png")));
}

#[test]
fn s2_falls_through_to_publisher_when_rom_missing() {
    let tmp = tempfile::tempdir().unwrap();
    touch(tmp.path(), "publisher/taito.png");

    let media = media_config(
        tmp.path(),
        &[("rungame", "rom scraped publisher system genre generic")],
    );
    let ev = event(
        "rungame",
        &[
            ("SystemId", "mame"),
            ("GamePath", "/roms/mame/chaseHQ.zip"),
            ("Publisher", "Taito"),
        ],
    );

    let result = resolve(&media, &ev);
    assert_eq!(result, MediaSet::single(tmp.path().join("publisher/taito.png")));
}

#[test]
fn s3_scraped_image_path_wins_when_no_rom_match() {
    let tmp = tempfile::tempdir().unwrap();

    let media = media_config(
        tmp.path(),
        &[("rungame", "rom scraped publisher system genre generic")],
    );
    let ev = event("rungame", &[("ImagePath", "/path/to/scraped.jpg")]);

    let result = resolve(&media, &ev);
    assert_eq!(result, MediaSet::single(PathBuf::from("/path/to/scraped.jpg")));
}

#[test]
fn s4_unknown_action_uses_default_rule_and_returns_all_matches_sorted() {
    let tmp = tempfile::tempdir().unwrap();
    touch(tmp.path(), "generic/b.png");
    touch(tmp.path(), "generic/a.png");

    let media = media_config(tmp.path(), &[("default", "generic")]);
    let ev = event("some_unknown_action", &[]);

    let result = resolve(&media, &ev);
    assert_eq!(
        result,
        MediaSet::new(vec![
            tmp.path().join("generic/a.png"),
            tmp.path().join("generic/b.png"),
        ])
    );
}

#[test]
fn s5_compound_term_concatenates_subterms_in_order() {
    let tmp = tempfile::tempdir().unwrap();
    touch(tmp.path(), "mame/chasehq.png");
    touch(tmp.path(), "publisher/taito.png");

    let media = media_config(tmp.path(), &[("rungame", "rom+publisher+system")]);
    let ev = event(
        "rungame",
        &[
            ("SystemId", "mame"),
            ("GamePath", "/roms/mame/chaseHQ.zip"),
            ("Publisher", "Taito"),
        ],
    );

    let result = resolve(&media, &ev);
    assert_eq!(
        result,
        MediaSet::new(vec![
            tmp.path().join("mame/chasehq.png"),
            tmp.path().join("publisher/taito.png"),
        ])
    );
}

#[test]
fn last_resort_default_image_when_nothing_matches() {
    let tmp = tempfile::tempdir().unwrap();

    let media = media_config(tmp.path(), &[("rungame", "rom publisher generic")]);
    let ev = event("rungame", &[("SystemId", "mame"), ("GamePath", "/roms/mame/x.zip")]);

    let result = resolve(&media, &ev);
    assert_eq!(result, MediaSet::single(tmp.path().join("default.png")));
}

#[test]
fn blank_term_returns_empty_set_and_stops_evaluation() {
    let tmp = tempfile::tempdir().unwrap();
    touch(tmp.path(), "generic/a.png");

    let media = media_config(tmp.path(), &[("sleep", "blank generic")]);
    let ev = event("sleep", &[]);

    let result = resolve(&media, &ev);
    assert!(result.is_empty());
}

#[test]
fn startup_path_expands_startup_template() {
    let tmp = tempfile::tempdir().unwrap();
    touch(tmp.path(), "startup/intro.mp4");

    let media = media_config(tmp.path(), &[("default", "generic")]);
    let result = resolve_startup(&media);
    assert_eq!(result, MediaSet::single(tmp.path().join("startup/intro.mp4")));
}

#[test]
fn game_basename_strips_last_extension_only() {
    assert_eq!(game_basename("/roms/mame/chaseHQ.zip"), "chaseHQ");
    assert_eq!(game_basename("/roms/mame/sub.dir/game.tar.gz"), "game.tar");
    assert_eq!(game_basename("noext"), "noext");
}
