// Author: Dustin Pilgrim
// License: MIT

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::rules::{PatternKind, RuleTerm, SimpleTerm};
use crate::config::MediaConfig;
use crate::core::event::Event;
use crate::core::glob;
use crate::core::media_set::MediaSet;

/// Translates an [`Event`] into a [`MediaSet`] using the action's configured
/// precedence rule. Falls back to `media_path/default_image` if every term
/// yields no match and no `blank` term was seen.
pub fn resolve(media: &MediaConfig, event: &Event) -> MediaSet {
    let rule = media.precedence_for(&event.action);

    for term in rule.terms() {
        match evaluate_term(media, term, event) {
            TermOutcome::Matched(set) => return set,
            TermOutcome::Skip => continue,
        }
    }

    let fallback = media.media_path.join(&media.default_image);
    debug!(action = %event.action, fallback = %fallback.display(), "no precedence term matched; using default image");
    MediaSet::single(fallback)
}

/// The `startup` entry point used once at program start: the plain
/// expansion of the `startup` glob template, independent of any event.
pub fn resolve_startup(media: &MediaConfig) -> MediaSet {
    expand_template(media, "startup/*")
}

enum TermOutcome {
    /// Term fired and terminates evaluation with this result (possibly empty,
    /// for `blank`).
    Matched(MediaSet),
    /// Term yielded nothing; continue to the next term.
    Skip,
}

fn evaluate_term(media: &MediaConfig, term: &RuleTerm, event: &Event) -> TermOutcome {
    match term {
        RuleTerm::Simple(simple) => evaluate_simple(media, *simple, event),
        RuleTerm::Compound(subterms) => {
            let mut paths = Vec::new();
            for sub in subterms {
                if let TermOutcome::Matched(set) = evaluate_simple(media, *sub, event) {
                    paths.extend(set.into_vec());
                }
            }
            if paths.is_empty() {
                TermOutcome::Skip
            } else {
                TermOutcome::Matched(MediaSet::new(paths))
            }
        }
    }
}

fn evaluate_simple(media: &MediaConfig, term: SimpleTerm, event: &Event) -> TermOutcome {
    match term {
        SimpleTerm::Blank => TermOutcome::Matched(MediaSet::empty()),
        SimpleTerm::Scraped => {
            let image_path = event.image_path();
            if image_path.is_empty() {
                TermOutcome::Skip
            } else {
                TermOutcome::Matched(MediaSet::single(PathBuf::from(image_path)))
            }
        }
        SimpleTerm::Pattern(kind) => {
            let set = expand_pattern(media, kind, event);
            if set.is_empty() {
                TermOutcome::Skip
            } else {
                TermOutcome::Matched(set)
            }
        }
    }
}

fn expand_pattern(media: &MediaConfig, kind: PatternKind, event: &Event) -> MediaSet {
    let template = match kind {
        PatternKind::Rom => format!(
            "{}/{}.*",
            event.system_id().to_lowercase(),
            game_basename(event.game_path())
        ),
        PatternKind::Publisher => format!("publisher/{}.*", event.publisher().to_lowercase()),
        PatternKind::Genre => format!("genre/{}.*", event.genre().to_lowercase()),
        PatternKind::System => format!("system/{}.*", event.system_id().to_lowercase()),
        PatternKind::Generic => "generic/*".to_string(),
        PatternKind::Screensaver => "screensaver/*".to_string(),
        PatternKind::Startup => "startup/*".to_string(),
    };
    expand_template(media, &template)
}

fn expand_template(media: &MediaConfig, template: &str) -> MediaSet {
    let matches = glob::expand(&media.media_path, template);
    if matches.is_empty() {
        debug!(template, "precedence term yielded no matches");
    }
    MediaSet::new(matches)
}

/// File-name portion of `GamePath` with its last extension removed.
fn game_basename(game_path: &str) -> String {
    let name = Path::new(game_path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => name[..idx].to_string(),
    }
}

pub fn warn_unreadable_media_root(media: &MediaConfig) {
    if !media.media_path.is_dir() {
        warn!(path = %media.media_path.display(), "media_path does not exist or is not a directory");
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod resolver_tests;
