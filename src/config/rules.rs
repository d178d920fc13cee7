// Author: Dustin Pilgrim
// License: MIT

use tracing::warn;

/// One of the pattern terms that expand to a glob template under the media
/// root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Rom,
    Publisher,
    Genre,
    System,
    Generic,
    Screensaver,
    Startup,
}

impl PatternKind {
    fn parse(word: &str) -> Option<Self> {
        match word {
            "rom" => Some(Self::Rom),
            "publisher" => Some(Self::Publisher),
            "genre" => Some(Self::Genre),
            "system" => Some(Self::System),
            "generic" => Some(Self::Generic),
            "screensaver" => Some(Self::Screensaver),
            "startup" => Some(Self::Startup),
            _ => None,
        }
    }
}

/// A single, non-compound rule term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleTerm {
    Blank,
    Scraped,
    Pattern(PatternKind),
}

impl SimpleTerm {
    fn parse(word: &str) -> Option<Self> {
        match word {
            "blank" => Some(Self::Blank),
            "scraped" => Some(Self::Scraped),
            _ => PatternKind::parse(word).map(Self::Pattern),
        }
    }
}

/// One term of a [`PrecedenceRule`]: either a single reserved word / pattern
/// term, or a `+`-joined compound evaluated as term-union.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTerm {
    Simple(SimpleTerm),
    Compound(Vec<SimpleTerm>),
}

/// Ordered, non-empty sequence of rule terms, tried in order until one
/// yields a non-empty match. Unknown words are logged and dropped at parse
/// time rather than at evaluation time, so a single malformed entry never
/// silently no-ops the whole rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecedenceRule(Vec<RuleTerm>);

impl PrecedenceRule {
    /// Parses a whitespace-separated rule string such as
    /// `"rom scraped publisher+system generic"`.
    pub fn parse(action: &str, raw: &str) -> Self {
        let mut terms = Vec::new();
        for word in raw.split_whitespace() {
            if let Some(term) = Self::parse_term(word) {
                terms.push(term);
            } else {
                warn!(action, term = word, "unknown precedence rule term; skipping");
            }
        }
        Self(terms)
    }

    fn parse_term(word: &str) -> Option<RuleTerm> {
        if word.contains('+') {
            let subterms: Vec<SimpleTerm> = word
                .split('+')
                .filter(|w| !w.is_empty())
                .filter_map(SimpleTerm::parse)
                .collect();
            if subterms.is_empty() {
                None
            } else {
                Some(RuleTerm::Compound(subterms))
            }
        } else {
            SimpleTerm::parse(word).map(RuleTerm::Simple)
        }
    }

    pub fn terms(&self) -> &[RuleTerm] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Per-action policy deciding whether a new event warrants a new slideshow.
/// Actions with no entry are treated as [`StateChangeRule::Never`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateChangeRule {
    #[default]
    Never,
    Always,
    Action,
    System,
    Game,
    SystemOrGame,
}

impl StateChangeRule {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "never" => Some(Self::Never),
            "always" => Some(Self::Always),
            "action" => Some(Self::Action),
            "system" => Some(Self::System),
            "game" => Some(Self::Game),
            "system/game" => Some(Self::SystemOrGame),
            _ => None,
        }
    }
}
