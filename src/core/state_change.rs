// Author: Dustin Pilgrim
// License: MIT

use std::collections::BTreeMap;

use crate::config::rules::StateChangeRule;
use crate::config::ChangeConfig;
use crate::core::event::{Event, FrontEndState};

const SLEEP: &str = "sleep";
const WAKEUP: &str = "wakeup";
const ENDGAME: &str = "endgame";

/// What the Event Handler should do with a just-processed event: whether it
/// counts as a state change, and which action/params to feed the resolver
/// with if so (normally the incoming event's own, but see the `wakeup`
/// restoration case in [`ChangeFilter::handle`]).
pub struct Decision {
    pub changed: bool,
    pub action: String,
    pub params: BTreeMap<String, String>,
}

/// Tracks front-end state across events and implements the state-change
/// filter: per-action rules from config, plus the `wakeup` restoration and
/// `endgame` flush special cases.
#[derive(Debug, Default)]
pub struct ChangeFilter {
    current: FrontEndState,
    state_before_sleep: Option<FrontEndState>,
    /// Action and params of the last event that was neither `sleep` nor
    /// `wakeup`; restored verbatim after a `sleep, wakeup` pair so that
    /// waking up reproduces the slideshow that was showing before sleep.
    previous_event: Option<(String, BTreeMap<String, String>)>,
}

impl ChangeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &FrontEndState {
        &self.current
    }

    /// Runs one event through the filter, updating internal state and
    /// returning the decision for the Event Handler to act on.
    pub fn handle(&mut self, change: &ChangeConfig, event: &Event) -> Decision {
        let previous_action = self.current.action.clone();
        let incoming_state = FrontEndState::from_event(event);

        let changed = if event.action == WAKEUP {
            true
        } else if previous_action == ENDGAME {
            true
        } else {
            self.evaluate_rule(change.rule_for(&event.action), &incoming_state)
        };

        if event.action == SLEEP {
            self.state_before_sleep = Some(self.current.clone());
        }
        if event.action != SLEEP && event.action != WAKEUP {
            self.previous_event = Some((event.action.clone(), event.params.clone()));
        }

        self.current = incoming_state;

        let (action, params) = if event.action == WAKEUP {
            if let Some(restored) = self.state_before_sleep.take() {
                self.current = restored;
            }
            match self.previous_event.clone() {
                Some((action, params)) => (action, params),
                None => (event.action.clone(), event.params.clone()),
            }
        } else {
            (event.action.clone(), event.params.clone())
        };

        Decision { changed, action, params }
    }

    fn evaluate_rule(&self, rule: StateChangeRule, incoming: &FrontEndState) -> bool {
        match rule {
            StateChangeRule::Never => false,
            StateChangeRule::Always => true,
            StateChangeRule::Action => incoming.action != self.current.action,
            StateChangeRule::System => incoming.system != self.current.system,
            StateChangeRule::Game => incoming.game != self.current.game,
            StateChangeRule::SystemOrGame => {
                incoming.system != self.current.system || incoming.game != self.current.game
            }
        }
    }
}

/// Rewrites `SystemId` to `arcade` when arcade-meta-system remapping is
/// enabled and the event's system is in the configured arcade-systems list.
/// A no-op otherwise.
pub fn apply_arcade_remap(enabled: bool, arcade_systems: &[String], event: &mut Event) {
    if !enabled {
        return;
    }
    let system = event.system_id();
    if system.is_empty() {
        return;
    }
    if arcade_systems.iter().any(|s| s.eq_ignore_ascii_case(system)) {
        event.set_system_id("arcade");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChangeConfig;

    fn change_cfg(pairs: &[(&str, StateChangeRule)]) -> ChangeConfig {
        let map = pairs.iter().map(|(a, r)| (a.to_string(), *r)).collect();
        ChangeConfig(map)
    }

    fn event(action: &str, pairs: &[(&str, &str)]) -> Event {
        let params = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Event::new(action, params)
    }

    #[test]
    fn never_rule_suppresses_change() {
        let cfg = change_cfg(&[("tick", StateChangeRule::Never)]);
        let mut filter = ChangeFilter::new();
        let d1 = filter.handle(&cfg, &event("tick", &[("SystemId", "mame")]));
        assert!(!d1.changed);
    }

    #[test]
    fn s6_system_rule_ignores_action_changes_with_same_system() {
        let cfg = change_cfg(&[("systembrowsing", StateChangeRule::System)]);
        let mut filter = ChangeFilter::new();

        let d1 = filter.handle(&cfg, &event("systembrowsing", &[("SystemId", "mame")]));
        assert!(d1.changed);

        let d2 = filter.handle(&cfg, &event("systembrowsing", &[("SystemId", "mame")]));
        assert!(!d2.changed);
    }

    #[test]
    fn endgame_flush_forces_next_event_changed() {
        let cfg = change_cfg(&[("gamelistbrowsing", StateChangeRule::Never)]);
        let mut filter = ChangeFilter::new();

        filter.handle(&cfg, &event("endgame", &[("SystemId", "mame")]));
        let d = filter.handle(&cfg, &event("gamelistbrowsing", &[("SystemId", "mame")]));
        assert!(d.changed);
    }

    #[test]
    fn sleep_wakeup_round_trip_restores_previous_event() {
        let cfg = change_cfg(&[("rungame", StateChangeRule::Always), ("sleep", StateChangeRule::Always)]);
        let mut filter = ChangeFilter::new();

        let a1 = event("rungame", &[("SystemId", "mame"), ("GamePath", "/roms/mame/x.zip")]);
        filter.handle(&cfg, &a1);

        filter.handle(&cfg, &event("sleep", &[]));
        let wake = filter.handle(&cfg, &event("wakeup", &[]));

        assert!(wake.changed);
        assert_eq!(wake.action, "rungame");
        assert_eq!(wake.params.get("GamePath").map(String::as_str), Some("/roms/mame/x.zip"));
        assert_eq!(filter.current(), &FrontEndState::from_event(&a1));
    }

    #[test]
    fn arcade_remap_only_rewrites_listed_systems() {
        let mut ev = event("rungame", &[("SystemId", "fba")]);
        apply_arcade_remap(true, &["fba".to_string(), "mame".to_string()], &mut ev);
        assert_eq!(ev.system_id(), "arcade");

        let mut ev = event("rungame", &[("SystemId", "snes")]);
        apply_arcade_remap(true, &["fba".to_string()], &mut ev);
        assert_eq!(ev.system_id(), "snes");

        let mut ev = event("rungame", &[("SystemId", "fba")]);
        apply_arcade_remap(false, &["fba".to_string()], &mut ev);
        assert_eq!(ev.system_id(), "fba");
    }
}
