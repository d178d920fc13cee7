// Author: Dustin Pilgrim
// License: MIT

use std::collections::BTreeMap;

/// A notification from the broker, already overlaid with the current
/// front-end parameter snapshot. Exists only for the duration of one
/// handling iteration; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub action: String,
    pub params: BTreeMap<String, String>,
}

impl Event {
    pub fn new(action: impl Into<String>, params: BTreeMap<String, String>) -> Self {
        Self {
            action: action.into(),
            params,
        }
    }

    pub fn get(&self, key: &str) -> &str {
        self.params.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn system_id(&self) -> &str {
        self.get("SystemId")
    }

    pub fn game_path(&self) -> &str {
        self.get("GamePath")
    }

    pub fn image_path(&self) -> &str {
        self.get("ImagePath")
    }

    pub fn publisher(&self) -> &str {
        self.get("Publisher")
    }

    pub fn genre(&self) -> &str {
        self.get("Genre")
    }

    pub fn is_folder(&self) -> bool {
        self.get("IsFolder") == "1"
    }

    /// Rewrites `SystemId` in place. Used by the arcade meta-system remap.
    pub fn set_system_id(&mut self, system_id: impl Into<String>) {
        self.params.insert("SystemId".to_string(), system_id.into());
    }
}

/// Immutable 4-tuple derived from an [`Event`]'s params via the canonical
/// keys `Action`, `SystemId`, `GamePath`, `IsFolder`. Missing params default
/// to empty string / false.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrontEndState {
    pub action: String,
    pub system: String,
    pub game: String,
    pub is_folder: bool,
}

impl FrontEndState {
    pub fn from_event(event: &Event) -> Self {
        Self {
            action: event.action.clone(),
            system: event.system_id().to_string(),
            game: event.game_path().to_string(),
            is_folder: event.is_folder(),
        }
    }
}
