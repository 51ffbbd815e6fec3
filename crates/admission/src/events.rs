// SPDX-License-Identifier: LGPL-2.1-or-later
// Copyright (C) 2025 Shahzad A. Bhatti <bhatti@plexobject.com>
//
// This file is part of PlexGate.
//
// PlexGate is free software: you can redistribute it and/or modify
// it under the terms of the GNU Lesser General Public License as published by
// the Free Software Foundation, either version 2.1 of the License, or
// (at your option) any later version.
//
// PlexGate is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License
// along with PlexGate. If not, see <https://www.gnu.org/licenses/>.

//! Queue events pushed to subscribed users.

use serde::{Deserialize, Serialize};

/// Status payload carried by [`QueueEvent::Enter`].
pub const ENTER_STATUS_PROCESSING: &str = "PROCESSING";

/// The two event kinds a subscribed user can receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum QueueEvent {
    /// Refreshed 0-based waiting position
    QueuePosition {
        /// Current rank in the waiting line
        position: u64,
    },
    /// Admission into the processing set; the channel's job is done after this
    Enter {
        /// Always `"PROCESSING"`
        status: String,
    },
}

impl QueueEvent {
    /// Position update event.
    pub fn position(position: u64) -> Self {
        QueueEvent::QueuePosition { position }
    }

    /// Admission event.
    pub fn enter() -> Self {
        QueueEvent::Enter {
            status: ENTER_STATUS_PROCESSING.to_string(),
        }
    }

    /// Wire name of the event kind.
    pub fn event_name(&self) -> &'static str {
        match self {
            QueueEvent::QueuePosition { .. } => "queue-position",
            QueueEvent::Enter { .. } => "enter",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(QueueEvent::position(3).event_name(), "queue-position");
        assert_eq!(QueueEvent::enter().event_name(), "enter");
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_string(&QueueEvent::position(7)).unwrap();
        assert_eq!(json, r#"{"event":"queue-position","position":7}"#);

        let json = serde_json::to_string(&QueueEvent::enter()).unwrap();
        assert_eq!(json, r#"{"event":"enter","status":"PROCESSING"}"#);
    }
}
