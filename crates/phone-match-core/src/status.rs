//! Module lifecycle status.
//!
//! ```text
//! pending ──init──▶ initializing ──initSuccess──▶ ready
//!    ▲                                              │
//!    └──────resetSuccess────── resetting ◀──reset───┘
//! ```
//!
//! The four lifecycle actions set their target status unconditionally; any
//! other action leaves the status alone. There is no error state: a caller
//! whose initialization cannot complete drives the module back to `pending`
//! with `resetSuccess`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::actions::MatcherAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModuleStatus {
    #[default]
    Pending,
    Initializing,
    Ready,
    Resetting,
}

impl ModuleStatus {
    pub fn reduce(self, action: &MatcherAction) -> Self {
        match action {
            MatcherAction::Init => ModuleStatus::Initializing,
            MatcherAction::InitSuccess { .. } => ModuleStatus::Ready,
            MatcherAction::Reset => ModuleStatus::Resetting,
            MatcherAction::ResetSuccess => ModuleStatus::Pending,
            _ => self,
        }
    }

    pub fn is_ready(self) -> bool {
        self == ModuleStatus::Ready
    }

    pub fn is_pending(self) -> bool {
        self == ModuleStatus::Pending
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModuleStatus::Pending => "pending",
            ModuleStatus::Initializing => "initializing",
            ModuleStatus::Ready => "ready",
            ModuleStatus::Resetting => "resetting",
        };
        f.write_str(s)
    }
}
