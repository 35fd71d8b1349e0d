use crate::daemon::DaemonKind;
use serde::{Deserialize, Serialize};

pub const FAILURE_ALERT: &str = "Oops! Something went wrong. Please try again.";

/// A transient result panel. Only one is open across the whole page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Panel {
    Feedback { text: String },
    Challenge { text: String },
    Replacement { text: String },
}

impl Panel {
    pub fn for_daemon(kind: DaemonKind, text: String) -> Self {
        match kind {
            DaemonKind::HelpfulAssistant => Panel::Feedback { text },
            DaemonKind::DevilsAdvocate => Panel::Challenge { text },
            DaemonKind::CreativeMastermind => Panel::Replacement { text },
        }
    }

    pub fn daemon(&self) -> DaemonKind {
        match self {
            Panel::Feedback { .. } => DaemonKind::HelpfulAssistant,
            Panel::Challenge { .. } => DaemonKind::DevilsAdvocate,
            Panel::Replacement { .. } => DaemonKind::CreativeMastermind,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Panel::Feedback { text } | Panel::Challenge { text } | Panel::Replacement { text } => text,
        }
    }

    pub fn element_id(&self) -> &'static str {
        match self {
            Panel::Feedback { .. } => "feedback-box",
            Panel::Challenge { .. } => "challenge-box",
            Panel::Replacement { .. } => "replacement-box",
        }
    }

    pub fn title(&self) -> &'static str {
        self.daemon().panel_title()
    }

    /// Replacement panels offer Replace next to Dismiss.
    pub fn offers_replace(&self) -> bool {
        matches!(self, Panel::Replacement { .. })
    }
}

/// Page chrome the controller writes results into.
///
/// Trigger enable/busy state is not pushed through here; observers derive it
/// from the coordinator's run snapshot.
pub trait Surface: Send + Sync {
    fn open_panel(&self, panel: &Panel);
    fn close_panel(&self, panel: &Panel);
    fn alert(&self, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_metadata() {
        let panel = Panel::for_daemon(DaemonKind::CreativeMastermind, "New text".to_string());
        assert_eq!(panel.daemon(), DaemonKind::CreativeMastermind);
        assert_eq!(panel.element_id(), "replacement-box");
        assert_eq!(panel.title(), "Creative Mastermind's Idea:");
        assert!(panel.offers_replace());

        let panel = Panel::for_daemon(DaemonKind::DevilsAdvocate, "Why?".to_string());
        assert!(!panel.offers_replace());
        assert_eq!(
            serde_json::to_value(&panel).unwrap(),
            serde_json::json!({"kind": "challenge", "text": "Why?"})
        );
    }
}
