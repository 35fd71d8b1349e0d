use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DaemonKind {
    HelpfulAssistant,
    DevilsAdvocate,
    CreativeMastermind,
}

impl DaemonKind {
    pub const ALL: [DaemonKind; 3] = [
        DaemonKind::HelpfulAssistant,
        DaemonKind::DevilsAdvocate,
        DaemonKind::CreativeMastermind,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DaemonKind::HelpfulAssistant => "helpful-assistant",
            DaemonKind::DevilsAdvocate => "devils-advocate",
            DaemonKind::CreativeMastermind => "creative-mastermind",
        }
    }

    pub fn from_str(s: &str) -> Option<DaemonKind> {
        match s.to_lowercase().as_str() {
            "helpful-assistant" => Some(DaemonKind::HelpfulAssistant),
            "devils-advocate" => Some(DaemonKind::DevilsAdvocate),
            "creative-mastermind" => Some(DaemonKind::CreativeMastermind),
            _ => None,
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            DaemonKind::HelpfulAssistant => 0,
            DaemonKind::DevilsAdvocate => 1,
            DaemonKind::CreativeMastermind => 2,
        }
    }

    /// Trigger label shown while the daemon is idle.
    pub fn label(&self) -> &'static str {
        match self {
            DaemonKind::HelpfulAssistant => "Helpful Assistant",
            DaemonKind::DevilsAdvocate => "Devil's Advocate",
            DaemonKind::CreativeMastermind => "Creative Mastermind",
        }
    }

    /// Tooltip text shown under the trigger label.
    pub fn description(&self) -> &'static str {
        match self {
            DaemonKind::HelpfulAssistant => {
                "I will help you improve your writing by giving you general tips on what could be changed."
            }
            DaemonKind::DevilsAdvocate => {
                "I will find the weaknesses in your writing and give you suggestions on how to improve it."
            }
            DaemonKind::CreativeMastermind => {
                "I will rewrite your writing in a more creative fashion, which could include humor, figurative language, and advanced vocabulary."
            }
        }
    }

    /// Tuning parameters this daemon's prompt is built from, in prompt order.
    pub fn parameter_names(&self) -> [&'static str; 3] {
        match self {
            DaemonKind::HelpfulAssistant => ["length", "approach", "formality"],
            DaemonKind::DevilsAdvocate => ["depth", "focus", "tone"],
            DaemonKind::CreativeMastermind => ["humor", "figurativeLanguage", "vocabulary"],
        }
    }

    /// Heading of the result panel this daemon opens.
    pub fn panel_title(&self) -> &'static str {
        match self {
            DaemonKind::HelpfulAssistant => "Helpful Assistant's Feedback:",
            DaemonKind::DevilsAdvocate => "Devil's Advocate's Challenge:",
            DaemonKind::CreativeMastermind => "Creative Mastermind's Idea:",
        }
    }
}

impl fmt::Display for DaemonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// User-chosen option values for one daemon invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TuningParameters(BTreeMap<String, String>);

impl TuningParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.0.insert(name.to_string(), value.to_string());
        self
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        self.0.insert(name.to_string(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(|v| v.as_str())
    }

    /// Value for `name`, empty when absent. Prompt building never fails.
    pub fn value(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    /// First parameter `kind` needs that is absent or blank.
    pub fn missing_for(&self, kind: DaemonKind) -> Option<&'static str> {
        kind.parameter_names()
            .into_iter()
            .find(|name| self.get(name).map_or(true, |v| v.trim().is_empty()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TuningParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
