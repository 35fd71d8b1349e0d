pub mod config;
pub mod controller;
pub mod coordinator;
pub mod daemon;
pub mod editor;
pub mod error;
pub mod logging;
pub mod normalizer;
pub mod palm;
pub mod prompts;
pub mod surface;
#[cfg(feature = "webview")]
mod webview;

pub use config::AssistantConfig;
pub use controller::{Controller, DaemonPhase, Outcome};
pub use coordinator::{Coordinator, RunSnapshot, TriggerState, TriggerView};
pub use daemon::{DaemonKind, TuningParameters};
pub use editor::{Document, Editor, Format, SelectionRange};
pub use error::{CompletionError, ConfigError, DaemonError, NormalizeError};
pub use normalizer::Challenge;
pub use palm::{CompletionBackend, CompletionResult, PalmClient};
pub use prompts::{build_prompt, CompletionRequest};
pub use surface::{Panel, Surface, FAILURE_ALERT};
#[cfg(feature = "webview")]
pub use webview::run;
