use crate::coordinator::Coordinator;
use crate::daemon::{DaemonKind, TuningParameters};
use crate::editor::{Editor, Format, SelectionRange};
use crate::error::DaemonError;
use crate::logging;
use crate::normalizer::{self, Challenge};
use crate::palm::CompletionBackend;
use crate::prompts::{build_prompt, CompletionRequest};
use crate::surface::{Panel, Surface, FAILURE_ALERT};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DaemonPhase {
    Idle,
    Running,
    AwaitingCompletion,
    Rendering,
    Failed,
}

/// What a successful run put on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Outcome {
    Feedback { text: String },
    Challenge {
        challenge: Challenge,
        /// Document span that received emphasis, if the sentence was found.
        span: Option<SelectionRange>,
    },
    Rewrite { text: String },
}

struct OpenPanel {
    panel: Panel,
    formatted: Option<SelectionRange>, // Reverted to plain when the panel closes.
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives the three daemons against one editor and one page.
pub struct Controller<B, E, S> {
    backend: B,
    editor: Mutex<E>,
    surface: S,
    coordinator: Coordinator,
    phases: Mutex<[DaemonPhase; 3]>,
    open_panel: Mutex<Option<OpenPanel>>,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl<B, E, S> Controller<B, E, S>
where
    B: CompletionBackend,
    E: Editor + Send,
    S: Surface,
{
    pub fn new(backend: B, editor: E, surface: S) -> Self {
        Self {
            backend,
            editor: Mutex::new(editor),
            surface,
            coordinator: Coordinator::new(),
            phases: Mutex::new([DaemonPhase::Idle; 3]),
            open_panel: Mutex::new(None),
            in_flight: Mutex::new(None),
        }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn phase(&self, kind: DaemonKind) -> DaemonPhase {
        lock(&self.phases)[kind.index()]
    }

    pub fn open_panel(&self) -> Option<Panel> {
        lock(&self.open_panel).as_ref().map(|open| open.panel.clone())
    }

    pub fn with_editor<T>(&self, f: impl FnOnce(&mut E) -> T) -> T {
        f(&mut lock(&self.editor))
    }

    /// Runs one daemon over the current selection.
    ///
    /// Fails fast with `Busy` if another daemon holds the run slot. Every
    /// other failure alerts the user and leaves all triggers usable.
    pub async fn run(&self, kind: DaemonKind, params: &TuningParameters) -> Result<Outcome, DaemonError> {
        if !self.coordinator.try_acquire(kind) {
            let holder = self.coordinator.running().unwrap_or(kind);
            logging::log_daemon(None, &format!("{} ignored, {} is running", kind, holder));
            return Err(DaemonError::Busy(holder));
        }

        let token = CancellationToken::new();
        *lock(&self.in_flight) = Some(token.clone());

        let run_id = Uuid::new_v4().to_string();
        logging::log_daemon(Some(&run_id), &format!("{} started", kind));
        self.close_open_panel(Some(&run_id));
        self.set_phase(kind, DaemonPhase::Running, &run_id);

        let result = self.execute(kind, params, &token, &run_id).await;
        *lock(&self.in_flight) = None;

        match result {
            Ok(outcome) => {
                self.coordinator.release(kind);
                Ok(outcome)
            }
            Err(e) => {
                self.set_phase(kind, DaemonPhase::Failed, &run_id);
                if matches!(e, DaemonError::Cancelled) {
                    logging::log_daemon(Some(&run_id), &format!("{} cancelled", kind));
                } else {
                    logging::log_error(Some(&run_id), &format!("{} failed ({}): {}", kind, e.category(), e));
                    self.surface.alert(FAILURE_ALERT);
                }
                self.coordinator.release(kind);
                self.set_phase(kind, DaemonPhase::Idle, &run_id);
                Err(e)
            }
        }
    }

    /// Closes the open panel, undoing any formatting it owns.
    pub fn dismiss(&self) -> Result<(), DaemonError> {
        if self.close_open_panel(None) {
            Ok(())
        } else {
            Err(DaemonError::NoPanel)
        }
    }

    /// Swaps the whole document for the rewrite on the open replacement panel.
    /// `edited` is the panel text after any changes the user made to it.
    pub fn replace(&self, edited: Option<&str>) -> Result<(), DaemonError> {
        let open = {
            let mut slot = lock(&self.open_panel);
            match slot.take() {
                Some(open) if open.panel.offers_replace() => open,
                other => {
                    *slot = other;
                    return Err(DaemonError::NoPanel);
                }
            }
        };

        let replacement = edited.unwrap_or(open.panel.text()).to_string();
        self.with_editor(|editor| {
            let length = editor.length();
            editor.delete_text(0, length);
            editor.insert_text(0, &replacement);
        });
        logging::log_editor(
            None,
            &format!("Document replaced with {} chars", replacement.chars().count()),
        );

        self.surface.close_panel(&open.panel);
        let kind = open.panel.daemon();
        lock(&self.phases)[kind.index()] = DaemonPhase::Idle;
        Ok(())
    }

    /// Abandons the current run, if any. Works from the moment the run
    /// slot is claimed until the result is rendered.
    pub fn cancel(&self) -> bool {
        match lock(&self.in_flight).as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    async fn execute(
        &self,
        kind: DaemonKind,
        params: &TuningParameters,
        token: &CancellationToken,
        run_id: &str,
    ) -> Result<Outcome, DaemonError> {
        if let Some(name) = params.missing_for(kind) {
            return Err(DaemonError::MissingParameter(name));
        }

        let (range, text) = self.with_editor(|editor| {
            let range = editor.selection().widen_if_empty(editor.length());
            (range, editor.text(range.index, range.length))
        });
        let request = build_prompt(kind, &text, params);

        let highlight = if kind == DaemonKind::CreativeMastermind {
            self.with_editor(|editor| editor.format_range(range, &Format::rewrite_highlight()));
            Some(range)
        } else {
            None
        };

        self.set_phase(kind, DaemonPhase::AwaitingCompletion, run_id);
        let rendered = match self.await_completion(&request, token).await {
            Ok(raw) => self.render(kind, range, &text, &raw, highlight, run_id),
            Err(e) => Err(e),
        };

        if rendered.is_err() {
            if let Some(span) = highlight {
                self.with_editor(|editor| editor.format_range(span, &Format::plain()));
            }
        }
        rendered
    }

    async fn await_completion(
        &self,
        request: &CompletionRequest,
        token: &CancellationToken,
    ) -> Result<String, DaemonError> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(DaemonError::Cancelled),
            completion = self.backend.complete(request) => {
                completion.map(|c| c.text).map_err(DaemonError::from)
            }
        }
    }

    fn render(
        &self,
        kind: DaemonKind,
        range: SelectionRange,
        text: &str,
        raw: &str,
        highlight: Option<SelectionRange>,
        run_id: &str,
    ) -> Result<Outcome, DaemonError> {
        let (outcome, panel, formatted) = match kind {
            DaemonKind::HelpfulAssistant => {
                let feedback = normalizer::strip_echo(text, raw);
                let panel = Panel::for_daemon(kind, feedback.clone());
                (Outcome::Feedback { text: feedback }, panel, None)
            }
            DaemonKind::DevilsAdvocate => {
                let challenge = normalizer::extract_challenge(raw)?;
                let span = locate_sentence(range, text, &challenge.sentence);
                match span {
                    Some(span) => {
                        self.with_editor(|editor| editor.format_range(span, &Format::emphasis()));
                        logging::log_editor(
                            Some(run_id),
                            &format!("Emphasis at {}..{}", span.index, span.end()),
                        );
                    }
                    None => logging::log_normalize(
                        Some(run_id),
                        "Challenged sentence not found in selection, no emphasis applied",
                    ),
                }
                let panel = Panel::for_daemon(kind, challenge.challenge.clone());
                (Outcome::Challenge { challenge, span }, panel, span)
            }
            DaemonKind::CreativeMastermind => {
                let rewrite = normalizer::strip_header(raw);
                let panel = Panel::for_daemon(kind, rewrite.clone());
                (Outcome::Rewrite { text: rewrite }, panel, highlight)
            }
        };

        logging::log_normalize(
            Some(run_id),
            &format!("{} result: {}", kind, logging::preview(panel.text(), 120)),
        );
        self.surface.open_panel(&panel);
        *lock(&self.open_panel) = Some(OpenPanel { panel, formatted });
        self.set_phase(kind, DaemonPhase::Rendering, run_id);
        Ok(outcome)
    }

    /// Returns whether a panel was open.
    fn close_open_panel(&self, run_id: Option<&str>) -> bool {
        let Some(open) = lock(&self.open_panel).take() else {
            return false;
        };

        if let Some(span) = open.formatted {
            self.with_editor(|editor| editor.format_range(span, &Format::plain()));
        }
        self.surface.close_panel(&open.panel);

        let kind = open.panel.daemon();
        lock(&self.phases)[kind.index()] = DaemonPhase::Idle;
        logging::log_daemon(run_id, &format!("Closed {}", open.panel.element_id()));
        true
    }

    fn set_phase(&self, kind: DaemonKind, phase: DaemonPhase, run_id: &str) {
        let previous = std::mem::replace(&mut lock(&self.phases)[kind.index()], phase);
        logging::log_daemon(
            Some(run_id),
            &format!("{}: {:?} -> {:?}", kind.as_str(), previous, phase),
        );
    }
}

/// Document span of the first occurrence of `sentence` inside the selection.
fn locate_sentence(range: SelectionRange, text: &str, sentence: &str) -> Option<SelectionRange> {
    if sentence.is_empty() {
        return None;
    }
    let byte_offset = text.find(sentence)?;
    let offset = text[..byte_offset].chars().count();
    Some(SelectionRange::new(range.index + offset, sentence.chars().count()))
}
