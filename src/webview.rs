// Tauri host: the page owns the real editor and panels, this side mirrors the
// document and pushes every change back as an event. The page counts offsets
// in UTF-16 code units, the mirror in characters.

use crate::config::AssistantConfig;
use crate::controller::{Controller, Outcome};
use crate::coordinator::TriggerView;
use crate::daemon::{DaemonKind, TuningParameters};
use crate::editor::{utf16_offset, Document, Editor, Format, SelectionRange};
use crate::logging;
use crate::palm::PalmClient;
use crate::surface::{Panel, Surface};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tauri::{AppHandle, Emitter, Manager, State};

const EDITOR_EVENT: &str = "legion://editor";
const PANEL_OPEN_EVENT: &str = "legion://panel-open";
const PANEL_CLOSE_EVENT: &str = "legion://panel-close";
const ALERT_EVENT: &str = "legion://alert";
const TRIGGERS_EVENT: &str = "legion://triggers";
const CONFIG_FILE: &str = "assistant.json";

type WebviewController = Controller<PalmClient, WebviewEditor, WebviewSurface>;

struct DaemonState {
    controller: Arc<WebviewController>,
    config_path: PathBuf,
}

/// Editor mutations replayed by the page on its own editor widget.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
enum EditorOp {
    SetSelection { index: usize, length: usize },
    Format { format: Format },
    DeleteText { index: usize, length: usize },
    InsertText { index: usize, text: String },
}

fn emit<P: Serialize + Clone>(app: &AppHandle, event: &str, payload: P) {
    if let Err(e) = app.emit(event, payload) {
        logging::log_error(None, &format!("Failed to emit {}: {}", event, e));
    }
}

pub struct WebviewEditor {
    document: Document,
    app: AppHandle,
}

impl WebviewEditor {
    fn new(app: AppHandle) -> Self {
        Self {
            document: Document::default(),
            app,
        }
    }
}

impl Editor for WebviewEditor {
    fn selection(&self) -> SelectionRange {
        self.document.selection()
    }

    fn text(&self, index: usize, length: usize) -> String {
        self.document.text(index, length)
    }

    fn length(&self) -> usize {
        self.document.length()
    }

    fn set_selection(&mut self, index: usize, length: usize) {
        self.document.set_selection(index, length);
        let page = self.document.selection().chars_to_utf16(self.document.contents());
        emit(
            &self.app,
            EDITOR_EVENT,
            EditorOp::SetSelection {
                index: page.index,
                length: page.length,
            },
        );
    }

    fn format(&mut self, format: Format) {
        self.document.format(format.clone());
        emit(&self.app, EDITOR_EVENT, EditorOp::Format { format });
    }

    fn delete_text(&mut self, index: usize, length: usize) {
        let page = SelectionRange::new(index, length).chars_to_utf16(self.document.contents());
        self.document.delete_text(index, length);
        emit(
            &self.app,
            EDITOR_EVENT,
            EditorOp::DeleteText {
                index: page.index,
                length: page.length,
            },
        );
    }

    fn insert_text(&mut self, index: usize, text: &str) {
        let page_index = utf16_offset(self.document.contents(), index);
        self.document.insert_text(index, text);
        emit(
            &self.app,
            EDITOR_EVENT,
            EditorOp::InsertText {
                index: page_index,
                text: text.to_string(),
            },
        );
    }
}

pub struct WebviewSurface {
    app: AppHandle,
}

impl Surface for WebviewSurface {
    fn open_panel(&self, panel: &Panel) {
        emit(&self.app, PANEL_OPEN_EVENT, panel.clone());
    }

    fn close_panel(&self, panel: &Panel) {
        emit(&self.app, PANEL_CLOSE_EVENT, panel.element_id());
    }

    fn alert(&self, message: &str) {
        emit(&self.app, ALERT_EVENT, message.to_string());
    }
}

// ============ Commands ============

/// Mirrors the page's editor contents before a daemon reads them.
/// `index` and `length` are the page selection in UTF-16 code units.
#[tauri::command]
fn sync_document(state: State<'_, DaemonState>, text: String, index: usize, length: usize) {
    let selection = SelectionRange::new(index, length).utf16_to_chars(&text);
    state
        .controller
        .with_editor(|editor| editor.document.reset(&text, selection));
}

#[tauri::command]
async fn run_daemon(
    state: State<'_, DaemonState>,
    daemon: DaemonKind,
    parameters: TuningParameters,
) -> Result<Outcome, String> {
    state
        .controller
        .run(daemon, &parameters)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
fn dismiss_panel(state: State<'_, DaemonState>) -> Result<(), String> {
    state.controller.dismiss().map_err(|e| e.to_string())
}

#[tauri::command]
fn replace_document(state: State<'_, DaemonState>, edited: Option<String>) -> Result<(), String> {
    state
        .controller
        .replace(edited.as_deref())
        .map_err(|e| e.to_string())
}

#[tauri::command]
fn cancel_daemon(state: State<'_, DaemonState>) -> bool {
    state.controller.cancel()
}

#[tauri::command]
fn get_triggers(state: State<'_, DaemonState>) -> Vec<TriggerView> {
    state.controller.coordinator().snapshot().triggers()
}

#[tauri::command]
fn get_recent_logs() -> Vec<String> {
    logging::recent_lines()
}

#[tauri::command]
async fn validate_and_save_api_key(state: State<'_, DaemonState>, api_key: String) -> Result<bool, String> {
    let candidate = AssistantConfig {
        api_key: api_key.clone(),
        ..state.controller.backend().config()
    };
    let client = PalmClient::new(candidate.clone()).map_err(|e| e.to_string())?;
    let valid = client.validate_api_key().await.map_err(|e| e.to_string())?;

    if valid {
        candidate
            .save_to_file(&state.config_path)
            .map_err(|e| e.to_string())?;
        state.controller.backend().set_api_key(&api_key);
        logging::log_completion(None, "API key validated and saved");
    }
    Ok(valid)
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .setup(|app| {
            logging::init_logging(true);

            let config_path = app.path().app_config_dir()?.join(CONFIG_FILE);
            let config = match AssistantConfig::load_from_file(&config_path) {
                Ok(config) => config,
                Err(e) => {
                    logging::log_daemon(None, &format!("Using default config: {}", e));
                    AssistantConfig::default()
                }
            };

            let handle = app.handle().clone();
            let controller = Arc::new(Controller::new(
                PalmClient::new(config)?,
                WebviewEditor::new(handle.clone()),
                WebviewSurface { app: handle.clone() },
            ));

            let mut triggers = controller.coordinator().subscribe();
            tauri::async_runtime::spawn(async move {
                while triggers.changed().await.is_ok() {
                    let views = triggers.borrow_and_update().triggers();
                    emit(&handle, TRIGGERS_EVENT, views);
                }
            });

            app.manage(DaemonState {
                controller,
                config_path,
            });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            sync_document,
            run_daemon,
            dismiss_panel,
            replace_document,
            cancel_daemon,
            get_triggers,
            get_recent_logs,
            validate_and_save_api_key,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
