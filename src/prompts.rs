// Prompt templates for the three daemons.
// Selected text and tuning values are spliced in verbatim, nothing is escaped.

use crate::daemon::{DaemonKind, TuningParameters};

/// Rendered instruction text, consumed once by the completion client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub instruction_text: String,
}

pub const HELPFUL_ASSISTANT_SUFFIX: &str = "\n\nYour feedback on the user's writing:\n\n";

pub const CREATIVE_MASTERMIND_SUFFIX: &str = "\n\nYour creatively rewritten response: \n\n";

pub const DEVILS_ADVOCATE_FORMAT: &str = r#"Provide your output in the following JSON format. Include all of your criticisms in a single JSON. Replace the values of the key according to the sentence in which you are finding the faults, and what your challenge is to that sentence:
{
  "sentence": "The sentence that you want to challenge. This sentence (((MUST))) be in the text provided above.",
  "challenge": "Your challenge to the sentence"
}
"#;

pub fn build_prompt(kind: DaemonKind, selected_text: &str, params: &TuningParameters) -> CompletionRequest {
    let instruction_text = match kind {
        DaemonKind::HelpfulAssistant => helpful_assistant_prompt(selected_text, params),
        DaemonKind::DevilsAdvocate => devils_advocate_prompt(selected_text, params),
        DaemonKind::CreativeMastermind => creative_mastermind_prompt(selected_text, params),
    };
    CompletionRequest { instruction_text }
}

fn helpful_assistant_prompt(text: &str, params: &TuningParameters) -> String {
    format!(
        "You are a helpful assistant that likes to give constructive feedback in numbered lists. \
         Please respond with {length} about how the user could improve their writing. \
         Please DO NOT repeat the user's text when giving your response. \
         You should {approach} when examining the user's writing and giving feedback. \
         You should also give feedback to help the user write in a {formality} tone. \
         The following is the user's writing: {text}{HELPFUL_ASSISTANT_SUFFIX}",
        length = params.value("length"),
        approach = params.value("approach"),
        formality = params.value("formality"),
    )
}

fn devils_advocate_prompt(text: &str, params: &TuningParameters) -> String {
    format!(
        "Please read the following text and find faults in it: \n\n{text}\n\n{DEVILS_ADVOCATE_FORMAT}\
         Your depth of analysis should be {depth}. \
         Your challenge should address the {focus} when you provide the criticism. \
         You should respond in a {tone} while writing. \
         Please respond in a JSON format. \
         Your response should (((NOT))) include any double quotes for the values",
        depth = params.value("depth"),
        focus = params.value("focus"),
        tone = params.value("tone"),
    )
}

fn creative_mastermind_prompt(text: &str, params: &TuningParameters) -> String {
    format!(
        "You are a creative mastermind who can make text more creative and add flair to it. \
         Your response should have {humor}, {figurative}, and {vocabulary}. \
         Make sure your response is about as long as your input. \
         The following is your input: {text}{CREATIVE_MASTERMIND_SUFFIX}",
        humor = params.value("humor"),
        figurative = params.value("figurativeLanguage"),
        vocabulary = params.value("vocabulary"),
    )
}
