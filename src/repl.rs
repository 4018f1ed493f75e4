use reedline::{
    FileBackedHistory, Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus,
    Reedline, Signal,
};
use std::borrow::Cow;
use std::io;
use std::path::PathBuf;

/// Number of entries kept in the history file
const HISTORY_CAPACITY: usize = 1000;

/// What one read from the line editor produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// Ctrl-C at the prompt; the partial line is discarded
    Interrupted,
    /// End of input (Ctrl-D or closed stream)
    Eof,
}

/// Source of input lines for the dispatcher
pub trait LineReader {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadOutcome>;
}

/// Interactive line editor backed by reedline
///
/// Every submitted line is appended to the history file.
pub struct ReedlineReader {
    editor: Reedline,
}

impl ReedlineReader {
    pub fn new(history_file: Option<PathBuf>) -> Self {
        let mut editor = Reedline::create();

        if let Some(path) = history_file {
            match FileBackedHistory::with_file(HISTORY_CAPACITY, path.clone()) {
                Ok(history) => editor = editor.with_history(Box::new(history)),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "history disabled");
                }
            }
        }

        Self { editor }
    }
}

impl LineReader for ReedlineReader {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadOutcome> {
        let prompt = ShellPrompt {
            left: prompt.to_string(),
        };

        match self.editor.read_line(&prompt)? {
            Signal::Success(line) => Ok(ReadOutcome::Line(line)),
            Signal::CtrlC => {
                println!("^C");
                Ok(ReadOutcome::Interrupted)
            }
            Signal::CtrlD => Ok(ReadOutcome::Eof),
            #[allow(unreachable_patterns)]
            _ => Ok(ReadOutcome::Interrupted),
        }
    }
}

/// Prompt whose text is set by configuration scripts
struct ShellPrompt {
    left: String,
}

impl Prompt for ShellPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        // Use ANSI reset code to ensure white/default terminal color
        Cow::Owned(format!("\x1b[0m{}", self.left))
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!("({}reverse search) ", prefix))
    }
}
