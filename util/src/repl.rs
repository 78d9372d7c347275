use std::path::{Path, PathBuf};

use rustyline::{error::ReadlineError, Editor};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum Error<E> {
    #[error(transparent)]
    Readline(ReadlineError),
    #[error("Eval failed: {0:?}")]
    EvalError(E),
}

pub trait Repl {
    type Error: std::fmt::Debug;
    fn prompt(&self) -> &str {
        ">> "
    }
    fn history(&self) -> Option<&Path> {
        None
    }
    fn evaluate(&mut self, input: String) -> Result<(), Self::Error>;
}

/// Reads lines until EOF or Ctrl-C. A line ending in `\` is continued on the
/// next one.
pub fn start_repl<R: Repl>(mut repl: R) -> Result<(), Error<R::Error>> {
    let prompt = repl.prompt().to_owned();
    let history = repl.history().map(Path::to_path_buf);
    let mut editor = Editor::<()>::new();
    if let Some(history) = history.as_ref() {
        if let Err(e) = editor.load_history(history) {
            debug!(path = %history.display(), error = %e, "no history loaded");
        }
    }
    let mut input: Option<String> = None;
    loop {
        match editor.readline(&prompt) {
            Ok(mut line) if line.ends_with('\\') => {
                line.pop();
                line.push('\n');
                if let Some(input) = input.as_mut() {
                    input.push_str(line.as_str());
                } else {
                    input = Some(line);
                }
            }
            Ok(line) => {
                let input = if let Some(mut input) = input.take() {
                    input.push_str(line.as_str());
                    input
                } else {
                    line
                };
                editor.add_history_entry(input.as_str());
                repl.evaluate(input).map_err(Error::EvalError)?;
                save_history(&mut editor, history.as_ref())?;
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!("Bye!");
                break Ok(());
            }
            Err(e) => break Err(Error::Readline(e)),
        }
    }
}

fn save_history<E>(editor: &mut Editor<()>, history: Option<&PathBuf>) -> Result<(), Error<E>> {
    match history {
        Some(history) => editor.save_history(history).map_err(Error::Readline),
        None => Ok(()),
    }
}
