use ansi_term::Colour::Red;
use rubytree::*;
use rustyline::{error::ReadlineError, Editor};
use std::path::PathBuf;

const HISTORY_FILE: &str = ".rubytree_history";

fn history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(HISTORY_FILE))
}

pub(crate) fn repl(mut eval: Evaluator) {
    let mut editor = Editor::<()>::new();
    let history = history_path();
    if let Some(path) = &history {
        let _ = editor.load_history(path);
    }
    let prompt_body = if cfg!(not(unix)) {
        // In Windows, it seems that ansi_term does not work well with rustyline.
        "irb:".to_string()
    } else {
        format!("{}", Red.bold().paint("irb:"))
    };
    let mut script = String::new();
    loop {
        let prompt = if script.is_empty() { ">" } else { "*" };
        let readline = editor.readline(&format!("{}{} ", prompt_body, prompt));
        let line = match readline {
            Ok(line) => {
                editor.add_history_entry(line.as_str());
                line + "\n"
            }
            Err(ReadlineError::Interrupted) => {
                script = String::new();
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(_) => continue,
        };

        script += &line;
        let node = match eval.parse_with_path(&script, "REPL") {
            Ok(node) => node,
            Err(err) if err.is_unexpected_eof() => continue,
            Err(err) => {
                eval.show_error(&err);
                script = String::new();
                continue;
            }
        };
        match eval.eval_program(&node) {
            Ok(result) => match eval.val_inspect(&result) {
                Ok(s) => println!("=> {}", s),
                Err(err) => eval.show_error(&err),
            },
            Err(err) => eval.show_error(&err),
        }
        script = String::new();
    }
    if let Some(path) = &history {
        let _ = editor.save_history(path);
    }
}
