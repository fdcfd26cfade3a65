use anyhow::{Context, Result};
use clap::Parser;
use rill_common::error::report_err;
use rill_interpreter::Interpreter;
use rustyline::error::ReadlineError;
use rustyline::Editor;
use termcolor::{ColorChoice, StandardStream};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[clap(about, author, disable_help_subcommand = true, propagate_version = true, version)]
pub enum Cmd {
    /// Start an interactive session
    Repl,
    /// Evaluate a script
    Run { path: PathBuf },
}

impl Cmd {
    pub fn run(&self) -> Result<()> {
        match self {
            Cmd::Repl => repl(),
            Cmd::Run { path } => run(path),
        }
    }
}

fn run(path: &Path) -> Result<()> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("could not read script: {}", path.display()))?;

    let stdout = io::stdout();
    let mut interpreter = Interpreter::new(stdout.lock());
    if let Err(errors) = interpreter.run(&source) {
        let mut stderr = StandardStream::stderr(ColorChoice::Auto);
        for err in &errors {
            report_err(&mut stderr, &source, err);
        }
        std::process::exit(1);
    }
    Ok(())
}

fn repl() -> Result<()> {
    let mut editor = Editor::<()>::new()?;
    let history = dirs::data_dir().map(|dir| dir.join("rill").join("history.txt"));
    if let Some(history) = &history {
        let _ = editor.load_history(history);
    }

    let mut interpreter = Interpreter::new(io::stdout());
    // History is saved on every exit path, including hard readline errors.
    let result = loop {
        match editor.readline(">>> ") {
            Ok(line) => {
                editor.add_history_entry(&line);
                if let Err(errors) = interpreter.run(&line) {
                    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
                    for err in &errors {
                        report_err(&mut stderr, &line, err);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => eprintln!("CTRL-C"),
            Err(ReadlineError::Eof) => break Ok(()),
            Err(err) => break Err(err.into()),
        }
    };

    if let Some(history) = &history {
        if let Some(dir) = history.parent() {
            fs::create_dir_all(dir)?;
        }
        editor.save_history(history)?;
    }
    result
}
