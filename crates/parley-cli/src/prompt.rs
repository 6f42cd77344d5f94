use anyhow::Result;
use console::style;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const PROMPT: &str = "\x1b[1m\x1b[38;5;30m> \x1b[0m";

#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    /// Send this text to the model
    Message(String),
    /// Switch to another provider
    Provider(String),
    ToggleContext,
    Clear,
    Help,
    /// Nothing to do, read again
    AskAgain,
    Exit,
}

/// Interpret one line typed at the prompt
pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::AskAgain;
    }
    if !line.starts_with('/') {
        return Input::Message(line.to_string());
    }

    let (command, argument) = match line.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (line, ""),
    };
    match command.to_ascii_lowercase().as_str() {
        "/exit" | "/quit" => Input::Exit,
        "/clear" => Input::Clear,
        "/context" => Input::ToggleContext,
        "/provider" if !argument.is_empty() => Input::Provider(argument.to_string()),
        "/?" | "/help" => Input::Help,
        _ => {
            println!("{}", style(format!("Unknown command {}, try /help", command)).dim());
            Input::AskAgain
        }
    }
}

pub fn print_help() {
    println!("Commands:");
    println!("/provider <id> - Switch provider (openai, anthropic, gemini, local)");
    println!("/context - Toggle platform context for the next messages");
    println!("/clear - Start a new conversation");
    println!("/exit - Exit the session");
    println!("/? | /help - Display this help message");
}

pub struct Prompt {
    editor: DefaultEditor,
}

impl Prompt {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }

    pub fn read(&mut self) -> Result<Input> {
        match self.editor.readline(PROMPT) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(parse_input(&line))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(Input::Exit),
            Err(e) => {
                eprintln!("Input error: {}", e);
                Ok(Input::Exit)
            }
        }
    }
}
