//! Line-oriented command input.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use imagen_core::{AspectRatio, Msg, VariationCount, WorkerCount};

use crate::platform::app::{AppInput, Listing};

/// Ends a `paste` block.
pub const PASTE_TERMINATOR: &str = ".";

pub const HELP: &str = "\
Commands:
  add <prompt>         append one prompt
  paste                replace all prompts; finish with a line containing only '.'
  prompts              list current prompts
  clear                clear all prompts (asks for confirmation)
  load <file>          load prompts from a text file
  save <file>          save prompts to a text file
  variations <1-5>     images per prompt
  aspect <ratio>       1:1, 16:9, 9:16, 4:3 or 3:4
  workers <1-4>        parallel requests
  settings             show current settings
  start                generate images
  open                 open the results folder
  newfolder            create a new timestamped results folder
  yes / no             answer a pending question
  help                 show this text
  quit                 exit";

/// Parses one command line. `None` for blank input.
pub fn parse_command(line: &str) -> Option<AppInput> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    let input = match command.to_lowercase().as_str() {
        "add" if !arg.is_empty() => AppInput::Msg(Msg::PromptAdded(arg.to_string())),
        "add" => usage("add <prompt>"),
        "prompts" | "list" => AppInput::Show(Listing::Prompts),
        "clear" => AppInput::Msg(Msg::ClearPromptsClicked),
        "load" if !arg.is_empty() => AppInput::Msg(Msg::LoadPromptsClicked(PathBuf::from(arg))),
        "load" => usage("load <file>"),
        "save" if !arg.is_empty() => AppInput::Msg(Msg::SavePromptsClicked(PathBuf::from(arg))),
        "save" => usage("save <file>"),
        "variations" => match arg.parse().ok().and_then(VariationCount::new) {
            Some(count) => AppInput::Msg(Msg::VariationsSelected(count)),
            None => usage("variations <1-5>"),
        },
        "aspect" => match AspectRatio::parse(arg) {
            Some(ratio) => AppInput::Msg(Msg::AspectRatioSelected(ratio)),
            None => usage("aspect <1:1|16:9|9:16|4:3|3:4>"),
        },
        "workers" => match arg.parse().ok().and_then(WorkerCount::new) {
            Some(count) => AppInput::Msg(Msg::WorkersSelected(count)),
            None => usage("workers <1-4>"),
        },
        "settings" => AppInput::Show(Listing::Settings),
        "start" => AppInput::Msg(Msg::StartClicked),
        "open" => AppInput::Msg(Msg::OpenResultsClicked),
        "newfolder" => AppInput::Msg(Msg::NewResultsFolderClicked),
        "yes" | "y" => AppInput::Msg(Msg::ConfirmationAnswered(true)),
        "no" | "n" => AppInput::Msg(Msg::ConfirmationAnswered(false)),
        "help" | "?" => AppInput::Show(Listing::Help),
        "quit" | "exit" => AppInput::Quit,
        other => AppInput::Notice(format!("Unknown command '{other}'. Type 'help'.")),
    };
    Some(input)
}

fn usage(form: &str) -> AppInput {
    AppInput::Notice(format!("Usage: {form}"))
}

/// Collects lines between `paste` and the terminator into one prompt text.
#[derive(Debug, Default)]
pub struct InputReader {
    paste: Option<Vec<String>>,
}

impl InputReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pasting(&self) -> bool {
        self.paste.is_some()
    }

    pub fn feed(&mut self, line: &str) -> Option<AppInput> {
        if let Some(lines) = self.paste.as_mut() {
            if line.trim() == PASTE_TERMINATOR {
                let text = lines.join("\n");
                self.paste = None;
                return Some(AppInput::Msg(Msg::PromptsEdited(text)));
            }
            lines.push(line.to_string());
            return None;
        }
        if line.trim().eq_ignore_ascii_case("paste") {
            self.paste = Some(Vec::new());
            return Some(AppInput::Notice(format!(
                "Paste prompts, one per line. End with '{PASTE_TERMINATOR}' on its own line."
            )));
        }
        parse_command(line)
    }
}

/// Reads stdin on its own thread. End of input quits the app.
pub fn spawn_reader(tx: mpsc::Sender<AppInput>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut reader = InputReader::new();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if let Some(input) = reader.feed(&line) {
                let quit = matches!(input, AppInput::Quit);
                if tx.send(input).is_err() || quit {
                    return;
                }
            }
        }
        let _ = tx.send(AppInput::Quit);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn msg(line: &str) -> Msg {
        match parse_command(line) {
            Some(AppInput::Msg(msg)) => msg,
            other => panic!("expected a message for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn blank_line_is_ignored() {
        assert!(parse_command("   ").is_none());
    }

    #[test]
    fn add_keeps_the_whole_prompt() {
        assert_eq!(
            msg("add  a red fox in snow, watercolor "),
            Msg::PromptAdded("a red fox in snow, watercolor".to_string())
        );
    }

    #[test]
    fn settings_commands_are_validated() {
        assert_eq!(
            msg("variations 4"),
            Msg::VariationsSelected(VariationCount::new(4).unwrap())
        );
        assert_eq!(
            msg("aspect 9:16"),
            Msg::AspectRatioSelected(AspectRatio::Portrait)
        );
        assert_eq!(msg("WORKERS 1"), Msg::WorkersSelected(WorkerCount::new(1).unwrap()));

        assert!(matches!(parse_command("variations 6"), Some(AppInput::Notice(_))));
        assert!(matches!(parse_command("aspect 2:1"), Some(AppInput::Notice(_))));
        assert!(matches!(parse_command("workers many"), Some(AppInput::Notice(_))));
    }

    #[test]
    fn file_commands_need_a_path() {
        assert_eq!(
            msg("load my prompts.txt"),
            Msg::LoadPromptsClicked(PathBuf::from("my prompts.txt"))
        );
        assert!(matches!(parse_command("save"), Some(AppInput::Notice(_))));
    }

    #[test]
    fn answers_and_quit() {
        assert_eq!(msg("y"), Msg::ConfirmationAnswered(true));
        assert_eq!(msg("no"), Msg::ConfirmationAnswered(false));
        assert!(matches!(parse_command("exit"), Some(AppInput::Quit)));
        assert!(matches!(parse_command("frobnicate"), Some(AppInput::Notice(_))));
    }

    #[test]
    fn paste_block_becomes_one_edit() {
        let mut reader = InputReader::new();

        assert!(matches!(reader.feed("paste"), Some(AppInput::Notice(_))));
        assert!(reader.is_pasting());
        assert!(reader.feed("first prompt").is_none());
        assert!(reader.feed("").is_none());
        assert!(reader.feed("start").is_none());

        match reader.feed(" . ") {
            Some(AppInput::Msg(msg)) => assert_eq!(
                msg,
                Msg::PromptsEdited("first prompt\n\nstart".to_string())
            ),
            other => panic!("expected edit, got {other:?}"),
        }
        assert!(!reader.is_pasting());
        assert!(matches!(reader.feed("start"), Some(AppInput::Msg(Msg::StartClicked))));
    }
}
