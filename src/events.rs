//! Input handling for the interactive panel.
//!
//! Each input line is either search text or a `/command`:
//!
//! - plain text: search box input (debounced)
//! - `/search`, `/clear`, `/refresh`: immediate search, clear, reload
//! - `/install` and `/remove` without argument: switch view
//! - `/install NAME`: install a package
//! - `/remove ID`: ask to remove an installed package
//! - `/yes`, `/no`: answer the remove confirmation
//! - `/quit`: leave
//!
//! A leading `//` escapes a literal `/` in search text.

use crate::app::Action;
use crate::logic::Mode;

/// Usage line shown for unknown commands.
pub const USAGE: &str =
    "commands: /search /clear /refresh /install [NAME] /remove [ID] /yes /no /quit";

/// What: Translate one input line into a panel action.
///
/// Inputs:
/// - `line`: Raw line without the trailing newline.
///
/// Output:
/// - The action, or `Err` with a usage message for unknown commands.
///
/// # Errors
///
/// Returns a message naming the unknown command plus [`USAGE`].
pub fn parse_line(line: &str) -> Result<Action, String> {
    if let Some(escaped) = line.strip_prefix("//") {
        return Ok(Action::Input(format!("/{escaped}")));
    }
    let Some(command) = line.trim_start().strip_prefix('/') else {
        return Ok(Action::Input(line.to_string()));
    };
    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(n, a)| (n, a.trim()));
    let action = match (name.to_ascii_lowercase().as_str(), arg.is_empty()) {
        ("search" | "s", _) => Action::Search,
        ("clear" | "c", _) => Action::Clear,
        ("refresh" | "r", _) => Action::Refresh,
        ("install" | "i", true) => Action::SwitchMode(Mode::Install),
        ("install" | "i", false) => Action::Install(arg.to_string()),
        ("remove" | "uninstall", true) => Action::SwitchMode(Mode::Remove),
        ("remove" | "uninstall", false) => Action::RequestRemove(arg.to_string()),
        ("yes" | "y", _) => Action::ConfirmRemove,
        ("no" | "n", _) => Action::CancelRemove,
        ("quit" | "q" | "exit", _) => Action::Quit,
        (other, _) => return Err(format!("unknown command /{other}; {USAGE}")),
    };
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// What: Plain text becomes input verbatim, including empty lines.
    fn plain_text_is_input() {
        assert_eq!(parse_line("fire fox"), Ok(Action::Input("fire fox".into())));
        assert_eq!(parse_line(""), Ok(Action::Input(String::new())));
        assert_eq!(parse_line("//usr"), Ok(Action::Input("/usr".into())));
    }

    #[test]
    /// What: Commands map onto actions; arguments select install/remove targets.
    ///
    /// Inputs:
    /// - Each command with and without arguments.
    ///
    /// Output:
    /// - Mode switches without arguments, targeted actions with them.
    fn commands_map_to_actions() {
        assert_eq!(parse_line("/install"), Ok(Action::SwitchMode(Mode::Install)));
        assert_eq!(parse_line("/install  htop "), Ok(Action::Install("htop".into())));
        assert_eq!(parse_line("/remove"), Ok(Action::SwitchMode(Mode::Remove)));
        assert_eq!(
            parse_line("/remove vim;9.0;x86_64;"),
            Ok(Action::RequestRemove("vim;9.0;x86_64;".into()))
        );
        assert_eq!(parse_line("/yes"), Ok(Action::ConfirmRemove));
        assert_eq!(parse_line("/NO"), Ok(Action::CancelRemove));
        assert_eq!(parse_line("/search"), Ok(Action::Search));
        assert_eq!(parse_line("/clear"), Ok(Action::Clear));
        assert_eq!(parse_line("/refresh"), Ok(Action::Refresh));
        assert_eq!(parse_line("/quit"), Ok(Action::Quit));
    }

    #[test]
    /// What: Unknown commands report usage.
    fn unknown_command_reports_usage() {
        let err = parse_line("/frobnicate").expect_err("unknown");
        assert!(err.starts_with("unknown command /frobnicate"));
        assert!(err.contains("/install"));
    }
}
