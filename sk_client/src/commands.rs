//! Line-mode parsers for the test and code prompts.

use skillatics::coding::{Language, ResultTab};
use std::fmt;

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Option letter or number outside the question's options.
    InvalidChoice(String),
    /// `:lang` without a known language.
    UnknownLanguage(String),
    /// A command that needs an argument was given none.
    MissingArgument(&'static str),
    /// Unrecognized command.
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChoice(value) => write!(
                f,
                "Invalid choice '{}'. Pick an option by letter (a-d) or number (1-4)",
                value
            ),
            Self::UnknownLanguage(value) => write!(
                f,
                "Unknown language '{}'. Use python, java, cpp or javascript",
                value
            ),
            Self::MissingArgument(usage) => write!(f, "Missing argument (e.g., '{}')", usage),
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{}'. Type 'help' to see available commands",
                cmd
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Input at the adaptive test prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestCommand {
    /// Select an option by zero-based index.
    Choose(usize),
    /// Select an option by index and submit it at once.
    Answer(usize),
    Submit,
    Status,
    Help,
    Quit,
}

/// Parse a line typed at the test prompt.
///
/// # Examples
///
/// ```
/// use sk_client::commands::{TestCommand, parse_test_command};
///
/// assert_eq!(parse_test_command("b"), Ok(TestCommand::Choose(1)));
/// assert_eq!(parse_test_command("3"), Ok(TestCommand::Choose(2)));
/// assert_eq!(parse_test_command("answer c"), Ok(TestCommand::Answer(2)));
/// assert_eq!(parse_test_command("submit"), Ok(TestCommand::Submit));
/// ```
pub fn parse_test_command(input: &str) -> Result<TestCommand, ParseError> {
    let trimmed = input.trim();
    let lower = trimmed.to_ascii_lowercase();

    match lower.as_str() {
        "submit" | "s" => return Ok(TestCommand::Submit),
        "status" => return Ok(TestCommand::Status),
        "help" | "?" => return Ok(TestCommand::Help),
        "quit" | "q" | "exit" => return Ok(TestCommand::Quit),
        _ => {}
    }

    let parts: Vec<&str> = lower.split_ascii_whitespace().collect();
    match parts.as_slice() {
        // A lone `a` is option a, not the shortcut
        ["answer"] => Err(ParseError::MissingArgument("answer b")),
        [choice] => parse_choice(choice).map(TestCommand::Choose),
        ["answer" | "a", choice] => parse_choice(choice).map(TestCommand::Answer),
        _ => Err(ParseError::UnrecognizedCommand(trimmed.to_string())),
    }
}

/// `a`..`z` or `1`.. to a zero-based option index
fn parse_choice(value: &str) -> Result<usize, ParseError> {
    let lower = value.to_ascii_lowercase();
    let mut chars = lower.chars();
    if let (Some(c @ 'a'..='z'), None) = (chars.next(), chars.next()) {
        return Ok(c as usize - 'a' as usize);
    }

    match value.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(ParseError::InvalidChoice(value.to_string())),
    }
}

/// Input at the code prompt; lines not starting with `:` are source code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeCommand {
    Line(String),
    Run,
    Submit,
    Reset,
    Clear,
    Show,
    Language(Language),
    Tab(ResultTab),
    Load(String),
    Random,
    List(Option<u8>),
    Help,
    Quit,
}

/// Parse a line typed at the code prompt.
///
/// # Examples
///
/// ```
/// use sk_client::commands::{CodeCommand, parse_code_command};
/// use skillatics::coding::Language;
///
/// assert_eq!(parse_code_command(":run"), Ok(CodeCommand::Run));
/// assert_eq!(parse_code_command(":lang c++"), Ok(CodeCommand::Language(Language::Cpp)));
/// assert_eq!(
///     parse_code_command("print(1)"),
///     Ok(CodeCommand::Line("print(1)".to_string()))
/// );
/// ```
pub fn parse_code_command(input: &str) -> Result<CodeCommand, ParseError> {
    let line = input.trim_end_matches(['\r', '\n']);
    let Some(command) = line.trim_start().strip_prefix(':') else {
        return Ok(CodeCommand::Line(line.to_string()));
    };

    let parts: Vec<&str> = command.split_ascii_whitespace().collect();
    match parts.as_slice() {
        ["run" | "r"] => Ok(CodeCommand::Run),
        ["submit" | "s"] => Ok(CodeCommand::Submit),
        ["reset"] => Ok(CodeCommand::Reset),
        ["clear"] => Ok(CodeCommand::Clear),
        ["show" | "p"] => Ok(CodeCommand::Show),
        ["random"] => Ok(CodeCommand::Random),
        ["help" | "h" | "?"] => Ok(CodeCommand::Help),
        ["quit" | "q" | "exit"] => Ok(CodeCommand::Quit),
        ["lang" | "language", name] => name
            .parse::<Language>()
            .map(CodeCommand::Language)
            .map_err(|_| ParseError::UnknownLanguage(name.to_string())),
        ["lang" | "language"] => Err(ParseError::MissingArgument(":lang java")),
        ["tab", "output" | "out"] => Ok(CodeCommand::Tab(ResultTab::Output)),
        ["tab", "cases" | "testcases" | "tests"] => Ok(CodeCommand::Tab(ResultTab::TestCases)),
        ["tab", ..] => Err(ParseError::MissingArgument(":tab cases")),
        ["load", id] => Ok(CodeCommand::Load(id.to_string())),
        ["load"] => Err(ParseError::MissingArgument(":load <question id>")),
        ["list"] => Ok(CodeCommand::List(None)),
        ["list", level] => match level.parse::<u8>() {
            Ok(level) => Ok(CodeCommand::List(Some(level))),
            Err(_) => Err(ParseError::UnrecognizedCommand(line.trim().to_string())),
        },
        _ => Err(ParseError::UnrecognizedCommand(line.trim().to_string())),
    }
}
