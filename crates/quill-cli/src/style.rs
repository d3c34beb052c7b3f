//! Terminal colouring for CLI output. Colour is only used when the target
//! stream is a terminal.

use std::io::IsTerminal;

use owo_colors::{AnsiColors, OwoColorize};

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn paint(text: impl AsRef<str>, color: AnsiColors, stream: Stream) -> String {
    let text = text.as_ref();
    let colored = match stream {
        Stream::Stdout => std::io::stdout().is_terminal(),
        Stream::Stderr => std::io::stderr().is_terminal(),
    };
    if colored {
        text.color(color).to_string()
    } else {
        text.to_string()
    }
}

pub fn success(text: impl AsRef<str>) -> String {
    paint(text, AnsiColors::Green, Stream::Stdout)
}

/// Program ids and paths.
pub fn accent(text: impl AsRef<str>) -> String {
    paint(text, AnsiColors::Cyan, Stream::Stdout)
}

pub fn warning(text: impl AsRef<str>) -> String {
    paint(text, AnsiColors::Yellow, Stream::Stderr)
}

pub fn error(text: impl AsRef<str>) -> String {
    paint(text, AnsiColors::Red, Stream::Stderr)
}
