//! Terminal styles.
//!
//! Rendering code asks for semantic styles (a property path, a configuration
//! id) rather than colors, so the palette can change in one place. `console`
//! drops the styling when stdout is not a terminal.

use console::Style;

pub fn heading() -> Style {
    Style::new().bold()
}

pub fn muted() -> Style {
    Style::new().dim()
}

pub fn configuration() -> Style {
    Style::new().cyan().bold()
}

pub fn property() -> Style {
    Style::new().cyan()
}

pub fn operation() -> Style {
    Style::new().magenta()
}

pub fn value() -> Style {
    Style::new().yellow()
}

pub fn added() -> Style {
    Style::new().green()
}

pub fn rejected() -> Style {
    Style::new().red()
}
