//! Terminal capability detection (spec.md §4.8).

use is_terminal::IsTerminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalCapabilities {
    pub is_tty: bool,
    pub supports_color: bool,
    pub width: u16,
}

/// TTY + `NO_COLOR` + `CLICOLOR`/`CLICOLOR_FORCE` gating, per spec.md §4.8:
/// `CLICOLOR_FORCE` (non-empty) wins even off a TTY; otherwise `NO_COLOR`
/// (any value) disables color; otherwise `CLICOLOR=0` disables color on a
/// TTY; otherwise color follows TTY-ness.
pub fn detect_capabilities() -> TerminalCapabilities {
    detect_capabilities_impl(
        |key| std::env::var(key).ok(),
        std::io::stdout().is_terminal(),
        crossterm::terminal::size().ok(),
    )
}

fn detect_capabilities_impl(
    get_env: impl Fn(&str) -> Option<String>,
    is_tty: bool,
    size: Option<(u16, u16)>,
) -> TerminalCapabilities {
    let clicolor_force = get_env("CLICOLOR_FORCE").is_some_and(|v| !v.is_empty());
    let no_color = get_env("NO_COLOR").is_some();
    let clicolor_disabled = get_env("CLICOLOR").as_deref() == Some("0");

    let supports_color = if clicolor_force {
        true
    } else if no_color {
        false
    } else {
        is_tty && !clicolor_disabled
    };

    let width = size.map(|(w, _)| w).unwrap_or(80);
    TerminalCapabilities {
        is_tty,
        supports_color,
        width,
    }
}
