//! Terminal detection for choosing fancy or plain output

use std::io::IsTerminal;

/// Environment variables whose presence means "running under CI"
const CI_VARS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "BUILDKITE",
    "JENKINS_URL",
    "TF_BUILD",
];

/// Decides between spinners/colors and plain line output
#[derive(Debug, Clone, Copy)]
pub struct UiContext {
    interactive: bool,
}

impl UiContext {
    /// Interactive when both stdout and stderr are terminals and no CI marker is set
    pub fn detect() -> Self {
        let terminal = std::io::stdout().is_terminal() && std::io::stderr().is_terminal();
        let ci = CI_VARS.iter().any(|var| std::env::var_os(var).is_some());
        Self {
            interactive: terminal && !ci,
        }
    }

    pub fn non_interactive() -> Self {
        Self { interactive: false }
    }

    /// Spinners and cliclack framing
    pub fn use_fancy_output(&self) -> bool {
        self.interactive
    }
}
