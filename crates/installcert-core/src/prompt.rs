//! Operator decision for `(Y/n) [Y]` prompts.
//!
//! Only an explicit `n`/`N` rejects. Everything else, including an empty
//! line and unrecognised answers such as `no` or `nope`, accepts. Keep this
//! in mind before changing the wording of any prompt.

/// Outcome of a yes/no prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Take the default path (add / save)
    Accept,
    /// Skip
    Reject,
}

impl Decision {
    /// Returns true for `Accept`.
    #[must_use]
    pub const fn is_accept(self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// Decide from a raw response line.
#[must_use]
pub fn decide(response: &str) -> Decision {
    match response.trim() {
        "n" | "N" => Decision::Reject,
        _ => Decision::Accept,
    }
}

/// Prompt text shown to the operator.
#[must_use]
pub fn question(message: &str) -> String {
    format!("{message} (Y/n) [Y]")
}
