/// Reaction marking approval on an approval prompt.
pub const APPROVE_SYMBOL: &str = "\u{2705}";
/// Reaction marking rejection on an approval prompt.
pub const REJECT_SYMBOL: &str = "\u{274C}";
/// Reaction the bot leaves on an origin message it has picked up.
pub const SEEN_SYMBOL: &str = "\u{1F440}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Approve,
    Reject,
}

impl Verdict {
    /// Anything other than the two verdict markers is not a review.
    pub fn classify(symbol: &str) -> Option<Self> {
        // Platforms sometimes append a variation selector to emoji.
        match symbol.trim_end_matches('\u{FE0F}') {
            APPROVE_SYMBOL => Some(Verdict::Approve),
            REJECT_SYMBOL => Some(Verdict::Reject),
            _ => None,
        }
    }

    pub fn approval(self) -> bool {
        matches!(self, Verdict::Approve)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Verdict::Approve => APPROVE_SYMBOL,
            Verdict::Reject => REJECT_SYMBOL,
        }
    }
}
