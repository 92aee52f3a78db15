/// Pending repeat count typed before (or inside) a command.
///
/// Digits are concatenated decimally, including digits typed after an
/// operator: `2d3w` reads back as 23, not 6.
#[derive(Debug, Clone)]
pub(crate) struct Counts {
    current: Option<u32>,
    max: u32,
}

impl Counts {
    pub(crate) fn new(max: u32) -> Self {
        Self { current: None, max }
    }

    /// Appends a digit. Returns `false` when `0` arrives with no count
    /// pending, in which case it is the line-start motion instead.
    pub(crate) fn push_digit(&mut self, d: u32) -> bool {
        if d == 0 && self.current.is_none() {
            return false;
        }
        let next = self
            .current
            .unwrap_or(0)
            .saturating_mul(10)
            .saturating_add(d)
            .min(self.max);
        self.current = Some(next);
        true
    }

    /// Reads the count, defaulting to 1, and resets it.
    pub(crate) fn consume(&mut self) -> u32 {
        self.current.take().unwrap_or(1).max(1)
    }

    /// Reads the count only if one was typed, and resets it.
    pub(crate) fn take(&mut self) -> Option<u32> {
        self.current.take().map(|n| n.max(1))
    }

    pub(crate) fn peek(&self) -> Option<u32> {
        self.current
    }

    pub(crate) fn clear(&mut self) {
        self.current = None;
    }
}
