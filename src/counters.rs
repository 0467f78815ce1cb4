use core::fmt::Write;
use heapless::String;

/// Per-step solver statistics, cleared at the start of every step.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StepCounters {
    /// Body pairs examined across all relaxation passes.
    pub pairs_tested: u32,
    /// Pairs that went through the GJK narrow phase.
    pub gjk_queries: u32,
    /// GJK runs that hit the iteration cap without an answer.
    pub gjk_non_convergent: u32,
    /// Contacts that received positional and velocity correction.
    pub contacts_resolved: u32,
}

impl StepCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Renders the counters into a fixed-capacity string, one line each.
    pub fn report(&self) -> String<256> {
        let mut text = String::new();
        let _ = write!(text, "pairs: {}\n", self.pairs_tested);
        let _ = write!(text, "gjk: {}\n", self.gjk_queries);
        let _ = write!(text, "non_convergent: {}\n", self.gjk_non_convergent);
        let _ = write!(text, "contacts: {}\n", self.contacts_resolved);
        text
    }
}
