use quiz_core::model::score_percentage;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub current: usize,
    pub is_first: bool,
    pub is_last: bool,
    pub is_complete: bool,
}

/// Final score of a session; the percentage is derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreReport {
    pub correct: u32,
    pub total: u32,
}

impl ScoreReport {
    #[must_use]
    pub fn percentage(&self) -> u32 {
        score_percentage(self.correct, self.total)
    }
}

/// Correct/total tally for one question kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindTally {
    pub total: u32,
    pub correct: u32,
}

/// Score split by question kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub multiple_choice: KindTally,
    pub true_false: KindTally,
}
