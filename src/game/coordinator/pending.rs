use chess_oracle::{Move, MoveDescriptor};

/// Lifecycle of one local move attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    /// Applied locally, waiting for the authority or the engine
    Applying { descriptor: MoveDescriptor, ply: usize },
    Confirmed { ply: usize },
    Rejected { ply: usize },
}

/// Tracks the single outstanding move attempt of a coordinator
#[derive(Debug, Clone, Default)]
pub struct PendingSubmission {
    phase: SubmissionPhase,
}

impl PendingSubmission {
    /// Start waiting for confirmation of the move at `ply`
    ///
    /// Returns `false` if another attempt is still waiting.
    pub fn request(&mut self, descriptor: MoveDescriptor, ply: usize) -> bool {
        if self.is_pending() {
            return false;
        }
        self.phase = SubmissionPhase::Applying { descriptor, ply };
        true
    }

    /// Record an attempt that needs no confirmation
    pub fn confirm_now(&mut self, ply: usize) {
        self.phase = SubmissionPhase::Confirmed { ply };
    }

    pub fn reject_now(&mut self, ply: usize) {
        self.phase = SubmissionPhase::Rejected { ply };
    }

    /// Ply the waiting attempt was played at
    pub fn awaiting_ply(&self) -> Option<usize> {
        match self.phase {
            SubmissionPhase::Applying { ply, .. } => Some(ply),
            _ => None,
        }
    }

    /// Settle the waiting attempt against the move now found at its ply
    ///
    /// `None` (line still too short) leaves the attempt waiting.
    pub fn settle(&mut self, at_ply: Option<&Move>) -> Option<SubmissionPhase> {
        let SubmissionPhase::Applying { descriptor, ply } = self.phase else {
            return None;
        };
        let settled = if at_ply?.matches(&descriptor) {
            SubmissionPhase::Confirmed { ply }
        } else {
            SubmissionPhase::Rejected { ply }
        };
        self.phase = settled;
        Some(settled)
    }

    /// Drop the waiting attempt without a verdict
    pub fn take(&mut self) -> Option<SubmissionPhase> {
        if !self.is_pending() {
            return None;
        }
        Some(std::mem::take(&mut self.phase))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.phase, SubmissionPhase::Applying { .. })
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }
}
