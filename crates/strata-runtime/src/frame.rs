use strata_core::Address;
use strata_state::{SnapshotId, StateError, TransactionState};
use tracing::debug;

/// How an invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Running,
    Committed,
    Discarded,
}

/// One active invocation: who called, who is running, and the snapshot the
/// frame owns.
#[derive(Debug)]
pub struct CallFrame {
    pub caller: Address,
    pub target: Address,
    pub snapshot: SnapshotId,
    pub status: FrameStatus,
}

/// The strict stack of active frames for one transaction. Only the top frame
/// may issue capability operations; frames nest call-and-return, never
/// concurrently.
#[derive(Debug, Default)]
pub struct FrameStack {
    frames: Vec<CallFrame>,
}

impl FrameStack {
    pub fn new() -> Self {
        FrameStack::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The currently active frame, if any
    pub fn top(&self) -> Option<&CallFrame> {
        self.frames.last()
    }

    /// Push a frame for a new invocation. Its snapshot is a child of the
    /// current top frame's snapshot, or of the transaction root if the stack
    /// is empty. Returns the frame's index for the matching `pop`.
    pub fn push(
        &mut self,
        state: &mut TransactionState,
        caller: Address,
        target: Address,
    ) -> Result<usize, StateError> {
        let parent = self.top().map(|f| f.snapshot).unwrap_or_else(|| state.root());
        let snapshot = state.create_child(parent)?;
        let index = self.frames.len();
        self.frames.push(CallFrame {
            caller,
            target,
            snapshot,
            status: FrameStatus::Running,
        });
        debug!("pushed frame {} for {} (snapshot {})", index, target, snapshot);
        Ok(index)
    }

    /// Pop the top frame and return it: commit its snapshot into the parent
    /// on `Success`, discard it on `Failure`.
    ///
    /// Panics if `index` is not the current top; popping out of order is a
    /// programming error in the executor.
    pub fn pop(
        &mut self,
        state: &mut TransactionState,
        index: usize,
        outcome: Outcome,
    ) -> Result<CallFrame, StateError> {
        assert_eq!(
            index + 1,
            self.frames.len(),
            "frame {} popped while {} frames are active",
            index,
            self.frames.len()
        );
        let mut frame = self.frames.pop().expect("frame stack underflow");
        match outcome {
            Outcome::Success => {
                state.commit(frame.snapshot)?;
                frame.status = FrameStatus::Committed;
            }
            Outcome::Failure => {
                state.discard(frame.snapshot)?;
                frame.status = FrameStatus::Discarded;
            }
        }
        debug!("popped frame {} ({:?})", index, outcome);
        Ok(frame)
    }
}
