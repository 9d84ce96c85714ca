use std::fmt;

use rust_fsm::state_machine;

// The room lifecycle is strictly one-way: every edge can fire at most once, so
// simultaneous start conditions (auto-start and a manual start request) cannot
// schedule the pre-game delay twice.
state_machine! {
    derive(Debug, Clone, PartialEq)
    pub RoomFsm(Waiting)

    Waiting => {
        BeginStarting => Starting
    },
    Starting => {
        BeginPlaying => Playing
    },
    Playing => {
        Finish => Finished
    }
}

impl fmt::Display for RoomFsmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
