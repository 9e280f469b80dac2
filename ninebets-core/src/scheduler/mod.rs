//! Round scheduler: the per-track state machine and the actor that ticks it.

pub mod actor;
pub mod commands;
pub mod core;
pub mod handle;

pub use actor::spawn_round_scheduler;
pub use commands::SchedulerCommand;
pub use self::core::{
    RoundEvent, RoundObserver, RoundPhase, RoundScheduler, SchedulerSnapshot, TickReport,
    TrackView,
};
pub use handle::RoundSchedulerHandle;
