//! Simulation engine — the candle loop and the pieces it is built from.
//!
//! Per candle the driver aligns the chart to the candle end, runs maintenance,
//! then two cycles:
//!
//! 1. `First`: existing orders settle; stop conditions are checked afterwards
//! 2. `Second`: new orders may be placed; the index advances afterwards

pub mod advance;
pub mod align;
pub mod collaborators;
pub mod control;
pub mod heartbeat;
pub mod simulation;
pub mod stop;

pub use advance::{advance_candle, Advance};
pub use align::{align_chart, check_chart_order, find_current_element, AlignError, AlignmentLayout, OutOfOrder};
pub use collaborators::{
    CollaboratorError, OutputSink, ProgressSink, TradingEngine, TradingEpisode, TradingRecords,
    TradingSystem,
};
pub use control::{SessionController, StopToken};
pub use heartbeat::{progress_percentage, Heartbeat};
pub use simulation::{
    Collaborators, RunSummary, Simulation, SimulationError, StartMode, STALE_DATA_MESSAGE,
};
pub use stop::{
    balance_breach, evaluate_between_cycles, final_datetime_reached, is_within_initial_datetime,
    resolve_start_index, Asset, BalanceBreach, Bound, StopOutcome,
};
