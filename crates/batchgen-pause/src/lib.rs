//! A cooperative pause gate that workers check between items.
//!
//! Pausing never cancels in-flight work; it only blocks workers from
//! picking up the *next* item until [`PauseController::resume`] is called,
//! either manually or automatically once a scheduled resume time passes.

mod controller;
mod timers;

pub use controller::PauseController;
pub use timers::TimerManager;
