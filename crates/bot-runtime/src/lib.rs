#![deny(warnings)]

//! Decision-loop runtime: the page-automation seam, snapshot capture, and
//! the synchronous tick loop that drives clicking and purchasing.
//!
//! The loop is cooperative and single-threaded: one tick runs to completion
//! (click, pop shimmers, capture, decide, execute) before the next begins.
//! Every tick works from a fresh [`bot_core::GameSnapshot`]; there is no
//! retry inside a tick, the next capture is the retry mechanism.

pub mod page;
pub mod reader;
pub mod session;
pub mod sim;

pub use page::{ElementHandle, PageAutomation};
pub use reader::{PageSelectors, SnapshotReader};
pub use session::{format_elapsed, RuntimeOptions, Session, SessionSummary};
pub use sim::SimulatedPage;
