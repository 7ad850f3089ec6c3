//! Diagnostics sink for the supervision runtime.
//!
//! The supervisor never logs component failures itself; it describes them as
//! [`Report`]s and hands them to a [`SubscriberSet`], which fans each report out
//! to every [`Subscribe`] implementor without waiting for them.
//!
//! ```text
//! ComponentActor ─┐
//! runner        ──┼─► SubscriberSet::emit(&Report) ─► [queue S1] ─► worker ─► S1.on_report()
//! Supervisor    ──┘                                 └► [queue SN] ─► worker ─► SN.on_report()
//! ```
//!
//! [`LogWriter`] renders reports through `tracing` and is installed by default.

mod log;
mod report;
mod set;
mod subscriber;

pub use log::LogWriter;
pub use report::{Report, ReportKind};
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
