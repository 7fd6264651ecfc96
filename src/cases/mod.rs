//! Case lifecycle: numbering, deadline tracking, and the registry service.

pub mod deadline;
pub mod number;
pub mod registry;

pub use deadline::{DeadlineReport, DeadlineStatus};
pub use registry::{CaseRegistry, ExtensionOutcome};
