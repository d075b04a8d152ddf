pub mod coordinator;
pub mod processor;
pub mod scheduler;
pub mod source;

pub use coordinator::{JobCoordinator, JobPermit};
pub use processor::{JobOutcome, JobProcessor, SharedProcessor};
pub use scheduler::Scheduler;
pub use source::JobSourceClient;
