//! Data transfer objects.
//!
//! - `job`: Job, ClonePayload (job source and `/download` bodies)
//! - `repository`: RepositoryDescriptor, Credentials, LocalRepositoryHandle, ComponentType
//! - `commit`: CommitRecord, DiffStats (history walker output)

pub mod commit;
pub mod job;
pub mod repository;

pub use commit::*;
pub use job::*;
pub use repository::*;
