// Record shapes for each pipeline stage

pub mod contact;
pub mod failure;
pub mod record_set;
pub mod upload;

pub use contact::{EnrichedContact, NormalizedContact, RawContact, ResolvedLocation};
pub use failure::{FailureKind, RecordFailure};
pub use record_set::RecordSet;
pub use upload::UploadPayload;
