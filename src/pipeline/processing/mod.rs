// Record processing: extraction, resolution, normalization, and deduplication

pub mod assemble;
pub mod country;
pub mod dedup;
pub mod extract;
pub mod gazetteer;
pub mod phone;

pub use country::{CountryResolver, Resolution};
pub use dedup::{CanonicalContact, DedupOutcome, Deduplicator, MergeKey, MergeRecord};
pub use phone::{PhoneNormalizer, PhoneSkip};
