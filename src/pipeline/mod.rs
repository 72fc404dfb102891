// Pipeline stages, leaves first: ingestion fetches raw payloads,
// processing turns them into domain values, indexing derives the lookup
// structures every UI surface reads.

pub mod indexing;
pub mod ingestion;
pub mod processing;
