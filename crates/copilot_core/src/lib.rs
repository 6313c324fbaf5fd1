pub mod bundle;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod merge;
pub mod resolve;
pub mod split;
pub mod text;
