//! Knowledge base access: the typed client used by the engine and an
//! in-memory implementation serving the same endpoints.

mod client;
mod memory;
mod seed;

pub use client::{KnowledgeBase, ParameterLookup};
pub use memory::MemoryKnowledgeBase;
pub use seed::{KbSeed, SeedConfiguration};
