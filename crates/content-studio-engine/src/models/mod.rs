pub mod block;
pub mod composition;
pub mod kinds;

pub use block::{BlockBody, BlockId, BlockKind, ContentBlock};
pub use composition::{Composition, CompositionId, CompositionKind, CompositionMetadata};
pub use kinds::*;
