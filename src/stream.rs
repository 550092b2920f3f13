pub mod classifier;
pub mod context;
pub mod processor;
pub mod resolve;
pub mod rules;

pub use classifier::{LineClassifier, LineType};
pub use context::RewriteContext;
pub use processor::StreamProcessor;
pub use resolve::resolve_reference;
