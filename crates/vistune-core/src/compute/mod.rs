mod context;

pub use context::{with_context, ComputeContext, ContextHandle, Master};
