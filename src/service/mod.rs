pub mod artifact;
pub mod canonicalize;
pub mod export;
pub mod fetch;
pub mod pipeline;
pub mod sync;
