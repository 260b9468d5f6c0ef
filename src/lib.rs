pub use vfetch_core::*;

pub mod software {
    pub use vfetch_software::*;
}

pub use software::{DrawInfo, FetchCache, FetchFunction, FetchKey, FetchedBatch, fetch_draw};
