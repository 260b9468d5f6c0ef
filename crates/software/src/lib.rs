mod cache;
mod draw;
mod simd;
mod vm;

pub use cache::*;
pub use draw::*;
pub use vm::*;
