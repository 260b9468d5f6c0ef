mod context;
mod descriptor;
mod format;

pub use context::*;
pub use descriptor::*;
pub use format::{ComponentKind, Format, FormatInfo};
