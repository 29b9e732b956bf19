pub mod enums;
pub mod report;

pub use enums::*;
pub use report::*;
