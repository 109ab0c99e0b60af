//! Output Formatting

pub mod json;
pub mod live;
