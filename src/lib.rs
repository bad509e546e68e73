pub mod core;
pub mod fence;
pub mod solve;
