pub mod contract;
pub mod money;
pub mod profile;
pub mod stack;
pub mod supplement;
