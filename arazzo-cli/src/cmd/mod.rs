pub mod config;
pub mod execute;
pub mod validate;
pub mod workflows;
