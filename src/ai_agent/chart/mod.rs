pub mod executor;
pub mod figure;
pub mod render;
pub mod sanitize;
pub mod script;
