pub mod formatter;
pub mod templates;
