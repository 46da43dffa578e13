pub mod agents;
pub mod chart;
pub mod data;
pub mod llm;
pub mod prompts;
pub mod tools;
