pub mod chart_agent;
pub mod insight_agent;
