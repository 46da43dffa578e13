pub mod dashboard_service;
pub mod report;
