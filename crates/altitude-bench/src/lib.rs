pub mod paths;
pub mod report;
pub mod runner;
