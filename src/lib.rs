pub mod axis;
pub mod chart;
pub mod config;
pub mod controls;
pub mod data;
pub mod filter;
pub mod logging;
pub mod performance;
pub mod review;
pub mod router;
