pub mod alerts;
pub mod config;
pub mod history;
pub mod reliability;
pub mod stats;
pub mod status;
pub mod watch;
