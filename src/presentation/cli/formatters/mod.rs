pub mod alert_fmt;
pub mod history_fmt;
pub mod stats_fmt;
pub mod status_fmt;
