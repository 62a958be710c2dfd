use colored::Colorize;

use crate::domain::entities::{CountRange, LatestFrame};

/// One history row: time, count, and how many cameras were streaming.
#[must_use]
pub fn history_row(frame: &LatestFrame) -> String {
    let online = frame.cam_stream.iter().filter(|up| **up).count();
    format!(
        "  {:<22} {:>7.0}  {online}/{} online",
        frame.timestamp,
        frame.count,
        frame.camera_count()
    )
}

#[must_use]
pub fn range_line(range: &CountRange) -> String {
    format!(
        "  min {:.0}  max {:.0}  mean {:.1}",
        range.min, range.max, range.mean
    )
}

pub fn print_history(frames: &[LatestFrame], total: usize, range: Option<&CountRange>) {
    for frame in frames {
        println!("{}", history_row(frame));
    }
    if let Some(range) = range {
        println!("{}", range_line(range).dimmed());
    }
    if total > frames.len() {
        println!(
            "  {}",
            format!("{} of {total} rows shown", frames.len()).dimmed()
        );
    }
}

pub fn print_no_history(message: &str) {
    println!();
    println!("{}", message.dimmed());
    println!();
}
