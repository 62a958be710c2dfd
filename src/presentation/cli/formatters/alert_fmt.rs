use colored::Colorize;

use crate::domain::entities::{CountingAlert, StreamAlert, StreamAlertType};

/// Strips ANSI/OSC escape sequences from a string to prevent terminal injection.
fn sanitize_terminal(input: &str) -> String {
    input.chars().filter(|c| *c != '\x1b').collect()
}

fn kind_badge(kind: &str) -> String {
    let label = format!(" {} ", sanitize_terminal(kind));
    match kind {
        "auto_fallback" => format!("{}", label.on_yellow().black().bold()),
        "service_error" => format!("{}", label.on_red().white().bold()),
        _ => format!("{}", label.on_blue().white()),
    }
}

fn stream_badge(alert_type: StreamAlertType) -> String {
    let label = format!("[{alert_type}]");
    match alert_type {
        StreamAlertType::Disconnected => format!("{}", label.red().bold()),
        StreamAlertType::Reconnected => format!("{}", label.green()),
        StreamAlertType::HighLatency => format!("{}", label.yellow()),
        StreamAlertType::Other => format!("{}", label.dimmed()),
    }
}

pub fn format_counting_alerts(alerts: &[CountingAlert], selected: &[String]) {
    for alert in alerts {
        let marker = if selected.contains(&alert.id) { "[x]" } else { "[ ]" };
        let state = if alert.acknowledged {
            "acknowledged".dimmed()
        } else {
            "open".yellow().bold()
        };
        println!();
        println!(
            "{marker} {} {} {}",
            kind_badge(&alert.kind),
            sanitize_terminal(&alert.id).bold(),
            state
        );
        if !alert.message.is_empty() {
            println!("  {}", sanitize_terminal(&alert.message));
        }
        if !alert.timestamp.is_empty() {
            println!("  {}", sanitize_terminal(&alert.timestamp).dimmed());
        }
    }
    println!();
}

pub fn format_stream_alerts(alerts: &[StreamAlert]) {
    for alert in alerts {
        println!(
            "  {} {} {}",
            stream_badge(alert.alert_type),
            sanitize_terminal(&alert.stream_name).bold(),
            sanitize_terminal(&alert.timestamp).dimmed()
        );
    }
}

pub fn print_no_alerts() {
    println!();
    println!("{}", "No alerts".green().bold());
    println!();
}
