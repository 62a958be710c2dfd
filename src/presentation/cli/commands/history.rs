use anyhow::Context;
use serde::Serialize;

use crate::application::services::Dashboard;
use crate::domain::entities::{CountRange, HistoryQuery, LatestFrame};
use crate::domain::ports::backend::ErrorKind;
use crate::domain::value_objects::SourceId;
use crate::presentation::cli::formatters::history_fmt::{print_history, print_no_history};
use crate::presentation::cli::formatters::status_fmt::print_section_header;

/// A history window as shown by `history`.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryReport {
    pub query: HistoryQuery,
    /// Rows the backend has for the query, which may exceed `frames`.
    pub count: usize,
    pub range: Option<CountRange>,
    pub frames: Vec<LatestFrame>,
}

impl HistoryReport {
    /// `None` until history has been fetched successfully.
    #[must_use]
    pub fn collect(dashboard: &Dashboard) -> Option<Self> {
        let snapshot = dashboard.store().history().get();
        let history = snapshot.data()?;
        Some(Self {
            query: dashboard.history_query(),
            count: history.count,
            range: history.count_range(),
            frames: history.data.clone(),
        })
    }
}

/// Fetch one history window and print it.
///
/// # Errors
///
/// Returns an error if the history endpoint fails for any reason other than
/// having no data, or if JSON serialization fails.
pub async fn run_history(
    dashboard: &Dashboard,
    query: HistoryQuery,
    json: bool,
) -> anyhow::Result<()> {
    match dashboard.load_history(query).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFoundError => {
            print_no_history(SourceId::History.not_found_message());
            return Ok(());
        }
        Err(e) => return Err(e).context("cannot fetch history"),
    }
    let Some(report) = HistoryReport::collect(dashboard) else {
        print_no_history(SourceId::History.not_found_message());
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    print_section_header(&format!("History ({} rows)", report.frames.len()));
    print_history(&report.frames, report.count, report.range.as_ref());
    println!();
    Ok(())
}
