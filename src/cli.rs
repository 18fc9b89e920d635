//! Line-oriented terminal front-end.
//!
//! Every stdin line replaces the query; state changes are rendered to stdout
//! as they are published.

use crate::config;
use crate::controller::{SearchController, SearchState};
use crate::logging;
use crate::search::ResultRecord;
use anyhow::{Context, Result};
use futures::StreamExt;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio_stream::wrappers::{LinesStream, WatchStream};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const QUIT_COMMAND: &str = ":q";
const MAX_COLUMN_WIDTH: usize = 40;
const RENDER_GRACE: Duration = Duration::from_millis(200);
const HEADERS: [&str; 5] = ["REGISTRY", "TAX ID", "LEGAL NAME", "TRADE NAME", "LOCATION"];

pub async fn run() -> Result<()> {
    let config = config::load_or_create_config()?;
    let _log_guard = logging::init(&config)?;

    let controller =
        SearchController::from_config(&config).context("Failed to create search controller")?;
    tracing::info!(endpoint = %config.endpoint, debounce_ms = config.debounce_ms, "opsearch started");

    println!("Searching {}", config.endpoint);
    println!("Type a query per line (blank line clears, {} quits).", QUIT_COMMAND);

    let renderer = tokio::spawn(render_loop(controller.subscribe()));

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = LinesStream::new(stdin.lines());
    let mut quit = false;
    while let Some(line) = lines.next().await {
        let line = line.context("Failed to read from stdin")?;
        if line.trim() == QUIT_COMMAND {
            quit = true;
            break;
        }
        controller.set_query(line);
    }

    if !quit {
        // Input ended (e.g. piped): let the last query settle before exiting.
        wait_until_settled(&controller).await;
    }

    // Dropping the controller closes the state channel, which ends the
    // render loop once the final state has been printed.
    drop(controller);
    if tokio::time::timeout(RENDER_GRACE, renderer).await.is_err() {
        tracing::debug!("renderer did not finish in time");
    }

    tracing::info!("opsearch exiting");
    Ok(())
}

async fn wait_until_settled(controller: &SearchController) {
    let mut rx = controller.subscribe();
    tokio::time::sleep(controller.debounce() + Duration::from_millis(10)).await;
    let _ = rx.wait_for(|s| !s.loading).await;
}

async fn render_loop(rx: watch::Receiver<SearchState>) {
    let mut states = WatchStream::new(rx);
    let mut last: Option<SearchState> = None;

    while let Some(state) = states.next().await {
        // Query edits alone don't change what is on screen.
        let visible_change = last.as_ref().map_or(true, |prev| {
            prev.loading != state.loading
                || prev.error != state.error
                || prev.results != state.results
        });
        if visible_change {
            print!("{}", render(&state));
        }
        last = Some(state);
    }
}

fn render(state: &SearchState) -> String {
    if state.loading {
        return format!("searching \"{}\"...\n", state.query.trim());
    }
    if let Some(error) = &state.error {
        return format!("error: {}\n", error);
    }
    if state.query.trim().is_empty() {
        return String::new();
    }
    if state.results.is_empty() {
        return "no results\n".to_string();
    }
    render_table(&state.results)
}

fn render_table(records: &[ResultRecord]) -> String {
    let rows: Vec<[String; 5]> = records
        .iter()
        .map(|r| {
            [
                r.registry_id.to_string(),
                r.tax_id.clone(),
                r.legal_name.clone(),
                r.trade_name.clone().unwrap_or_default(),
                r.location().unwrap_or_default(),
            ]
            .map(|cell| truncate(&cell, MAX_COLUMN_WIDTH))
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.width());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS.map(str::to_string), &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out.push_str(&format!("{} result(s)\n", records.len()));
    out
}

fn push_row(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| pad(cell, *width))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

/// Right-pad to `width` display cells.
fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.width());
    format!("{}{}", s, " ".repeat(fill))
}

/// Cut to at most `max` display cells, marking the cut with an ellipsis.
fn truncate(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_counts_display_width() {
        assert_eq!(pad("São", 5), "São  ");
        assert_eq!(pad("toolong", 3), "toolong");
    }

    #[test]
    fn test_truncate_marks_cut() {
        assert_eq!(truncate("short", 10), "short");
        let cut = truncate("ADMINISTRADORA DE BENEFICIOS", 10);
        assert_eq!(cut, "ADMINISTR…");
        assert_eq!(cut.width(), 10);
    }

    #[test]
    fn test_render_states() {
        let mut state = SearchState {
            query: " acme ".to_string(),
            loading: true,
            ..Default::default()
        };
        assert_eq!(render(&state), "searching \"acme\"...\n");

        state.loading = false;
        state.error = Some("not found".to_string());
        assert_eq!(render(&state), "error: not found\n");

        state.error = None;
        assert_eq!(render(&state), "no results\n");

        state.query.clear();
        assert_eq!(render(&state), "");
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let mut record = ResultRecord::new(1u64, "00.000.000/0001-00", "Acme LTDA");
        record.city = Some("São Paulo".to_string());
        record.state_code = Some("SP".to_string());

        let table = render_table(&[record]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("REGISTRY  TAX ID"));
        assert!(lines[1].starts_with("1         00.000.000/0001-00  Acme LTDA"));
        assert!(lines[1].ends_with("São Paulo/SP"));
        assert_eq!(lines[2], "1 result(s)");
    }
}
