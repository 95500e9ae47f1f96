//! Plain-text rendering of tests and procedure tables.

use proclab_core::types::TestName;
use proclab_core::{LinkAction, Observed, Refresh};
use std::io::{self, Write};

const NEW_MARKER: &str = "*";

pub fn tests(out: &mut impl Write, tests: &[TestName]) -> io::Result<()> {
    if tests.is_empty() {
        return writeln!(out, "No tests yet.");
    }
    for test in tests {
        writeln!(out, "{test}")?;
    }
    Ok(())
}

pub fn procedures(out: &mut impl Write, test: &TestName, entries: &[Observed]) -> io::Result<()> {
    writeln!(out, "Procedures for: {test}")?;
    if entries.is_empty() {
        return writeln!(out, "No procedures available for this test.");
    }

    let text_width = entries
        .iter()
        .map(|entry| entry.procedure.text.chars().count())
        .max()
        .unwrap_or(0);

    for entry in entries {
        let marker = if entry.is_new { NEW_MARKER } else { " " };
        let id = entry
            .procedure
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "{marker} {index:>3}  {text:<text_width$}  {action}  [{id}]",
            index = entry.index,
            text = entry.procedure.text,
            action = describe(&LinkAction::of(&entry.procedure.link)),
        )?;
    }
    Ok(())
}

pub fn refresh(out: &mut impl Write, test: &TestName, cycle: u64, refresh: &Refresh) -> io::Result<()> {
    writeln!(
        out,
        "-- refresh {cycle}: {} new ({NEW_MARKER} marks new) --",
        refresh.new_count()
    )?;
    procedures(out, test, &refresh.entries)
}

pub fn describe(action: &LinkAction) -> String {
    match action {
        LinkAction::Download { path, name, url } => match url {
            Some(url) => format!("download {name}: {} | open remotely: {url}", path.display()),
            None => format!("download {name}: {}", path.display()),
        },
        LinkAction::OpenRemote(url) => format!("open remotely: {url}"),
        LinkAction::Missing { name } => format!("file missing: {name}"),
        LinkAction::Open(url) => format!("open link: {url}"),
        LinkAction::Nothing => "N/A".to_string(),
    }
}
