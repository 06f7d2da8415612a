use std::io::{self, Write};

use serde::Serialize;

use crate::app::{
    CountResult, ExportSummary, LoadSummary, MembersResult, ProgressEvent, ProgressSink,
};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Console,
    Json,
}

pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn event(&self, event: ProgressEvent) {
        println!("{}", event.message);
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_load(result: &LoadSummary) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_count(result: &CountResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_members(result: &MembersResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_export(result: &ExportSummary) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

// Only the final summary is printed in JSON mode.
impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

pub fn print_load_summary(result: &LoadSummary) {
    let green = "\x1b[32m";
    let cyan = "\x1b[36m";
    let yellow = "\x1b[33m";
    let reset = "\x1b[0m";

    println!("{cyan}SRA metadata load summary{reset}");
    println!(
        "{green}samples: {} loaded, {} rows{reset}",
        result.records.samples, result.rows.samples
    );
    println!(
        "{green}experiments: {} loaded, {} rows{reset}",
        result.records.experiments, result.rows.experiments
    );
    println!(
        "{green}runs: {} loaded, {} rows{reset}",
        result.records.runs, result.rows.runs
    );
    println!(
        "{cyan}{} members loaded in {} insert calls ({} ms){reset}",
        result.entries_loaded, result.insert_calls, result.elapsed_ms
    );
    if result.entries_skipped > 0 {
        println!(
            "{yellow}{} malformed members skipped{reset}",
            result.entries_skipped
        );
    }
}
