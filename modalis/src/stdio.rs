//! JSON-lines transport: one request per stdin line, one response per stdout line.

use crate::Service;
use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

pub fn serve(service: &Service) -> Result<ExitCode> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut served = 0usize;

    for line in stdin.lock().lines() {
        let line = line.context("failed to read request")?;
        if line.trim().is_empty() {
            continue;
        }

        let response = service.handle_json(&line);
        serde_json::to_writer(&mut out, &response)?;
        out.write_all(b"\n")?;
        out.flush()?;
        served += 1;
    }

    tracing::info!(requests = served, "stdin closed, stopping");
    Ok(ExitCode::SUCCESS)
}
