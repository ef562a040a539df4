//! mockproc command shim - answers invocations from a route table
//!
//! This binary is copied to the name of each command a test wants to fake.
//! See the library docs for the environment it reads.

use anyhow::Result;
use mockproc_common::exit_status_byte;
use mockproc_shim::{logging, run_shim};
use std::process::ExitCode;

/// Exit status for shim failures that are not routing misses
const SHIM_ERROR_EXIT: u8 = 126;

fn main() -> ExitCode {
    logging::init();
    match run_main() {
        Ok(code) => ExitCode::from(exit_status_byte(code)),
        Err(e) => {
            eprintln!("mockproc shim error: {e:#}");
            ExitCode::from(SHIM_ERROR_EXIT)
        }
    }
}

fn run_main() -> Result<i32> {
    let exit_code = run_shim()?;
    Ok(exit_code)
}
