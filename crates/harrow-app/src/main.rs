#![forbid(unsafe_code)]

//! Binary entrypoint for the Harrow scheduler.

use harrow_app::{AppResult, run_app};

/// Runs the selected command on a single-threaded runtime.
#[tokio::main(flavor = "current_thread")]
async fn main() -> AppResult<()> {
    run_app().await
}
