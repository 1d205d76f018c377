use crate::error::SelpgError;
use crate::page_range::PageSelection;
use crate::stream::router::{self, Route};
use crate::stream::{scanner, Destination, InputSource, ScanReport};
use tracing::{debug, error};

/// Copy the selected pages of `input` to `destination`.
///
/// The input is opened before a print command is started, so an unreadable
/// file never spawns one. The scan runs on a blocking thread; the pipe to the
/// print command is closed when it returns, on success or failure, and the
/// print job is always awaited before this function returns.
pub async fn run(
    input: InputSource,
    selection: PageSelection,
    destination: Destination,
) -> Result<ScanReport, SelpgError> {
    let reader = input.open()?;
    let Route { sink, job } = router::route(destination)?;

    debug!(
        %input,
        start = selection.start(),
        end = selection.end(),
        page_break = ?selection.page_break(),
        "selecting pages"
    );

    // `sink` moves into the closure and is dropped when the scan ends
    let scanned = tokio::task::spawn_blocking(move || scanner::scan(reader, &selection, sink))
        .await
        .unwrap_or_else(|e| {
            Err(SelpgError::Task(format!(
                "page scan did not complete: {}",
                e
            )))
        });

    let printed = match job {
        Some(job) => job.wait().await,
        None => Ok(()),
    };

    match (scanned, printed) {
        (Ok(report), Ok(())) => Ok(report),
        (Err(e), Ok(())) | (Ok(_), Err(e)) => Err(e),
        // A print command that died early shows up as a broken pipe in the
        // scan; its own failure is the one worth reporting
        (Err(scan_error @ SelpgError::Output(_)), Err(print_error))
            if print_error.is_print_failure() =>
        {
            debug!(error = %scan_error, "scan aborted by print command failure");
            Err(print_error)
        }
        (Err(scan_error), Err(print_error)) => {
            error!("print job failed: {:#}", anyhow::Error::new(print_error));
            Err(scan_error)
        }
    }
}
