use crate::error::SelpgError;
use crate::page_range::PageSelection;
use std::io::{ErrorKind, Read, Write};
use tracing::{debug, trace};

/// Size of each read from the input
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Where a scan is relative to the requested interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Before the start page
    Searching,
    /// Inside `[start, end]`
    Emitting,
    /// Past the end page; no further reads
    Done,
}

/// Outcome of a successful scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub bytes_written: u64,
    /// Page the cursor was on when reading stopped
    pub last_page: u64,
}

#[derive(Debug)]
struct ScanCursor {
    current_page: u64,
    unit_counter: u32,
    emitted_any: bool,
}

impl ScanCursor {
    fn new() -> Self {
        ScanCursor {
            current_page: 1,
            unit_counter: 0,
            emitted_any: false,
        }
    }

    /// Count one delimiter. Returns true when it closed the current page.
    fn advance(&mut self, unit_size: u32) -> bool {
        self.unit_counter = (self.unit_counter + 1) % unit_size;
        if self.unit_counter == 0 {
            self.current_page += 1;
            true
        } else {
            false
        }
    }

    fn state(&self, selection: &PageSelection) -> ScanState {
        if self.current_page < u64::from(selection.start()) {
            ScanState::Searching
        } else if self.current_page <= u64::from(selection.end()) {
            ScanState::Emitting
        } else {
            ScanState::Done
        }
    }
}

/// Copy the pages of `selection` from `input` to `sink`.
///
/// The input is read in chunks and never held in memory as a whole. Reading
/// stops as soon as the end page has been closed. Returns
/// [`SelpgError::Range`] if not a single byte fell inside the interval.
pub fn scan<R: Read, W: Write>(
    input: R,
    selection: &PageSelection,
    sink: W,
) -> Result<ScanReport, SelpgError> {
    scan_with_chunk_size(input, selection, sink, CHUNK_SIZE)
}

pub fn scan_with_chunk_size<R: Read, W: Write>(
    mut input: R,
    selection: &PageSelection,
    mut sink: W,
    chunk_size: usize,
) -> Result<ScanReport, SelpgError> {
    let mut buffer = vec![0u8; chunk_size.max(1)];
    let delimiter = selection.delimiter();
    let unit_size = selection.unit_size();
    let keep_break = selection.page_break().keeps_delimiter();
    let start = u64::from(selection.start());
    let end = u64::from(selection.end());

    let mut cursor = ScanCursor::new();
    let mut state = cursor.state(selection);
    let mut bytes_written = 0u64;

    while state != ScanState::Done {
        let n = match input.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(SelpgError::Input(e)),
        };
        let chunk = &buffer[..n];

        // Offsets of the interval within this chunk
        let (mut from, mut to) = (0, n);
        for (i, &byte) in chunk.iter().enumerate() {
            if byte != delimiter || !cursor.advance(unit_size) {
                continue;
            }
            if cursor.current_page == start {
                from = i + 1;
            } else if cursor.current_page == end + 1 {
                to = if keep_break { i + 1 } else { i };
                break;
            }
        }

        let next = cursor.state(selection);
        if next != state {
            trace!(page = cursor.current_page, ?next, "scan state changed");
            state = next;
        }

        if state != ScanState::Searching && from < to {
            sink.write_all(&chunk[from..to]).map_err(SelpgError::Output)?;
            bytes_written += (to - from) as u64;
            cursor.emitted_any = true;
        }
    }

    sink.flush().map_err(SelpgError::Output)?;

    debug!(
        bytes_written,
        last_page = cursor.current_page,
        "scan finished"
    );

    if !cursor.emitted_any {
        return Err(SelpgError::Range);
    }

    Ok(ScanReport {
        bytes_written,
        last_page: cursor.current_page,
    })
}
