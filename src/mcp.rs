use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::PathBuf;

use crate::page_range::PageSelection;
use crate::stream::{scan, InputSource};

/// Most bytes `select_pages` returns in one response
pub const MAX_SELECTED_BYTES: usize = 1024 * 1024;

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SelectPagesRequest {
    #[schemars(description = "Path to the text file")]
    pub path: String,
    #[schemars(description = "First page to return (1-based)")]
    pub start: u32,
    #[schemars(description = "Last page to return (inclusive, at least start)")]
    pub end: u32,
    #[schemars(description = "Lines per page (default: 72). Not allowed together with form_feed")]
    #[serde(default)]
    pub limit: Option<u32>,
    #[schemars(description = "Pages end at form feed characters instead of a line count (default: false)")]
    #[serde(default)]
    pub form_feed: bool,
}

#[derive(Debug, Clone)]
pub struct SelpgServer {
    tool_router: ToolRouter<Self>,
}

impl SelpgServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for SelpgServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl SelpgServer {
    #[tool(description = "Return a range of pages from a text file. Pages are a fixed number of lines (limit, default 72) or, with form_feed, the text between form feed characters. At most 1 MiB of selected text is returned; larger selections fail, so request fewer pages.")]
    fn select_pages(&self, Parameters(req): Parameters<SelectPagesRequest>) -> String {
        match read_selected_pages(req, MAX_SELECTED_BYTES) {
            Ok(result) => {
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {:#}", e),
        }
    }
}

fn read_selected_pages(req: SelectPagesRequest, max_bytes: usize) -> Result<SelectPagesResult> {
    let selection =
        PageSelection::from_options(Some(req.start), Some(req.end), req.limit, req.form_feed)?;
    let reader = InputSource::File(PathBuf::from(&req.path)).open()?;

    let mut selected = CappedBuffer::new(max_bytes);
    let report = scan(reader, &selection, &mut selected)?;
    let selected = selected.buf;

    Ok(SelectPagesResult {
        path: req.path,
        start: req.start,
        end: req.end,
        bytes: report.bytes_written,
        text: String::from_utf8_lossy(&selected).into_owned(),
    })
}

/// Collects scanner output in memory, failing the write once `limit` bytes
/// would be exceeded so the scan stops reading.
struct CappedBuffer {
    buf: Vec<u8>,
    limit: usize,
}

impl CappedBuffer {
    fn new(limit: usize) -> Self {
        CappedBuffer {
            buf: Vec::new(),
            limit,
        }
    }
}

impl Write for CappedBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.buf.len() + data.len() > self.limit {
            return Err(io::Error::other(format!(
                "selected pages exceed the {} byte limit",
                self.limit
            )));
        }
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SelectPagesResult {
    pub path: String,
    pub start: u32,
    pub end: u32,
    pub bytes: u64,
    pub text: String,
}

#[tool_handler]
impl ServerHandler for SelpgServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Page selection for plain text files. Use select_pages to read a range of \
                 pages, counted either as fixed blocks of lines or as form-feed separated pages."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = SelpgServer::new();

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
