use crate::error::SelpgError;

/// Lines per page when neither `--limit` nor `--pbflag` is given
pub const DEFAULT_LINES_PER_PAGE: u32 = 72;

/// Marker byte used by `--pbflag`
pub const FORM_FEED: u8 = 0x0C;

/// How the input is cut into pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageBreak {
    /// A page is a fixed number of `\n`-terminated lines
    Lines(u32),
    /// Every occurrence of the byte closes a page
    Marker(u8),
}

impl PageBreak {
    /// The byte the scanner counts.
    pub fn delimiter(&self) -> u8 {
        match self {
            PageBreak::Lines(_) => b'\n',
            PageBreak::Marker(byte) => *byte,
        }
    }

    /// Whether the delimiter closing the last selected page is part of the
    /// output. Newlines end a line and stay; markers only separate pages.
    pub fn keeps_delimiter(&self) -> bool {
        matches!(self, PageBreak::Lines(_))
    }

    /// Number of delimiters that make up one page.
    pub fn unit_size(&self) -> u32 {
        match self {
            PageBreak::Lines(limit) => *limit,
            PageBreak::Marker(_) => 1,
        }
    }
}

/// The inclusive, 1-based page interval to extract and how pages are delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSelection {
    start: u32,
    end: u32,
    page_break: PageBreak,
}

impl PageSelection {
    pub fn new(start: u32, end: u32, page_break: PageBreak) -> Result<Self, SelpgError> {
        if start == 0 || end == 0 {
            return Err(usage("start and end pages must be positive"));
        }
        if start > end {
            return Err(usage(format!(
                "end page {} must be equal to or greater than start page {}",
                end, start
            )));
        }
        if page_break.unit_size() == 0 {
            return Err(usage("lines per page must be positive"));
        }

        Ok(PageSelection {
            start,
            end,
            page_break,
        })
    }

    /// Build a selection from the raw option values of the command line or an
    /// MCP request.
    ///
    /// Start and end are mandatory, and an explicit line limit cannot be
    /// combined with form-feed mode.
    pub fn from_options(
        start: Option<u32>,
        end: Option<u32>,
        limit: Option<u32>,
        form_feed: bool,
    ) -> Result<Self, SelpgError> {
        if limit.is_some() && form_feed {
            return Err(usage("a line limit and form-feed page breaks can not be used together"));
        }

        let (Some(start), Some(end)) = (start, end) else {
            return Err(usage("both a start page and an end page are required"));
        };

        let page_break = if form_feed {
            PageBreak::Marker(FORM_FEED)
        } else {
            PageBreak::Lines(limit.unwrap_or(DEFAULT_LINES_PER_PAGE))
        };

        PageSelection::new(start, end, page_break)
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn page_break(&self) -> PageBreak {
        self.page_break
    }

    pub fn delimiter(&self) -> u8 {
        self.page_break.delimiter()
    }

    pub fn unit_size(&self) -> u32 {
        self.page_break.unit_size()
    }
}

fn usage(message: impl Into<String>) -> SelpgError {
    SelpgError::Usage(message.into())
}
