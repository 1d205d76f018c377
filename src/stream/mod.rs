pub mod bridge;
pub mod input;
pub mod router;
pub mod scanner;

pub use bridge::{PrintCommand, DEFAULT_PRINT_PROGRAM};
pub use input::InputSource;
pub use router::Destination;
pub use scanner::{scan, ScanReport};
