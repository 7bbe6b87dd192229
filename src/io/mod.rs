//! I/O seams: reader/source traits, the driver abstraction and in-memory
//! reference implementations.

pub mod driver;
pub mod memory;
pub mod reader;

pub use driver::{PendingReader, ReaderDriver};
pub use memory::{MemoryDriver, MemoryLoadContext, MemoryReader, MemorySource};
pub use reader::{RasterReader, RasterSource, ReadArgs};
