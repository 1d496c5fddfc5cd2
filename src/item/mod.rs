#[cfg(feature = "xml")]
/// This module provides an XML item reader.
pub mod xml;

#[cfg(feature = "rdbc-sqlite")]
/// This module provides an RDBC (SQLite) item writer.
pub mod rdbc;
