pub mod error;
pub mod checksum;
pub mod layout;
pub mod header;
pub mod io_stream;
pub mod archive;
pub mod inspect;
pub mod naming;
pub mod config;
pub mod archiver;

pub use error::{ContainerError, Result};
pub use checksum::{Checksum, ChecksumEngine};
pub use layout::{Field, HeaderLayout, Variant, HEADER_SIZE};
pub use header::{ContainerHeader, FirmwareMetadata, Metadata, PackageMetadata};
pub use io_stream::{ContainerReader, ContainerWriter, Extraction};
pub use inspect::{inspect, HeaderInfo};
