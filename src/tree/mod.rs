// Document tree module
// Typed tree accessor plus the XML/gzip codec used at both ends of the pipeline

pub mod node;
pub mod xml;

pub use node::{Node, PathSegment};
pub use xml::{parse_document, read_document, write_document, TreeError};
