//! Factur-X / ZUGFeRD PDF/A-3 embedding.
//!
//! Turns an ordinary PDF and a CII XML invoice into a hybrid document:
//!
//! 1. load the PDF and locate the catalog
//! 2. drop previous entries with the attachment's name from the
//!    EmbeddedFiles name tree
//! 3. add the embedded-file stream and its `/Filespec`
//! 4. register the filespec under `/Names` and in the catalog `/AF` array
//! 5. stamp PDF/A-3u and Factur-X properties into the XMP packet and
//!    `/Producer` and `/ModDate` into the document info
//! 6. serialize with a fixed trailer `/ID`
//!
//! Steps 2–5 run on a copy of the object graph, so a failure never leaves
//! a half-modified document behind.

mod dedup;
mod document;
mod extract;
mod filespec;
mod graph;
mod load;
mod save;
mod stamp;
mod wiring;
mod xmp;

pub use document::{HybridDocument, embed_in_pdf};
pub use extract::extract_attachment;
pub use stamp::{CONFORMANCE_LEVEL, FACTURX_VERSION};
