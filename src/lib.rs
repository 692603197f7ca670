//! # facturx-embed
//!
//! Embeds Factur-X / ZUGFeRD XML invoices into existing PDFs, producing
//! PDF/A-3 hybrid documents: the XML travels as an associated file
//! (`facturx.xml`, `/AFRelationship /Data`) and the XMP metadata declares
//! PDF/A-3u and Factur-X conformance.
//!
//! ## Quick Start
//!
//! ```no_run
//! use facturx_embed::core::EmbedOptions;
//! use facturx_embed::facturx::{embed_in_pdf, extract_attachment};
//!
//! let pdf = std::fs::read("invoice.pdf").unwrap();
//! let xml = std::fs::read("factur-x.xml").unwrap();
//!
//! let options = EmbedOptions::new().producer("ACME Billing");
//! let hybrid = embed_in_pdf(&pdf, &xml, &options).unwrap();
//!
//! assert_eq!(extract_attachment(&hybrid, "facturx.xml").unwrap(), xml);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | (none) | Embedding, extraction, XML well-formedness check |
//! | `server` | Authenticated HTTP service (`POST /embed`, `GET /healthz`) |

pub mod core;
pub mod facturx;
pub mod xml;

#[cfg(feature = "server")]
pub mod server;

pub use crate::core::{EmbedError, EmbedOptions};
pub use crate::facturx::{HybridDocument, embed_in_pdf, extract_attachment};
pub use crate::xml::validate_xml;
