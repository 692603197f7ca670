use chrono::{DateTime, Utc};

/// The embedded XML filename registered by this crate.
pub const FACTURX_FILENAME: &str = "facturx.xml";

/// Default `/Producer` written to the document-info dictionary.
pub const DEFAULT_PRODUCER: &str = "ELS Factur-X Embed Service";

/// Default `/Desc` of the attachment's file specification.
pub const DEFAULT_DESCRIPTION: &str = "Factur-X EN16931 structured data";

/// Per-call settings for [`crate::facturx::embed_in_pdf`].
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use facturx_embed::core::EmbedOptions;
///
/// let options = EmbedOptions::new()
///     .producer("ACME Billing")
///     .timestamp(Utc.with_ymd_and_hms(2024, 6, 15, 8, 30, 0).unwrap())
///     .request_id("req-42");
/// assert_eq!(options.timestamp_string(), "2024-06-15T08:30:00Z");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedOptions {
    /// Logical name of the attachment (`/F`, `/UF`, name-tree key).
    pub attachment_name: String,
    /// Human-readable `/Desc` of the file specification.
    pub description: String,
    /// `/Producer` written to the document-info dictionary.
    pub producer: String,
    /// Fixed stamping time. `None` means "now".
    pub timestamp: Option<DateTime<Utc>>,
    /// Correlation id attached to every log event of the invocation.
    pub request_id: Option<String>,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            attachment_name: FACTURX_FILENAME.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            producer: DEFAULT_PRODUCER.to_string(),
            timestamp: None,
            request_id: None,
        }
    }
}

impl EmbedOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attachment_name(mut self, name: impl Into<String>) -> Self {
        self.attachment_name = name.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn producer(mut self, producer: impl Into<String>) -> Self {
        self.producer = producer.into();
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// The stamping time rendered for XMP and `/ModDate`.
    pub fn timestamp_string(&self) -> String {
        format_timestamp(self.timestamp.unwrap_or_else(Utc::now))
    }
}

/// Render a UTC timestamp as ISO-8601 with second precision and a `Z` suffix.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
