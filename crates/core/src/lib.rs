pub mod error;
pub mod fetch;
pub mod formatters;
pub mod locate;
pub mod normalize;
pub mod parse;
pub mod record;
pub mod relay;
pub mod retrieve;
pub mod synthesize;
pub mod text_mode;

pub use error::{GleanerError, Result};
#[cfg(feature = "fetch")]
pub use fetch::HttpTransport;
pub use fetch::{FetchConfig, HttpResponse, Transport};
pub use fetch::{fetch_file, fetch_stdin, validate_url};
pub use formatters::{JsonConfig, JsonFormatter, MarkdownConfig, MarkdownFormatter, TextConfig, TextFormatter};
pub use formatters::{OutputFormat, PageStyle, PagedConfig, PagedDocument, TextStats, render, stats};
pub use formatters::{convert_to_json, convert_to_markdown, convert_to_pages, convert_to_text, convert_to_word};
#[doc(hidden)]
pub use locate::{CandidateRegion, RegionSource};
pub use locate::{LocatorConfig, locate};
pub use normalize::{NormalizeOptions, NormalizedFragment, normalize};
pub use parse::{Document, Element};
pub use record::{Dimension, DocumentRecord, ImageInfo};
pub use relay::{PayloadKind, Relay, default_relays, default_text_relay};
#[cfg(feature = "fetch")]
pub use retrieve::retrieve;
pub use retrieve::{AttemptOutcome, GleanerConfig, GleanerConfigBuilder, RetrievalAttempt, Retriever, extract_html};
pub use synthesize::{synthesize, synthesize_at};
pub use text_mode::parse_text;
