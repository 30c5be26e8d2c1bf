//! Word-processor document output.
//!
//! Word and LibreOffice open HTML documents that declare the Office
//! namespaces, so the record is wrapped in such a document rather than
//! written as OOXML.

use time::macros::format_description;

use crate::Result;
use crate::record::DocumentRecord;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

/// Wrap the record's content in an Office-namespaced HTML document.
pub fn convert_to_word(record: &DocumentRecord) -> Result<String> {
    let title = escape(record.title());
    let source = escape(record.source_url());
    let extracted = record
        .extracted_at()
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC"))
        .unwrap_or_else(|_| record.extracted_at_rfc3339());

    Ok(format!(
        "<html xmlns:o=\"urn:schemas-microsoft-com:office:office\" \
         xmlns:w=\"urn:schemas-microsoft-com:office:word\">\
         <head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><h1>{title}</h1>\
         <p><strong>Source:</strong> {source}</p>\
         <p><strong>Extracted:</strong> {extracted}</p>\
         <hr><div>{content}</div></body></html>",
        content = record.content()
    ))
}
