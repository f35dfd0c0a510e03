/// Result sink: renders outcomes as the JSON results document.
///
/// The document is always a JSON array with one record per hydrograph, in
/// input order, even when only one hydrograph was analyzed.

use tracing::info;

use crate::error::SourceError;
use crate::model::SeriesOutcome;
use crate::storage::Storage;

/// Serializes outcomes compactly, or with two-space indentation when
/// `pretty` is set. The bytes carry no trailing newline.
pub fn serialize(outcomes: &[SeriesOutcome], pretty: bool) -> Result<Vec<u8>, serde_json::Error> {
    if pretty {
        serde_json::to_vec_pretty(outcomes)
    } else {
        serde_json::to_vec(outcomes)
    }
}

/// Writes a serialized document to `locator`, followed by a newline.
pub fn write_document(storage: &dyn Storage, locator: &str, document: &[u8]) -> Result<(), SourceError> {
    let mut bytes = Vec::with_capacity(document.len() + 1);
    bytes.extend_from_slice(document);
    bytes.push(b'\n');
    storage.write(locator, &bytes)?;
    info!(locator, bytes = bytes.len(), "results written");
    Ok(())
}
