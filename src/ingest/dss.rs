/// HEC-DSS binary hydrographs.
///
/// DSS files are recognized so a payload can name them, but decoding the
/// record catalog is not implemented; every read fails with
/// `FormatError::Unsupported`.

use super::{FormatKind, FormatOptions, Normalizer};
use crate::error::FormatError;
use crate::model::Series;

pub struct DssNormalizer;

impl Normalizer for DssNormalizer {
    fn read(&self, _raw: &[u8], _options: &FormatOptions, _source_id: &str) -> Result<Series, FormatError> {
        Err(FormatError::Unsupported(FormatKind::Dss.to_string()))
    }
}
