//! Read-only view of an attestation quote.
//!
//! Only the fields needed to index quotes are exposed. Nothing about the quote
//! is verified here.
use rustc_hex::{FromHex, FromHexError, ToHex};

use super::{MrEnclave, MrSigner};
use crate::common::field::{self, Field};

/// An attestation quote.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Quote(Vec<u8>);

impl Quote {
    pub const MRENCLAVE: Field = Field::read_only(112, 32);
    /// The first half of report data, which holds the MRSIGNER of the key
    /// the quote was requested for.
    pub const REPORT_DATA_MRSIGNER: Field = Field::read_only(368, 32);

    /// Minimum length of a quote for which all fields can be read.
    pub const MIN_LEN: usize = Self::REPORT_DATA_MRSIGNER.end();

    /// Decode a quote from its hex representation.
    ///
    /// Surrounding whitespace is ignored.
    pub fn from_hex(s: &str) -> Result<Self, FromHexError> {
        Ok(Quote(s.trim().from_hex()?))
    }

    /// Lowercase hex representation of the quote.
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn mrenclave(&self) -> Result<MrEnclave, field::Error> {
        let mut mrenclave = MrEnclave::default();
        mrenclave.0.copy_from_slice(Self::MRENCLAVE.get(&self.0)?);
        Ok(mrenclave)
    }

    pub fn report_data_mrsigner(&self) -> Result<MrSigner, field::Error> {
        let mut mrsigner = MrSigner::default();
        mrsigner
            .0
            .copy_from_slice(Self::REPORT_DATA_MRSIGNER.get(&self.0)?);
        Ok(mrsigner)
    }
}

impl From<Vec<u8>> for Quote {
    fn from(data: Vec<u8>) -> Self {
        Quote(data)
    }
}

impl From<&[u8]> for Quote {
    fn from(data: &[u8]) -> Self {
        Quote(data.to_vec())
    }
}

impl AsRef<[u8]> for Quote {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
