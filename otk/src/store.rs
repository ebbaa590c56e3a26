//! Local store of attestation quotes.
//!
//! Quotes are kept in a plain text file, one hex-encoded quote per line. The
//! file is only ever appended to. Lookups scan the file from the start and
//! return the first quote whose report data carries the requested MRSIGNER.
//!
//! There is no locking. Concurrent writers may interleave at the granularity
//! of the operating system's appending writes.
use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

use slog::{debug, info, Logger};

use crate::{
    common::{
        field,
        logger::get_logger,
        sgx::{mrsigner_for_modulus, mrsigner_for_modulus_le, quote::Quote, MrSigner},
    },
    config,
    Sigstruct,
};

/// Possible errors returned by this module.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no matching quote found")]
    QuoteLookup,
    #[error("MRSIGNER in the quote ({found:x}) does not match the intended modulus ({expected:x})")]
    InvalidQuote { found: MrSigner, expected: MrSigner },
    #[error("malformed quote: {0}")]
    MalformedQuote(#[from] field::Error),
    #[error("malformed quote store entry: {0}")]
    MalformedEntry(#[from] rustc_hex::FromHexError),
    #[error("quote store I/O error: {0}")]
    Io(#[from] io::Error),
}

/// An append-only file of quotes indexed by MRSIGNER.
pub struct QuoteStore {
    logger: Logger,
    path: PathBuf,
}

impl Default for QuoteStore {
    fn default() -> Self {
        Self::new(config::default_quote_store())
    }
}

impl QuoteStore {
    /// Create a store backed by the file at `path`.
    ///
    /// The file is not touched until the first save.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            logger: get_logger("otk/store"),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Find the quote for the key that signed `sigstruct`.
    pub fn lookup_for_sigstruct(&self, sigstruct: &Sigstruct) -> Result<Quote, Error> {
        self.lookup(&sigstruct.mrsigner())
    }

    /// Find the quote for a big-endian modulus.
    pub fn lookup_for_modulus(&self, modulus: &[u8]) -> Result<Quote, Error> {
        self.lookup(&mrsigner_for_modulus(modulus))
    }

    /// Find the quote for a little-endian modulus, as laid out in SIGSTRUCT.
    pub fn lookup_for_modulus_le(&self, modulus: &[u8]) -> Result<Quote, Error> {
        self.lookup(&mrsigner_for_modulus_le(modulus))
    }

    /// Find the first quote carrying `mrsigner` in its report data.
    pub fn lookup(&self, mrsigner: &MrSigner) -> Result<Quote, Error> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(self.logger, "quote store does not exist";
                    "path" => %self.path.display(),
                );
                return Err(Error::QuoteLookup);
            }
            Err(err) => return Err(err.into()),
        };

        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let quote = Quote::from_hex(&line)?;
            if quote.report_data_mrsigner()? == *mrsigner {
                let mrenclave = quote.mrenclave()?;
                debug!(self.logger, "found quote";
                    "mrsigner" => ?mrsigner,
                    "mrenclave" => ?mrenclave,
                );
                return Ok(quote);
            }
        }

        debug!(self.logger, "no quote for MRSIGNER"; "mrsigner" => ?mrsigner);
        Err(Error::QuoteLookup)
    }

    /// Save a quote obtained for a big-endian `modulus`.
    ///
    /// The quote must carry the MRSIGNER of `modulus` in its report data,
    /// otherwise it is rejected and the store is left untouched.
    pub fn save(&self, modulus: &[u8], quote: &[u8]) -> Result<(), Error> {
        let quote = Quote::from(quote);
        let expected = mrsigner_for_modulus(modulus);
        let found = quote.report_data_mrsigner()?;
        if found != expected {
            return Err(Error::InvalidQuote { found, expected });
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        // Single write, so the line is appended as a whole where the platform
        // allows it.
        file.write_all(format!("{}\n", quote.to_hex()).as_bytes())?;

        info!(self.logger, "saved quote";
            "mrsigner" => ?expected,
            "path" => %self.path.display(),
        );

        Ok(())
    }
}
