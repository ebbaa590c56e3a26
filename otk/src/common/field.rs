//! Fixed-offset fields of binary structures.
//!
//! A [`Field`] describes a byte range of a fixed-layout structure together with
//! the encoding used when the range is viewed as a little-endian integer.
//! Structures declare their layout as a table of `Field` constants and use the
//! generic accessors below instead of hand-written per-field code.
use num_bigint::BigUint;
use num_traits::ToPrimitive;

use super::bcd;

/// Possible errors returned by this module.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("field at offset {offset} with length {len} is out of range for {size} bytes")]
    OutOfRange {
        offset: usize,
        len: usize,
        size: usize,
    },
    #[error("wrong value length: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },
    #[error("value does not fit in {0} bytes")]
    Overflow(usize),
    #[error("can't set read-only field")]
    ReadOnly,
}

/// Integer encoding of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// Plain unsigned little-endian integer.
    Raw,
    /// Unsigned little-endian integer holding BCD digits.
    Bcd,
}

/// A byte range inside a fixed-layout structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    pub offset: usize,
    pub len: usize,
    pub encoding: Encoding,
    pub writable: bool,
}

impl Field {
    /// A writable raw field.
    pub const fn new(offset: usize, len: usize) -> Self {
        Self {
            offset,
            len,
            encoding: Encoding::Raw,
            writable: true,
        }
    }

    /// A writable BCD field.
    pub const fn bcd(offset: usize, len: usize) -> Self {
        Self {
            offset,
            len,
            encoding: Encoding::Bcd,
            writable: true,
        }
    }

    /// A read-only raw field.
    pub const fn read_only(offset: usize, len: usize) -> Self {
        Self {
            offset,
            len,
            encoding: Encoding::Raw,
            writable: false,
        }
    }

    /// End offset (exclusive) of the field.
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }

    fn check_range(&self, size: usize) -> Result<(), Error> {
        if self.end() > size {
            return Err(Error::OutOfRange {
                offset: self.offset,
                len: self.len,
                size,
            });
        }
        Ok(())
    }

    /// Raw bytes of the field.
    pub fn get<'a>(&self, buf: &'a [u8]) -> Result<&'a [u8], Error> {
        self.check_range(buf.len())?;
        Ok(&buf[self.offset..self.end()])
    }

    /// The field as an unsigned integer, after the decode hook.
    pub fn get_uint(&self, buf: &[u8]) -> Result<BigUint, Error> {
        let value = BigUint::from_bytes_le(self.get(buf)?);
        match self.encoding {
            Encoding::Raw => Ok(value),
            Encoding::Bcd => {
                let value = value.to_u64().ok_or(Error::Overflow(8))?;
                Ok(BigUint::from(bcd::decode(value)))
            }
        }
    }

    /// The field as a `u64`, after the decode hook.
    ///
    /// Fails with [`Error::Overflow`] for fields whose value does not fit.
    pub fn get_u64(&self, buf: &[u8]) -> Result<u64, Error> {
        self.get_uint(buf)?
            .to_u64()
            .ok_or(Error::Overflow(std::mem::size_of::<u64>()))
    }

    /// Overwrite the field with raw bytes of exactly the field's length.
    pub fn set(&self, buf: &mut [u8], value: &[u8]) -> Result<(), Error> {
        if !self.writable {
            return Err(Error::ReadOnly);
        }
        self.check_range(buf.len())?;
        if value.len() != self.len {
            return Err(Error::LengthMismatch {
                expected: self.len,
                got: value.len(),
            });
        }
        buf[self.offset..self.end()].copy_from_slice(value);
        Ok(())
    }

    /// Store an unsigned integer after the encode hook, little-endian and
    /// zero padded to the field's length.
    pub fn set_uint(&self, buf: &mut [u8], value: &BigUint) -> Result<(), Error> {
        if !self.writable {
            return Err(Error::ReadOnly);
        }
        let value = match self.encoding {
            Encoding::Raw => value.clone(),
            Encoding::Bcd => value
                .to_u64()
                .and_then(bcd::encode)
                .map(BigUint::from)
                .ok_or(Error::Overflow(self.len))?,
        };

        let mut encoded = value.to_bytes_le();
        if encoded.len() > self.len {
            return Err(Error::Overflow(self.len));
        }
        encoded.resize(self.len, 0);

        self.set(buf, &encoded)
    }

    /// Store a `u64` after the encode hook.
    pub fn set_u64(&self, buf: &mut [u8], value: u64) -> Result<(), Error> {
        self.set_uint(buf, &BigUint::from(value))
    }
}
