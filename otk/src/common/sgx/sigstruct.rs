//! Enclave signature structure (SIGSTRUCT).
//!
//! Layout follows Intel SDM vol. 3D part 4, 38.13, table 38-19.
use std::io::Read;

use byteorder::{ByteOrder, LittleEndian};
use chrono::{Datelike, NaiveDate};
use num_bigint::BigUint;

use super::{
    mrsigner_for_modulus_le,
    rsa::{AuxValues, SGX_RSA_PUBLIC_EXPONENT},
    Error, MrEnclave, MrSigner,
};
use crate::common::field::Field;

/// Size of SIGSTRUCT in bytes.
pub const SIGSTRUCT_SIZE: usize = 1808;
/// Size of the signed part of SIGSTRUCT in bytes.
pub const SIGNING_DATA_SIZE: usize = 256;

/// First constant header of SIGSTRUCT.
pub const SIGSTRUCT_HEADER: [u8; 16] = [
    0x06, 0x00, 0x00, 0x00, 0xe1, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00,
];
/// Second constant header of SIGSTRUCT.
pub const SIGSTRUCT_HEADER2: [u8; 16] = [
    0x01, 0x01, 0x00, 0x00, 0x60, 0x00, 0x00, 0x00, 0x60, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00,
];

/// ISVSVN of versions which can't be superseded.
pub const MAX_ISVSVN: u16 = 0xffff;

/// An enclave signature structure.
///
/// The structure is always exactly [`SIGSTRUCT_SIZE`] bytes long and always
/// carries valid headers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sigstruct([u8; SIGSTRUCT_SIZE]);

impl Sigstruct {
    pub const HEADER: Field = Field::new(0, 16);
    pub const DATE: Field = Field::new(20, 4);
    pub const DAY: Field = Field::bcd(20, 1);
    pub const MONTH: Field = Field::bcd(21, 1);
    pub const YEAR: Field = Field::bcd(22, 2);
    pub const HEADER2: Field = Field::new(24, 16);
    pub const MODULUS: Field = Field::new(128, 384);
    pub const EXPONENT: Field = Field::new(512, 4);
    pub const SIGNATURE: Field = Field::new(516, 384);
    pub const MRENCLAVE: Field = Field::new(960, 32);
    pub const ISVPRODID: Field = Field::new(1024, 2);
    pub const ISVSVN: Field = Field::new(1026, 2);
    pub const Q1: Field = Field::new(1040, 384);
    pub const Q2: Field = Field::new(1424, 384);

    /// Parse SIGSTRUCT from its exact binary representation.
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        let data: [u8; SIGSTRUCT_SIZE] = data.try_into().map_err(|_| {
            Error::InvalidSigstruct(format!(
                "wrong length: expected {}, got {}",
                SIGSTRUCT_SIZE,
                data.len()
            ))
        })?;
        let sigstruct = Sigstruct(data);

        if sigstruct.raw(&Self::HEADER) != SIGSTRUCT_HEADER {
            return Err(Error::InvalidSigstruct("wrong HEADER".to_string()));
        }
        if sigstruct.raw(&Self::HEADER2) != SIGSTRUCT_HEADER2 {
            return Err(Error::InvalidSigstruct("wrong HEADER2".to_string()));
        }

        Ok(sigstruct)
    }

    /// Read SIGSTRUCT from a reader.
    ///
    /// One byte more than needed is requested, so trailing data is reported as
    /// a length mismatch instead of being silently ignored.
    pub fn read_from<R: Read>(reader: R) -> Result<Self, Error> {
        let mut data = Vec::with_capacity(SIGSTRUCT_SIZE + 1);
        reader
            .take(SIGSTRUCT_SIZE as u64 + 1)
            .read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// Binary representation of the structure.
    pub fn as_bytes(&self) -> &[u8; SIGSTRUCT_SIZE] {
        &self.0
    }

    /// Raw bytes of a field.
    pub fn get(&self, field: &Field) -> Result<&[u8], Error> {
        Ok(field.get(&self.0)?)
    }

    /// Overwrite a field with raw bytes.
    ///
    /// The headers can't be changed.
    pub fn set(&mut self, field: &Field, value: &[u8]) -> Result<(), Error> {
        self.check_not_header(field)?;
        Ok(field.set(&mut self.0, value)?)
    }

    /// Store an integer in a field.
    pub fn set_uint(&mut self, field: &Field, value: &BigUint) -> Result<(), Error> {
        self.check_not_header(field)?;
        Ok(field.set_uint(&mut self.0, value)?)
    }

    fn check_not_header(&self, field: &Field) -> Result<(), Error> {
        let overlaps = |h: &Field| field.offset < h.end() && h.offset < field.end();
        if overlaps(&Self::HEADER) || overlaps(&Self::HEADER2) {
            return Err(Error::InvalidSigstruct(
                "headers are constant".to_string(),
            ));
        }
        Ok(())
    }

    fn raw(&self, field: &Field) -> &[u8] {
        // Layout fields are always within the structure.
        &self.0[field.offset..field.end()]
    }

    /// RSA modulus of the signing key.
    pub fn modulus(&self) -> BigUint {
        BigUint::from_bytes_le(self.raw(&Self::MODULUS))
    }

    /// RSA public exponent of the signing key.
    pub fn exponent(&self) -> u32 {
        LittleEndian::read_u32(self.raw(&Self::EXPONENT))
    }

    /// RSA signature over the signing data.
    pub fn signature(&self) -> BigUint {
        BigUint::from_bytes_le(self.raw(&Self::SIGNATURE))
    }

    /// Enclave measurement.
    pub fn mrenclave(&self) -> MrEnclave {
        let mut mrenclave = MrEnclave::default();
        mrenclave.0.copy_from_slice(self.raw(&Self::MRENCLAVE));
        mrenclave
    }

    pub fn set_mrenclave(&mut self, mrenclave: &MrEnclave) -> Result<(), Error> {
        self.set(&Self::MRENCLAVE, mrenclave.as_ref())
    }

    /// ISV assigned product ID.
    pub fn isvprodid(&self) -> u16 {
        LittleEndian::read_u16(self.raw(&Self::ISVPRODID))
    }

    pub fn set_isvprodid(&mut self, isvprodid: u16) -> Result<(), Error> {
        self.set(&Self::ISVPRODID, &isvprodid.to_le_bytes())
    }

    /// ISV assigned security version number.
    pub fn isvsvn(&self) -> u16 {
        LittleEndian::read_u16(self.raw(&Self::ISVSVN))
    }

    pub fn set_isvsvn(&mut self, isvsvn: u16) -> Result<(), Error> {
        self.set(&Self::ISVSVN, &isvsvn.to_le_bytes())
    }

    pub fn q1(&self) -> BigUint {
        BigUint::from_bytes_le(self.raw(&Self::Q1))
    }

    pub fn q2(&self) -> BigUint {
        BigUint::from_bytes_le(self.raw(&Self::Q2))
    }

    pub fn day(&self) -> Result<u32, Error> {
        Ok(Self::DAY.get_u64(&self.0)? as u32)
    }

    pub fn set_day(&mut self, day: u32) -> Result<(), Error> {
        Ok(Self::DAY.set_u64(&mut self.0, day.into())?)
    }

    pub fn month(&self) -> Result<u32, Error> {
        Ok(Self::MONTH.get_u64(&self.0)? as u32)
    }

    pub fn set_month(&mut self, month: u32) -> Result<(), Error> {
        Ok(Self::MONTH.set_u64(&mut self.0, month.into())?)
    }

    pub fn year(&self) -> Result<u32, Error> {
        Ok(Self::YEAR.get_u64(&self.0)? as u32)
    }

    pub fn set_year(&mut self, year: u32) -> Result<(), Error> {
        Ok(Self::YEAR.set_u64(&mut self.0, year.into())?)
    }

    /// Signing date.
    pub fn date(&self) -> Result<NaiveDate, Error> {
        let (year, month, day) = (self.year()?, self.month()?, self.day()?);
        NaiveDate::from_ymd_opt(year as i32, month, day).ok_or_else(|| {
            Error::InvalidSigstruct(format!(
                "invalid date: {:04}-{:02}-{:02}",
                year, month, day
            ))
        })
    }

    pub fn set_date(&mut self, date: NaiveDate) -> Result<(), Error> {
        let year = u32::try_from(date.year())
            .ok()
            .filter(|year| *year <= 9999)
            .ok_or_else(|| {
                Error::InvalidSigstruct(format!("date out of range: {}", date))
            })?;

        self.set_year(year)?;
        self.set_month(date.month())?;
        self.set_day(date.day())
    }

    /// Data covered by the signature: the header and the enclave body.
    pub fn signing_data(&self) -> [u8; SIGNING_DATA_SIZE] {
        let mut data = [0u8; SIGNING_DATA_SIZE];
        data[..128].copy_from_slice(&self.0[0..128]);
        data[128..].copy_from_slice(&self.0[900..1028]);
        data
    }

    /// MRSIGNER of the key that signed (or will sign) the structure.
    pub fn mrsigner(&self) -> MrSigner {
        mrsigner_for_modulus_le(self.raw(&Self::MODULUS))
    }

    /// Ensure ISVSVN is at the maximum value.
    pub fn check_isvsvn_max(&self) -> Result<(), Error> {
        check_isvsvn(self.isvsvn())
    }

    /// Store an RSA signature together with the auxiliary values.
    ///
    /// `modulus` and `signature` are integers; they are stored little-endian.
    pub fn set_signature(
        &mut self,
        exponent: u32,
        modulus: &BigUint,
        signature: &BigUint,
    ) -> Result<(), Error> {
        if exponent != SGX_RSA_PUBLIC_EXPONENT {
            return Err(Error::InvalidSigstruct(format!(
                "unsupported exponent: expected {}, got {}",
                SGX_RSA_PUBLIC_EXPONENT, exponent
            )));
        }
        let aux = AuxValues::compute(signature, modulus)?;

        // Work on a copy so that a failure leaves the structure untouched.
        let mut signed = self.clone();
        signed.set_uint(&Self::EXPONENT, &BigUint::from(exponent))?;
        signed.set_uint(&Self::MODULUS, modulus)?;
        signed.set_uint(&Self::SIGNATURE, signature)?;
        signed.set_uint(&Self::Q1, &aux.q1)?;
        signed.set_uint(&Self::Q2, &aux.q2)?;
        *self = signed;

        Ok(())
    }
}

/// Ensure `isvsvn` is at the maximum value.
pub fn check_isvsvn(isvsvn: u16) -> Result<(), Error> {
    if isvsvn != MAX_ISVSVN {
        return Err(Error::InvalidSigstruct(format!(
            "expected ISVSVN {}, found {:#06x}",
            MAX_ISVSVN, isvsvn
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use num_traits::One;
    use rustc_hex::{FromHex, ToHex};

    use super::*;
    use crate::common::{field, sgx::mrsigner_for_modulus};

    fn sigstruct() -> Sigstruct {
        let mut data = Vec::with_capacity(SIGSTRUCT_SIZE);
        data.extend_from_slice(&SIGSTRUCT_HEADER);
        data.extend_from_slice(&[0u8; 8]);
        data.extend_from_slice(&SIGSTRUCT_HEADER2);
        data.resize(SIGSTRUCT_SIZE, 0);
        Sigstruct::from_bytes(&data).unwrap()
    }

    fn hex(s: &str) -> Vec<u8> {
        s.from_hex().unwrap()
    }

    #[test]
    fn test_sigstruct_date_read() {
        let mut sigstruct = sigstruct();
        sigstruct.0[20..24].copy_from_slice(&hex("14042320"));
        assert_eq!(
            sigstruct.date().unwrap(),
            NaiveDate::from_ymd_opt(2023, 4, 14).unwrap()
        );
    }

    #[test]
    fn test_sigstruct_date_write() {
        let mut sigstruct = sigstruct();
        sigstruct
            .set_date(NaiveDate::from_ymd_opt(2023, 11, 14).unwrap())
            .unwrap();
        assert_eq!(sigstruct.0[20..24].to_hex::<String>(), "14112320");
    }

    #[test]
    fn test_sigstruct_date_scenario() {
        let mut data = Vec::with_capacity(SIGSTRUCT_SIZE);
        data.extend_from_slice(&SIGSTRUCT_HEADER);
        data.extend_from_slice(&[0u8; 4]);
        data.extend_from_slice(&hex("14042320"));
        data.extend_from_slice(&SIGSTRUCT_HEADER2);
        data.extend_from_slice(&[0u8; 1768]);

        let mut sigstruct = Sigstruct::from_bytes(&data).unwrap();
        assert_eq!(
            sigstruct.date().unwrap(),
            NaiveDate::from_ymd_opt(2023, 4, 14).unwrap()
        );

        sigstruct
            .set_date(NaiveDate::from_ymd_opt(2023, 11, 14).unwrap())
            .unwrap();
        assert_eq!(
            sigstruct.get(&Sigstruct::DATE).unwrap().to_hex::<String>(),
            "14112320"
        );
    }

    #[test]
    fn test_sigstruct_date_round_trip() {
        let mut sigstruct = sigstruct();
        for (y, m, d) in [
            (0, 1, 1),
            (1, 1, 1),
            (1999, 12, 31),
            (2000, 2, 29),
            (2024, 7, 4),
            (9999, 12, 31),
        ] {
            let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
            sigstruct.set_date(date).unwrap();
            assert_eq!(sigstruct.date().unwrap(), date);
        }
    }

    #[test]
    fn test_sigstruct_date_invalid() {
        let mut sigstruct = sigstruct();
        // 2023-02-30
        sigstruct.0[20..24].copy_from_slice(&hex("30022320"));
        assert!(matches!(sigstruct.date(), Err(Error::InvalidSigstruct(_))));

        // All zeroes is not a date either.
        let sigstruct = self::sigstruct();
        assert!(sigstruct.date().is_err());

        // Non-decimal nibbles decode to out-of-range values.
        let mut sigstruct = self::sigstruct();
        sigstruct.0[20..24].copy_from_slice(&[0xff; 4]);
        assert!(matches!(sigstruct.date(), Err(Error::InvalidSigstruct(_))));

        let mut sigstruct = self::sigstruct();
        let date = NaiveDate::from_ymd_opt(10000, 1, 1).unwrap();
        assert!(sigstruct.set_date(date).is_err());
        assert_eq!(sigstruct.get(&Sigstruct::DATE).unwrap(), &[0u8; 4]);
    }

    #[test]
    fn test_sigstruct_date_read_year() {
        let mut sigstruct = sigstruct();
        sigstruct.0[22..24].copy_from_slice(&hex("2320"));
        assert_eq!(sigstruct.year().unwrap(), 2023);
    }

    #[test]
    fn test_sigstruct_date_write_year() {
        let mut sigstruct = sigstruct();
        sigstruct.set_year(2023).unwrap();
        assert_eq!(&sigstruct.0[22..24], &hex("2320")[..]);
    }

    #[test]
    fn test_sigstruct_date_read_month() {
        let mut sigstruct = sigstruct();
        sigstruct.0[21..22].copy_from_slice(&hex("11"));
        assert_eq!(sigstruct.month().unwrap(), 11);
    }

    #[test]
    fn test_sigstruct_date_write_month() {
        let mut sigstruct = sigstruct();
        sigstruct.set_month(11).unwrap();
        assert_eq!(&sigstruct.0[21..22], &hex("11")[..]);
    }

    #[test]
    fn test_sigstruct_date_read_day() {
        let mut sigstruct = sigstruct();
        sigstruct.0[20..21].copy_from_slice(&hex("14"));
        assert_eq!(sigstruct.day().unwrap(), 14);
    }

    #[test]
    fn test_sigstruct_date_write_day() {
        let mut sigstruct = sigstruct();
        sigstruct.set_day(14).unwrap();
        assert_eq!(&sigstruct.0[20..21], &hex("14")[..]);
    }

    #[test]
    fn test_sigstruct_wrong_length() {
        let data = sigstruct().as_bytes().to_vec();

        for len in [0, 1, 40, SIGSTRUCT_SIZE - 1] {
            assert!(matches!(
                Sigstruct::from_bytes(&data[..len]),
                Err(Error::InvalidSigstruct(_))
            ));
        }

        let mut longer = data.clone();
        longer.push(0);
        let err = Sigstruct::from_bytes(&longer).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid SIGSTRUCT: wrong length: expected 1808, got 1809"
        );
    }

    #[test]
    fn test_sigstruct_wrong_headers() {
        let data = sigstruct().as_bytes().to_vec();

        let mut bad = data.clone();
        bad[4] ^= 0xff;
        let err = Sigstruct::from_bytes(&bad).unwrap_err();
        assert_eq!(err.to_string(), "invalid SIGSTRUCT: wrong HEADER");

        let mut bad = data.clone();
        bad[39] = 1;
        let err = Sigstruct::from_bytes(&bad).unwrap_err();
        assert_eq!(err.to_string(), "invalid SIGSTRUCT: wrong HEADER2");

        // Bytes between the headers are not constrained.
        let mut good = data;
        good[16..20].copy_from_slice(&[0x86, 0x80, 0, 0]);
        assert!(Sigstruct::from_bytes(&good).is_ok());
    }

    #[test]
    fn test_sigstruct_headers_immutable() {
        let mut sigstruct = sigstruct();
        assert!(sigstruct.set(&Sigstruct::HEADER, &[0u8; 16]).is_err());
        assert!(sigstruct.set(&Field::new(30, 20), &[0u8; 20]).is_err());
        assert_eq!(sigstruct, self::sigstruct());
    }

    #[test]
    fn test_sigstruct_read_from() {
        let data = sigstruct().as_bytes().to_vec();

        let sigstruct = Sigstruct::read_from(Cursor::new(&data)).unwrap();
        assert_eq!(&sigstruct.as_bytes()[..], &data[..]);

        let short = Sigstruct::read_from(Cursor::new(&data[..1000]));
        assert!(matches!(short, Err(Error::InvalidSigstruct(_))));

        let mut longer = data;
        longer.extend_from_slice(&[0u8; 100]);
        let long = Sigstruct::read_from(Cursor::new(&longer));
        assert!(matches!(long, Err(Error::InvalidSigstruct(_))));
    }

    #[test]
    fn test_sigstruct_signing_data() {
        let mut sigstruct = sigstruct();
        for (i, b) in sigstruct.0.iter_mut().enumerate().skip(40) {
            *b = i as u8;
        }

        let data = sigstruct.signing_data();
        assert_eq!(data.len(), SIGNING_DATA_SIZE);
        assert_eq!(&data[..128], &sigstruct.as_bytes()[0..128]);
        assert_eq!(&data[128..], &sigstruct.as_bytes()[900..1028]);

        let zero = self::sigstruct();
        let mut expected = zero.as_bytes()[0..128].to_vec();
        expected.extend_from_slice(&zero.as_bytes()[900..1028]);
        assert_eq!(&zero.signing_data()[..], &expected[..]);
    }

    #[test]
    fn test_sigstruct_mrsigner() {
        let mut sigstruct = sigstruct();
        assert_eq!(
            sigstruct.mrsigner(),
            "a1a4f5721c1c4610af7f71078f3a68c330536d679803b0e0507ee8dc10c5dfca"
                .parse()
                .unwrap()
        );

        let modulus = (BigUint::one() << 3071u32) + BigUint::from(0xabcdefu32);
        sigstruct.set_uint(&Sigstruct::MODULUS, &modulus).unwrap();
        assert_eq!(sigstruct.modulus(), modulus);

        let mut modulus_be = modulus.to_bytes_be();
        assert_eq!(modulus_be.len(), 384);
        assert_eq!(sigstruct.mrsigner(), mrsigner_for_modulus(&modulus_be));
        modulus_be.reverse();
        assert_eq!(
            sigstruct.mrsigner(),
            mrsigner_for_modulus_le(&modulus_be)
        );
    }

    #[test]
    fn test_sigstruct_isvsvn() {
        let mut sigstruct = sigstruct();
        let err = sigstruct.check_isvsvn_max().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid SIGSTRUCT: expected ISVSVN 65535, found 0x0000"
        );

        sigstruct.set_isvsvn(0x1234).unwrap();
        assert_eq!(&sigstruct.as_bytes()[1026..1028], &[0x34, 0x12]);
        assert!(sigstruct.check_isvsvn_max().is_err());

        sigstruct.set_isvsvn(MAX_ISVSVN).unwrap();
        assert!(sigstruct.check_isvsvn_max().is_ok());
        assert_eq!(sigstruct.isvsvn(), MAX_ISVSVN);
    }

    #[test]
    fn test_sigstruct_ident_fields() {
        let mut sigstruct = sigstruct();
        let mrenclave = MrEnclave([0x5a; 32]);
        sigstruct.set_mrenclave(&mrenclave).unwrap();
        sigstruct.set_isvprodid(0x0102).unwrap();

        assert_eq!(sigstruct.mrenclave(), mrenclave);
        assert_eq!(sigstruct.isvprodid(), 0x0102);
        assert_eq!(&sigstruct.as_bytes()[960..992], &[0x5a; 32]);
        assert_eq!(&sigstruct.as_bytes()[1024..1026], &[0x02, 0x01]);
        // The identity block is covered by the signature.
        assert_eq!(&sigstruct.signing_data()[188..220], &[0x5a; 32]);
    }

    #[test]
    fn test_sigstruct_set_signature() {
        let mut sigstruct = sigstruct();
        let modulus = (BigUint::one() << 3071u32) + BigUint::from(12345u32);
        let signature = (BigUint::one() << 3070u32) + BigUint::from(6789u32);

        sigstruct.set_signature(3, &modulus, &signature).unwrap();

        let aux = AuxValues::compute(&signature, &modulus).unwrap();
        assert_eq!(sigstruct.exponent(), 3);
        assert_eq!(&sigstruct.as_bytes()[512..516], &[3, 0, 0, 0]);
        assert_eq!(sigstruct.modulus(), modulus);
        assert_eq!(sigstruct.signature(), signature);
        assert_eq!(sigstruct.q1(), aux.q1);
        assert_eq!(sigstruct.q2(), aux.q2);

        // Little-endian: the lowest byte of the modulus comes first.
        assert_eq!(sigstruct.as_bytes()[128], 0x39);
        assert_eq!(sigstruct.as_bytes()[128 + 383], 0x80);
    }

    #[test]
    fn test_sigstruct_set_signature_rejects() {
        let mut sigstruct = sigstruct();
        let modulus = (BigUint::one() << 3071u32) + BigUint::from(12345u32);
        let signature = BigUint::from(42u32);

        assert!(sigstruct.set_signature(65537, &modulus, &signature).is_err());

        // A modulus wider than 3072 bits does not fit.
        let wide = BigUint::one() << 3072u32;
        assert!(matches!(
            sigstruct.set_signature(3, &wide, &signature),
            Err(Error::Field(field::Error::Overflow(384)))
        ));
        assert_eq!(sigstruct, self::sigstruct());
    }
}
