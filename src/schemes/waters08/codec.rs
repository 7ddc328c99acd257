//! Tagged binary encoding of parameters, keys and ciphertexts.
//!
//! Every top-level object starts with the advertised [`SCHEME_TAG`]; a
//! different tag is reported with the error variant of the expected type.
use std::io::{Cursor, Read, Write};
use std::path::Path;
use tracing::debug;
use crate::utils::file::{
    expect_tag, read_advertised_bytes, read_element, read_from_file, read_len, read_string, read_u32,
    write_advertised_bytes, write_element, write_len, write_string, write_tag, write_to_file, write_u32,
};
use super::*;

impl Waters08PublicParameters {
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        write_tag(out, SCHEME_TAG)?;
        write_u32(out, self.operable_bits)?;
        write_string(out, &self.pairing_description)?;
        write_element(out, &self.g1)?;
        write_element(out, &self.g2)?;
        write_element(out, &self.g1_a)?;
        write_element(out, &self.e_gg_alpha)?;
        let attributes = self.attributes();
        write_len(out, attributes.len())?;
        for attribute in &attributes {
            write_string(out, &attribute.name)?;
            write_u32(out, attribute.id)?;
            write_element(out, &attribute.h)?;
        }
        Ok(())
    }

    /// Reads parameters written by [`Self::write_to`]. The registry is built
    /// completely before the parameters are returned.
    pub fn read_from<R: Read>(input: &mut R) -> Result<Waters08PublicParameters> {
        expect_tag(input, SCHEME_TAG, AbeError::InvalidPublicParameters)?;
        let operable_bits = read_u32(input)?;
        if operable_bits == 0 || operable_bits > MAX_SECURITY_BITS {
            return Err(AbeError::InvalidPublicParameters(format!(
                "unsupported security level of {} bits",
                operable_bits
            )));
        }
        let pairing_description = read_string(input)?;
        if pairing_description != PAIRING_DESCRIPTION {
            return Err(AbeError::InvalidPublicParameters(format!(
                "unsupported pairing {:?}",
                pairing_description
            )));
        }
        let elements = (
            read_element(input)?,
            read_element(input)?,
            read_element(input)?,
            read_element(input)?,
        );
        let count = read_len(input)?;
        let mut attributes = Vec::new();
        for _ in 0..count {
            attributes.push(Waters08Attribute {
                name: read_string(input)?,
                id: read_u32(input)?,
                h: read_element(input)?,
            });
        }
        let pp = Waters08PublicParameters::restore(operable_bits, pairing_description, elements, attributes)?;
        debug!(attributes = count, "restored waters08 parameters");
        Ok(pp)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Waters08PublicParameters> {
        Waters08PublicParameters::read_from(&mut Cursor::new(bytes))
    }

    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        write_to_file(path, &self.to_bytes()?)
    }

    pub fn read_from_file(path: &Path) -> Result<Waters08PublicParameters> {
        Waters08PublicParameters::from_bytes(&read_from_file(path)?)
    }
}

impl Waters08MasterKey {
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        write_tag(out, SCHEME_TAG)?;
        write_element(out, self.g1_alpha())
    }

    /// Reads a master key and checks it against `pp`.
    pub fn read_from<R: Read>(pp: &Waters08PublicParameters, input: &mut R) -> Result<Waters08MasterKey> {
        expect_tag(input, SCHEME_TAG, AbeError::InvalidMasterSecretKey)?;
        let msk = Waters08MasterKey::from_element(read_element(input)?);
        verify_master_key(pp, &msk)?;
        Ok(msk)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    pub fn from_bytes(pp: &Waters08PublicParameters, bytes: &[u8]) -> Result<Waters08MasterKey> {
        Waters08MasterKey::read_from(pp, &mut Cursor::new(bytes))
    }

    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let bytes = zeroize::Zeroizing::new(self.to_bytes()?);
        write_to_file(path, &bytes)
    }

    pub fn read_from_file(pp: &Waters08PublicParameters, path: &Path) -> Result<Waters08MasterKey> {
        let bytes = zeroize::Zeroizing::new(read_from_file(path)?);
        Waters08MasterKey::from_bytes(pp, &bytes)
    }
}

impl Waters08PrivateKey {
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        write_tag(out, SCHEME_TAG)?;
        write_element(out, &self.k)?;
        write_element(out, &self.l)?;
        write_len(out, self.attribute_keys.len())?;
        for (id, k_x) in &self.attribute_keys {
            write_u32(out, *id)?;
            write_element(out, k_x)?;
        }
        Ok(())
    }

    /// Reads a private key and checks it against `pp`.
    pub fn read_from<R: Read>(pp: &Waters08PublicParameters, input: &mut R) -> Result<Waters08PrivateKey> {
        expect_tag(input, SCHEME_TAG, AbeError::InvalidPrivateKey)?;
        let k = read_element(input)?;
        let l = read_element(input)?;
        let count = read_len(input)?;
        let mut attribute_keys = BTreeMap::new();
        for _ in 0..count {
            let id = read_u32(input)?;
            if attribute_keys.insert(id, read_element(input)?).is_some() {
                return Err(AbeError::InvalidPrivateKey(format!("attribute id {} listed twice", id)));
            }
        }
        let sk = Waters08PrivateKey { k, l, attribute_keys };
        verify_private_key(pp, &sk)?;
        Ok(sk)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    pub fn from_bytes(pp: &Waters08PublicParameters, bytes: &[u8]) -> Result<Waters08PrivateKey> {
        Waters08PrivateKey::read_from(pp, &mut Cursor::new(bytes))
    }

    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let bytes = zeroize::Zeroizing::new(self.to_bytes()?);
        write_to_file(path, &bytes)
    }

    pub fn read_from_file(pp: &Waters08PublicParameters, path: &Path) -> Result<Waters08PrivateKey> {
        let bytes = zeroize::Zeroizing::new(read_from_file(path)?);
        Waters08PrivateKey::from_bytes(pp, &bytes)
    }
}

impl Waters08AuxiliaryCiphertext {
    /// Writes the matrix, `C'` and the `(C_i, D_i)` pairs; no tag.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        self.matrix.write_to(out)?;
        write_element(out, &self.c_prime)?;
        write_len(out, self.pairs.len())?;
        for (c_i, d_i) in &self.pairs {
            write_element(out, c_i)?;
            write_element(out, d_i)?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(input: &mut R) -> Result<Waters08AuxiliaryCiphertext> {
        let matrix = ShareGeneratingMatrix::read_from(input)?;
        let c_prime = read_element(input)?;
        let count = read_len(input)?;
        if count != matrix.rows() {
            return Err(AbeError::InvalidCiphertext(format!(
                "{} ciphertext components for a matrix with {} rows",
                count,
                matrix.rows()
            )));
        }
        let mut pairs = Vec::new();
        for _ in 0..count {
            pairs.push((read_element(input)?, read_element(input)?));
        }
        Ok(Waters08AuxiliaryCiphertext { matrix, c_prime, pairs })
    }
}

impl Waters08Ciphertext {
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        write_tag(out, SCHEME_TAG)?;
        self.aux.write_to(out)?;
        write_advertised_bytes(out, &self.content)
    }

    /// Reads a ciphertext and checks its policy against `pp`.
    pub fn read_from<R: Read>(pp: &Waters08PublicParameters, input: &mut R) -> Result<Waters08Ciphertext> {
        expect_tag(input, SCHEME_TAG, AbeError::InvalidCiphertext)?;
        let aux = Waters08AuxiliaryCiphertext::read_from(input)?;
        verify_auxiliary(pp, &aux)?;
        let content = read_advertised_bytes(input)?;
        Ok(Waters08Ciphertext { aux, content })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    pub fn from_bytes(pp: &Waters08PublicParameters, bytes: &[u8]) -> Result<Waters08Ciphertext> {
        Waters08Ciphertext::read_from(pp, &mut Cursor::new(bytes))
    }
}
