//! Binary framing shared by every serialized object.
//!
//! Integers are fixed-width big-endian. Variable length data is written as
//! "advertised bytes": a `u32` length followed by the raw bytes. Group
//! elements are written as advertised bytes holding their borsh encoding.
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use borsh::{BorshDeserialize, BorshSerialize};
use tracing::debug;
use crate::error::{AbeError, Result};

pub fn write_u32<W: Write>(out: &mut W, value: u32) -> Result<()> {
    out.write_all(&value.to_be_bytes())?;
    Ok(())
}

pub fn read_u32<R: Read>(input: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

pub fn write_i32<W: Write>(out: &mut W, value: i32) -> Result<()> {
    out.write_all(&value.to_be_bytes())?;
    Ok(())
}

pub fn read_i32<R: Read>(input: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

/// Writes a `usize` count as `u32`, rejecting counts that do not fit.
pub fn write_len<W: Write>(out: &mut W, len: usize) -> Result<()> {
    let len = u32::try_from(len).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("length {} exceeds u32", len))
    })?;
    write_u32(out, len)
}

pub fn read_len<R: Read>(input: &mut R) -> Result<usize> {
    Ok(read_u32(input)? as usize)
}

pub fn write_advertised_bytes<W: Write>(out: &mut W, data: &[u8]) -> Result<()> {
    write_len(out, data.len())?;
    out.write_all(data)?;
    Ok(())
}

/// Reads advertised bytes without trusting the advertised length for
/// allocation; a length beyond the remaining input is a short read.
pub fn read_advertised_bytes<R: Read>(input: &mut R) -> Result<Vec<u8>> {
    let len = read_u32(input)? as u64;
    let mut data = Vec::new();
    input.by_ref().take(len).read_to_end(&mut data)?;
    if data.len() as u64 != len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("advertised {} bytes, found {}", len, data.len()),
        )
        .into());
    }
    Ok(data)
}

pub fn write_string<W: Write>(out: &mut W, value: &str) -> Result<()> {
    write_advertised_bytes(out, value.as_bytes())
}

pub fn read_string<R: Read>(input: &mut R) -> Result<String> {
    String::from_utf8(read_advertised_bytes(input)?)
        .map_err(|e| AbeError::Deserialization(format!("string is not utf-8: {}", e)))
}

/// Writes the scheme tag heading every top-level object.
pub fn write_tag<W: Write>(out: &mut W, tag: &[u8]) -> Result<()> {
    write_advertised_bytes(out, tag)
}

/// Reads a scheme tag; a different tag becomes the error built by `on_mismatch`.
pub fn expect_tag<R: Read, F>(input: &mut R, tag: &[u8], on_mismatch: F) -> Result<()>
where
    F: FnOnce(String) -> AbeError,
{
    let found = read_advertised_bytes(input)?;
    if found != tag {
        return Err(on_mismatch(format!(
            "expected scheme tag {:?}, found {:?}",
            String::from_utf8_lossy(tag),
            String::from_utf8_lossy(&found)
        )));
    }
    Ok(())
}

/// Canonical byte encoding of a group element.
pub fn encode_element<T: BorshSerialize>(element: &T) -> Result<Vec<u8>> {
    Ok(borsh::to_vec(element)?)
}

/// Rebuilds a group element from [`encode_element`] output.
pub fn decode_element<T: BorshDeserialize>(bytes: &[u8]) -> Result<T> {
    borsh::from_slice(bytes).map_err(|e| AbeError::Deserialization(e.to_string()))
}

pub fn write_element<W: Write, T: BorshSerialize>(out: &mut W, element: &T) -> Result<()> {
    write_advertised_bytes(out, &encode_element(element)?)
}

pub fn read_element<R: Read, T: BorshDeserialize>(input: &mut R) -> Result<T> {
    decode_element(&read_advertised_bytes(input)?)
}

pub fn write_to_file(path: &Path, data: &[u8]) -> Result<()> {
    fs::write(path, data)?;
    debug!(path = %path.display(), bytes = data.len(), "wrote file");
    Ok(())
}

pub fn read_from_file(path: &Path) -> Result<Vec<u8>> {
    let data = fs::read(path)?;
    debug!(path = %path.display(), bytes = data.len(), "read file");
    Ok(data)
}
