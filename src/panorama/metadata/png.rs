//! XMP in PNG: an `iTXt` chunk placed right after `IHDR`.
//!
//! No scan for an existing XMP chunk is made; injecting twice leaves two.

use tracing::debug;

use crate::panorama::common::error::{CaptureError, Result};
use crate::panorama::metadata::crc::Crc32;
use crate::panorama::metadata::xmp::PNG_XMP_KEYWORD;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Signature (8) plus the IHDR chunk (4 length + 4 type + 13 data + 4 CRC).
pub const XMP_INSERT_OFFSET: usize = 33;

const IHDR_DATA_LEN: u32 = 13;

/// Keyword terminator, compression flag, compression method, empty language
/// tag terminator, empty translated keyword terminator.
const ITXT_HEADER_TAIL: [u8; 5] = [0; 5];

/// Location of one chunk in a PNG stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub offset: usize,
    pub kind: [u8; 4],
    pub data_len: usize,
}

impl Chunk {
    pub fn data<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        &bytes[self.offset + 8..self.offset + 8 + self.data_len]
    }

    pub fn stored_crc(&self, bytes: &[u8]) -> u32 {
        let at = self.offset + 8 + self.data_len;
        u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    pub fn end(&self) -> usize {
        self.offset + 12 + self.data_len
    }
}

fn read_u32_be(bytes: &[u8], offset: usize) -> Result<u32> {
    match bytes.get(offset..offset + 4) {
        Some(b) => Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        None => Err(CaptureError::MalformedContainer(format!(
            "cannot read 4 bytes at offset {} of {}",
            offset,
            bytes.len()
        ))),
    }
}

/// Checks the signature and that IHDR is the first chunk, so offset 33 is a
/// chunk boundary.
pub fn validate_header(bytes: &[u8]) -> Result<()> {
    if bytes.len() < XMP_INSERT_OFFSET || bytes[..8] != PNG_SIGNATURE {
        return Err(CaptureError::MalformedContainer(
            "missing PNG signature or IHDR".to_string(),
        ));
    }
    let ihdr_len = read_u32_be(bytes, 8)?;
    if &bytes[12..16] != b"IHDR" || ihdr_len != IHDR_DATA_LEN {
        return Err(CaptureError::MalformedContainer(
            "first PNG chunk is not a 13-byte IHDR".to_string(),
        ));
    }
    Ok(())
}

/// Lists every chunk, checking that each fits inside `bytes`.
pub fn chunks(bytes: &[u8]) -> Result<Vec<Chunk>> {
    validate_header(bytes)?;
    let mut out = Vec::new();
    let mut offset = PNG_SIGNATURE.len();
    while offset < bytes.len() {
        let data_len = read_u32_be(bytes, offset)? as usize;
        let kind = bytes
            .get(offset + 4..offset + 8)
            .and_then(|k| <[u8; 4]>::try_from(k).ok())
            .ok_or_else(|| {
                CaptureError::MalformedContainer(format!("chunk type at {} is truncated", offset + 4))
            })?;
        let chunk = Chunk {
            offset,
            kind,
            data_len,
        };
        if chunk.end() > bytes.len() {
            return Err(CaptureError::MalformedContainer(format!(
                "chunk {} at {} runs past end of data",
                String::from_utf8_lossy(&kind),
                offset
            )));
        }
        out.push(chunk);
        offset = chunk.end();
    }
    Ok(out)
}

/// Length, `iTXt`, keyword header plus packet, CRC over type and data.
pub fn build_itxt_chunk(packet: &str, crc: &Crc32) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(PNG_XMP_KEYWORD.len() + ITXT_HEADER_TAIL.len() + packet.len());
    data.extend_from_slice(PNG_XMP_KEYWORD.as_bytes());
    data.extend_from_slice(&ITXT_HEADER_TAIL);
    data.extend_from_slice(packet.as_bytes());

    let data_len = u32::try_from(data.len())
        .ok()
        .filter(|len| *len <= i32::MAX as u32)
        .ok_or(CaptureError::MetadataTooLarge(data.len()))?;

    let checksum = crc.checksum_parts(&[b"iTXt", &data]);

    let mut chunk = Vec::with_capacity(data.len() + 12);
    chunk.extend_from_slice(&data_len.to_be_bytes());
    chunk.extend_from_slice(b"iTXt");
    chunk.extend_from_slice(&data);
    chunk.extend_from_slice(&checksum.to_be_bytes());
    Ok(chunk)
}

/// Returns a copy of `bytes` with an XMP `iTXt` chunk inserted after IHDR.
pub fn inject(bytes: &[u8], packet: &str, crc: &Crc32) -> Result<Vec<u8>> {
    validate_header(bytes)?;
    let chunk = build_itxt_chunk(packet, crc)?;
    debug!(offset = XMP_INSERT_OFFSET, len = chunk.len(), "Inserting XMP iTXt chunk");

    let mut out = Vec::with_capacity(bytes.len() + chunk.len());
    out.extend_from_slice(&bytes[..XMP_INSERT_OFFSET]);
    out.extend_from_slice(&chunk);
    out.extend_from_slice(&bytes[XMP_INSERT_OFFSET..]);
    Ok(out)
}

/// Whether a chunk is an XMP `iTXt` chunk.
pub fn is_xmp_chunk(chunk: &Chunk, bytes: &[u8]) -> bool {
    &chunk.kind == b"iTXt"
        && chunk.data(bytes).starts_with(PNG_XMP_KEYWORD.as_bytes())
        && chunk.data(bytes).get(PNG_XMP_KEYWORD.len()) == Some(&0)
}
