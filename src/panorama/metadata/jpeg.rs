//! XMP in JPEG: one APP1 marker segment before the first scan.

use tracing::debug;

use crate::panorama::common::error::{CaptureError, Result};
use crate::panorama::metadata::xmp::XMP_NAMESPACE;

pub const MARKER_SOI: u16 = 0xFFD8;
pub const MARKER_SOS: u16 = 0xFFDA;
pub const MARKER_APP1: u16 = 0xFFE1;
const MARKER_TEM: u16 = 0xFF01;

/// Smallest APP1 length that can hold the XMP namespace and its NUL.
const MIN_XMP_SEGMENT_LENGTH: usize = 2 + XMP_NAMESPACE.len() + 1;

/// Largest value a segment length field can hold.
const MAX_SEGMENT_LENGTH: usize = u16::MAX as usize;

/// Location of one marker segment in a JPEG stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub marker: u16,
    /// Offset of the `FF xx` marker bytes
    pub offset: usize,
    /// Declared length (includes the two length bytes); `None` for markers
    /// that stand alone
    pub length: Option<usize>,
}

impl Segment {
    /// Offset just past this segment.
    pub fn end(&self) -> usize {
        self.offset + 2 + self.length.unwrap_or(0)
    }

    /// Total bytes including the marker.
    pub fn total_len(&self) -> usize {
        self.end() - self.offset
    }

    /// Bytes after the length field.
    pub fn payload<'a>(&self, bytes: &'a [u8]) -> Result<&'a [u8]> {
        let start = self.offset + 4;
        match self.length {
            Some(_) => bytes.get(start..self.end()).ok_or_else(|| {
                CaptureError::MalformedContainer(format!(
                    "segment {:04X} at {} runs past end of data",
                    self.marker, self.offset
                ))
            }),
            None => Ok(&[]),
        }
    }

    /// Whether this is an APP1 segment carrying the XMP namespace.
    pub fn is_xmp(&self, bytes: &[u8]) -> Result<bool> {
        let Some(length) = self.length else {
            return Ok(false);
        };
        if self.marker != MARKER_APP1 || length < MIN_XMP_SEGMENT_LENGTH {
            return Ok(false);
        }
        let start = self.offset + 4;
        let prefix = bytes.get(start..start + XMP_NAMESPACE.len()).ok_or_else(|| {
            CaptureError::MalformedContainer(format!("APP1 segment at {} is truncated", self.offset))
        })?;
        Ok(prefix == XMP_NAMESPACE.as_bytes())
    }
}

fn read_u16_be(bytes: &[u8], offset: usize) -> Result<u16> {
    match bytes.get(offset..offset + 2) {
        Some(b) => Ok(u16::from_be_bytes([b[0], b[1]])),
        None => Err(CaptureError::MalformedContainer(format!(
            "cannot read 2 bytes at offset {} of {}",
            offset,
            bytes.len()
        ))),
    }
}

/// Walks marker segments from just after SOI until the start of scan.
///
/// Yields an error (and then stops) as soon as a marker or length field cannot
/// be read. Reaching SOS ends the walk without yielding it.
pub struct Segments<'a> {
    bytes: &'a [u8],
    offset: usize,
    done: bool,
}

impl<'a> Segments<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        if read_u16_be(bytes, 0)? != MARKER_SOI {
            return Err(CaptureError::MalformedContainer(
                "missing JPEG start-of-image marker".to_string(),
            ));
        }
        Ok(Self {
            bytes,
            offset: 2,
            done: false,
        })
    }

    fn next_segment(&mut self) -> Result<Option<Segment>> {
        let offset = self.offset;
        let marker = read_u16_be(self.bytes, offset)?;
        if marker >> 8 != 0xFF {
            return Err(CaptureError::MalformedContainer(format!(
                "expected marker at offset {offset}, found {marker:04X}"
            )));
        }

        if marker == MARKER_SOS {
            return Ok(None);
        }

        if (0xFFD0..=0xFFD9).contains(&marker) || marker == MARKER_TEM {
            self.offset += 2;
            return Ok(Some(Segment {
                marker,
                offset,
                length: None,
            }));
        }

        let length = read_u16_be(self.bytes, offset + 2)? as usize;
        if length < 2 {
            return Err(CaptureError::MalformedContainer(format!(
                "segment {marker:04X} at {offset} declares length {length}"
            )));
        }
        self.offset += 2 + length;
        Ok(Some(Segment {
            marker,
            offset,
            length: Some(length),
        }))
    }
}

impl Iterator for Segments<'_> {
    type Item = Result<Segment>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_segment() {
            Ok(Some(segment)) => Some(Ok(segment)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// First existing XMP APP1 segment before the scan, if any.
pub fn find_xmp_segment(bytes: &[u8]) -> Result<Option<Segment>> {
    for segment in Segments::new(bytes)? {
        let segment = segment?;
        if segment.is_xmp(bytes)? {
            return Ok(Some(segment));
        }
    }
    Ok(None)
}

/// `FF E1`, length, namespace, NUL, packet.
pub fn build_xmp_segment(packet: &str) -> Result<Vec<u8>> {
    let content_len = XMP_NAMESPACE.len() + 1 + packet.len();
    let length = content_len + 2;
    if length > MAX_SEGMENT_LENGTH {
        return Err(CaptureError::MetadataTooLarge(content_len));
    }

    let mut segment = Vec::with_capacity(2 + length);
    segment.extend_from_slice(&MARKER_APP1.to_be_bytes());
    segment.extend_from_slice(&(length as u16).to_be_bytes());
    segment.extend_from_slice(XMP_NAMESPACE.as_bytes());
    segment.push(0);
    segment.extend_from_slice(packet.as_bytes());
    Ok(segment)
}

/// Returns a copy of `bytes` with `packet` as its XMP segment, replacing the
/// first existing one or inserting after the first segment.
pub fn inject(bytes: &[u8], packet: &str) -> Result<Vec<u8>> {
    let (start, resume) = match find_xmp_segment(bytes)? {
        Some(existing) => {
            let end = existing.end();
            if end > bytes.len() {
                return Err(CaptureError::MalformedContainer(format!(
                    "XMP segment at {} runs past end of data",
                    existing.offset
                )));
            }
            debug!(offset = existing.offset, len = existing.total_len(), "Replacing XMP segment");
            (existing.offset, end)
        }
        None => {
            let first_len = read_u16_be(bytes, 4)? as usize;
            let insert_at = 4 + first_len;
            if first_len < 2 || insert_at > bytes.len() {
                return Err(CaptureError::MalformedContainer(format!(
                    "first segment length {first_len} does not fit in {} bytes",
                    bytes.len()
                )));
            }
            debug!(offset = insert_at, "Inserting XMP segment");
            (insert_at, insert_at)
        }
    };

    let segment = build_xmp_segment(packet)?;
    let mut out = Vec::with_capacity(bytes.len() - (resume - start) + segment.len());
    out.extend_from_slice(&bytes[..start]);
    out.extend_from_slice(&segment);
    out.extend_from_slice(&bytes[resume..]);
    Ok(out)
}
