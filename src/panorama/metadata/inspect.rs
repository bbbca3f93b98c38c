//! Reading injected panorama metadata back out of encoded images.

use std::str::FromStr;

use elementtree::Element;
use memchr::memmem;
use tracing::debug;

use crate::panorama::common::error::Result;
use crate::panorama::encode::types::{EncodedImage, ImageFormat};
use crate::panorama::metadata::xmp::{GPANO_NAMESPACE, RDF_NAMESPACE};
use crate::panorama::metadata::{jpeg, png};

/// GPano values found in an image.
#[derive(Debug, Clone, PartialEq)]
pub struct PanoramaInfo {
    pub projection_type: String,
    pub cropped_width: u32,
    pub cropped_height: u32,
    pub full_width: u32,
    pub full_height: u32,
    pub horizontal_fov_degrees: f32,
    pub pose_heading_degrees: f32,
}

/// Offset and total length of the first XMP APP1 segment, if any.
pub fn find_jpeg_xmp_segment(bytes: &[u8]) -> Result<Option<(usize, usize)>> {
    Ok(jpeg::find_xmp_segment(bytes)?.map(|s| (s.offset, s.total_len())))
}

/// Number of XMP APP1 segments before the first scan.
pub fn count_jpeg_xmp_segments(bytes: &[u8]) -> Result<usize> {
    let mut count = 0;
    for segment in jpeg::Segments::new(bytes)? {
        if segment?.is_xmp(bytes)? {
            count += 1;
        }
    }
    Ok(count)
}

/// Number of XMP iTXt chunks.
pub fn count_png_xmp_chunks(bytes: &[u8]) -> Result<usize> {
    Ok(png::chunks(bytes)?
        .iter()
        .filter(|c| png::is_xmp_chunk(c, bytes))
        .count())
}

/// GPano values from the first XMP block of `image`, or `None` when there is
/// no XMP block or it lacks the panorama fields.
pub fn read_panorama_metadata(image: &EncodedImage) -> Result<Option<PanoramaInfo>> {
    let bytes = &image.bytes;
    let packet: Option<&[u8]> = match image.format {
        ImageFormat::Jpeg => match jpeg::find_xmp_segment(bytes)? {
            Some(segment) => Some(segment.payload(bytes)?),
            None => None,
        },
        ImageFormat::Png => png::chunks(bytes)?
            .into_iter()
            .find(|c| png::is_xmp_chunk(c, bytes))
            .map(|c| c.data(bytes)),
    };
    Ok(packet.and_then(parse_gpano))
}

/// The `<x:xmpmeta>` document inside an XMP block, without the JPEG namespace
/// prefix or the `<?xpacket?>` wrapper.
fn xmpmeta_range(packet: &[u8]) -> Option<&[u8]> {
    const START: &[u8] = b"<x:xmpmeta";
    const END: &[u8] = b"</x:xmpmeta>";
    let start = memmem::find(packet, START)?;
    let len = memmem::find(&packet[start..], END)? + END.len();
    Some(&packet[start..start + len])
}

/// A GPano property, written either as an attribute of the description or
/// as a child element.
fn gpano_field<T: FromStr>(description: &Element, name: &str) -> Option<T> {
    description
        .find((GPANO_NAMESPACE, name))
        .map(|child| child.text())
        .or_else(|| description.get_attr((GPANO_NAMESPACE, name)))
        .and_then(|value| value.trim().parse().ok())
}

fn parse_gpano(packet: &[u8]) -> Option<PanoramaInfo> {
    let root = match Element::from_reader(xmpmeta_range(packet)?) {
        Ok(root) => root,
        Err(e) => {
            debug!(error = %e, "XMP block is not well-formed");
            return None;
        }
    };

    let description = root
        .find((RDF_NAMESPACE, "RDF"))?
        .find_all((RDF_NAMESPACE, "Description"))
        .find(|d| gpano_field::<String>(d, "ProjectionType").is_some())?;

    Some(PanoramaInfo {
        projection_type: gpano_field(description, "ProjectionType")?,
        cropped_width: gpano_field(description, "CroppedAreaImageWidthPixels")?,
        cropped_height: gpano_field(description, "CroppedAreaImageHeightPixels")?,
        full_width: gpano_field(description, "FullPanoWidthPixels")?,
        full_height: gpano_field(description, "FullPanoHeightPixels")?,
        horizontal_fov_degrees: gpano_field(description, "InitialHorizontalFOVDegrees")?,
        pose_heading_degrees: gpano_field(description, "PoseHeadingDegrees")?,
    })
}
