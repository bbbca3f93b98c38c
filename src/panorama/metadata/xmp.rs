//! GPano (Photo Sphere) XMP packets.

use std::fmt::Write as _;

/// Namespace that prefixes an XMP APP1 segment in JPEG.
pub const XMP_NAMESPACE: &str = "http://ns.adobe.com/xap/1.0/";

/// iTXt keyword that marks an XMP chunk in PNG.
pub const PNG_XMP_KEYWORD: &str = "XML:com.adobe.xmp";

/// Namespace of the Photo Sphere (GPano) properties.
pub const GPANO_NAMESPACE: &str = "http://ns.google.com/photos/1.0/panorama/";
pub const RDF_NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const XMP_TOOLKIT: &str = "Adobe XMP Core 5.1.0-jc003";

/// Values stamped into every packet that do not depend on the image.
#[derive(Debug, Clone, PartialEq)]
pub struct XmpSettings {
    pub capture_software: String,
    pub stitching_software: String,
    /// Written as `InitialHorizontalFOVDegrees`; not derived from the capture.
    pub horizontal_fov_degrees: f32,
    /// Written as `PoseHeadingDegrees`; not derived from the capture heading.
    pub pose_heading_degrees: f32,
}

impl Default for XmpSettings {
    fn default() -> Self {
        Self {
            capture_software: "Unity3D".to_string(),
            stitching_software: "Unity3D".to_string(),
            horizontal_fov_degrees: 75.0,
            pose_heading_degrees: 180.0,
        }
    }
}

/// Metadata for one full, uncropped equirectangular panorama.
#[derive(Debug, Clone, PartialEq)]
pub struct XmpPanoramaMetadata {
    pub cropped_width: u32,
    pub cropped_height: u32,
    pub cropped_left: u32,
    pub cropped_top: u32,
    pub full_width: u32,
    pub full_height: u32,
    pub horizontal_fov_degrees: f32,
    pub pose_heading_degrees: f32,
    pub capture_software: String,
    pub stitching_software: String,
}

impl XmpPanoramaMetadata {
    pub fn for_dimensions(width: u32, height: u32, settings: &XmpSettings) -> Self {
        Self {
            cropped_width: width,
            cropped_height: height,
            cropped_left: 0,
            cropped_top: 0,
            full_width: width,
            full_height: height,
            horizontal_fov_degrees: settings.horizontal_fov_degrees,
            pose_heading_degrees: settings.pose_heading_degrees,
            capture_software: settings.capture_software.clone(),
            stitching_software: settings.stitching_software.clone(),
        }
    }

    /// Bare `x:xmpmeta` document, as carried in a JPEG APP1 segment.
    pub fn jpeg_packet(&self) -> String {
        self.xmpmeta(false)
    }

    /// `x:xmpmeta` wrapped in `<?xpacket?>` processing instructions, with TIFF
    /// orientation and EXIF pixel dimensions, as carried in a PNG iTXt chunk.
    pub fn png_packet(&self) -> String {
        format!(
            "<?xpacket begin=\"\u{feff}\" id=\"W5M0MpCehiHzreSzNTczkc9d\"?>{}<?xpacket end=\"w\"?>",
            self.xmpmeta(true)
        )
    }

    fn xmpmeta(&self, with_exif: bool) -> String {
        let mut out = String::with_capacity(1024);
        let _ = write!(
            out,
            "<x:xmpmeta xmlns:x=\"adobe:ns:meta/\" x:xmptk=\"{XMP_TOOLKIT}\"> \
             <rdf:RDF xmlns:rdf=\"{RDF_NAMESPACE}\"> \
             <rdf:Description rdf:about=\"\" xmlns:GPano=\"{GPANO_NAMESPACE}\""
        );
        if with_exif {
            out.push_str(
                " xmlns:tiff=\"http://ns.adobe.com/tiff/1.0/\" xmlns:exif=\"http://ns.adobe.com/exif/1.0/\"",
            );
        }
        let _ = write!(
            out,
            " GPano:UsePanoramaViewer=\"True\" \
             GPano:CaptureSoftware=\"{}\" \
             GPano:StitchingSoftware=\"{}\" \
             GPano:ProjectionType=\"equirectangular\" \
             GPano:PoseHeadingDegrees=\"{:.1}\" \
             GPano:InitialViewHeadingDegrees=\"0.0\" \
             GPano:InitialViewPitchDegrees=\"0.0\" \
             GPano:InitialViewRollDegrees=\"0.0\" \
             GPano:InitialHorizontalFOVDegrees=\"{:.1}\" \
             GPano:CroppedAreaLeftPixels=\"{}\" \
             GPano:CroppedAreaTopPixels=\"{}\" \
             GPano:CroppedAreaImageWidthPixels=\"{}\" \
             GPano:CroppedAreaImageHeightPixels=\"{}\" \
             GPano:FullPanoWidthPixels=\"{}\" \
             GPano:FullPanoHeightPixels=\"{}\"",
            escape_attr(&self.capture_software),
            escape_attr(&self.stitching_software),
            self.pose_heading_degrees,
            self.horizontal_fov_degrees,
            self.cropped_left,
            self.cropped_top,
            self.cropped_width,
            self.cropped_height,
            self.full_width,
            self.full_height,
        );
        if with_exif {
            let _ = write!(
                out,
                " tiff:Orientation=\"1\" exif:PixelXDimension=\"{}\" exif:PixelYDimension=\"{}\"",
                self.full_width, self.full_height
            );
        }
        out.push_str("/></rdf:RDF></x:xmpmeta>");
        out
    }
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
