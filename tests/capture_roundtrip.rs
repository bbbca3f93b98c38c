use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel;
use glam::Vec3;
use spaces_pano_rs::panorama::metadata::inspect::{
    count_jpeg_xmp_segments, count_png_xmp_chunks, find_jpeg_xmp_segment,
};
use spaces_pano_rs::panorama::metadata::{png, read_panorama_metadata, xmp::PNG_XMP_KEYWORD};
use spaces_pano_rs::panorama::projection::cube::direction_to_face_uv;
use spaces_pano_rs::panorama::{
    CaptureConfig, CaptureError, CapturePipeline, CaptureRequest, EquirectProjector,
    EquirectangularBuffer, ImageEncoder, ImageFormat, MetadataInjector, PanoramaProjector,
    SkyGradient, SoftwareBackend, StandardEncoder, Viewpoint,
};

fn face_palette(_origin: Vec3, dir: Vec3) -> [u8; 3] {
    let (face, _, _) = direction_to_face_uv(dir);
    let i = face.index() as u8;
    [40 * i, 200 - 30 * i, 10 + i]
}

fn gradient(width: u32) -> EquirectangularBuffer {
    let mut buffer = EquirectangularBuffer::new(width);
    for (i, v) in buffer.data.iter_mut().enumerate() {
        *v = (i * 13 % 256) as u8;
    }
    buffer
}

#[test]
fn test_cubemap_1024_projects_to_1024_by_512() {
    let backend = Arc::new(SoftwareBackend::new(face_palette, EquirectProjector::default()).unwrap());
    let projector = PanoramaProjector::new(Arc::clone(&backend), 8192);
    let size = projector.cubemap_size(1000);
    assert_eq!(size, 1024);

    let pixels = projector.project_sync(&Viewpoint::default(), size, 0.0).unwrap();
    assert_eq!((pixels.width, pixels.height), (1024, 512));
    assert_eq!(backend.live_targets(), 0);
    assert_eq!(backend.camera_target(), None);
}

#[test]
fn test_projector_async_matches_sync() {
    let backend = Arc::new(SoftwareBackend::new(SkyGradient::default(), EquirectProjector::default()).unwrap());
    let projector = PanoramaProjector::new(backend, 8192);
    let viewpoint = Viewpoint::at(Vec3::new(1.0, 2.0, 3.0));

    let sync_pixels = projector.project_sync(&viewpoint, 64, 0.125).unwrap();
    let (tx, rx) = channel::bounded(1);
    projector.project_async(&viewpoint, 64, 0.125, move |pixels| tx.send(pixels).unwrap());
    let async_pixels = rx.recv_timeout(Duration::from_secs(10)).unwrap().unwrap();
    assert_eq!(sync_pixels, async_pixels);
}

#[test]
fn test_jpeg_insertion_lands_after_first_segment() {
    let encoded = StandardEncoder::default().encode(&gradient(64), ImageFormat::Jpeg).unwrap();
    assert_eq!(find_jpeg_xmp_segment(&encoded.bytes).unwrap(), None);

    let first_len = u16::from_be_bytes([encoded.bytes[4], encoded.bytes[5]]) as usize;
    let insert_at = 4 + first_len;

    let injected = MetadataInjector::default().inject(&encoded).unwrap();
    let (offset, segment_len) = find_jpeg_xmp_segment(&injected.bytes).unwrap().unwrap();
    assert_eq!(offset, insert_at);
    assert_eq!(&injected.bytes[..insert_at], &encoded.bytes[..insert_at]);
    assert_eq!(&injected.bytes[insert_at + segment_len..], &encoded.bytes[insert_at..]);
}

#[test]
fn test_jpeg_injection_is_idempotent() {
    let injector = MetadataInjector::default();
    let encoded = StandardEncoder::default().encode(&gradient(128), ImageFormat::Jpeg).unwrap();

    let once = injector.inject(&encoded).unwrap();
    let twice = injector.inject(&once).unwrap();
    assert_eq!(once.len(), twice.len());
    assert_eq!(once.bytes, twice.bytes);
    assert_eq!(count_jpeg_xmp_segments(&twice.bytes).unwrap(), 1);
    // The input is never modified in place.
    assert_eq!(find_jpeg_xmp_segment(&encoded.bytes).unwrap(), None);
}

#[test]
fn test_png_injection_adds_exactly_one_chunk() {
    let injector = MetadataInjector::default();
    let encoded = StandardEncoder::default().encode(&gradient(64), ImageFormat::Png).unwrap();
    let n = encoded.len();

    let injected = injector.inject(&encoded).unwrap();
    let packet = injector.metadata_for(64, 32).png_packet();
    let payload_len = PNG_XMP_KEYWORD.len() + 5 + packet.len();
    assert_eq!(injected.len(), n + payload_len + 12);
    assert_eq!(&injected.bytes[..33], &encoded.bytes[..33]);
    assert_eq!(&injected.bytes[33 + payload_len + 12..], &encoded.bytes[33..]);

    let chunks = png::chunks(&injected.bytes).unwrap();
    let xmp = chunks.iter().find(|c| png::is_xmp_chunk(c, &injected.bytes)).unwrap();
    assert_eq!(xmp.offset, 33);
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&xmp.kind);
    hasher.update(xmp.data(&injected.bytes));
    assert_eq!(xmp.stored_crc(&injected.bytes), hasher.finalize());

    // Not idempotent: a second pass adds a second chunk.
    let again = injector.inject(&injected).unwrap();
    assert_eq!(count_png_xmp_chunks(&again.bytes).unwrap(), 2);
}

#[test]
fn test_injected_images_still_decode() {
    let injector = MetadataInjector::default();
    for format in [ImageFormat::Jpeg, ImageFormat::Png] {
        let encoded = StandardEncoder::default().encode(&gradient(64), format).unwrap();
        let injected = injector.inject(&encoded).unwrap();
        let decoded = image::load_from_memory(&injected.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 32));
    }
}

#[test]
fn test_truncated_jpeg_is_malformed() {
    let encoded = StandardEncoder::default().encode(&gradient(64), ImageFormat::Jpeg).unwrap();
    let first_len = u16::from_be_bytes([encoded.bytes[4], encoded.bytes[5]]) as usize;
    // Stop one byte into the second segment's length field.
    let mut truncated = encoded.clone();
    truncated.bytes.truncate(4 + first_len + 3);

    let err = MetadataInjector::default().inject(&truncated).unwrap_err();
    assert!(matches!(err, CaptureError::MalformedContainer(_)));
}

#[test]
fn test_software_capture_persists_valid_panoramas() {
    let pipeline = CapturePipeline::software(SkyGradient::default(), CaptureConfig::default()).unwrap();
    let dir = tempfile::tempdir().unwrap();

    for (name, jpeg) in [("pano.jpg", true), ("pano.png", false)] {
        let request = CaptureRequest::new(200).jpeg(jpeg).face_alignment(true).heading(45.0);
        let captured = pipeline.capture_sync(&request).unwrap();
        assert_eq!((captured.width, captured.height), (256, 128));

        let path = dir.path().join(name);
        std::fs::write(&path, &captured.bytes).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes, captured.bytes);

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (256, 128));

        let info = read_panorama_metadata(&captured).unwrap().unwrap();
        assert_eq!(info.projection_type, "equirectangular");
        assert_eq!((info.full_width, info.full_height), (256, 128));
        assert_eq!(info.horizontal_fov_degrees, 75.0);
        assert_eq!(info.pose_heading_degrees, 180.0);
    }
}

#[test]
fn test_software_async_capture_matches_sync() {
    let pipeline = CapturePipeline::software(face_palette, CaptureConfig::default()).unwrap();
    let request = CaptureRequest::new(128).jpeg(false).face_alignment(true).heading(90.0);
    let sync_image = pipeline.capture_sync(&request).unwrap();

    let (tx, rx) = channel::bounded(1);
    pipeline.capture_async(request, move |result| tx.send(result).unwrap());
    let async_image = rx.recv_timeout(Duration::from_secs(10)).unwrap().unwrap();
    assert_eq!(sync_image, async_image);
}

#[test]
fn test_struct_config_caps_cubemap_at_power_of_two() {
    let config = CaptureConfig {
        max_cubemap_edge: 300,
        ..Default::default()
    };
    let pipeline = CapturePipeline::software(SkyGradient::default(), config).unwrap();

    let captured = pipeline.capture_sync(&CaptureRequest::new(4000).jpeg(false)).unwrap();
    assert_eq!((captured.width, captured.height), (256, 128));
    let info = read_panorama_metadata(&captured).unwrap().unwrap();
    assert_eq!((info.full_width, info.full_height), (256, 128));
}
