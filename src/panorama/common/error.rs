use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Render backend cannot render cube captures")]
    RenderUnsupported,

    #[error("Failed to encode panorama: {0}")]
    EncodeFailure(String),

    #[error("Malformed image container: {0}")]
    MalformedContainer(String),

    #[error("XMP metadata of {0} bytes does not fit in a JPEG segment")]
    MetadataTooLarge(usize),

    #[error("Invalid capture dimensions: width={0}, height={1}")]
    InvalidDimensions(u32, u32),

    #[error("Render target unavailable: {0}")]
    TargetUnavailable(String),

    #[error("Pixel readback failed: {0}")]
    Readback(String),

    #[error("A capture is already in progress")]
    Busy,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CaptureError>;
