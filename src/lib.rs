//! vidterm - a real-time colored half-block video viewer for the terminal
//!
//! This crate turns a local video file or a network stream into a sequence of
//! ANSI escape sequences. Two source pixel rows are packed into one terminal
//! row with the upper-half block glyph, frames are paced against the wall
//! clock, and decoding only starts at the first keyframe.

pub mod cli;
pub mod config;
pub mod converter;
pub mod decoder;
pub mod geometry;
pub mod pacing;
pub mod pipeline;
pub mod prelude;
pub mod renderer;
pub mod scaler;
pub mod sequencer;

pub use cli::{Cli, ColorChoice};
pub use config::{OpenOptions, ViewerConfig};
pub use converter::{Cell, CellColor, ColorEncoder, EncodingMode, GlyphRow, PixelView};
pub use decoder::{MediaSource, StreamInfo, VideoDecoder};
pub use geometry::{Fit, TargetGeometry, TerminalSize};
pub use pacing::PacingController;
pub use pipeline::{play, probe, RenderStage};
pub use renderer::TerminalRenderer;
pub use scaler::{ResampleRequest, Resampler};
pub use sequencer::{
    CancellationToken, CompressedPacket, FrameDecoder, FrameSequencer, FrameSink, FrameTiming,
    Outcome, PacketSource, PipelineState, ReadStatus, RetryPolicy,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Upper-half block: foreground paints the top pixel, background the bottom one
pub const HALF_BLOCK: char = '▀';

/// Placeholder progress line drawn under every frame
pub const STATUS_PLACEHOLDER: &str = "[---------------------------------]";

/// Default read/connect timeout for network sources, in seconds
pub const DEFAULT_STREAM_TIMEOUT_SECS: u64 = 10;

/// Errors that abort the viewer before the first frame is drawn
#[derive(thiserror::Error, Debug)]
pub enum StartupError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Cannot open '{locator}': {source}")]
    Open {
        locator: String,
        source: ffmpeg_next::Error,
    },

    #[error("Couldn't find a video stream in '{0}'")]
    NoVideoStream(String),

    #[error("Cannot open the video codec: {0}")]
    Codec(ffmpeg_next::Error),

    #[error("Cannot create scaling context {src:?} -> {dst:?}: {source}")]
    ResamplerInit {
        src: ffmpeg_next::format::Pixel,
        dst: ffmpeg_next::format::Pixel,
        source: ffmpeg_next::Error,
    },

    #[error("Cannot query terminal size: {0}")]
    Terminal(std::io::Error),

    #[error("Unusable geometry: {0}")]
    Geometry(String),
}

/// Error types used throughout the application
#[derive(thiserror::Error, Debug)]
pub enum ViewerError {
    #[error(transparent)]
    Startup(#[from] StartupError),

    #[error("Read error: {0}")]
    Read(ffmpeg_next::Error),

    #[error("Source stalled after {0} consecutive retries")]
    Stalled(u32),

    #[error("Decode error: {0}")]
    Decode(ffmpeg_next::Error),

    #[error("Resample error: {0}")]
    Resample(ffmpeg_next::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, ViewerError>;
