// Re-export commonly used types for convenience
pub use crate::cli::{Cli, ColorChoice};
pub use crate::config::{OpenOptions, ViewerConfig};
pub use crate::converter::{Cell, CellColor, ColorEncoder, EncodingMode, GlyphRow, PixelView};
pub use crate::geometry::{resolve, Fit, TargetGeometry, TerminalSize};
pub use crate::pacing::PacingController;
pub use crate::renderer::TerminalRenderer;
pub use crate::sequencer::{
    CancellationToken, CompressedPacket, FrameDecoder, FrameSequencer, FrameSink, FrameTiming,
    Outcome, PacketSource, PipelineState, ReadStatus, RetryPolicy,
};
pub use crate::{StartupError, ViewerError, HALF_BLOCK, STATUS_PLACEHOLDER};

// Re-export external types commonly used in tests
pub use std::time::Duration;
