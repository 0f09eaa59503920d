use ffmpeg_next as ffmpeg;
use ffmpeg::format::Pixel;
use ffmpeg::software::scaling::{Context, Flags};
use log::debug;

use crate::converter::{EncodingMode, PixelView};
use crate::geometry::TargetGeometry;
use crate::{Result, StartupError, ViewerError};

/// Parameters the scaler is bound to for the whole run
#[derive(Debug, Clone, Copy)]
pub struct ResampleRequest {
    pub src_format: Pixel,
    pub src_width: u32,
    pub src_height: u32,
    pub target: TargetGeometry,
    pub mode: EncodingMode,
}

impl ResampleRequest {
    /// Output pixel format: packed RGB for truecolor, a single luma plane
    /// for grayscale. The buffer layout differs per mode, so `channels()`
    /// travels with the view handed to the encoder.
    pub fn dst_format(&self) -> Pixel {
        match self.mode {
            EncodingMode::Truecolor => Pixel::RGB24,
            EncodingMode::Grayscale => Pixel::GRAY8,
        }
    }

    /// Bytes per pixel of the output plane
    pub fn channels(&self) -> usize {
        match self.mode {
            EncodingMode::Truecolor => 3,
            EncodingMode::Grayscale => 1,
        }
    }

    /// Create the scaling context and its persistent output buffer
    pub fn build(self) -> std::result::Result<Resampler, StartupError> {
        let dst_format = self.dst_format();
        let context = Context::get(
            self.src_format,
            self.src_width,
            self.src_height,
            dst_format,
            self.target.width,
            self.target.height,
            Flags::BILINEAR,
        )
        .map_err(|source| StartupError::ResamplerInit {
            src: self.src_format,
            dst: dst_format,
            source,
        })?;

        debug!(
            "Scaler {:?} {}x{} -> {:?} {}x{}",
            self.src_format,
            self.src_width,
            self.src_height,
            dst_format,
            self.target.width,
            self.target.height
        );

        Ok(Resampler {
            context,
            output: ffmpeg::frame::Video::new(dst_format, self.target.width, self.target.height),
            channels: self.channels(),
        })
    }
}

/// Configured scaler plus the one resampled buffer it writes into
pub struct Resampler {
    context: Context,
    output: ffmpeg::frame::Video,
    channels: usize,
}

impl Resampler {
    /// Resample `frame` into the persistent buffer, overwriting the previous
    /// contents
    pub fn run(&mut self, frame: &ffmpeg::frame::Video) -> Result<()> {
        self.context
            .run(frame, &mut self.output)
            .map_err(ViewerError::Resample)
    }

    /// Stride-aware view of the last resampled picture
    pub fn view(&self) -> PixelView<'_> {
        PixelView::new(
            self.output.data(0),
            self.output.width() as usize,
            self.output.height() as usize,
            self.output.stride(0),
            self.channels,
        )
    }
}
