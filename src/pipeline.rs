//! Startup wiring and the per-frame render stage.
//!
//! Startup (open, stream selection, decoder, terminal query, geometry,
//! scaler) fails before the terminal is touched. Once the sequencer runs,
//! every exit path goes through `Terminated`, which restores the cursor.

use std::io::{Stdout, Write};

use ffmpeg_next as ffmpeg;
use log::{debug, info};

use crate::config::ViewerConfig;
use crate::converter::ColorEncoder;
use crate::decoder::{self, MediaSource, StreamInfo};
use crate::geometry::{self, Fit};
use crate::pacing::PacingController;
use crate::renderer::TerminalRenderer;
use crate::scaler::{ResampleRequest, Resampler};
use crate::sequencer::{
    CancellationToken, FrameSequencer, FrameSink, FrameTiming, Outcome, PipelineState,
};
use crate::Result;

/// Resample, encode, draw and pace one decoded frame
pub struct RenderStage<W: Write = Stdout> {
    resampler: Resampler,
    encoder: ColorEncoder,
    renderer: TerminalRenderer<W>,
    pacer: PacingController,
    time_base: ffmpeg::Rational,
}

impl<W: Write> RenderStage<W> {
    pub fn new(
        resampler: Resampler,
        encoder: ColorEncoder,
        renderer: TerminalRenderer<W>,
        pacer: PacingController,
        time_base: ffmpeg::Rational,
    ) -> Self {
        Self {
            resampler,
            encoder,
            renderer,
            pacer,
            time_base,
        }
    }

    pub fn renderer(&self) -> &TerminalRenderer<W> {
        &self.renderer
    }
}

impl<W: Write> FrameSink<ffmpeg::frame::Video> for RenderStage<W> {
    fn on_transition(&mut self, _from: PipelineState, to: PipelineState) -> Result<()> {
        match to {
            PipelineState::Streaming => self.renderer.prepare()?,
            PipelineState::Terminated => self.renderer.restore()?,
            _ => {}
        }
        Ok(())
    }

    fn on_frame(&mut self, frame: &ffmpeg::frame::Video, timing: FrameTiming) -> Result<()> {
        self.resampler.run(frame)?;
        let rows = self.encoder.encode(&self.resampler.view());
        self.renderer.draw(&rows)?;

        let declared = decoder::frame_duration(frame, self.time_base);
        let processing = timing.processing();
        let waited = self.pacer.wait(declared, processing);
        debug!(
            "Frame {}: processing {:?}, waited {:?}",
            self.renderer.frames_rendered(),
            processing,
            waited
        );
        Ok(())
    }
}

/// Open the source and report its video stream without rendering anything
pub fn probe(config: &ViewerConfig) -> Result<StreamInfo> {
    decoder::init();
    let source = MediaSource::open(&config.source, &config.open)?;
    Ok(source.info().clone())
}

/// Play `config.source` on standard output until end of stream, interrupt
/// or a fatal error
pub fn play(config: &ViewerConfig, cancel: CancellationToken) -> Result<Outcome> {
    decoder::init();
    let mut source = MediaSource::open(&config.source, &config.open)?;
    let info = source.info().clone();
    let decoder = source.decoder()?;

    let terminal = config.terminal_size()?;
    geometry::check_inputs(terminal, info.width, info.height)?;
    let target = geometry::resolve(terminal, info.width, info.height);
    match target.fit {
        Fit::Width => info!(
            "Image is wider than the screen, fitting to width: {}x{}",
            target.width, target.height
        ),
        Fit::Height => info!(
            "Image is taller than the screen, fitting to height: {}x{}",
            target.width, target.height
        ),
    }

    let resampler = ResampleRequest {
        src_format: info.format,
        src_width: info.width,
        src_height: info.height,
        target,
        mode: config.mode,
    }
    .build()?;

    let stage = RenderStage::new(
        resampler,
        ColorEncoder::new(config.mode),
        TerminalRenderer::stdout(),
        PacingController::from_frame_rate(
            info.frame_rate.numerator(),
            info.frame_rate.denominator(),
        ),
        info.time_base,
    );

    FrameSequencer::new(source, decoder, stage, info.index, cancel)
        .with_retry(config.retry)
        .run()
}
