//! Packet-to-frame state machine.
//!
//! ```text
//! INIT -> AWAITING_KEYFRAME -> STREAMING -> DRAINING -> TERMINATED
//!                 \                 \
//!                  +-----------------+--> TERMINATED (interrupt, fatal error)
//! ```
//!
//! Everything before the first keyframe on the selected video stream is
//! discarded without being decoded. Packets of other streams are always
//! discarded. Cancellation is cooperative: the token is checked once per
//! loop iteration, so the frame in flight always finishes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::{Result, ViewerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    AwaitingKeyframe,
    Streaming,
    Draining,
    Terminated,
}

/// Result of one demuxer read
#[derive(Debug)]
pub enum ReadStatus<P> {
    Packet(P),
    /// Nothing available right now, try again
    Again,
    EndOfStream,
}

/// The parts of a demuxed packet the sequencer looks at
pub trait CompressedPacket {
    fn stream_index(&self) -> usize;
    fn is_keyframe(&self) -> bool;
}

/// Demuxer side of the pipeline
pub trait PacketSource {
    type Packet: CompressedPacket;

    fn read_packet(&mut self) -> Result<ReadStatus<Self::Packet>>;
}

/// Decoder side of the pipeline. A frame returned by `receive_frame` is only
/// valid until the next call.
pub trait FrameDecoder<P> {
    type Frame;

    fn send_packet(&mut self, packet: &P) -> Result<()>;

    /// Signal end of input so buffered frames can be drained
    fn send_eof(&mut self) -> Result<()>;

    /// Next decoded frame, `None` once the decoder needs more input
    fn receive_frame(&mut self) -> Result<Option<&Self::Frame>>;
}

/// Consumer of decoded frames and lifecycle transitions
pub trait FrameSink<F> {
    fn on_transition(&mut self, from: PipelineState, to: PipelineState) -> Result<()>;

    fn on_frame(&mut self, frame: &F, timing: FrameTiming) -> Result<()>;
}

/// Wall-clock cost already spent on a frame before it reaches the sink
#[derive(Debug, Clone, Copy)]
pub struct FrameTiming {
    /// Reading the packet and submitting it to the decoder
    pub packet_latency: Duration,
    /// When the decoder was asked for this frame
    pub started: Instant,
}

impl FrameTiming {
    /// Total processing time so far: packet latency plus everything since
    /// the frame was requested
    pub fn processing(&self) -> Duration {
        self.packet_latency + self.started.elapsed()
    }
}

/// Shared stop flag, set from the interrupt handler and polled by the loop
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// How "try again" read statuses are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive retries tolerated before the source counts as stalled
    pub max_consecutive: u32,
    /// Sleep between retries
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_consecutive: 10_000,
            backoff: Duration::from_millis(1),
        }
    }
}

/// How a run that did not fail came to an end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    EndOfStream,
    Interrupted,
}

/// Counters reported when the sequencer terminates
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SequencerStats {
    pub packets_read: u64,
    pub packets_discarded: u64,
    pub packets_decoded: u64,
    pub frames: u64,
}

pub struct FrameSequencer<S, D, K> {
    source: S,
    decoder: D,
    sink: K,
    video_stream: usize,
    state: PipelineState,
    cancel: CancellationToken,
    retry: RetryPolicy,
    stats: SequencerStats,
}

impl<S, D, K> FrameSequencer<S, D, K>
where
    S: PacketSource,
    D: FrameDecoder<S::Packet>,
    K: FrameSink<D::Frame>,
{
    /// Create a sequencer in `Init` for packets of `video_stream`
    pub fn new(
        source: S,
        decoder: D,
        sink: K,
        video_stream: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            decoder,
            sink,
            video_stream,
            state: PipelineState::Init,
            cancel,
            retry: RetryPolicy::default(),
            stats: SequencerStats::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn stats(&self) -> SequencerStats {
        self.stats
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Run until end of stream, interrupt or the first fatal error.
    ///
    /// Every path ends in `Terminated`, and the sink sees that transition
    /// exactly once.
    pub fn run(&mut self) -> Result<Outcome> {
        let result = self
            .transition(PipelineState::AwaitingKeyframe)
            .and_then(|()| self.pump());

        if let Err(e) = &result {
            error!("{}", e);
        }
        if let Err(e) = self.transition(PipelineState::Terminated) {
            warn!("Failed to restore terminal: {}", e);
        }

        let stats = self.stats;
        info!(
            "Packets read: {}, discarded: {}, decoded: {}, frames rendered: {}",
            stats.packets_read, stats.packets_discarded, stats.packets_decoded, stats.frames
        );
        result
    }

    fn pump(&mut self) -> Result<Outcome> {
        let mut retries = 0u32;
        loop {
            if self.cancel.is_cancelled() {
                info!("Interrupted, stopping");
                return Ok(Outcome::Interrupted);
            }

            let read_started = Instant::now();
            let packet = match self.source.read_packet()? {
                ReadStatus::Packet(packet) => {
                    retries = 0;
                    packet
                }
                ReadStatus::Again => {
                    retries += 1;
                    if retries > self.retry.max_consecutive {
                        return Err(ViewerError::Stalled(self.retry.max_consecutive));
                    }
                    std::thread::sleep(self.retry.backoff);
                    continue;
                }
                ReadStatus::EndOfStream => {
                    info!("End of stream");
                    self.drain()?;
                    return Ok(Outcome::EndOfStream);
                }
            };
            self.stats.packets_read += 1;

            if packet.stream_index() != self.video_stream {
                self.stats.packets_discarded += 1;
                continue;
            }

            if self.state == PipelineState::AwaitingKeyframe {
                if !packet.is_keyframe() {
                    debug!("Skipping packet before first keyframe");
                    self.stats.packets_discarded += 1;
                    continue;
                }
                info!("Found key frame");
                self.transition(PipelineState::Streaming)?;
            }

            self.decoder.send_packet(&packet)?;
            self.stats.packets_decoded += 1;
            self.deliver_frames(read_started.elapsed())?;
        }
    }

    /// Flush frames buffered inside the decoder once input is exhausted
    fn drain(&mut self) -> Result<()> {
        let was_streaming = self.state == PipelineState::Streaming;
        self.transition(PipelineState::Draining)?;
        if was_streaming {
            self.decoder.send_eof()?;
            self.deliver_frames(Duration::ZERO)?;
        }
        Ok(())
    }

    fn deliver_frames(&mut self, packet_latency: Duration) -> Result<()> {
        loop {
            let started = Instant::now();
            let Some(frame) = self.decoder.receive_frame()? else {
                return Ok(());
            };
            self.sink.on_frame(frame, FrameTiming { packet_latency, started })?;
            self.stats.frames += 1;
        }
    }

    fn transition(&mut self, to: PipelineState) -> Result<()> {
        let from = self.state;
        if from == to || from == PipelineState::Terminated {
            return Ok(());
        }
        debug!("Pipeline state {:?} -> {:?}", from, to);
        self.state = to;
        self.sink.on_transition(from, to)
    }
}
