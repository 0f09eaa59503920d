use ffmpeg_next as ffmpeg;
use log::{debug, info};
use std::time::Duration;

use crate::config::OpenOptions;
use crate::sequencer::{CompressedPacket, FrameDecoder, PacketSource, ReadStatus};
use crate::{Result, StartupError, ViewerError};

/// Initialize FFmpeg once per process: networking for stream sources and a
/// quiet library log
pub fn init() {
    // Continue anyway, a failed registration surfaces when opening the input
    if let Err(e) = ffmpeg::init() {
        debug!("FFmpeg init error: {:?}", e);
    }
    ffmpeg::format::network::init();
    ffmpeg::util::log::set_level(ffmpeg::util::log::Level::Warning);
}

/// What the pipeline needs to know about the selected video stream, read
/// once at startup
#[derive(Debug, Clone)]
pub struct StreamInfo {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub format: ffmpeg::format::Pixel,
    pub codec_name: &'static str,
    pub frame_rate: ffmpeg::Rational,
    pub time_base: ffmpeg::Rational,
}

impl StreamInfo {
    pub fn fps(&self) -> f64 {
        let rate = self.frame_rate;
        if rate.denominator() != 0 {
            f64::from(rate.numerator()) / f64::from(rate.denominator())
        } else {
            0.0
        }
    }
}

/// Opened and demuxed media source
pub struct MediaSource {
    input_context: ffmpeg::format::context::Input,
    info: StreamInfo,
    decoder: Option<ffmpeg::codec::decoder::Video>,
}

impl MediaSource {
    /// Open a file path or URL and pick its best video stream
    pub fn open(locator: &str, options: &OpenOptions) -> std::result::Result<Self, StartupError> {
        let mut dictionary = ffmpeg::Dictionary::new();
        for (key, value) in options.entries() {
            dictionary.set(key, &value);
        }

        debug!("Attempting to open source: {}", locator);
        let input_context = ffmpeg::format::input_with_dictionary(&locator.to_string(), dictionary)
            .map_err(|source| StartupError::Open {
                locator: locator.to_string(),
                source,
            })?;

        let stream = input_context
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| StartupError::NoVideoStream(locator.to_string()))?;

        // Dimensions and format come from an opened decoder, which has
        // resolved what the container parameters left unset
        let decoder = open_decoder(&stream)?;
        let info = StreamInfo {
            index: stream.index(),
            width: decoder.width(),
            height: decoder.height(),
            format: decoder.format(),
            codec_name: stream.parameters().id().name(),
            frame_rate: stream.avg_frame_rate(),
            time_base: stream.time_base(),
        };

        info!(
            "Found video stream {}, resolution {}x{}, framerate {}/{}, codec name {}",
            info.index,
            info.width,
            info.height,
            info.frame_rate.numerator(),
            info.frame_rate.denominator(),
            info.codec_name
        );

        Ok(Self {
            input_context,
            info,
            decoder: Some(decoder),
        })
    }

    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    /// Hand out the decoder opened for the selected stream. There is only
    /// one, so a second call fails.
    pub fn decoder(&mut self) -> std::result::Result<VideoDecoder, StartupError> {
        let decoder = self
            .decoder
            .take()
            .ok_or(StartupError::Codec(ffmpeg::Error::DecoderNotFound))?;
        Ok(VideoDecoder {
            decoder,
            frame: ffmpeg::frame::Video::empty(),
        })
    }
}

fn open_decoder(
    stream: &ffmpeg::format::stream::Stream,
) -> std::result::Result<ffmpeg::codec::decoder::Video, StartupError> {
    ffmpeg::codec::context::Context::from_parameters(stream.parameters())
        .and_then(|context| context.decoder().video())
        .map_err(StartupError::Codec)
}

impl CompressedPacket for ffmpeg::Packet {
    fn stream_index(&self) -> usize {
        self.stream()
    }

    fn is_keyframe(&self) -> bool {
        self.is_key()
    }
}

impl PacketSource for MediaSource {
    type Packet = ffmpeg::Packet;

    fn read_packet(&mut self) -> Result<ReadStatus<ffmpeg::Packet>> {
        let mut packet = ffmpeg::Packet::empty();
        match packet.read(&mut self.input_context) {
            Ok(()) => Ok(ReadStatus::Packet(packet)),
            Err(ffmpeg::Error::Eof) => Ok(ReadStatus::EndOfStream),
            Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::ffi::EAGAIN => {
                Ok(ReadStatus::Again)
            }
            Err(e) => Err(ViewerError::Read(e)),
        }
    }
}

/// Video decoder holding the single reusable decode target
pub struct VideoDecoder {
    decoder: ffmpeg::codec::decoder::Video,
    frame: ffmpeg::frame::Video,
}

impl FrameDecoder<ffmpeg::Packet> for VideoDecoder {
    type Frame = ffmpeg::frame::Video;

    fn send_packet(&mut self, packet: &ffmpeg::Packet) -> Result<()> {
        self.decoder.send_packet(packet).map_err(ViewerError::Decode)
    }

    fn send_eof(&mut self) -> Result<()> {
        self.decoder.send_eof().map_err(ViewerError::Decode)
    }

    fn receive_frame(&mut self) -> Result<Option<&ffmpeg::frame::Video>> {
        match self.decoder.receive_frame(&mut self.frame) {
            Ok(()) => Ok(Some(&self.frame)),
            Err(ffmpeg::Error::Eof) => Ok(None),
            Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::ffi::EAGAIN => Ok(None),
            Err(e) => Err(ViewerError::Decode(e)),
        }
    }
}

/// Longest per-frame duration taken from the container; anything above is
/// treated as corrupt
pub const MAX_DECLARED_DURATION: Duration = Duration::from_secs(5);

/// Declared presentation duration of a decoded frame, converted from
/// `time_base` ticks. `None` when the container did not set one or set an
/// implausible value.
pub fn frame_duration(
    frame: &ffmpeg::frame::Video,
    time_base: ffmpeg::Rational,
) -> Option<Duration> {
    ticks_to_duration(frame.packet().duration, time_base)
}

fn ticks_to_duration(ticks: i64, time_base: ffmpeg::Rational) -> Option<Duration> {
    if ticks <= 0 || time_base.numerator() <= 0 || time_base.denominator() <= 0 {
        return None;
    }
    let seconds =
        ticks as f64 * f64::from(time_base.numerator()) / f64::from(time_base.denominator());
    match Duration::try_from_secs_f64(seconds) {
        Ok(duration) if duration <= MAX_DECLARED_DURATION => Some(duration),
        _ => {
            debug!("Ignoring declared frame duration of {} ticks", ticks);
            None
        }
    }
}
