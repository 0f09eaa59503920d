use std::time::Duration;

use crate::cli::Cli;
use crate::converter::EncodingMode;
use crate::geometry::TerminalSize;
use crate::sequencer::RetryPolicy;
use crate::StartupError;

/// Scheme prefixes that mark a locator as a network stream
const STREAM_PREFIXES: &[&str] = &["rtsp", "rtmp", "http"];

/// Demuxer options applied when opening a source
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpenOptions {
    /// Force interleaved RTSP over TCP instead of UDP
    pub tcp_transport: bool,
    /// Socket read/connect timeout, `None` when disabled or not a stream
    pub timeout: Option<Duration>,
}

impl OpenOptions {
    /// Options for `locator`: network streams get TCP transport and the
    /// timeout, local files get nothing
    pub fn for_locator(locator: &str, timeout_secs: u64) -> Self {
        if !is_stream(locator) {
            return Self::default();
        }
        Self {
            tcp_transport: true,
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        }
    }

    /// Flatten into ffmpeg dictionary entries.
    ///
    /// The timeout is written in microseconds under both the legacy RTSP key
    /// (`stimeout`) and the current one (`timeout`).
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = Vec::new();
        if self.tcp_transport {
            entries.push(("rtsp_transport", "tcp".to_string()));
            let micros = self.timeout.map_or(0, |t| t.as_micros());
            entries.push(("stimeout", micros.to_string()));
            entries.push(("timeout", micros.to_string()));
        }
        entries
    }
}

/// Whether `locator` names a network stream rather than a local path
pub fn is_stream(locator: &str) -> bool {
    STREAM_PREFIXES.iter().any(|prefix| {
        locator
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

/// Everything the pipeline needs, resolved once from the command line
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub source: String,
    pub mode: EncodingMode,
    pub open: OpenOptions,
    pub columns: Option<u16>,
    pub rows: Option<u16>,
    pub retry: RetryPolicy,
}

impl ViewerConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, StartupError> {
        cli.validate().map_err(StartupError::InvalidArgument)?;
        Ok(Self {
            source: cli.source.clone(),
            mode: cli.encoding_mode(),
            open: OpenOptions::for_locator(&cli.source, cli.timeout),
            columns: cli.width,
            rows: cli.height,
            retry: RetryPolicy::default(),
        })
    }

    /// Terminal size, querying the terminal once for whatever was not
    /// overridden on the command line
    pub fn terminal_size(&self) -> Result<TerminalSize, StartupError> {
        let (columns, rows) = match (self.columns, self.rows) {
            (Some(w), Some(h)) => (w, h),
            (w, h) => {
                let (queried_w, queried_h) =
                    crossterm::terminal::size().map_err(StartupError::Terminal)?;
                (w.unwrap_or(queried_w), h.unwrap_or(queried_h))
            }
        };
        Ok(TerminalSize { columns, rows })
    }
}
