use clap::Parser;

use crate::converter::EncodingMode;
use crate::DEFAULT_STREAM_TIMEOUT_SECS;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Video file path or stream URL (rtsp://, rtmp://, http(s)://)
    #[arg(required = true, value_name = "SOURCE")]
    pub source: String,

    /// Color encoding (auto, truecolor, grayscale)
    #[arg(short, long, default_value = "auto")]
    pub mode: ColorChoice,

    /// Read/connect timeout for network streams in seconds (0 disables)
    #[arg(short, long, default_value_t = DEFAULT_STREAM_TIMEOUT_SECS, value_name = "SECONDS")]
    pub timeout: u64,

    /// Set terminal width (override automatic detection)
    #[arg(short, long)]
    pub width: Option<u16>,

    /// Set terminal height (override automatic detection)
    #[arg(long)]
    pub height: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Show video stream information only (don't play)
    #[arg(long)]
    pub info_only: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorChoice {
    /// Truecolor when COLORTERM advertises it, grayscale otherwise
    Auto,
    /// 24-bit color half blocks
    Truecolor,
    /// 256-color grayscale ramp half blocks
    Grayscale,
}

impl ColorChoice {
    /// Pick the encoding, consulting the `COLORTERM` value for `Auto`
    pub fn resolve(self, colorterm: Option<&str>) -> EncodingMode {
        match self {
            ColorChoice::Truecolor => EncodingMode::Truecolor,
            ColorChoice::Grayscale => EncodingMode::Grayscale,
            ColorChoice::Auto => match colorterm.map(str::trim) {
                Some(value)
                    if value.eq_ignore_ascii_case("truecolor")
                        || value.eq_ignore_ascii_case("24bit") =>
                {
                    EncodingMode::Truecolor
                }
                _ => EncodingMode::Grayscale,
            },
        }
    }
}

impl Cli {
    /// Validate command line arguments
    pub fn validate(&self) -> Result<(), String> {
        if self.source.trim().is_empty() {
            return Err("No video or URL provided".to_string());
        }

        // Validate terminal dimensions
        if let Some(width) = self.width {
            if width == 0 {
                return Err("Terminal width must be greater than 0".to_string());
            }
        }

        if let Some(height) = self.height {
            if height < 2 {
                return Err("Terminal height must be at least 2 rows".to_string());
            }
        }

        Ok(())
    }

    /// Encoding mode after resolving `auto` against the environment
    pub fn encoding_mode(&self) -> EncodingMode {
        let colorterm = std::env::var("COLORTERM").ok();
        self.mode.resolve(colorterm.as_deref())
    }
}
