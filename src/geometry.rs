//! Target raster size for a source video on a character grid.
//!
//! One terminal cell shows two stacked pixels, so a terminal of `C` columns
//! and `R - 1` usable rows (the last row holds the status line) is a
//! `C x 2(R - 1)` pixel canvas.

use crate::StartupError;

/// Terminal size in cells as reported by the terminal (or overridden)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub columns: u16,
    pub rows: u16,
}

impl TerminalSize {
    /// Rows left for the picture once the status line is reserved
    pub fn usable_rows(&self) -> u16 {
        self.rows.saturating_sub(1)
    }
}

/// Which terminal dimension limited the picture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    /// Video is relatively wider than the terminal: full width is used
    Width,
    /// Video is relatively taller than the terminal: full height is used
    Height,
}

/// Resampling target in pixels, fixed for the lifetime of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetGeometry {
    pub width: u32,
    pub height: u32,
    pub fit: Fit,
}

impl TargetGeometry {
    /// Number of terminal rows the picture occupies; an odd last pixel row
    /// is dropped
    pub fn glyph_rows(&self) -> u32 {
        self.height / 2
    }
}

/// Reject inputs that `resolve` is not defined for
pub fn check_inputs(
    terminal: TerminalSize,
    video_width: u32,
    video_height: u32,
) -> Result<(), StartupError> {
    if terminal.columns == 0 || terminal.usable_rows() == 0 {
        return Err(StartupError::Geometry(format!(
            "terminal {}x{} has no room for a picture",
            terminal.columns, terminal.rows
        )));
    }
    if video_width == 0 || video_height == 0 {
        return Err(StartupError::Geometry(format!(
            "video reports {}x{}",
            video_width, video_height
        )));
    }
    Ok(())
}

/// Compute the target raster for a `video_width x video_height` source.
///
/// Inputs must have passed [`check_inputs`]. The comparison
/// `C / (R-1) <= 2W / H` is done on integers, so the branch choice is exact.
pub fn resolve(terminal: TerminalSize, video_width: u32, video_height: u32) -> TargetGeometry {
    let columns = u64::from(terminal.columns);
    let rows = u64::from(terminal.usable_rows());
    let (w, h) = (u64::from(video_width), u64::from(video_height));

    let (width, height, fit) = if columns * h <= 2 * w * rows {
        (columns, h * columns / w, Fit::Width)
    } else {
        let height = 2 * rows;
        (w * height / h, height, Fit::Height)
    };

    TargetGeometry {
        width: clamp_dimension(width),
        height: clamp_dimension(height),
        fit,
    }
}

fn clamp_dimension(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(columns: u16, rows: u16) -> TerminalSize {
        TerminalSize { columns, rows }
    }

    #[test]
    fn test_full_hd_on_100x40() {
        let target = resolve(term(100, 40), 1920, 1080);
        assert_eq!(target.fit, Fit::Width);
        assert_eq!(target.width, 100);
        assert_eq!(target.height, 56);
        assert_eq!(target.glyph_rows(), 28);
    }

    #[test]
    fn test_portrait_video_fits_height() {
        let target = resolve(term(100, 40), 1080, 1920);
        assert_eq!(target.fit, Fit::Height);
        assert_eq!(target.height, 78);
        // floor(1080 / 1920 * 78) = 43
        assert_eq!(target.width, 43);
    }

    #[test]
    fn test_equal_ratio_takes_width_branch() {
        // 80 / 20 == 2 * 200 / 100
        let target = resolve(term(80, 21), 200, 100);
        assert_eq!(target.fit, Fit::Width);
        assert_eq!((target.width, target.height), (80, 40));
    }

    #[test]
    fn test_output_stays_positive_and_inside_terminal() {
        for &(columns, rows) in &[(1u16, 2u16), (80, 24), (211, 57), (40, 120)] {
            for &(w, h) in &[(1u32, 1u32), (1920, 1080), (640, 480), (90, 1600), (4000, 3)] {
                let terminal = term(columns, rows);
                let target = resolve(terminal, w, h);
                assert!(target.width > 0 && target.height > 0);
                assert!(target.width <= u32::from(columns));
                assert!(
                    target.height <= 2 * u32::from(terminal.usable_rows()) || target.height == 1
                );
            }
        }
    }

    #[test]
    fn test_aspect_ratio_preserved_within_rounding() {
        let target = resolve(term(100, 40), 1920, 1080);
        // width branch: h = floor(H/W * w), so H/W * w - h is in [0, 1)
        let exact = 1080.0 / 1920.0 * f64::from(target.width);
        assert!(exact - f64::from(target.height) < 1.0);

        let target = resolve(term(200, 30), 720, 1280);
        let exact = 720.0 / 1280.0 * f64::from(target.height);
        assert!(exact - f64::from(target.width) < 1.0);
    }

    #[test]
    fn test_check_inputs() {
        assert!(check_inputs(term(80, 24), 640, 480).is_ok());
        assert!(check_inputs(term(0, 24), 640, 480).is_err());
        assert!(check_inputs(term(80, 1), 640, 480).is_err());
        assert!(check_inputs(term(80, 24), 0, 480).is_err());
        assert!(check_inputs(term(80, 24), 640, 0).is_err());
    }
}
