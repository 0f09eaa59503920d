use crate::HALF_BLOCK;

/// First index of the 24-step grayscale ramp in the 256-color palette
pub const GRAY_RAMP_START: u8 = 232;

/// Number of steps in the grayscale ramp (232..=255)
pub const GRAY_RAMP_STEPS: u16 = 24;

/// How pixels are turned into terminal colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingMode {
    /// 24-bit `38;2;r;g;b` escapes
    Truecolor,
    /// 256-color indices from the grayscale ramp
    Grayscale,
}

/// A terminal color as emitted for one half of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellColor {
    Rgb { r: u8, g: u8, b: u8 },
    Indexed(u8),
}

/// One terminal cell: two vertically stacked pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Upper pixel
    pub fg: CellColor,
    /// Lower pixel
    pub bg: CellColor,
    pub glyph: char,
}

/// One terminal output row
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlyphRow {
    pub cells: Vec<Cell>,
}

/// Borrowed, stride-aware view over a packed pixel plane.
///
/// `stride` may exceed `width * channels` because of row alignment; the
/// padding is never read. Pixels that fall outside `data` read as black.
#[derive(Debug, Clone, Copy)]
pub struct PixelView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    stride: usize,
    channels: usize,
}

impl<'a> PixelView<'a> {
    pub fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        stride: usize,
        channels: usize,
    ) -> Self {
        Self {
            data,
            width,
            height,
            stride,
            channels: channels.max(1),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// RGB at `(x, y)`; single-channel planes are replicated to gray
    pub fn rgb(&self, x: usize, y: usize) -> (u8, u8, u8) {
        let offset = y * self.stride + x * self.channels;
        match self.data.get(offset..offset + self.channels) {
            Some(&[v]) => (v, v, v),
            Some(&[r, g, b, ..]) => (r, g, b),
            _ => (0, 0, 0),
        }
    }

    /// Luma at `(x, y)`: the sample itself for single-channel planes,
    /// BT.709 weighted for RGB
    pub fn luma(&self, x: usize, y: usize) -> u8 {
        if self.channels == 1 {
            let offset = y * self.stride + x;
            return self.data.get(offset).copied().unwrap_or(0);
        }
        let (r, g, b) = self.rgb(x, y);
        calculate_luminance(r, g, b)
    }
}

/// Pixel buffer to half-block glyph rows converter
#[derive(Debug, Clone, Copy)]
pub struct ColorEncoder {
    mode: EncodingMode,
}

impl ColorEncoder {
    pub fn new(mode: EncodingMode) -> Self {
        Self { mode }
    }

    /// Encode `view` into `height / 2` rows of `width` cells.
    ///
    /// Pixel rows `2y` and `2y + 1` become terminal row `y`. With an odd
    /// height the last pixel row has no partner and is not drawn.
    pub fn encode(&self, view: &PixelView<'_>) -> Vec<GlyphRow> {
        (0..view.height() / 2)
            .map(|y| GlyphRow {
                cells: (0..view.width())
                    .map(|x| Cell {
                        fg: self.color_at(view, x, 2 * y),
                        bg: self.color_at(view, x, 2 * y + 1),
                        glyph: HALF_BLOCK,
                    })
                    .collect(),
            })
            .collect()
    }

    fn color_at(&self, view: &PixelView<'_>, x: usize, y: usize) -> CellColor {
        match self.mode {
            EncodingMode::Truecolor => {
                let (r, g, b) = view.rgb(x, y);
                CellColor::Rgb { r, g, b }
            }
            EncodingMode::Grayscale => CellColor::Indexed(gray_level(view.luma(x, y))),
        }
    }
}

/// Map `0..=255` onto the 24 grayscale palette entries `232..=255`
pub fn gray_level(value: u8) -> u8 {
    let step = u16::from(value) * GRAY_RAMP_STEPS / 256;
    GRAY_RAMP_START + step as u8
}

/// Calculate luminance from RGB values (ITU-R BT.709 luma coefficients)
fn calculate_luminance(r: u8, g: u8, b: u8) -> u8 {
    let luminance = 0.2126 * f64::from(r) + 0.7152 * f64::from(g) + 0.0722 * f64::from(b);
    luminance.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `width x height` RGB plane with `padding` spare bytes per row
    fn rgb_plane(
        width: usize,
        height: usize,
        padding: usize,
        pixel: impl Fn(usize, usize) -> [u8; 3],
    ) -> (Vec<u8>, usize) {
        let stride = width * 3 + padding;
        let mut data = vec![0xEE; stride * height];
        for y in 0..height {
            for x in 0..width {
                let offset = y * stride + x * 3;
                data[offset..offset + 3].copy_from_slice(&pixel(x, y));
            }
        }
        (data, stride)
    }

    #[test]
    fn test_luminance_calculation() {
        assert_eq!(calculate_luminance(255, 255, 255), 255);
        assert_eq!(calculate_luminance(0, 0, 0), 0);

        let red_luma = calculate_luminance(255, 0, 0);
        assert!(red_luma < 255);
        assert!(red_luma > 0);
    }

    #[test]
    fn test_truecolor_pairs_rows() {
        let (data, stride) = rgb_plane(2, 2, 5, |x, y| [x as u8 * 100, y as u8 * 200, 7]);
        let view = PixelView::new(&data, 2, 2, stride, 3);
        let rows = ColorEncoder::new(EncodingMode::Truecolor).encode(&view);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells.len(), 2);
        let cell = rows[0].cells[1];
        assert_eq!(cell.fg, CellColor::Rgb { r: 100, g: 0, b: 7 });
        assert_eq!(cell.bg, CellColor::Rgb { r: 100, g: 200, b: 7 });
        assert_eq!(cell.glyph, HALF_BLOCK);
    }

    #[test]
    fn test_odd_height_drops_last_row() {
        let (data, stride) = rgb_plane(3, 5, 0, |_, _| [1, 2, 3]);
        let view = PixelView::new(&data, 3, 5, stride, 3);
        let rows = ColorEncoder::new(EncodingMode::Truecolor).encode(&view);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.cells.len() == 3));
    }

    #[test]
    fn test_stride_padding_is_not_read() {
        let (data, stride) = rgb_plane(1, 2, 13, |_, _| [10, 20, 30]);
        let view = PixelView::new(&data, 1, 2, stride, 3);
        let rows = ColorEncoder::new(EncodingMode::Truecolor).encode(&view);
        assert_eq!(rows[0].cells[0].bg, CellColor::Rgb { r: 10, g: 20, b: 30 });
    }

    #[test]
    fn test_encoding_is_pure() {
        let (data, stride) = rgb_plane(4, 4, 2, |x, y| [(x * 40) as u8, (y * 60) as u8, 90]);
        let view = PixelView::new(&data, 4, 4, stride, 3);
        for mode in [EncodingMode::Truecolor, EncodingMode::Grayscale] {
            let encoder = ColorEncoder::new(mode);
            assert_eq!(encoder.encode(&view), encoder.encode(&view));
        }
    }

    #[test]
    fn test_gray_ramp_extremes_and_monotonic() {
        assert_eq!(gray_level(0), 232);
        assert_eq!(gray_level(255), 255);
        let mut previous = gray_level(0);
        for value in 1..=255u8 {
            let level = gray_level(value);
            assert!(level >= previous);
            assert!((232..=255).contains(&level));
            previous = level;
        }
    }

    #[test]
    fn test_grayscale_single_channel_plane() {
        // 2x2 luma plane with 6 bytes of alignment padding per row
        let data = [0u8, 255, 9, 9, 9, 9, 9, 9, 128, 64, 9, 9, 9, 9, 9, 9];
        let view = PixelView::new(&data, 2, 2, 8, 1);
        let rows = ColorEncoder::new(EncodingMode::Grayscale).encode(&view);

        let cells = &rows[0].cells;
        assert_eq!(cells[0].fg, CellColor::Indexed(232));
        assert_eq!(cells[1].fg, CellColor::Indexed(255));
        assert_eq!(cells[0].bg, CellColor::Indexed(gray_level(128)));
        assert_eq!(cells[1].bg, CellColor::Indexed(gray_level(64)));
    }

    #[test]
    fn test_grayscale_from_rgb_plane() {
        let (data, stride) = rgb_plane(1, 2, 0, |_, y| {
            if y == 0 {
                [0, 0, 0]
            } else {
                [255, 255, 255]
            }
        });
        let view = PixelView::new(&data, 1, 2, stride, 3);
        let rows = ColorEncoder::new(EncodingMode::Grayscale).encode(&view);
        assert_eq!(rows[0].cells[0].fg, CellColor::Indexed(232));
        assert_eq!(rows[0].cells[0].bg, CellColor::Indexed(255));
    }

    #[test]
    fn test_short_buffer_reads_black() {
        let data = [50u8, 60, 70];
        let view = PixelView::new(&data, 1, 2, 3, 3);
        let rows = ColorEncoder::new(EncodingMode::Truecolor).encode(&view);
        assert_eq!(rows[0].cells[0].fg, CellColor::Rgb { r: 50, g: 60, b: 70 });
        assert_eq!(rows[0].cells[0].bg, CellColor::Rgb { r: 0, g: 0, b: 0 });
    }
}
