use crate::converter::{CellColor, GlyphRow};
use crate::STATUS_PLACEHOLDER;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use log::debug;
use std::io::{stdout, Stdout, Write};

/// Writes encoded frames to the terminal, one flush per frame.
///
/// Screen preparation (clear, hide cursor) and restoration (show cursor,
/// trailing newline) each happen at most once per renderer.
pub struct TerminalRenderer<W: Write = Stdout> {
    out: W,
    frame_buf: Vec<u8>,
    prepared: bool,
    restored: bool,
    frames_rendered: u64,
}

impl TerminalRenderer<Stdout> {
    pub fn stdout() -> Self {
        Self::new(stdout())
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            frame_buf: Vec::new(),
            prepared: false,
            restored: false,
            frames_rendered: 0,
        }
    }

    /// Clear the screen and hide the cursor (first call only)
    pub fn prepare(&mut self) -> std::io::Result<()> {
        if self.prepared || self.restored {
            return Ok(());
        }
        self.prepared = true;
        queue!(self.out, Clear(ClearType::All), Hide)?;
        self.out.flush()?;
        debug!("Terminal prepared for rendering");
        Ok(())
    }

    /// Show the cursor again and end the line (first call only)
    pub fn restore(&mut self) -> std::io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        queue!(self.out, ResetColor, Print("\n"), Show)?;
        self.out.flush()?;
        debug!("Terminal restored after {} frames", self.frames_rendered);
        Ok(())
    }

    /// Serialize `rows` behind a cursor-home prefix and write them in one go
    pub fn draw(&mut self, rows: &[GlyphRow]) -> std::io::Result<()> {
        let buf = &mut self.frame_buf;
        buf.clear();
        queue!(buf, MoveTo(0, 0))?;

        for row in rows {
            let mut fg = None;
            let mut bg = None;
            for cell in &row.cells {
                if fg != Some(cell.fg) {
                    queue!(buf, SetForegroundColor(to_color(cell.fg)))?;
                    fg = Some(cell.fg);
                }
                if bg != Some(cell.bg) {
                    queue!(buf, SetBackgroundColor(to_color(cell.bg)))?;
                    bg = Some(cell.bg);
                }
                queue!(buf, Print(cell.glyph))?;
            }
            queue!(buf, ResetColor, Print("\n"))?;
        }
        queue!(buf, Print(STATUS_PLACEHOLDER))?;

        self.out.write_all(&self.frame_buf)?;
        self.out.flush()?;
        self.frames_rendered += 1;
        Ok(())
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn is_restored(&self) -> bool {
        self.restored
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }
}

impl<W: Write> Drop for TerminalRenderer<W> {
    fn drop(&mut self) {
        // Never leave the cursor hidden
        if self.prepared {
            let _ = self.restore();
        }
    }
}

fn to_color(color: CellColor) -> Color {
    match color {
        CellColor::Rgb { r, g, b } => Color::Rgb { r, g, b },
        CellColor::Indexed(index) => Color::AnsiValue(index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::Cell;
    use crate::HALF_BLOCK;

    const SHOW: &str = "\x1b[?25h";
    const HIDE: &str = "\x1b[?25l";

    fn output(renderer: &TerminalRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.get_ref().clone()).unwrap()
    }

    fn cell(fg: CellColor, bg: CellColor) -> Cell {
        Cell { fg, bg, glyph: HALF_BLOCK }
    }

    #[test]
    fn test_prepare_and_restore_once() {
        let mut renderer = TerminalRenderer::new(Vec::new());
        renderer.prepare().unwrap();
        renderer.prepare().unwrap();
        renderer.restore().unwrap();
        renderer.restore().unwrap();

        let text = output(&renderer);
        assert_eq!(text.matches("\x1b[2J").count(), 1);
        assert_eq!(text.matches(HIDE).count(), 1);
        assert_eq!(text.matches(SHOW).count(), 1);
        assert!(text.find(HIDE) < text.find(SHOW));
    }

    #[test]
    fn test_restore_without_prepare_still_shows_cursor() {
        let mut renderer = TerminalRenderer::new(Vec::new());
        renderer.restore().unwrap();
        renderer.prepare().unwrap();
        let text = output(&renderer);
        assert_eq!(text.matches(SHOW).count(), 1);
        assert!(!text.contains(HIDE));
    }

    #[test]
    fn test_truecolor_frame() {
        let red = CellColor::Rgb { r: 255, g: 0, b: 0 };
        let blue = CellColor::Rgb { r: 0, g: 0, b: 255 };
        let rows = vec![
            GlyphRow { cells: vec![cell(red, blue), cell(red, blue)] },
            GlyphRow { cells: vec![cell(blue, red)] },
        ];

        let mut renderer = TerminalRenderer::new(Vec::new());
        renderer.draw(&rows).unwrap();
        let text = output(&renderer);

        assert!(text.starts_with("\x1b[1;1H"));
        assert!(text.contains("\x1b[38;2;255;0;0m"));
        assert!(text.contains("\x1b[48;2;0;0;255m"));
        assert_eq!(text.matches(HALF_BLOCK).count(), 3);
        assert_eq!(text.matches('\n').count(), 2);
        assert!(text.ends_with(STATUS_PLACEHOLDER));
        // repeated colors within a row are not re-emitted
        assert_eq!(text.matches("\x1b[38;2;255;0;0m").count(), 1);
        assert_eq!(text.matches("\x1b[48;2;0;0;255m").count(), 1);
        assert_eq!(renderer.frames_rendered(), 1);
    }

    #[test]
    fn test_indexed_frame() {
        let rows = vec![GlyphRow {
            cells: vec![cell(CellColor::Indexed(232), CellColor::Indexed(255))],
        }];
        let mut renderer = TerminalRenderer::new(Vec::new());
        renderer.draw(&rows).unwrap();
        let text = output(&renderer);
        assert!(text.contains("\x1b[38;5;232m"));
        assert!(text.contains("\x1b[48;5;255m"));
    }

    /// Writer whose bytes outlive the renderer that owns it
    #[derive(Clone, Default)]
    struct SharedBuf(std::rc::Rc<std::cell::RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_panic_while_streaming_restores_cursor() {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let mut renderer = TerminalRenderer::new(writer);
            renderer.prepare().unwrap();
            panic!("frame failed mid-stream");
        }));
        assert!(result.is_err());

        let text = String::from_utf8(buf.0.borrow().clone()).unwrap();
        assert_eq!(text.matches(HIDE).count(), 1);
        assert!(text.ends_with(SHOW));
    }

    #[test]
    fn test_each_draw_is_one_self_contained_frame() {
        let rows = vec![GlyphRow {
            cells: vec![cell(CellColor::Indexed(240), CellColor::Indexed(240))],
        }];
        let mut renderer = TerminalRenderer::new(Vec::new());
        renderer.draw(&rows).unwrap();
        let first = output(&renderer);
        renderer.draw(&rows).unwrap();
        let both = output(&renderer);
        assert_eq!(both, format!("{first}{first}"));
    }
}
