//! Browser session abstraction used for best-effort screenshots.
//!
//! The reporting pipeline only ever borrows a session for the duration of a
//! single screenshot call. Two implementations live here:
//! - the `BrowserSession` trait, which a WebDriver client implements
//! - `MockPage`, an in-memory page rendered into a framebuffer (demos and tests)

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{ImageBuffer, RgbImage};
use std::fs;
use std::io::Cursor;
use std::path::Path;

use super::types::{SnapshotError, SnapshotResult};

/// Height of one rendered text line in pixels
const LINE_HEIGHT: u32 = 12;
/// Left/top padding for page content in pixels
const PAGE_MARGIN: u32 = 8;

/// A live browser session that can render its current viewport
///
/// Implementations provide:
/// - `screenshot_png()` returning the encoded viewport
/// - `save_screenshot()` writing it to disk; drivers whose native call reports
///   success as a boolean override this and return `Ok(false)` on refusal
pub trait BrowserSession {
    /// Render the current viewport as PNG bytes
    fn screenshot_png(&mut self) -> SnapshotResult<Vec<u8>>;

    /// Get the source type identifier (e.g., "chrome", "mock")
    fn source_type(&self) -> &str;

    /// Save the current viewport to `path`, returning whether a file was written
    fn save_screenshot(&mut self, path: &Path) -> SnapshotResult<bool> {
        let png = self.screenshot_png()?;
        fs::write(path, png)?;
        Ok(true)
    }
}

/// An in-memory stand-in for a browser page
///
/// Keeps a URL, a heading and body lines, and renders them into an RGB
/// framebuffer with font8x8 glyphs whenever a screenshot is taken. The
/// drawing primitives are public so fixtures can paint arbitrary content.
#[derive(Debug, Clone)]
pub struct MockPage {
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// RGB pixel buffer (row-major, 3 bytes per pixel)
    buffer: Vec<u8>,
    /// Current URL
    url: String,
    /// Page heading
    heading: String,
    /// Body text, one entry per line
    body: Vec<String>,
}

/// Bytes needed for an RGB buffer of the given size
fn buffer_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}

impl MockPage {
    /// Create a blank white page with the given viewport size
    pub fn new(width: u32, height: u32) -> Self {
        let mut page = Self {
            width,
            height,
            buffer: vec![0u8; buffer_len(width, height)],
            url: "about:blank".to_string(),
            heading: String::new(),
            body: Vec::new(),
        };
        page.fill([255, 255, 255]);
        page
    }

    /// Create a page already pointing at `url`
    pub fn at(width: u32, height: u32, url: impl Into<String>) -> Self {
        let mut page = Self::new(width, height);
        page.url = url.into();
        page
    }

    /// Navigate to a new URL, clearing heading and body
    pub fn navigate(&mut self, url: impl Into<String>) {
        self.url = url.into();
        self.heading.clear();
        self.body.clear();
    }

    /// Current URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Set the page heading
    pub fn set_heading(&mut self, heading: impl Into<String>) {
        self.heading = heading.into();
    }

    /// Append a line of body text
    pub fn push_line(&mut self, line: impl Into<String>) {
        self.body.push(line.into());
    }

    /// Visible text content (heading followed by body lines)
    pub fn text(&self) -> String {
        let mut lines = Vec::with_capacity(self.body.len() + 1);
        if !self.heading.is_empty() {
            lines.push(self.heading.as_str());
        }
        lines.extend(self.body.iter().map(String::as_str));
        lines.join("\n")
    }

    /// Number of body lines, the mock's analogue of an element count
    pub fn line_count(&self) -> usize {
        self.body.len()
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Fill the entire framebuffer with a color
    pub fn fill(&mut self, color: [u8; 3]) {
        for chunk in self.buffer.chunks_exact_mut(3) {
            chunk.copy_from_slice(&color);
        }
    }

    /// Draw a filled rectangle
    pub fn draw_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
        for py in y..(y + h).min(self.height) {
            for px in x..(x + w).min(self.width) {
                self.set_pixel(px, py, color);
            }
        }
    }

    /// Draw text using font8x8 glyphs
    ///
    /// Each character is 8x8 pixels. Text does not wrap.
    pub fn draw_text(&mut self, x: u32, y: u32, text: &str, fg: [u8; 3], bg: [u8; 3]) {
        let mut cursor_x = x;
        for ch in text.chars() {
            if cursor_x >= self.width {
                break;
            }
            self.draw_char(cursor_x, y, ch, fg, bg);
            cursor_x += 8;
        }
    }

    fn draw_char(&mut self, x: u32, y: u32, ch: char, fg: [u8; 3], bg: [u8; 3]) {
        let glyph = BASIC_FONTS.get(ch).unwrap_or([0u8; 8]);
        for (row_idx, row) in glyph.iter().enumerate() {
            let py = y + row_idx as u32;
            if py >= self.height {
                break;
            }
            for bit in 0..8 {
                let px = x + bit;
                if px >= self.width {
                    break;
                }
                // font8x8 stores LSB as leftmost pixel
                let color = if (row >> bit) & 1 == 1 { fg } else { bg };
                self.set_pixel(px, py, color);
            }
        }
    }

    /// Get the color of a pixel
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0];
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        [self.buffer[idx], self.buffer[idx + 1], self.buffer[idx + 2]]
    }

    /// Set the color of a pixel
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.buffer[idx..idx + 3].copy_from_slice(&color);
    }

    /// Repaint the framebuffer from the page model: URL bar, heading, body
    pub fn render(&mut self) {
        let white = [255, 255, 255];
        let bar = [230, 230, 230];
        let ink = [17, 17, 17];

        self.fill(white);
        self.draw_rect(0, 0, self.width, LINE_HEIGHT + PAGE_MARGIN, bar);
        let url = self.url.clone();
        self.draw_text(PAGE_MARGIN, PAGE_MARGIN / 2, &url, ink, bar);

        let mut y = LINE_HEIGHT + PAGE_MARGIN * 2;
        let heading = self.heading.clone();
        if !heading.is_empty() {
            self.draw_text(PAGE_MARGIN, y, &heading, [31, 58, 147], white);
            y += LINE_HEIGHT * 2;
        }
        for line in self.body.clone() {
            if y >= self.height {
                break;
            }
            self.draw_text(PAGE_MARGIN, y, &line, ink, white);
            y += LINE_HEIGHT;
        }
    }

    fn to_image(&self) -> SnapshotResult<RgbImage> {
        ImageBuffer::from_raw(self.width, self.height, self.buffer.clone()).ok_or_else(|| {
            SnapshotError::Capture(format!(
                "framebuffer does not match {}x{}",
                self.width, self.height
            ))
        })
    }

    /// Encode the framebuffer as PNG bytes without repainting
    pub fn to_png(&self) -> SnapshotResult<Vec<u8>> {
        let img = self.to_image()?;
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        Ok(bytes)
    }
}

impl BrowserSession for MockPage {
    fn screenshot_png(&mut self) -> SnapshotResult<Vec<u8>> {
        self.render();
        self.to_png()
    }

    fn source_type(&self) -> &str {
        "mock"
    }
}
