//! Placeholder thumbnails
//!
//! Fixed-layout rasters drawn without any external capability, used when a file has
//! no faithful rendering or when its rendering is a text preview.

use image::{Rgb, RgbImage};
use std::path::Path;

use super::font::{self, GLYPH_HEIGHT};
use super::layout::{visible_line_tops, wrap_words};
use super::output::{write_jpeg, OutputError};
use crate::core::error::PlaceholderError;
use crate::core::types::ThumbnailSpec;
use crate::core::utils::truncate_with_ellipsis;

/// Caption of the default placeholder
pub const NO_PREVIEW_CAPTION: &str = "No Preview Available";

/// Body of the placeholder drawn for documents locked with a real password
pub const PASSWORD_CAPTION: &str = "Password Protected / Content Not Accessible";

const BACKGROUND: Rgb<u8> = Rgb([240, 240, 240]);
const BORDER: Rgb<u8> = Rgb([150, 150, 150]);
const ICON: Rgb<u8> = Rgb([120, 120, 120]);
const ICON_FILL: Rgb<u8> = Rgb([255, 255, 255]);
const TEXT: Rgb<u8> = Rgb([40, 40, 40]);
const CAPTION: Rgb<u8> = Rgb([110, 110, 110]);
const HEADER: Rgb<u8> = Rgb([52, 73, 94]);
const HEADER_TEXT: Rgb<u8> = Rgb([255, 255, 255]);

const BORDER_WIDTH: u32 = 2;
const PADDING: u32 = 6;
const HEADER_HEIGHT: u32 = 20;
const LINE_HEIGHT: u32 = GLYPH_HEIGHT + 3;

/// What a placeholder shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    /// Icon, file name and the fixed "No Preview Available" caption
    NoPreview { file_name: String },
    /// Title band over word-wrapped free text
    Text { title: String, body: String },
    /// Title band over pre-split preview lines, each starting on its own row
    Tabular { title: String, lines: Vec<String> },
}

impl Placeholder {
    pub fn no_preview(file_name: impl Into<String>) -> Self {
        Placeholder::NoPreview {
            file_name: file_name.into(),
        }
    }

    pub fn password_protected(file_name: impl Into<String>) -> Self {
        Placeholder::Text {
            title: file_name.into(),
            body: PASSWORD_CAPTION.to_string(),
        }
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Placeholder::NoPreview { .. } => "no-preview",
            Placeholder::Text { .. } => "text",
            Placeholder::Tabular { .. } => "tabular",
        }
    }
}

/// Draws placeholders at the thumbnail size
#[derive(Debug, Clone)]
pub struct PlaceholderRenderer {
    spec: ThumbnailSpec,
}

impl PlaceholderRenderer {
    pub fn new(spec: ThumbnailSpec) -> Self {
        Self { spec }
    }

    /// Draw a placeholder into a fresh canvas
    pub fn render(&self, placeholder: &Placeholder) -> RgbImage {
        let mut canvas = RgbImage::from_pixel(self.spec.width, self.spec.height, BACKGROUND);

        match placeholder {
            Placeholder::NoPreview { file_name } => self.draw_no_preview(&mut canvas, file_name),
            Placeholder::Text { title, body } => {
                let top = self.draw_header(&mut canvas, title);
                let lines = wrap_words(body, self.text_budget(), font::text_width);
                self.draw_lines(&mut canvas, &lines, top);
            }
            Placeholder::Tabular { title, lines } => {
                let top = self.draw_header(&mut canvas, title);
                let wrapped: Vec<String> = lines
                    .iter()
                    .flat_map(|line| wrap_words(line, self.text_budget(), font::text_width))
                    .collect();
                self.draw_lines(&mut canvas, &wrapped, top);
            }
        }

        self.draw_border(&mut canvas);
        canvas
    }

    /// Render and write a placeholder to `output`
    pub fn write(&self, placeholder: &Placeholder, output: &Path) -> Result<(), PlaceholderError> {
        let canvas = self.render(placeholder);
        write_jpeg(&canvas, self.spec.jpeg_quality, output).map_err(|e| match e {
            OutputError::Encode(err) => PlaceholderError::Encode {
                reason: err.to_string(),
            },
            OutputError::Io(source) => PlaceholderError::Write {
                path: output.to_path_buf(),
                source,
            },
        })
    }

    /// Horizontal space available for a line of text
    fn text_budget(&self) -> u32 {
        self.spec.width.saturating_sub(2 * (BORDER_WIDTH + PADDING))
    }

    fn draw_no_preview(&self, canvas: &mut RgbImage, file_name: &str) {
        let (width, height) = canvas.dimensions();

        // Document icon: page outline with a folded corner and a few text rules
        let icon_w = (width / 4).max(12);
        let icon_h = (height * 3 / 10).max(16);
        let icon_x = width.saturating_sub(icon_w) / 2;
        let icon_y = height / 6;
        let fold = icon_w / 4;

        fill_rect(canvas, icon_x, icon_y, icon_w, icon_h, ICON_FILL);
        outline_rect(canvas, icon_x, icon_y, icon_w, icon_h, ICON);
        for i in 0..fold {
            // clear the corner and draw the fold diagonal
            for j in 0..(fold - i) {
                put(canvas, icon_x + icon_w - 1 - j, icon_y + i, BACKGROUND);
            }
            put(canvas, icon_x + icon_w - 1 - (fold - i), icon_y + i, ICON);
            put(canvas, icon_x + icon_w - fold + i, icon_y + fold, ICON);
        }
        let rule_x = icon_x + icon_w / 5;
        let rule_w = icon_w * 3 / 5;
        let mut rule_y = icon_y + fold + icon_h / 8;
        while rule_y + 2 < icon_y + icon_h {
            fill_rect(canvas, rule_x, rule_y, rule_w, 1, ICON);
            rule_y += icon_h / 6;
        }

        let max_chars = font::chars_that_fit(self.text_budget());
        let name = truncate_with_ellipsis(file_name, max_chars);
        let name_y = icon_y + icon_h + height / 10;
        draw_centered(canvas, name_y, &name, TEXT);

        let caption = truncate_with_ellipsis(NO_PREVIEW_CAPTION, max_chars);
        draw_centered(canvas, name_y + 2 * LINE_HEIGHT, &caption, CAPTION);
    }

    /// Title band across the top; returns the first free row below it
    fn draw_header(&self, canvas: &mut RgbImage, title: &str) -> u32 {
        let width = canvas.width();
        fill_rect(canvas, 0, 0, width, HEADER_HEIGHT, HEADER);

        let max_chars = font::chars_that_fit(self.text_budget());
        let title = truncate_with_ellipsis(title, max_chars);
        let text_y = (HEADER_HEIGHT - GLYPH_HEIGHT) / 2;
        font::draw_text(
            canvas,
            (BORDER_WIDTH + PADDING) as i32,
            text_y as i32,
            &title,
            HEADER_TEXT,
        );

        HEADER_HEIGHT + PADDING
    }

    fn draw_lines(&self, canvas: &mut RgbImage, lines: &[String], top: u32) {
        let height = canvas.height();
        let x = (BORDER_WIDTH + PADDING) as i32;
        for (line, y) in lines
            .iter()
            .zip(visible_line_tops(lines.len(), top, LINE_HEIGHT, height))
        {
            font::draw_text(canvas, x, y as i32, line, TEXT);
        }
    }

    fn draw_border(&self, canvas: &mut RgbImage) {
        let (width, height) = canvas.dimensions();
        for s in 0..BORDER_WIDTH.min(width / 2).min(height / 2) {
            outline_rect(canvas, s, s, width - 2 * s, height - 2 * s, BORDER);
        }
    }
}

fn put(canvas: &mut RgbImage, x: u32, y: u32, color: Rgb<u8>) {
    if x < canvas.width() && y < canvas.height() {
        canvas.put_pixel(x, y, color);
    }
}

fn fill_rect(canvas: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    for py in y..y.saturating_add(h) {
        for px in x..x.saturating_add(w) {
            put(canvas, px, py, color);
        }
    }
}

fn outline_rect(canvas: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    if w == 0 || h == 0 {
        return;
    }
    for px in x..x + w {
        put(canvas, px, y, color);
        put(canvas, px, y + h - 1, color);
    }
    for py in y..y + h {
        put(canvas, x, py, color);
        put(canvas, x + w - 1, py, color);
    }
}

fn draw_centered(canvas: &mut RgbImage, y: u32, text: &str, color: Rgb<u8>) {
    let width = canvas.width() as i32;
    let x = (width - font::text_width(text) as i32) / 2;
    font::draw_text(canvas, x.max(0), y as i32, text, color);
}
