//! Drawing a (possibly partial) fill as a raster image: a black canvas with a white square for
//! every writable cell and each assigned letter centered in its cell. Blocked cells stay black, and
//! the gap left around each white square draws the grid lines.

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use log::debug;
use std::fs;
use std::path::Path;

use crate::backtracking_search::Assignment;
use crate::error::{Error, Result};
use crate::grid_config::{letter_grid, GridConfig};
use crate::word_list::WordList;

/// Side length of a cell, in pixels.
pub const CELL_SIZE: u32 = 100;

/// Gap between the edge of a cell and its white interior, in pixels.
pub const CELL_BORDER: u32 = 2;

pub const FONT_SIZE: f32 = 80.0;

/// Where to look for a font when none is given explicitly.
const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/opentype/open-sans/OpenSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub struct Colors;

impl Colors {
    pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
}

/// Load a TrueType/OpenType font from a file.
pub fn load_font(path: &Path) -> Result<FontVec> {
    let bytes = fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    FontVec::try_from_vec(bytes).map_err(|_| Error::InvalidFont {
        path: path.to_path_buf(),
    })
}

/// Find a usable font in one of the usual system locations.
#[must_use]
pub fn load_system_font() -> Option<FontVec> {
    SYSTEM_FONT_PATHS.iter().find_map(|path| {
        let font = load_font(Path::new(path)).ok()?;
        debug!("Using font {path}");
        Some(font)
    })
}

/// Draw the grid with the letters of `assignment`. Without a font, only the cells are drawn.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn draw_grid_image(
    config: &GridConfig,
    word_list: &WordList,
    assignment: &Assignment,
    font: Option<&FontVec>,
) -> RgbImage {
    let (height, width) = config.dimensions();
    let mut image = RgbImage::from_pixel(
        width as u32 * CELL_SIZE,
        height as u32 * CELL_SIZE,
        Colors::BLACK,
    );
    let letters = letter_grid(config, word_list, assignment);
    let scale = PxScale::from(FONT_SIZE);

    for (row, line) in letters.iter().enumerate() {
        for (col, letter) in line.iter().enumerate() {
            if !config.is_active(row, col) {
                continue;
            }

            let x = col as u32 * CELL_SIZE;
            let y = row as u32 * CELL_SIZE;
            let interior = Rect::at((x + CELL_BORDER) as i32, (y + CELL_BORDER) as i32)
                .of_size(CELL_SIZE - 2 * CELL_BORDER, CELL_SIZE - 2 * CELL_BORDER);
            draw_filled_rect_mut(&mut image, interior, Colors::WHITE);

            if let (Some(letter), Some(font)) = (letter, font) {
                let text = letter.to_string();
                let (text_width, text_height) = text_size(scale, font, &text);
                draw_text_mut(
                    &mut image,
                    Colors::BLACK,
                    (x + CELL_SIZE.saturating_sub(text_width) / 2) as i32,
                    (y + CELL_SIZE.saturating_sub(text_height) / 2) as i32,
                    scale,
                    font,
                    &text,
                );
            }
        }
    }

    image
}

/// Draw the grid and write it to `path`; the format is chosen from the file extension.
pub fn save_grid_image(
    config: &GridConfig,
    word_list: &WordList,
    assignment: &Assignment,
    font: Option<&FontVec>,
    path: &Path,
) -> Result<()> {
    draw_grid_image(config, word_list, assignment, font).save(path)?;
    debug!("Saved grid image to {}", path.display());
    Ok(())
}
