use image::{imageops, RgbaImage};

pub const CANVAS_SIZE: u32 = 320;

/// Offset that centers `len` inside `canvas_len`, rounded towards negative
/// infinity so odd oversized images lose their extra column on the left/top.
pub fn center_offset(canvas_len: u32, len: u32) -> i64 {
    (i64::from(canvas_len) - i64::from(len)).div_euclid(2)
}

/// Places `img` unscaled in the middle of a transparent `canvas_w`x`canvas_h`
/// canvas. Pixels are copied as-is (including alpha) and anything falling
/// outside the canvas is clipped.
pub fn center_on_canvas(img: &RgbaImage, canvas_w: u32, canvas_h: u32) -> RgbaImage {
    let mut canvas = RgbaImage::new(canvas_w, canvas_h);
    let x = center_offset(canvas_w, img.width());
    let y = center_offset(canvas_h, img.height());
    imageops::replace(&mut canvas, img, x, y);
    canvas
}

pub fn apply_canvas(img: &RgbaImage) -> RgbaImage {
    center_on_canvas(img, CANVAS_SIZE, CANVAS_SIZE)
}
