use phantom_qc::ImageF32;

/// Generates a uniform flood disc on a dark background.
pub fn flood_disc(size: usize, radius: f64, level: f32) -> ImageF32 {
    assert!(size > 0, "image size must be positive");
    let mut img = ImageF32::new(size, size);
    let c = size as f64 / 2.0;
    for y in 0..size {
        for x in 0..size {
            let dx = x as f64 - c;
            let dy = y as f64 - c;
            if (dx * dx + dy * dy).sqrt() <= radius {
                img.set(x, y, level);
            }
        }
    }
    img
}

/// Two vertical line sources blurred with a Gaussian point-spread of the
/// given σ (in pixels), centered at columns `c1` and `c2`.
pub fn two_bar_phantom(w: usize, h: usize, c1: f64, c2: f64, sigma: f64) -> ImageF32 {
    assert!(sigma > 0.0, "blur width must be positive");
    let mut img = ImageF32::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let g = |c: f64| {
                let t = x as f64 - c;
                (-t * t / (2.0 * sigma * sigma)).exp()
            };
            img.set(x, y, (1000.0 * (g(c1) + g(c2))) as f32);
        }
    }
    img
}

/// Horizontal line sources every `spacing` rows, blurred with σ.
pub fn line_grid(w: usize, h: usize, spacing: usize, sigma: f64) -> ImageF32 {
    assert!(spacing > 1, "line spacing must exceed one pixel");
    let mut img = ImageF32::new(w, h);
    for y in 0..h {
        let mut v = 0.0f64;
        let mut line = spacing;
        while line < h {
            let t = y as f64 - line as f64;
            v += 1000.0 * (-t * t / (2.0 * sigma * sigma)).exp();
            line += spacing;
        }
        for x in 0..w {
            img.set(x, y, v as f32);
        }
    }
    img
}
