//! Owned single-channel f32 image in row-major layout (stride == width).
//!
//! Pixel intensities are detector counts; derived profile and metric math
//! runs in f64. Provides the block-sum rebin and normalized 3×3 convolution
//! required by the uniformity analyses.
#[derive(Clone, Debug)]
pub struct ImageF32 {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Number of f32 elements between consecutive rows (equals `w`)
    pub stride: usize,
    /// Backing storage in row-major order
    pub data: Vec<f32>,
}

impl ImageF32 {
    /// Construct a zero-initialized buffer of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            stride: w,
            data: vec![0.0; w * h],
        }
    }

    /// Wrap an existing row-major buffer. Panics if the length is not `w × h`.
    pub fn from_vec(w: usize, h: usize, data: Vec<f32>) -> Self {
        assert_eq!(data.len(), w * h, "buffer length must equal w * h");
        Self {
            w,
            h,
            stride: w,
            data,
        }
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.stride + x
    }

    #[inline]
    /// Get the pixel value at (x, y).
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }

    #[inline]
    /// Set the pixel value at (x, y).
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    #[inline]
    /// Borrow row `y` as a slice.
    pub fn row(&self, y: usize) -> &[f32] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }

    /// Maximum pixel value, 0 for an empty image.
    pub fn max_value(&self) -> f32 {
        self.data.iter().copied().fold(0.0f32, f32::max)
    }

    /// Shrink by an integer factor, summing each `factor × factor` block.
    ///
    /// Trailing rows/columns that do not fill a whole block are discarded.
    pub fn block_sum_shrink(&self, factor: usize) -> ImageF32 {
        if factor <= 1 {
            return self.clone();
        }
        let nw = self.w / factor;
        let nh = self.h / factor;
        let mut out = ImageF32::new(nw, nh);
        for by in 0..nh {
            for bx in 0..nw {
                let mut acc = 0.0f32;
                for dy in 0..factor {
                    let row = self.row(by * factor + dy);
                    for dx in 0..factor {
                        acc += row[bx * factor + dx];
                    }
                }
                out.set(bx, by, acc);
            }
        }
        out
    }

    /// Convolve with a 3×3 kernel normalized by its coefficient sum,
    /// replicating the border.
    pub fn convolve3x3(&self, kernel: &[f32; 9]) -> ImageF32 {
        let norm: f32 = kernel.iter().sum();
        let norm = if norm != 0.0 { norm } else { 1.0 };
        let mut out = ImageF32::new(self.w, self.h);
        if self.w == 0 || self.h == 0 {
            return out;
        }
        for y in 0..self.h {
            for x in 0..self.w {
                let mut acc = 0.0f32;
                for ky in 0..3usize {
                    let sy = (y + ky).saturating_sub(1).min(self.h - 1);
                    for kx in 0..3usize {
                        let sx = (x + kx).saturating_sub(1).min(self.w - 1);
                        acc += kernel[ky * 3 + kx] * self.get(sx, sy);
                    }
                }
                out.set(x, y, acc / norm);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_sum_shrink_sums_blocks() {
        let img = ImageF32::from_vec(4, 4, (0..16).map(|v| v as f32).collect());
        let small = img.block_sum_shrink(2);
        assert_eq!((small.w, small.h), (2, 2));
        assert_eq!(small.get(0, 0), 0.0 + 1.0 + 4.0 + 5.0);
        assert_eq!(small.get(1, 1), 10.0 + 11.0 + 14.0 + 15.0);
    }

    #[test]
    fn convolve_preserves_flat_field() {
        let img = ImageF32::from_vec(5, 5, vec![7.0; 25]);
        let smooth = img.convolve3x3(&[1.0, 2.0, 1.0, 2.0, 4.0, 2.0, 1.0, 2.0, 1.0]);
        for v in &smooth.data {
            assert!((v - 7.0).abs() < 1e-5);
        }
    }
}
