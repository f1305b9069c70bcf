use phantom_qc::analyses::planar_uniformity;
use phantom_qc::ImageF32;

fn main() {
    // Demo stub: builds a synthetic flood disc and scores its uniformity
    let size = 128usize;
    let mut image = ImageF32::new(size, size);
    let c = size as f64 / 2.0;
    for y in 0..size {
        for x in 0..size {
            let dx = x as f64 - c;
            let dy = y as f64 - c;
            if (dx * dx + dy * dy).sqrt() <= 56.0 {
                image.set(x, y, 100.0);
            }
        }
    }

    match planar_uniformity(&image) {
        Ok(m) => println!(
            "UFOV IU={:.2}% DU={:.2}%  CFOV IU={:.2}% DU={:.2}%",
            m.ufov.integral_pct, m.ufov.differential_pct, m.cfov.integral_pct, m.cfov.differential_pct
        ),
        Err(err) => eprintln!("analysis failed: {err}"),
    }
}
