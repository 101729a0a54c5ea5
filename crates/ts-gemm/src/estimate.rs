use ts_device::DeviceConfig;
use ts_tile::TileGeometry;

/// Predicted accelerator cost of one multiplication.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Padded `(m, n, k)` the engine actually computes.
    pub padded: (usize, usize, usize),
    /// Kernel run length.
    pub ticks: u64,
    /// Useful multiply-adds over multiply-adds performed, in `(0, 1]`.
    pub efficiency: f64,
    /// Predicted kernel time in seconds at the configured clock.
    pub seconds: f64,
}

impl Estimate {
    pub fn new(geom: &TileGeometry, config: &DeviceConfig) -> Self {
        let ticks = geom.ticks();
        let useful = geom.m() as f64 * geom.n() as f64 * geom.k() as f64;
        // Each tick is a length-T dot product.
        let performed = ticks as f64 * geom.tile() as f64;
        let efficiency = if performed > 0.0 { useful / performed } else { 0.0 };

        // One extra tile of ticks covers the stream offset before the first result.
        let cycles = ticks as f64 + geom.tile_len() as f64;
        let seconds = cycles / (config.frequency_mhz as f64 * 1e6);

        Estimate {
            padded: geom.padded_dims(),
            ticks,
            efficiency,
            seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_fit_is_fully_efficient() {
        let g = TileGeometry::new(16, 32, 32, 32).unwrap();
        let e = Estimate::new(&g, &DeviceConfig::default());
        assert_eq!(e.padded, (32, 32, 32));
        assert_eq!(e.ticks, 8 * 256);
        assert_relative_eq!(e.efficiency, 1.0);
        assert_relative_eq!(e.seconds, (2048.0 + 256.0) / 150e6);
    }

    #[test]
    fn test_padding_lowers_efficiency() {
        let g = TileGeometry::new(16, 20, 18, 17).unwrap();
        let e = Estimate::new(&g, &DeviceConfig::default());
        assert_eq!(e.padded, (32, 32, 32));
        assert_relative_eq!(e.efficiency, (20.0 * 18.0 * 17.0) / (32.0 * 32.0 * 32.0));
    }

    #[test]
    fn test_empty_problem() {
        let g = TileGeometry::new(16, 0, 4, 4).unwrap();
        let e = Estimate::new(&g, &DeviceConfig::default());
        assert_eq!(e.ticks, 0);
        assert_eq!(e.efficiency, 0.0);
    }
}
