use crate::description::BuildDescription;
use crate::error::{DeviceError, Result};

/// Default stream transfer alignment in bytes.
pub const DEFAULT_STREAM_ALIGNMENT: usize = 16;

/// Static properties of an accelerator build.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    /// Edge length `T` of the square tiles the engine consumes and produces.
    pub tile_size: usize,
    /// Kernel clock in MHz. Used for throughput estimates only.
    pub frequency_mhz: u32,
    /// Every stream transfer must be a multiple of this many bytes.
    pub stream_alignment: usize,
}

impl DeviceConfig {
    /// Create and validate a configuration.
    pub fn new(tile_size: usize, frequency_mhz: u32, stream_alignment: usize) -> Result<Self> {
        let config = DeviceConfig {
            tile_size,
            frequency_mhz,
            stream_alignment,
        };
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration from build constants named `<prefix>_<key>`.
    ///
    /// Reads the following keys:
    /// - `<prefix>_tileSize` -> tile_size
    /// - `<prefix>_frequency` -> frequency_mhz
    /// - `<prefix>_PCIE_ALIGNMENT` -> stream_alignment (default 16)
    pub fn from_build(desc: &BuildDescription, prefix: &str) -> Result<Self> {
        let key = |name: &str| format!("{prefix}_{name}");

        let tile_size = desc.get_usize(&key("tileSize"))?;
        let frequency = desc.get_u64(&key("frequency"))?;
        let frequency_mhz = u32::try_from(frequency).map_err(|_| DeviceError::InvalidValue {
            key: key("frequency"),
            value: frequency.to_string(),
        })?;

        let alignment_key = key("PCIE_ALIGNMENT");
        let stream_alignment = if desc.contains(&alignment_key) {
            desc.get_usize(&alignment_key)?
        } else {
            DEFAULT_STREAM_ALIGNMENT
        };

        Self::new(tile_size, frequency_mhz, stream_alignment)
    }

    /// Elements in one tile.
    pub fn tile_len(&self) -> usize {
        self.tile_size * self.tile_size
    }

    /// Bytes in one tile of `f64`.
    pub fn tile_bytes(&self) -> usize {
        self.tile_len() * std::mem::size_of::<f64>()
    }

    fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(DeviceError::InvalidConfig("tile size must be > 0".to_string()));
        }
        if self.frequency_mhz == 0 {
            return Err(DeviceError::InvalidConfig("frequency must be > 0".to_string()));
        }
        if !self.stream_alignment.is_power_of_two() {
            return Err(DeviceError::InvalidConfig(format!(
                "stream alignment {} is not a power of two",
                self.stream_alignment
            )));
        }
        // Every transfer is a whole number of tiles, so one tile must be aligned.
        if self.tile_bytes() % self.stream_alignment != 0 {
            return Err(DeviceError::InvalidConfig(format!(
                "a {0}x{0} tile is {1} bytes, not a multiple of the {2}-byte stream alignment",
                self.tile_size,
                self.tile_bytes(),
                self.stream_alignment
            )));
        }
        Ok(())
    }
}

impl Default for DeviceConfig {
    /// The shipped DGEMM engine: 16x16 tiles at 150 MHz.
    fn default() -> Self {
        DeviceConfig {
            tile_size: 16,
            frequency_mhz: 150,
            stream_alignment: DEFAULT_STREAM_ALIGNMENT,
        }
    }
}
