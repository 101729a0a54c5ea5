use ts_gemm::GemmError;

/// Status codes returned by all FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TsStatus {
    Ok = 0,
    ErrorInvalidArgument = 1,
    ErrorLimits = 2,
    ErrorDevice = 3,
    ErrorInternal = 4,
}

impl From<&GemmError> for TsStatus {
    fn from(err: &GemmError) -> Self {
        match err {
            GemmError::ExceedsLimits { .. } | GemmError::ScratchTooLarge { .. } => TsStatus::ErrorLimits,
            GemmError::Tile(_) => TsStatus::ErrorInvalidArgument,
            GemmError::Device(_) | GemmError::Poisoned => TsStatus::ErrorDevice,
            GemmError::SlotBusy(_) | GemmError::SlotIdle(_) | GemmError::MissingOutput(_) => {
                TsStatus::ErrorInternal
            }
        }
    }
}
