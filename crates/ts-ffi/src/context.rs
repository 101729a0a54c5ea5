use ts_gemm::{Limits, Session, SimAccelerator};

/// Opaque session handle: the simulated accelerator plus its scratch buffers.
pub struct TsSession {
    pub session: Session<SimAccelerator>,
}

impl TsSession {
    pub fn open(limits: Limits) -> ts_gemm::Result<Self> {
        Ok(Self {
            session: Session::open(SimAccelerator::new(), limits)?,
        })
    }
}
