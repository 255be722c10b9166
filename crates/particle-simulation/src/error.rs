use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or stepping a simulation backend.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid input or configuration rejected by the physics core.
    #[error(transparent)]
    Physics(#[from] particle_physics::Error),

    /// The CPU worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// No compatible GPU adapter.
    #[cfg(feature = "gpu")]
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    /// The adapter refused to open a device.
    #[cfg(feature = "gpu")]
    #[error("failed to open GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    /// Waiting on the device failed (lost device, timeout).
    #[cfg(feature = "gpu")]
    #[error("GPU poll failed: {0}")]
    Poll(#[from] wgpu::PollError),

    /// Mapping the staging buffer for a host readback failed.
    #[cfg(feature = "gpu")]
    #[error("GPU readback failed: {0}")]
    Readback(String),
}
