//! Error types.
//!
//! Capacity overflow is reported through [`CapacityExceeded`] by the low-level
//! containers and turned into a silent drop by the stroke mesh. Setup failures
//! are fatal and surface as [`SetupError`] from constructors.

use thiserror::Error;

/// A fixed-capacity container could not take the requested elements.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("capacity exceeded: {requested} requested, {available} available")]
pub struct CapacityExceeded {
    /// Number of elements (or bytes, for GPU storage) the caller tried to write.
    pub requested: usize,
    /// Number of elements (or bytes) still free.
    pub available: usize,
}

/// The frame gate was closed during teardown.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("frame gate closed")]
pub struct GateClosed;

/// Errors raised while building the GPU-side resources of a stroke renderer.
#[derive(Error, Debug)]
pub enum SetupError {
    /// A configuration value is out of its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The requested buffer is larger than the device allows.
    #[error("buffer `{label}` needs {size} bytes but the device limit is {limit}")]
    BufferTooLarge {
        /// Debug label of the buffer.
        label: &'static str,
        /// Requested size in bytes.
        size: u64,
        /// Device maximum buffer size.
        limit: u64,
    },
    /// The device reported an error while creating resources.
    #[error("device error: {0}")]
    Device(#[from] wgpu::Error),
}

/// Errors raised while staging a frame for rendering.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The uniform pool was shut down while waiting for a slot.
    #[error(transparent)]
    GateClosed(#[from] GateClosed),
    /// The GPU storage is smaller than the mesh it must mirror.
    #[error("geometry upload failed: {0}")]
    Upload(#[from] CapacityExceeded),
}

/// Errors raised by the frame recorder.
#[derive(Error, Debug)]
pub enum RecordingError {
    /// `end` or `capture` was called while no recording is active.
    #[error("no recording in progress")]
    NotRecording,
    /// Reading the color attachment back from the GPU failed.
    #[error("texture readback failed: {0}")]
    Readback(String),
}
