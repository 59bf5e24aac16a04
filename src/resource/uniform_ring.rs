//! A small pool of uniform buffers rotated across frames in flight.
//!
//! Each frame writes its [`StrokeUniforms`] into its own slot so the CPU never
//! overwrites a block the GPU is still reading. A [`FramePermits`] gate holds
//! one permit per slot: acquiring a slot takes a permit, and the GPU completion
//! callback gives it back through a [`FrameCompletion`] handle. When every slot
//! is in flight, [`UniformRingBuffer::acquire_next`] blocks.
//!
//! Completions arrive in submission order, so the slot at the cursor is always
//! the one freed longest ago.

use super::storage::{GpuStorage, HostStorage};
use crate::error::{GateClosed, SetupError};
use crate::light::{StrokeUniforms, STROKE_UNIFORMS_SIZE};
use crate::sync::FramePermits;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Configuration of a [`UniformRingBuffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UniformRingConfig {
    /// Number of slots, i.e. the maximum number of frames in flight.
    pub in_flight: usize,
}

impl Default for UniformRingConfig {
    fn default() -> Self {
        Self { in_flight: 3 }
    }
}

impl UniformRingConfig {
    /// Sets the number of frames in flight.
    pub fn with_in_flight(mut self, in_flight: usize) -> Self {
        self.in_flight = in_flight;
        self
    }

    /// Checks that at least one slot is requested.
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.in_flight == 0 {
            return Err(SetupError::InvalidConfig(
                "the uniform ring needs at least one slot".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lifecycle of one slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    /// Ready to be written.
    Free,
    /// The CPU is copying a uniform block into it.
    Writing,
    /// Handed to the GPU; freed by the next completion signal.
    Submitted,
}

/// A slot acquired for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformSlot {
    index: usize,
}

impl UniformSlot {
    /// Position of the slot in the ring.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Debug)]
struct SlotTable {
    states: Vec<SlotState>,
    // Oldest first.
    submitted: VecDeque<usize>,
}

#[derive(Debug)]
struct RingShared {
    permits: FramePermits,
    slots: Mutex<SlotTable>,
}

/// Handle given to the GPU completion callback.
///
/// Cloneable and `Send`, so it can be moved into
/// `wgpu::Queue::on_submitted_work_done` or any other callback.
#[derive(Clone, Debug)]
pub struct FrameCompletion {
    shared: Arc<RingShared>,
}

impl FrameCompletion {
    /// Marks the oldest submitted frame as done and frees its slot.
    pub fn signal(&self) {
        let freed = {
            let mut slots = self.shared.slots.lock();
            let freed = slots.submitted.pop_front();
            if let Some(index) = freed {
                slots.states[index] = SlotState::Free;
            }
            freed
        };

        match freed {
            Some(_) => self.shared.permits.release(),
            None => log::warn!("Frame completion signaled with no frame in flight."),
        }
    }

    /// Closes the gate: every blocked or future acquire fails with [`GateClosed`].
    pub fn close(&self) {
        self.shared.permits.close();
    }

    /// Number of frames submitted and not yet signaled.
    pub fn in_flight(&self) -> usize {
        self.shared.slots.lock().submitted.len()
    }
}

/// K uniform slots guarded by a K-permit gate.
///
/// Dropping the ring closes the gate.
pub struct UniformRingBuffer<S: GpuStorage> {
    storages: Vec<S>,
    cursor: usize,
    shared: Arc<RingShared>,
}

impl UniformRingBuffer<HostStorage> {
    /// A ring whose slots live in RAM.
    pub fn in_host_memory(config: UniformRingConfig) -> Result<Self, SetupError> {
        config.validate()?;
        Self::new(
            (0..config.in_flight)
                .map(|_| HostStorage::new(STROKE_UNIFORMS_SIZE))
                .collect(),
        )
    }
}

impl<S: GpuStorage> UniformRingBuffer<S> {
    /// Builds a ring over the given slot storages, one per frame in flight.
    pub fn new(storages: Vec<S>) -> Result<Self, SetupError> {
        if storages.is_empty() {
            return Err(SetupError::InvalidConfig(
                "the uniform ring needs at least one slot".to_string(),
            ));
        }
        if let Some(small) = storages
            .iter()
            .find(|s| s.capacity() < STROKE_UNIFORMS_SIZE as u64)
        {
            return Err(SetupError::InvalidConfig(format!(
                "uniform slot holds {} bytes, {} needed",
                small.capacity(),
                STROKE_UNIFORMS_SIZE
            )));
        }

        let count = storages.len();
        let shared = Arc::new(RingShared {
            permits: FramePermits::new(count),
            slots: Mutex::new(SlotTable {
                states: vec![SlotState::Free; count],
                submitted: VecDeque::with_capacity(count),
            }),
        });

        Ok(UniformRingBuffer {
            storages,
            cursor: 0,
            shared,
        })
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.storages.len()
    }

    /// Always `false`: a ring has at least one slot.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storages.is_empty()
    }

    /// A handle for the GPU completion callback.
    pub fn completion(&self) -> FrameCompletion {
        FrameCompletion {
            shared: self.shared.clone(),
        }
    }

    /// The storage backing slot `index`.
    pub fn slot_storage(&self, index: usize) -> Option<&S> {
        self.storages.get(index)
    }

    /// The state of slot `index`.
    pub fn slot_state(&self, index: usize) -> Option<SlotState> {
        self.shared.slots.lock().states.get(index).copied()
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.shared.permits.available()
    }

    /// Waits for a free slot, writes `uniforms` into it and marks it submitted.
    pub fn acquire_next(&mut self, uniforms: &StrokeUniforms) -> Result<UniformSlot, GateClosed> {
        self.shared.permits.acquire()?;
        Ok(self.fill_next(uniforms))
    }

    /// Like [`Self::acquire_next`] but returns `Ok(None)` instead of blocking.
    pub fn try_acquire_next(
        &mut self,
        uniforms: &StrokeUniforms,
    ) -> Result<Option<UniformSlot>, GateClosed> {
        if self.shared.permits.try_acquire()? {
            Ok(Some(self.fill_next(uniforms)))
        } else {
            Ok(None)
        }
    }

    /// Like [`Self::acquire_next`] but gives up after `timeout`.
    pub fn acquire_next_timeout(
        &mut self,
        uniforms: &StrokeUniforms,
        timeout: Duration,
    ) -> Result<Option<UniformSlot>, GateClosed> {
        if self.shared.permits.acquire_timeout(timeout)? {
            Ok(Some(self.fill_next(uniforms)))
        } else {
            Ok(None)
        }
    }

    /// Closes the gate and wakes every blocked acquirer.
    pub fn shutdown(&self) {
        log::info!("Shutting down uniform ring ({} slots).", self.len());
        self.shared.permits.close();
    }

    fn fill_next(&mut self, uniforms: &StrokeUniforms) -> UniformSlot {
        let index = self.cursor % self.storages.len();

        {
            let mut slots = self.shared.slots.lock();
            debug_assert_eq!(slots.states[index], SlotState::Free);
            slots.states[index] = SlotState::Writing;
        }

        self.storages[index].write(0, bytemuck::bytes_of(uniforms));

        {
            let mut slots = self.shared.slots.lock();
            slots.states[index] = SlotState::Submitted;
            slots.submitted.push_back(index);
        }

        self.cursor = (index + 1) % self.storages.len();
        UniformSlot { index }
    }
}

impl<S: GpuStorage> Drop for UniformRingBuffer<S> {
    fn drop(&mut self) {
        self.shared.permits.close();
    }
}
