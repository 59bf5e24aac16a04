//! Screen recording of the composited view.
//!
//! A [`FrameRecorder`] hands captured frames to a [`FrameSink`] (a video
//! encoder, a network stream, or [`MemorySink`]). The render loop must never
//! stall on the sink: when the sink is still busy after a few short polls the
//! frame is dropped and counted.

use crate::context::Context;
use crate::error::RecordingError;
use image::{ImageBuffer, Rgba};
use std::thread;
use std::time::{Duration, Instant};

/// An RGBA8 frame, top row first.
pub type FrameImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// Consumer of recorded frames.
pub trait FrameSink {
    /// Can the sink take a frame right now?
    fn is_ready_for_more_data(&self) -> bool;

    /// Takes a frame. `elapsed` is the recording time, pauses excluded.
    fn push_frame(&mut self, frame: FrameImage, elapsed: Duration);
}

/// A sink keeping every frame in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    frames: Vec<(FrameImage, Duration)>,
    limit: Option<usize>,
}

impl MemorySink {
    pub fn new() -> MemorySink {
        MemorySink::default()
    }

    /// A sink that stops being ready once it holds `limit` frames.
    pub fn with_limit(limit: usize) -> MemorySink {
        MemorySink {
            frames: Vec::new(),
            limit: Some(limit),
        }
    }

    pub fn frames(&self) -> &[(FrameImage, Duration)] {
        &self.frames
    }

    /// Drops the stored frames, making room again.
    pub fn take_frames(&mut self) -> Vec<(FrameImage, Duration)> {
        std::mem::take(&mut self.frames)
    }
}

impl FrameSink for MemorySink {
    fn is_ready_for_more_data(&self) -> bool {
        self.limit.map_or(true, |limit| self.frames.len() < limit)
    }

    fn push_frame(&mut self, frame: FrameImage, elapsed: Duration) {
        self.frames.push((frame, elapsed));
    }
}

/// Configuration for frame recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordingConfig {
    /// Record every Nth frame. Set to 1 to record every frame,
    /// 2 to record every other frame, etc.
    /// Default: 1
    pub frame_skip: u32,
    /// How many times the sink is polled before the frame is dropped.
    pub ready_poll_attempts: u32,
    /// Sleep between two polls.
    pub ready_poll_interval: Duration,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            frame_skip: 1,
            ready_poll_attempts: 10,
            ready_poll_interval: Duration::from_micros(100),
        }
    }
}

impl RecordingConfig {
    /// Creates a new recording config with default settings (every frame).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how many frames to skip between captures.
    /// 1 = every frame, 2 = every other frame, etc.
    pub fn with_frame_skip(mut self, skip: u32) -> Self {
        self.frame_skip = skip.max(1);
        self
    }

    /// Sets how long to wait for a busy sink.
    pub fn with_ready_poll(mut self, attempts: u32, interval: Duration) -> Self {
        self.ready_poll_attempts = attempts;
        self.ready_poll_interval = interval;
        self
    }
}

/// Counters of a finished recording.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecordingStats {
    /// Frames handed to the sink.
    pub recorded: u64,
    /// Frames dropped because the sink was busy.
    pub dropped: u64,
    /// Frames left out by `frame_skip`.
    pub skipped: u64,
    /// Recording time, pauses excluded.
    pub duration: Duration,
}

struct Session {
    started: Instant,
    paused_at: Option<Instant>,
    paused_total: Duration,
    frame_counter: u64,
    stats: RecordingStats,
}

impl Session {
    fn elapsed(&self, now: Instant) -> Duration {
        let pause = self
            .paused_at
            .map_or(Duration::ZERO, |at| now.saturating_duration_since(at));
        now.saturating_duration_since(self.started)
            .saturating_sub(self.paused_total + pause)
    }
}

/// Feeds rendered frames to a [`FrameSink`] without blocking the render loop.
pub struct FrameRecorder<S: FrameSink> {
    sink: S,
    config: RecordingConfig,
    session: Option<Session>,
}

impl<S: FrameSink> FrameRecorder<S> {
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, RecordingConfig::default())
    }

    pub fn with_config(sink: S, config: RecordingConfig) -> Self {
        FrameRecorder {
            sink,
            config,
            session: None,
        }
    }

    /// Starts a recording. Restarts it if one is already running.
    pub fn begin(&mut self) {
        if self.session.is_some() {
            log::warn!("Recording restarted; previous frames stay in the sink.");
        }
        self.session = Some(Session {
            started: Instant::now(),
            paused_at: None,
            paused_total: Duration::ZERO,
            frame_counter: 0,
            stats: RecordingStats::default(),
        });
        log::info!(
            "Recording started (every {} frame(s)).",
            self.config.frame_skip
        );
    }

    /// Suspends capture. The paused time is not counted in timestamps.
    pub fn pause(&mut self) {
        if let Some(session) = &mut self.session {
            if session.paused_at.is_none() {
                session.paused_at = Some(Instant::now());
            }
        }
    }

    pub fn resume(&mut self) {
        if let Some(session) = &mut self.session {
            if let Some(at) = session.paused_at.take() {
                session.paused_total += at.elapsed();
            }
        }
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.session
            .as_ref()
            .map_or(false, |s| s.paused_at.is_some())
    }

    /// Stops the recording and returns its counters.
    pub fn end(&mut self) -> Result<RecordingStats, RecordingError> {
        let session = self.session.take().ok_or(RecordingError::NotRecording)?;
        let mut stats = session.stats;
        stats.duration = session.elapsed(Instant::now());
        log::info!(
            "Recording ended: {} frames recorded, {} dropped.",
            stats.recorded,
            stats.dropped
        );
        Ok(stats)
    }

    /// Offers the current frame.
    ///
    /// `capture` is only called when the frame will actually be recorded.
    /// Returns `Ok(false)` when the frame was paused out, skipped or dropped.
    pub fn offer_frame<F>(&mut self, capture: F) -> Result<bool, RecordingError>
    where
        F: FnOnce() -> Result<FrameImage, RecordingError>,
    {
        let session = self.session.as_mut().ok_or(RecordingError::NotRecording)?;
        if session.paused_at.is_some() {
            return Ok(false);
        }

        let index = session.frame_counter;
        session.frame_counter += 1;
        if index % self.config.frame_skip.max(1) as u64 != 0 {
            session.stats.skipped += 1;
            return Ok(false);
        }

        let mut ready = self.sink.is_ready_for_more_data();
        let mut attempts = 0;
        while !ready && attempts < self.config.ready_poll_attempts {
            thread::sleep(self.config.ready_poll_interval);
            ready = self.sink.is_ready_for_more_data();
            attempts += 1;
        }

        if !ready {
            session.stats.dropped += 1;
            log::debug!("Sink busy, dropped frame {}.", index);
            return Ok(false);
        }

        let frame = capture()?;
        let elapsed = session.elapsed(Instant::now());
        self.sink.push_frame(frame, elapsed);
        session.stats.recorded += 1;
        Ok(true)
    }

    /// Counters of the running recording.
    pub fn stats(&self) -> Option<RecordingStats> {
        self.session.as_ref().map(|s| s.stats)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Reads a color texture back from the GPU.
///
/// The texture needs `COPY_SRC` usage and an 8-bit RGBA or BGRA format.
pub fn capture_texture(ctxt: &Context, texture: &wgpu::Texture) -> Result<FrameImage, RecordingError> {
    let format = texture.format();
    let is_bgra = match format {
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => true,
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => false,
        other => {
            return Err(RecordingError::Readback(format!(
                "unsupported texture format {:?}",
                other
            )))
        }
    };

    let width = texture.width();
    let height = texture.height();

    // wgpu requires rows to be aligned to 256 bytes
    let unpadded_bytes_per_row = width as usize * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
    let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

    let staging_buffer = ctxt.create_buffer(&wgpu::BufferDescriptor {
        label: Some("capture_staging_buffer"),
        size: (padded_bytes_per_row * height as usize) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = ctxt.create_command_encoder(Some("capture_copy_encoder"));
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row as u32),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    ctxt.submit(std::iter::once(encoder.finish()));

    let buffer_slice = staging_buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });

    ctxt.device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|e| RecordingError::Readback(e.to_string()))?;
    rx.recv()
        .map_err(|e| RecordingError::Readback(e.to_string()))?
        .map_err(|e| RecordingError::Readback(e.to_string()))?;

    let pixels = {
        let data = buffer_slice.get_mapped_range();
        unpad_rows(&data, width, height, padded_bytes_per_row, is_bgra)
    };
    staging_buffer.unmap();

    ImageBuffer::from_raw(width, height, pixels)
        .ok_or_else(|| RecordingError::Readback("pixel buffer size mismatch".to_string()))
}

/// Strips the row padding of a readback and swizzles BGRA to RGBA.
fn unpad_rows(data: &[u8], width: u32, height: u32, padded_bytes_per_row: usize, is_bgra: bool) -> Vec<u8> {
    let row_bytes = width as usize * 4;
    let mut out = Vec::with_capacity(row_bytes * height as usize);

    for row in data.chunks(padded_bytes_per_row).take(height as usize) {
        for pixel in row[..row_bytes].chunks_exact(4) {
            if is_bgra {
                out.extend_from_slice(&[pixel[2], pixel[1], pixel[0], pixel[3]]);
            } else {
                out.extend_from_slice(pixel);
            }
        }
    }

    out
}
