//! V4L2 camera source.
//!
//! Captures from a local device node (e.g. /dev/video0) through memory-mapped
//! buffers. The device is asked for the configured mode in YUYV; whatever mode
//! it negotiates is used as long as the pixel format is one `normalize_to_rgba`
//! understands. Timestamps are milliseconds since `connect`.

use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;
use std::time::{Duration, Instant};

use super::normalize::{normalize_to_rgba, PixelFormat};
use super::{CaptureError, CaptureErrorKind, FrameSource, SourceConfig, SourceStats};
use crate::frame::Frame;

const MMAP_BUFFERS: u32 = 4;

#[self_referencing]
struct DeviceState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

pub struct V4l2Source {
    config: SourceConfig,
    state: Option<DeviceState>,
    format: PixelFormat,
    active_width: u32,
    active_height: u32,
    connected_at: Option<Instant>,
    frame_count: u64,
    last_frame_at: Option<Instant>,
    last_timestamp_ms: f64,
    last_error: Option<String>,
}

impl V4l2Source {
    /// `config.url` is the device path.
    pub fn new(config: SourceConfig) -> Self {
        Self {
            active_width: config.width,
            active_height: config.height,
            config,
            state: None,
            format: PixelFormat::Yuyv,
            connected_at: None,
            frame_count: 0,
            last_frame_at: None,
            last_timestamp_ms: 0.0,
            last_error: None,
        }
    }

    fn pixel_format(fourcc: &v4l::FourCC) -> Option<PixelFormat> {
        match &fourcc.repr {
            b"YUYV" => Some(PixelFormat::Yuyv),
            b"RGB3" => Some(PixelFormat::Rgb24),
            b"NV12" => Some(PixelFormat::Nv12),
            _ => None,
        }
    }

    fn health_grace(&self) -> Duration {
        let fps = self.config.fps.max(1);
        Duration::from_millis(((1000 / fps) * 6).max(2_000) as u64)
    }
}

impl FrameSource for V4l2Source {
    fn connect(&mut self) -> Result<()> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let path = self.config.url.clone();
        let mut device = v4l::Device::with_path(&path)
            .map_err(|err| CaptureError::from_io(&err, &path))?;

        let mut format = device.format().context("read v4l2 format")?;
        format.width = self.config.width;
        format.height = self.config.height;
        format.fourcc = v4l::FourCC::new(b"YUYV");
        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                let capture = CaptureError::from_io(&err, &path);
                if capture.kind == CaptureErrorKind::DeviceBusy {
                    return Err(capture.into());
                }
                log::warn!("V4l2Source: failed to set format on {}: {}", path, err);
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };

        self.format = Self::pixel_format(&format.fourcc).ok_or_else(|| {
            anyhow!("{}: unsupported pixel format {}", path, format.fourcc)
        })?;

        if self.config.fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(self.config.fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!("V4l2Source: failed to set fps on {}: {}", path, err);
            }
        }

        self.active_width = format.width;
        self.active_height = format.height;

        let state = DeviceStateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, MMAP_BUFFERS)
                    .map_err(|err| CaptureError::from_io(&err, "v4l2 buffer stream"))
            },
        }
        .try_build()?;
        self.state = Some(state);
        self.connected_at = Some(Instant::now());
        self.last_error = None;

        log::info!(
            "V4l2Source: connected to {} ({}x{} {:?})",
            path,
            self.active_width,
            self.active_height,
            self.format
        );
        Ok(())
    }

    fn ready(&self) -> bool {
        self.state.is_some() && self.active_width > 0 && self.active_height > 0
    }

    fn current_frame(&mut self) -> Result<Frame> {
        use v4l::io::traits::CaptureStream;

        let state = self.state.as_mut().context("v4l2 device not connected")?;
        let (buf, meta) = state
            .with_mut(|fields| fields.stream.next())
            .map_err(|err| {
                self.last_error = Some(err.to_string());
                anyhow::Error::new(err).context("capture v4l2 frame")
            })?;

        let used = (meta.bytesused as usize).min(buf.len());
        let used = if used == 0 { buf.len() } else { used };
        let rgba = normalize_to_rgba(
            &buf[..used],
            self.active_width,
            self.active_height,
            self.format,
        )?;

        let now = Instant::now();
        let timestamp_ms = self
            .connected_at
            .map(|start| now.duration_since(start).as_secs_f64() * 1000.0)
            .unwrap_or(0.0);
        self.frame_count += 1;
        self.last_frame_at = Some(now);
        self.last_timestamp_ms = timestamp_ms;

        Frame::new(rgba, self.active_width, self.active_height, timestamp_ms)
    }

    fn current_timestamp(&self) -> f64 {
        self.last_timestamp_ms
    }

    fn is_healthy(&self) -> bool {
        if self.last_error.is_some() {
            return false;
        }
        match self.last_frame_at {
            Some(at) => at.elapsed() <= self.health_grace(),
            None => true,
        }
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            source: self.config.url.clone(),
        }
    }
}
