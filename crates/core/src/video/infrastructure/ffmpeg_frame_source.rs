use std::path::{Path, PathBuf};

use crate::shared::error::SourceError;
use crate::shared::frame::Frame;
use crate::shared::stream_info::StreamInfo;
use crate::video::domain::frame_source::FrameSource;

/// Where frames come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameInput {
    /// A V4L2 capture device such as `/dev/video0`.
    Device(PathBuf),
    /// A recorded video file.
    File(PathBuf),
}

impl FrameInput {
    /// Device paths and bare device numbers map to capture devices.
    pub fn parse(input: &str) -> Self {
        if let Ok(n) = input.parse::<u32>() {
            return FrameInput::Device(PathBuf::from(format!("/dev/video{n}")));
        }
        if input.starts_with("/dev/") {
            return FrameInput::Device(PathBuf::from(input));
        }
        FrameInput::File(PathBuf::from(input))
    }

    pub fn path(&self) -> &Path {
        match self {
            FrameInput::Device(p) | FrameInput::File(p) => p,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, FrameInput::Device(_))
    }
}

struct Decoding {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
}

/// Captures or decodes frames via ffmpeg-next (libavformat + libavcodec).
///
/// Every decoded picture is converted to RGB24 and wrapped in a [`Frame`].
pub struct FfmpegFrameSource {
    input: FrameInput,
    decoding: Option<Decoding>,
}

// Safety: FfmpegFrameSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegFrameSource {}

impl FfmpegFrameSource {
    pub fn new(input: FrameInput) -> Self {
        Self {
            input,
            decoding: None,
        }
    }

    fn ffmpeg_err(&self, source: ffmpeg_next::Error) -> SourceError {
        SourceError::Ffmpeg {
            input: self.input.path().display().to_string(),
            source,
        }
    }

    fn open_input(&self) -> Result<ffmpeg_next::format::context::Input, SourceError> {
        match &self.input {
            FrameInput::File(path) => {
                ffmpeg_next::format::input(path).map_err(|e| self.ffmpeg_err(e))
            }
            FrameInput::Device(path) => {
                ffmpeg_next::device::register_all();
                let format = ffmpeg_next::device::input::video()
                    .find(|f| f.name().split(',').any(|n| n == "video4linux2" || n == "v4l2"))
                    .ok_or_else(|| SourceError::DeviceFormat("video4linux2".to_string()))?;
                let ctx = ffmpeg_next::format::open_with(
                    path,
                    &ffmpeg_next::Format::Input(format),
                    ffmpeg_next::Dictionary::new(),
                )
                .map_err(|e| self.ffmpeg_err(e))?;
                match ctx {
                    ffmpeg_next::format::context::Context::Input(ictx) => Ok(ictx),
                    ffmpeg_next::format::context::Context::Output(_) => Err(
                        SourceError::DeviceFormat(path.display().to_string()),
                    ),
                }
            }
        }
    }
}

impl FrameSource for FfmpegFrameSource {
    fn open(&mut self) -> Result<StreamInfo, SourceError> {
        ffmpeg_next::init().map_err(|e| self.ffmpeg_err(e))?;

        let ictx = self.open_input()?;
        let source = self.input.path().display().to_string();

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| SourceError::NoVideoStream(source.clone()))?;
        let stream_index = stream.index();

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| self.ffmpeg_err(e))?;
        let decoder = codec_ctx.decoder().video().map_err(|e| self.ffmpeg_err(e))?;

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| self.ffmpeg_err(e))?;

        let info = StreamInfo {
            width,
            height,
            fps,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source,
            live: self.input.is_live(),
        };
        log::info!(
            "Opened {} ({}x{} @ {:.1} fps, {})",
            info.source,
            info.width,
            info.height,
            info.fps,
            if info.live { "live" } else { "file" }
        );

        self.decoding = Some(Decoding {
            ictx,
            decoder,
            scaler,
            stream_index,
            width,
            height,
        });
        Ok(info)
    }

    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, SourceError>> + '_> {
        let input = self.input.path().display().to_string();
        let Some(decoding) = self.decoding.as_mut() else {
            return Box::new(std::iter::once(Err(SourceError::NotOpen)));
        };
        Box::new(FfmpegFrameIter {
            decoding,
            input,
            frame_index: 0,
            flushing: false,
            done: false,
        })
    }

    fn close(&mut self) {
        self.decoding = None;
    }
}

/// Lazy iterator that decodes one frame at a time.
struct FfmpegFrameIter<'a> {
    decoding: &'a mut Decoding,
    input: String,
    frame_index: usize,
    flushing: bool,
    done: bool,
}

impl FfmpegFrameIter<'_> {
    fn err(&self, source: ffmpeg_next::Error) -> SourceError {
        SourceError::Ffmpeg {
            input: self.input.clone(),
            source,
        }
    }

    fn try_receive(&mut self) -> Option<Result<Frame, SourceError>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoding.decoder.receive_frame(&mut decoded).is_err() {
            return None;
        }
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        if let Err(e) = self.decoding.scaler.run(&decoded, &mut rgb_frame) {
            return Some(Err(self.err(e)));
        }
        let pixels = extract_rgb_pixels(&rgb_frame, self.decoding.width, self.decoding.height);
        let frame = Frame::new(
            pixels,
            self.decoding.width,
            self.decoding.height,
            3,
            self.frame_index,
        );
        self.frame_index += 1;
        Some(Ok(frame))
    }
}

impl Iterator for FfmpegFrameIter<'_> {
    type Item = Result<Frame, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if let Some(result) = self.try_receive() {
            return Some(result);
        }

        if self.flushing {
            self.done = true;
            return None;
        }

        loop {
            let next_packet = self.decoding.ictx.packets().next();
            let Some((stream, packet)) = next_packet else {
                let _ = self.decoding.decoder.send_eof();
                self.flushing = true;
                if let Some(result) = self.try_receive() {
                    return Some(result);
                }
                self.done = true;
                return None;
            };

            if stream.index() != self.decoding.stream_index {
                continue;
            }

            if self.decoding.decoder.send_packet(&packet).is_err() {
                continue;
            }

            if let Some(result) = self.try_receive() {
                return Some(result);
            }
        }
    }
}

/// Copies pixel data into a tightly packed RGB buffer, dropping row padding.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    pixels
}
