use std::path::Path;

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// `AV_TIME_BASE`: units per second of container-level seek timestamps.
const AV_TIME_BASE: f64 = 1_000_000.0;

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("reader is not open")]
    NotOpened,
    #[error("no video stream found")]
    NoVideoStream,
    #[error("no frame has been grabbed")]
    NothingGrabbed,
    #[error("cannot seek: unknown frame rate")]
    UnknownFrameRate,
    #[error("frame {0} not found in stream")]
    FrameNotFound(usize),
    #[error(transparent)]
    Ffmpeg(#[from] ffmpeg_next::Error),
}

/// Decodes video frames via ffmpeg-next (libavformat + libavcodec).
///
/// `grab` runs the codec (packets to YUV) but skips the RGB conversion and
/// copy; `retrieve` converts the last grabbed frame to RGB24.
pub struct FfmpegReader {
    state: Option<DecodeState>,
}

// Safety: FfmpegReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegReader {}

struct DecodeState {
    input: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    decoded: ffmpeg_next::util::frame::video::Video,
    stream_index: usize,
    time_base: ffmpeg_next::Rational,
    fps: f64,
    width: u32,
    height: u32,
    /// Index of the frame currently held in `decoded`.
    position: Option<usize>,
    eof_sent: bool,
}

impl FfmpegReader {
    pub fn new() -> Self {
        Self { state: None }
    }

    fn state(&mut self) -> Result<&mut DecodeState, ReaderError> {
        self.state.as_mut().ok_or(ReaderError::NotOpened)
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        self.state = None;

        let input = ffmpeg_next::format::input(path)?;
        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or(ReaderError::NoVideoStream)?;

        let stream_index = stream.index();
        let time_base = stream.time_base();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.avg_frame_rate();
        let rate = if rate.denominator() != 0 && rate.numerator() != 0 {
            rate
        } else {
            stream.rate()
        };
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let total_frames = frame_count(
            stream.frames(),
            stream.duration(),
            time_base,
            input.duration(),
            fps,
        );

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
        )?;

        let metadata = VideoMetadata {
            width,
            height,
            fps,
            total_frames,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };
        log::debug!(
            "Opened {}: {}x{} @ {:.2} fps, {} frames",
            path.display(),
            width,
            height,
            fps,
            total_frames
        );

        self.state = Some(DecodeState {
            input,
            decoder,
            scaler,
            decoded: ffmpeg_next::util::frame::video::Video::empty(),
            stream_index,
            time_base,
            fps,
            width,
            height,
            position: None,
            eof_sent: false,
        });

        Ok(metadata)
    }

    fn grab(&mut self) -> Result<bool, Box<dyn std::error::Error>> {
        let state = self.state()?;
        if !state.decode_next()? {
            return Ok(false);
        }
        state.position = Some(state.position.map_or(0, |p| p + 1));
        Ok(true)
    }

    fn retrieve(&mut self) -> Result<Frame, Box<dyn std::error::Error>> {
        let state = self.state()?;
        let index = state.position.ok_or(ReaderError::NothingGrabbed)?;
        Ok(state.convert(index)?)
    }

    fn read_at(&mut self, index: usize) -> Result<Frame, Box<dyn std::error::Error>> {
        let state = self.state()?;
        if state.fps <= 0.0 {
            return Err(ReaderError::UnknownFrameRate.into());
        }

        let timestamp = (index as f64 / state.fps * AV_TIME_BASE) as i64;
        state.input.seek(timestamp, ..=timestamp)?;
        state.decoder.flush();
        state.eof_sent = false;

        // Seeking lands on the keyframe at or before the target; decode
        // forward until the presentation time reaches it.
        while state.decode_next()? {
            if let Some(current) = state.current_frame_number() {
                if current >= index {
                    state.position = Some(index);
                    return Ok(state.convert(index)?);
                }
            }
        }
        Err(ReaderError::FrameNotFound(index).into())
    }

    fn close(&mut self) {
        self.state = None;
    }
}

impl DecodeState {
    /// Decodes the next video frame into `self.decoded`.
    fn decode_next(&mut self) -> Result<bool, ReaderError> {
        loop {
            if self.decoder.receive_frame(&mut self.decoded).is_ok() {
                return Ok(true);
            }
            if self.eof_sent {
                return Ok(false);
            }

            let next_packet = self.input.packets().next();
            match next_packet {
                Some((stream, packet)) => {
                    if stream.index() != self.stream_index {
                        continue;
                    }
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        log::debug!("Skipping undecodable packet: {e}");
                    }
                }
                None => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
            }
        }
    }

    /// Frame number of the decoded frame, derived from its timestamp.
    fn current_frame_number(&self) -> Option<usize> {
        let ts = self.decoded.timestamp().or(self.decoded.pts())?;
        let seconds = ts as f64 * f64::from(self.time_base);
        Some((seconds * self.fps).round().max(0.0) as usize)
    }

    fn convert(&mut self, index: usize) -> Result<Frame, ReaderError> {
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(&self.decoded, &mut rgb_frame)?;
        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        Ok(Frame::new(pixels, self.width, self.height, 3, index))
    }
}

/// Frame count from the container, falling back to duration × fps when the
/// stream header does not record it.
fn frame_count(
    stream_frames: i64,
    stream_duration: i64,
    time_base: ffmpeg_next::Rational,
    container_duration: i64,
    fps: f64,
) -> usize {
    if stream_frames > 0 {
        return stream_frames as usize;
    }
    if fps <= 0.0 {
        return 0;
    }
    let seconds = if stream_duration > 0 && time_base.denominator() != 0 {
        stream_duration as f64 * f64::from(time_base)
    } else if container_duration > 0 {
        container_duration as f64 / AV_TIME_BASE
    } else {
        return 0;
    };
    (seconds * fps).round() as usize
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may have padding bytes at the end of each row (stride > width*3).
/// This function strips that padding to produce a tightly-packed pixel buffer.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
