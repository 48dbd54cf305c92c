//! Side effects of an emitted event: annotated snapshot, buffered clip,
//! a JSON record. Nothing here feeds back into tracking or classification.

use ab_glyph::{Font, FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use serde_derive::Serialize;
use std::path::{Path, PathBuf};

use crate::bbox::BBox;
use crate::behavior::{BehaviorEvent, Severity};
use crate::circular_queue::CircularQueue;
use crate::error::Result;

pub const DEFAULT_BUFFER_FRAMES: usize = 150;

/// Clips shorter than this are not worth writing.
pub const MIN_CLIP_FRAMES: usize = 30;

const MARKER_RADIUS: i32 = 15;
const BOX_SIZE: f32 = 120.0;
const BOX_THICKNESS: i32 = 4;

const CAPTION_LEFT: i32 = 15;

/// Top edge and pixel height of the kind, severity and detail lines.
const CAPTION_LINES: [(i32, f32); 3] = [(12, 32.0), (52, 26.0), (88, 22.0)];

#[derive(Serialize, Debug, Clone)]
pub struct AlertRecord {
    pub event: BehaviorEvent,
    pub timestamp: String,
    pub image: Option<PathBuf>,
    pub clip: Option<PathBuf>,
}

pub trait AlertSink {
    /// Called for every processed frame, before its events are triggered.
    fn observe(&mut self, _frame: &RgbImage) {}

    fn trigger(&mut self, event: &BehaviorEvent, frame: &RgbImage) -> Result<AlertRecord>;

    fn alert_count(&self) -> usize;
}

/// The most recent frames, kept for pre-event clips.
#[derive(Debug)]
pub struct FrameBuffer {
    frames: CircularQueue<RgbImage>,
}

impl FrameBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: CircularQueue::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn push(&mut self, frame: &RgbImage) {
        self.frames.push(frame.clone());
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Buffered frames oldest first, or nothing if the buffer is too short.
    pub fn snapshot(&self) -> Option<Vec<&RgbImage>> {
        if self.frames.len() < MIN_CLIP_FRAMES {
            return None;
        }

        Some(self.frames.iter().collect())
    }

    /// The frame pushed last, for read-only display elsewhere.
    #[inline]
    pub fn latest(&self) -> Option<&RgbImage> {
        self.frames.latest()
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_FRAMES)
    }
}

pub fn severity_color(severity: Severity) -> Rgb<u8> {
    match severity {
        Severity::Critical => Rgb([255, 0, 0]),
        Severity::Medium => Rgb([255, 165, 0]),
        Severity::Low => Rgb([255, 255, 0]),
    }
}

/// Copy of `frame` with a filled marker and a square around the event.
pub fn annotate(frame: &RgbImage, event: &BehaviorEvent) -> RgbImage {
    let mut out = frame.clone();
    let color = severity_color(event.severity);
    let (x, y) = (event.location.x, event.location.y);

    draw_filled_circle_mut(&mut out, (x, y), MARKER_RADIUS, color);

    let square = BBox::xywh(x as f32, y as f32, BOX_SIZE, BOX_SIZE)
        .as_ltrb()
        .as_ltwh();

    for t in 0..BOX_THICKNESS {
        let side = (square.width() as i32 - 2 * t).max(1) as u32;
        let rect = Rect::at(square.left() as i32 + t, square.top() as i32 + t).of_size(side, side);
        draw_hollow_rect_mut(&mut out, rect, color);
    }

    out
}

/// Writes the event kind, severity and detail in the top-left corner.
pub fn caption(image: &mut RgbImage, event: &BehaviorEvent, font: &impl Font) {
    let color = severity_color(event.severity);
    let lines = [
        event.kind.to_string(),
        format!("Severity: {}", event.severity),
        event.detail.clone(),
    ];

    for ((top, size), text) in CAPTION_LINES.iter().zip(&lines) {
        draw_text_mut(image, color, CAPTION_LEFT, *top, PxScale::from(*size), font, text);
    }
}

/// Loads a TrueType/OpenType font for alert captions.
pub fn load_font<P: AsRef<Path>>(path: P) -> Result<FontVec> {
    let data = std::fs::read(path)?;
    Ok(FontVec::try_from_vec(data)?)
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S_%6f").to_string()
}

/// Writes every alert below an output directory:
/// `images/<kind>_<ts>.jpg`, `clips/<kind>_<ts>/NNNN.jpg`, `events/<kind>_<ts>.json`.
///
/// Images are captioned only when a font was given.
pub struct DiskAlertSink {
    images_dir: PathBuf,
    clips_dir: PathBuf,
    events_dir: PathBuf,
    buffer: FrameBuffer,
    font: Option<FontVec>,
    alert_count: usize,
}

impl DiskAlertSink {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Result<Self> {
        Self::with_buffer(output_dir, FrameBuffer::default())
    }

    pub fn with_buffer<P: AsRef<Path>>(output_dir: P, buffer: FrameBuffer) -> Result<Self> {
        let root = output_dir.as_ref();
        let images_dir = root.join("images");
        let clips_dir = root.join("clips");
        let events_dir = root.join("events");

        for dir in [&images_dir, &clips_dir, &events_dir] {
            std::fs::create_dir_all(dir)?;
        }

        Ok(Self {
            images_dir,
            clips_dir,
            events_dir,
            buffer,
            font: None,
            alert_count: 0,
        })
    }

    pub fn with_font(mut self, font: FontVec) -> Self {
        self.font = Some(font);
        self
    }

    pub fn reset_count(&mut self) {
        self.alert_count = 0;
    }

    fn save_clip(&self, name: &str) -> Result<Option<PathBuf>> {
        let frames = match self.buffer.snapshot() {
            Some(frames) => frames,
            None => return Ok(None),
        };

        let dir = self.clips_dir.join(name);
        std::fs::create_dir_all(&dir)?;

        for (idx, frame) in frames.iter().enumerate() {
            frame.save(dir.join(format!("{:04}.jpg", idx)))?;
        }

        Ok(Some(dir))
    }
}

impl AlertSink for DiskAlertSink {
    fn observe(&mut self, frame: &RgbImage) {
        self.buffer.push(frame);
    }

    fn trigger(&mut self, event: &BehaviorEvent, frame: &RgbImage) -> Result<AlertRecord> {
        self.alert_count += 1;

        let timestamp = timestamp();
        let name = format!("{}_{}_{}", event.kind, timestamp, self.alert_count);

        let image_path = self.images_dir.join(format!("{}.jpg", name));
        let mut image = annotate(frame, event);
        if let Some(font) = &self.font {
            caption(&mut image, event, font);
        }
        image.save(&image_path)?;

        let clip = self.save_clip(&name)?;

        let record = AlertRecord {
            event: event.clone(),
            timestamp,
            image: Some(image_path),
            clip,
        };

        let file = std::fs::File::create(self.events_dir.join(format!("{}.json", name)))?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), &record)?;

        log::warn!("ALERT #{}: {}", self.alert_count, event);

        Ok(record)
    }

    fn alert_count(&self) -> usize {
        self.alert_count
    }
}

/// Only reports alerts through the log.
#[derive(Debug, Default)]
pub struct LogAlertSink {
    alert_count: usize,
}

impl AlertSink for LogAlertSink {
    fn trigger(&mut self, event: &BehaviorEvent, _frame: &RgbImage) -> Result<AlertRecord> {
        self.alert_count += 1;
        log::warn!("ALERT #{}: {}", self.alert_count, event);

        Ok(AlertRecord {
            event: event.clone(),
            timestamp: timestamp(),
            image: None,
            clip: None,
        })
    }

    fn alert_count(&self) -> usize {
        self.alert_count
    }
}
