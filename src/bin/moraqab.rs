use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use image::RgbImage;

use moraqab::alert::{self, AlertSink, DiskAlertSink, LogAlertSink};
use moraqab::{Detection, Frame, Monitor, Monitoring, PipelineConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Replays detector output through the safety monitor")]
struct Args {
    /// Detections dump, one `<frame_no>:[{"bbox":[x1,y1,x2,y2],"p":conf,"c":class}, ...]` per line
    #[arg(long)]
    detections: PathBuf,

    /// Directory with frame images named `<frame_no>.jpg` or `<frame_no>.png`
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Size of the blank frame used when no image is available
    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    /// JSON file overriding any subset of the pipeline config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write alert images, clips and records; log only when absent
    #[arg(long)]
    alerts: Option<PathBuf>,

    /// Font used to caption alert images
    #[arg(long)]
    font: Option<PathBuf>,

    #[arg(long, default_value = "default")]
    source: String,
}

fn parse_line(line: &str) -> Option<(u64, Vec<Detection>)> {
    let idx = line.find(':')?;
    let (frame_no, vector) = line.split_at(idx);

    match (frame_no.trim().parse::<u64>(), serde_json::from_str(&vector[1..])) {
        (Ok(frame_no), Ok(dets)) => Some((frame_no, dets)),
        (Ok(_), Err(err)) => {
            log::warn!("wrong file format: parse json failed: {}", err);
            None
        }
        (Err(_), _) => {
            log::warn!("wrong file format: parse frame number failed");
            None
        }
    }
}

fn load_image(dir: Option<&Path>, frame_no: u64, width: u32, height: u32) -> RgbImage {
    if let Some(dir) = dir {
        for ext in ["jpg", "png"] {
            let path = dir.join(format!("{}.{}", frame_no, ext));
            if !path.exists() {
                continue;
            }

            match image::open(&path) {
                Ok(img) => return img.to_rgb8(),
                Err(err) => log::warn!("cannot read {}: {}", path.display(), err),
            }
        }
    }

    RgbImage::new(width, height)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    let mut sink: Box<dyn AlertSink> = match &args.alerts {
        Some(dir) => {
            let mut disk =
                DiskAlertSink::new(dir).with_context(|| format!("preparing {}", dir.display()))?;

            if let Some(path) = &args.font {
                let font = alert::load_font(path)
                    .with_context(|| format!("loading font {}", path.display()))?;
                disk = disk.with_font(font);
            }

            Box::new(disk)
        }
        None => Box::new(LogAlertSink::default()),
    };

    let mut monitor = Monitor::new(config)?;

    let file = std::fs::File::open(&args.detections)
        .with_context(|| format!("opening {}", args.detections.display()))?;

    let mut frames = 0u64;
    for line in std::io::BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let (frame_no, dets) = match parse_line(&line) {
            Some(parsed) => parsed,
            None => continue,
        };

        let image = load_image(args.frames.as_deref(), frame_no, args.width, args.height);
        let frame = Frame::new(image, Detection::filter_confident(dets));

        sink.observe(&frame.image);

        let events = match monitor.process(&args.source, &frame) {
            Ok(events) => events,
            Err(err) => {
                log::warn!("frame {} skipped: {}", frame_no, err);
                continue;
            }
        };

        for event in &events {
            if let Err(err) = sink.trigger(event, &frame.image) {
                log::error!("alert for frame {} failed: {}", frame_no, err);
            }
        }

        frames += 1;
    }

    log::info!(
        "processed {} frames, {} alerts, {} live tracks",
        frames,
        sink.alert_count(),
        monitor.tracks(&args.source).len()
    );

    Ok(())
}
