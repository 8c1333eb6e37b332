//! Pipeline planning: turns a job into ffmpeg argument lists.
//!
//! The planner is pure. It never touches the filesystem or spawns anything;
//! [`ProcessManager`](super::ProcessManager) executes the resulting plan.
//!
//! Video filters are threaded through a single chain in a fixed order:
//! stereo flattening, then subtitle rendering, then resizing. Flattening
//! comes first so subtitles are positioned on the final mono frame.

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::error::TranscodeError;
use super::job::{BurnIn, TranscodeJob};
use super::types::{AudioSelector, OutputMode, StereoMode};

/// Aspect ratio forced after flattening when the source reports none.
pub const DEFAULT_ASPECT_RATIO: &str = "16:9";

/// Fixed audio target: AAC, 48 kHz, 128 kbps, stereo.
const AUDIO_ARGS: [&str; 8] = ["-c:a", "aac", "-ar", "48000", "-b:a", "128k", "-ac", "2"];

/// One stage of the video filter chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum FilterStage {
    /// Keep the left eye of a stereoscopic frame.
    Flatten { mode: StereoMode },
    /// Paint a bitmap subtitle track over the picture.
    Overlay { subtitle: u32 },
    /// Render a text subtitle track (`stream = Some`) or file (`stream = None`).
    Subtitles { file: PathBuf, stream: Option<u32> },
    /// Fixed width, height follows the aspect ratio.
    Scale { width: u32 },
}

impl FilterStage {
    /// Renders this stage, reading from the stream labelled `input`.
    fn render(&self, input: &str) -> String {
        match self {
            Self::Flatten { mode } => {
                format!("{}{}", input, mode.flatten_filter().unwrap_or("null"))
            }
            Self::Overlay { subtitle } => format!("{}[0:s:{}]overlay", input, subtitle),
            Self::Subtitles { file, stream } => {
                let mut expr = format!("{}subtitles={}", input, quote_filter_value(file));
                if let Some(index) = stream {
                    expr.push_str(&format!(":si={}", index));
                }
                expr
            }
            Self::Scale { width } => format!("{}scale={}:-1", input, width),
        }
    }
}

/// The video filter chain, as a typed value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterGraph {
    stages: Vec<FilterStage>,
}

impl FilterGraph {
    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    fn push(&mut self, stage: FilterStage) {
        self.stages.push(stage);
    }

    /// Renders the `-filter_complex` expression.
    ///
    /// Each stage reads the previous stage's labelled output (`[v1]`, `[v2]`, ...).
    /// A lone resize is emitted as a bare `scale` filter.
    pub fn render(&self) -> String {
        if let [FilterStage::Scale { width }] = self.stages.as_slice() {
            return format!("scale={}:-1", width);
        }

        let mut expr = String::new();
        let mut input = "[0:v:0]".to_string();
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                input = format!("[v{}]", i);
                expr.push_str(&input);
                expr.push(';');
            }
            expr.push_str(&stage.render(&input));
        }
        expr
    }
}

/// Everything needed to run one transcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandPlan {
    /// Directory the job owns; recreated empty before anything runs.
    pub output_dir: PathBuf,
    /// Stream-copy cut run to completion before the main pipeline.
    pub pre_cut: Option<Vec<String>>,
    /// Arguments of the main ffmpeg invocation.
    pub main: Vec<String>,
    /// The typed filter chain rendered into `main`, if any.
    pub filter_graph: Option<FilterGraph>,
    /// Playlist or single output file.
    pub output_file: PathBuf,
}

/// Builds the command plan for a job.
pub fn plan(job: &TranscodeJob) -> Result<CommandPlan, TranscodeError> {
    if let Some(selector) = job.subtitle_stream() {
        if job.source().subtitle(selector).is_none() {
            return Err(TranscodeError::invalid_option(format!(
                "subtitle stream {} does not exist ({} subtitle track(s) known)",
                selector,
                job.source().subtitles.len()
            )));
        }
    }
    if job.resize_width() == Some(0) {
        return Err(TranscodeError::invalid_option(
            "resize width must be positive",
        ));
    }

    let output_dir = job.output_dir().to_path_buf();
    let burn_in = job.burn_in();
    let source_path = job.source().path.as_path();

    // Subtitle filters index time from the start of their input file, so a
    // seek with burn-in cuts a new input instead of using -ss.
    let mut pre_cut = None;
    let mut input: PathBuf = source_path.to_path_buf();
    let mut seek = None;
    if job.start_offset_secs() > 0 {
        if burn_in.is_some() {
            let cut_file =
                output_dir.join(format!("temp.{}", job.source().container_extension()));
            pre_cut = Some(pre_cut_args(source_path, job.start_offset_secs(), &cut_file));
            input = cut_file;
        } else {
            seek = Some(job.start_offset_secs());
        }
    }

    let graph = build_filter_graph(job, burn_in, &input);

    let mut args = strings(&["-hide_banner", "-loglevel", "fatal"]);
    if let Some(offset) = seek {
        args.extend(["-ss".to_string(), offset.to_string()]);
    }
    args.extend(["-i".to_string(), path_arg(&input)]);
    args.extend(strings(&["-pix_fmt", "yuv420p", "-preset", "medium"]));

    if !graph.is_empty() {
        args.extend(["-filter_complex".to_string(), graph.render()]);
    }
    if job.stereo_mode().is_stereo() {
        let ratio = job
            .source()
            .ratio
            .clone()
            .unwrap_or_else(|| DEFAULT_ASPECT_RATIO.to_string());
        args.extend(["-aspect".to_string(), ratio]);
    }

    if let AudioSelector::Track(track) = job.audio_stream() {
        // An explicit map disables automatic selection of the video stream
        if graph.is_empty() {
            args.extend(strings(&["-map", "0:v:0"]));
        }
        args.extend(["-map".to_string(), format!("0:a:{}", track)]);
    }
    args.extend(strings(&AUDIO_ARGS));

    if job.stereo_mode().is_stereo() {
        args.extend(strings(&["-metadata:s:v:0", "stereo_mode=mono"]));
    }
    args.extend([
        "-c:v".to_string(),
        job.encoder().to_string(),
        "-crf".to_string(),
        job.crf().to_string(),
    ]);

    let output_file = job.output_file();
    match job.output_mode() {
        OutputMode::Segmented { segment_secs } => {
            args.extend([
                "-hls_time".to_string(),
                segment_secs.to_string(),
                "-hls_playlist_type".to_string(),
                "event".to_string(),
                "-hls_segment_filename".to_string(),
                path_arg(&output_dir.join("stream%03d.ts")),
            ]);
        }
        OutputMode::SingleFile => {}
    }
    args.push(path_arg(&output_file));

    Ok(CommandPlan {
        output_dir,
        pre_cut,
        main: args,
        filter_graph: (!graph.is_empty()).then_some(graph),
        output_file,
    })
}

fn build_filter_graph(job: &TranscodeJob, burn_in: Option<BurnIn<'_>>, input: &Path) -> FilterGraph {
    let mut graph = FilterGraph::default();

    if job.stereo_mode().is_stereo() {
        graph.push(FilterStage::Flatten {
            mode: job.stereo_mode(),
        });
    }

    match burn_in {
        Some(BurnIn::Stream { selector, track }) if track.is_bitmap() => {
            graph.push(FilterStage::Overlay { subtitle: selector });
        }
        Some(BurnIn::Stream { selector, .. }) => {
            graph.push(FilterStage::Subtitles {
                file: input.to_path_buf(),
                stream: Some(selector),
            });
        }
        Some(BurnIn::File(file)) => {
            graph.push(FilterStage::Subtitles {
                file: file.to_path_buf(),
                stream: None,
            });
        }
        None => {}
    }

    if let Some(width) = job.resize_width() {
        graph.push(FilterStage::Scale { width });
    }

    graph
}

fn pre_cut_args(source: &Path, offset_secs: u64, cut_file: &Path) -> Vec<String> {
    let mut args = strings(&["-y", "-hide_banner", "-loglevel", "fatal"]);
    args.extend([
        "-ss".to_string(),
        offset_secs.to_string(),
        "-i".to_string(),
        path_arg(source),
    ]);
    args.extend(strings(&["-c", "copy", "-map", "0"]));
    args.push(path_arg(cut_file));
    args
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Quotes a path for use as a filter option value.
fn quote_filter_value(path: &Path) -> String {
    let raw = path.to_string_lossy();
    format!("'{}'", raw.replace('\'', r"'\''"))
}
