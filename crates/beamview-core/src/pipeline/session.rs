use std::path::Path;

use ndarray::Array2;
use tracing::{debug, info, warn};

use crate::acquisition::sequence::FrameSequenceTracker;
use crate::acquisition::source::RawFrame;
use crate::error::{BeamviewError, Result};
use crate::frame::{DisplayFrame, Frame};
use crate::io::image_io::{FrameSaver, SaveFormat};
use crate::io::timestamp_log::TimestampLogger;
use crate::process::accumulator::FrameAccumulator;
use crate::process::annotation::{Annotation, AnnotationEngine};
use crate::process::display::DisplayScaler;
use crate::process::histogram::{Histogram, LogHistogram};
use crate::process::plugin::{ProcessorRegistry, ProcessorSlot};
use crate::process::roi::{RoiExtractor, RoiParams};

use super::config::{OutputConfig, PipelineConfig};
use super::series::ScrollingSeries;

/// File names of the two timestamp logs inside the output directory.
pub const FRAME_TIMESTAMP_LOG: &str = "frame_timestamps.bin";
pub const HOST_TIMESTAMP_LOG: &str = "host_timestamps.bin";

/// Running totals of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Frames handed to the session.
    pub frames: u64,
    /// Frames the processor passed on.
    pub processed: u64,
    /// Averages rendered for display.
    pub rendered: u64,
    /// Averages that could not be rendered (degenerate display range).
    pub skipped_renders: u64,
}

/// Files written while the session runs.
pub struct SessionOutput {
    saver: Option<FrameSaver>,
    display_saver: Option<FrameSaver>,
    timestamps: Option<TimestampLogger>,
}

impl SessionOutput {
    /// `None` when the configuration asks for nothing to be written.
    pub fn from_config(config: &OutputConfig) -> Result<Option<Self>> {
        let Some(dir) = &config.directory else {
            return Ok(None);
        };
        if !(config.save_averages || config.save_display || config.timestamp_logs) {
            return Ok(None);
        }
        std::fs::create_dir_all(dir)?;

        let saver = config
            .save_averages
            .then(|| FrameSaver::create(dir, "average", config.format))
            .transpose()?;
        let display_saver = config
            .save_display
            .then(|| FrameSaver::create(dir, "display", SaveFormat::Png))
            .transpose()?;
        let timestamps = config
            .timestamp_logs
            .then(|| {
                TimestampLogger::create(&dir.join(FRAME_TIMESTAMP_LOG), &dir.join(HOST_TIMESTAMP_LOG))
            })
            .transpose()?;
        info!(dir = %dir.display(), "Writing session output");
        Ok(Some(Self {
            saver,
            display_saver,
            timestamps,
        }))
    }

    fn record(&mut self, frame: &Frame) {
        let Some(log) = self.timestamps.as_mut() else {
            return;
        };
        let sequence = frame.metadata.sequence.map_or(f64::NAN, f64::from);
        let host = frame.metadata.host_timestamp.unwrap_or(f64::NAN);
        if let Err(e) = log.record(sequence, host) {
            warn!(error = %e, "Timestamp log write failed");
        }
    }

    fn save_average(&mut self, average: &Array2<f64>) {
        if let Some(saver) = self.saver.as_mut() {
            if let Err(e) = saver.save(average) {
                warn!(error = %e, "Saving average failed");
            }
        }
    }

    fn save_display(&mut self, display: &DisplayFrame) {
        if let Some(saver) = self.display_saver.as_mut() {
            if let Err(e) = saver.save_display(display) {
                warn!(error = %e, "Saving display image failed");
            }
        }
    }

    /// Averages written so far.
    pub fn saved_averages(&self) -> u64 {
        self.saver.as_ref().map_or(0, FrameSaver::saved)
    }

    /// Flush the timestamp logs.
    pub fn finish(self) -> Result<u64> {
        match self.timestamps {
            Some(log) => log.finish(),
            None => Ok(0),
        }
    }
}

/// Everything the processing consumer owns: tracker, processor, ROI,
/// accumulator, display settings, annotations and the summed-signal series.
///
/// One session is driven by one consumer; all state changes go through
/// `&mut self`.
pub struct Session {
    tracker: FrameSequenceTracker,
    registry: ProcessorRegistry,
    processor: ProcessorSlot,
    roi: Option<RoiParams>,
    extractor: RoiExtractor,
    accumulator: FrameAccumulator,
    scaler: DisplayScaler,
    display_min: f64,
    display_max: f64,
    background: Option<Array2<f64>>,
    engine: AnnotationEngine,
    script: Option<String>,
    annotations: Vec<Annotation>,
    annotation_shape: Option<(usize, usize)>,
    series: ScrollingSeries,
    histogram: LogHistogram,
    output: Option<SessionOutput>,
    next_index: u64,
    last_display: Option<DisplayFrame>,
    stats: SessionStats,
}

impl Session {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        Self::with_registry(config, ProcessorRegistry::with_builtins())
    }

    /// Session using a caller-provided processor registry.
    pub fn with_registry(config: &PipelineConfig, registry: ProcessorRegistry) -> Result<Self> {
        let processor = ProcessorSlot::new(registry.create(&config.processor.name)?);
        let script = match &config.annotation.script {
            Some(path) => Some(read_script(path)?),
            None => None,
        };

        Ok(Self {
            tracker: FrameSequenceTracker::new(config.sequence.bit_width),
            registry,
            processor,
            roi: config.roi,
            extractor: RoiExtractor::new(),
            accumulator: FrameAccumulator::new(config.accumulation.target),
            scaler: DisplayScaler::new(config.display.subtract_background),
            display_min: config.display.min,
            display_max: config.display.max,
            background: None,
            engine: AnnotationEngine::new(config.annotation.comment_style),
            script,
            annotations: Vec::new(),
            annotation_shape: None,
            series: ScrollingSeries::new(config.accumulation.series_capacity),
            histogram: LogHistogram::default(),
            output: None,
            next_index: 0,
            last_display: None,
            stats: SessionStats::default(),
        })
    }

    /// Start writing files as described by `config`.
    pub fn attach_output(&mut self, config: &OutputConfig) -> Result<()> {
        self.output = SessionOutput::from_config(config)?;
        Ok(())
    }

    /// Stop writing files and flush them. Returns the number of timestamp
    /// records written.
    pub fn finish_output(&mut self) -> Result<u64> {
        match self.output.take() {
            Some(output) => output.finish(),
            None => Ok(0),
        }
    }

    pub fn output(&self) -> Option<&SessionOutput> {
        self.output.as_ref()
    }

    /// Feed a frame from the acquisition reader.
    pub fn process_raw(&mut self, raw: RawFrame, bit_depth: u8) -> Option<DisplayFrame> {
        let frame = raw.into_frame(self.next_index, bit_depth);
        self.process_frame(frame)
    }

    /// Run one frame through the pipeline. Returns a display frame when
    /// this frame completed an average that could be rendered.
    pub fn process_frame(&mut self, frame: Frame) -> Option<DisplayFrame> {
        self.next_index = frame.metadata.frame_index + 1;
        self.stats.frames += 1;

        if let Some(sequence) = frame.metadata.sequence {
            self.tracker.observe(sequence);
        }
        if let Some(output) = self.output.as_mut() {
            output.record(&frame);
        }

        let frame = self.processor.process(frame)?;
        self.stats.processed += 1;

        let windowed = self.extractor.apply(&frame, self.roi.as_ref());
        self.series.push(windowed.data.sum());

        if !self.accumulator.add(&windowed) {
            return None;
        }
        if let (Some(output), Some(average)) = (self.output.as_mut(), self.accumulator.average()) {
            output.save_average(average);
        }
        self.render_latest()
    }

    /// Render the most recent average with the current display settings.
    pub fn render_latest(&mut self) -> Option<DisplayFrame> {
        let mut display = match self.render_average() {
            Ok(display) => display?,
            Err(BeamviewError::DegenerateRange { min, max }) => {
                warn!(min, max, "Degenerate display range, render skipped");
                self.stats.skipped_renders += 1;
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Render failed");
                self.stats.skipped_renders += 1;
                return None;
            }
        };

        self.annotate(&mut display);
        if let Some(output) = self.output.as_mut() {
            output.save_display(&display);
        }
        self.stats.rendered += 1;
        self.last_display = Some(display.clone());
        Some(display)
    }

    fn render_average(&mut self) -> Result<Option<DisplayFrame>> {
        let Some(average) = self.accumulator.average() else {
            return Ok(None);
        };
        let result = self.scaler.render(
            average,
            self.display_min,
            self.display_max,
            self.background.as_ref(),
        );
        match result {
            Err(BeamviewError::ShapeMismatch { expected, actual }) => {
                warn!(?expected, ?actual, "Background no longer matches, dropped");
                self.background = None;
                self.scaler
                    .render(average, self.display_min, self.display_max, None)
                    .map(Some)
            }
            other => other.map(Some),
        }
    }

    fn annotate(&mut self, display: &mut DisplayFrame) {
        let Some(script) = &self.script else {
            return;
        };
        let shape = (display.height(), display.width());
        if self.annotation_shape != Some(shape) {
            self.annotations = self.engine.parse(script, shape);
            self.annotation_shape = Some(shape);
            debug!(count = self.annotations.len(), ?shape, "Annotations parsed");
        }
        AnnotationEngine::apply(display, &self.annotations);
    }

    /// Keep the latest average as background. Returns false if no average
    /// exists yet.
    pub fn capture_background(&mut self) -> bool {
        match self.accumulator.average() {
            Some(average) => {
                self.background = Some(average.clone());
                info!("Background captured");
                true
            }
            None => false,
        }
    }

    pub fn clear_background(&mut self) {
        self.background = None;
    }

    pub fn background(&self) -> Option<&Array2<f64>> {
        self.background.as_ref()
    }

    pub fn set_subtract_background(&mut self, enabled: bool) {
        self.scaler.set_subtract_background(enabled);
    }

    pub fn set_display_range(&mut self, min: f64, max: f64) {
        self.display_min = min;
        self.display_max = max;
    }

    pub fn display_range(&self) -> (f64, f64) {
        (self.display_min, self.display_max)
    }

    /// Change the ROI. The partial sum is discarded since its shape or
    /// weighting no longer applies; the last average stays available.
    pub fn set_roi(&mut self, roi: Option<RoiParams>) {
        if self.roi != roi {
            self.roi = roi;
            self.accumulator.discard_partial();
        }
    }

    pub fn roi(&self) -> Option<&RoiParams> {
        self.roi.as_ref()
    }

    pub fn set_accumulation_target(&mut self, target: usize) {
        self.accumulator.set_target(target);
    }

    /// Replace the overlay script; annotations are rebuilt on the next
    /// render.
    pub fn set_annotation_script(&mut self, script: Option<String>) {
        self.script = script;
        self.annotations.clear();
        self.annotation_shape = None;
    }

    /// Swap to another registered processor, carrying its state over.
    pub fn swap_processor(&mut self, name: &str) -> Result<()> {
        self.processor.reload(&self.registry, name)
    }

    pub fn processor_name(&self) -> &str {
        self.processor.name()
    }

    /// Forget per-connection state (after a reconnect). Drop totals and the
    /// background are kept.
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.accumulator.reset();
        self.last_display = None;
    }

    pub fn tracker(&self) -> &FrameSequenceTracker {
        &self.tracker
    }

    pub fn accumulator(&self) -> &FrameAccumulator {
        &self.accumulator
    }

    pub fn series(&self) -> &ScrollingSeries {
        &self.series
    }

    /// Level histogram of the most recent average.
    pub fn histogram(&self) -> Option<Histogram> {
        self.accumulator.average().map(|a| self.histogram.compute(a))
    }

    pub fn last_display(&self) -> Option<&DisplayFrame> {
        self.last_display.as_ref()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }
}

fn read_script(path: &Path) -> Result<String> {
    let script = std::fs::read_to_string(path)?;
    debug!(path = %path.display(), "Annotation script loaded");
    Ok(script)
}
