//! Swappable per-frame processing stage.
//!
//! A processor is looked up by name in a [`ProcessorRegistry`] and lives in
//! a [`ProcessorSlot`]. Replacing it moves state across explicitly: the old
//! instance exports named fields, the new one imports the fields it knows,
//! converting from the old version where needed.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::error::{BeamviewError, Result};
use crate::frame::{Frame, FrameData};

/// One exported field of processor state.
#[derive(Clone, Debug)]
pub enum StateValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Frame(Frame),
}

pub type ProcessorState = BTreeMap<String, StateValue>;

/// A processing strategy applied to every frame before windowing.
pub trait FrameProcessor: Send {
    fn name(&self) -> &str;

    /// Bumped whenever the exported state layout changes.
    fn version(&self) -> u32;

    /// Return the processed frame, or `None` if there is nothing new to
    /// pass downstream.
    fn process(&mut self, frame: Frame) -> Option<Frame>;

    fn export_state(&self) -> ProcessorState {
        ProcessorState::new()
    }

    /// Take over state exported by a predecessor of version `from_version`.
    /// Unknown fields are ignored.
    fn import_state(&mut self, _state: ProcessorState, _from_version: u32) {}
}

/// Returns frames unchanged.
#[derive(Debug, Default)]
pub struct Passthrough;

impl FrameProcessor for Passthrough {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn version(&self) -> u32 {
        1
    }

    fn process(&mut self, frame: Frame) -> Option<Frame> {
        Some(frame)
    }
}

/// Subtracts the previous frame, highlighting what changed.
#[derive(Debug, Default)]
pub struct SubtractPrevious {
    previous: Option<Frame>,
}

impl FrameProcessor for SubtractPrevious {
    fn name(&self) -> &str {
        "subtract-previous"
    }

    fn version(&self) -> u32 {
        1
    }

    fn process(&mut self, frame: Frame) -> Option<Frame> {
        let previous = match self.previous.take() {
            Some(p) if p.dim() == frame.dim() => p,
            _ => frame.clone(),
        };
        let diff = frame.data.to_f64() - previous.data.to_f64();
        let out = Frame::float(diff, frame.bit_depth).with_metadata(frame.metadata.clone());
        self.previous = Some(frame);
        Some(out)
    }

    fn export_state(&self) -> ProcessorState {
        let mut state = ProcessorState::new();
        if let Some(previous) = &self.previous {
            state.insert("previous".into(), StateValue::Frame(previous.clone()));
        }
        state
    }

    fn import_state(&mut self, mut state: ProcessorState, _from_version: u32) {
        if let Some(StateValue::Frame(previous)) = state.remove("previous") {
            self.previous = Some(previous);
        }
    }
}

/// Removes a constant dark level.
///
/// Version 1 stored `dark_level` as an integer count; version 2 stores a
/// float.
#[derive(Debug, Default)]
pub struct DarkOffset {
    level: f64,
}

impl DarkOffset {
    pub fn new(level: f64) -> Self {
        Self { level }
    }

    pub fn level(&self) -> f64 {
        self.level
    }
}

impl FrameProcessor for DarkOffset {
    fn name(&self) -> &str {
        "dark-offset"
    }

    fn version(&self) -> u32 {
        2
    }

    fn process(&mut self, frame: Frame) -> Option<Frame> {
        if self.level == 0.0 {
            return Some(frame);
        }
        let level = self.level;
        let data = match &frame.data {
            FrameData::Raw(a) => a.mapv(|v| v as f64 - level),
            FrameData::Float(a) => a.mapv(|v| v - level),
        };
        Some(Frame::float(data, frame.bit_depth).with_metadata(frame.metadata.clone()))
    }

    fn export_state(&self) -> ProcessorState {
        let mut state = ProcessorState::new();
        state.insert("dark_level".into(), StateValue::Float(self.level));
        state
    }

    fn import_state(&mut self, mut state: ProcessorState, from_version: u32) {
        self.level = match (from_version, state.remove("dark_level")) {
            (1, Some(StateValue::Int(level))) => level as f64,
            (_, Some(StateValue::Float(level))) => level,
            _ => return,
        };
    }
}

pub type ProcessorConstructor = fn() -> Box<dyn FrameProcessor>;

/// Named processor constructors.
#[derive(Clone, Debug)]
pub struct ProcessorRegistry {
    constructors: BTreeMap<String, ProcessorConstructor>,
}

impl ProcessorRegistry {
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Registry with the built-in processors.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("passthrough", || Box::new(Passthrough));
        registry.register("subtract-previous", || Box::new(SubtractPrevious::default()));
        registry.register("dark-offset", || Box::new(DarkOffset::default()));
        registry
    }

    /// Add or replace a constructor.
    pub fn register(&mut self, name: impl Into<String>, constructor: ProcessorConstructor) {
        self.constructors.insert(name.into(), constructor);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn FrameProcessor>> {
        self.constructors
            .get(name)
            .map(|ctor| ctor())
            .ok_or_else(|| BeamviewError::UnknownProcessor(name.to_string()))
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Holds the active processor and performs swaps.
pub struct ProcessorSlot {
    current: Box<dyn FrameProcessor>,
    generation: u64,
}

impl ProcessorSlot {
    pub fn new(processor: Box<dyn FrameProcessor>) -> Self {
        Self {
            current: processor,
            generation: 0,
        }
    }

    pub fn name(&self) -> &str {
        self.current.name()
    }

    pub fn version(&self) -> u32 {
        self.current.version()
    }

    /// Number of swaps performed.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn process(&mut self, frame: Frame) -> Option<Frame> {
        self.current.process(frame)
    }

    /// Replace the processor, migrating state from the old one.
    pub fn swap(&mut self, mut next: Box<dyn FrameProcessor>) {
        let state = self.current.export_state();
        let from_version = self.current.version();
        debug!(fields = state.len(), from_version, "Migrating processor state");
        next.import_state(state, from_version);
        info!(
            from = self.current.name(),
            to = next.name(),
            version = next.version(),
            "Processor swapped"
        );
        self.current = next;
        self.generation += 1;
    }

    /// Swap to a fresh instance of a registered processor.
    pub fn reload(&mut self, registry: &ProcessorRegistry, name: &str) -> Result<()> {
        let next = registry.create(name)?;
        self.swap(next);
        Ok(())
    }
}

impl Default for ProcessorSlot {
    fn default() -> Self {
        Self::new(Box::new(Passthrough))
    }
}
