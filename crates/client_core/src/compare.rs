//! Split-view comparison of registered images.
//!
//! Two of the three catalog slots are selected at any time. The selected slot
//! with the lower layering priority is drawn full-width as the base layer; the
//! other is drawn on top, clipped to `[0, slider]` percent of the width.

use std::{fmt, str::FromStr};

use thiserror::Error;

pub const SLIDER_MIN: f64 = 0.0;
pub const SLIDER_MAX: f64 = 100.0;
pub const SLIDER_RESET: f64 = 50.0;
pub const SELECTION_SIZE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotId {
    GroundTruth,
    AiInferred,
    Brightfield,
}

impl SlotId {
    pub const ALL: [SlotId; 3] = [Self::GroundTruth, Self::AiInferred, Self::Brightfield];

    pub fn short_name(self) -> &'static str {
        match self {
            Self::GroundTruth => "gt",
            Self::AiInferred => "ai",
            Self::Brightfield => "bf",
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown comparison slot '{0}', expected gt, ai or bf")]
pub struct UnknownSlot(pub String);

impl FromStr for SlotId {
    type Err = UnknownSlot;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gt" | "ground_truth" | "ground-truth" => Ok(Self::GroundTruth),
            "ai" | "ai_inferred" | "ai-inferred" => Ok(Self::AiInferred),
            "bf" | "brightfield" => Ok(Self::Brightfield),
            _ => Err(UnknownSlot(s.to_string())),
        }
    }
}

/// Where each slot's image is served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareSources {
    pub ground_truth: String,
    pub ai_inferred: String,
    pub brightfield: String,
}

impl Default for CompareSources {
    fn default() -> Self {
        Self {
            ground_truth: "/1.png".into(),
            ai_inferred: "/2.png".into(),
            brightfield: "/3.png".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub id: SlotId,
    pub label: &'static str,
    pub color: &'static str,
    /// Only used to order layers; lower draws underneath.
    pub priority: u8,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    slots: [Slot; 3],
}

impl Catalog {
    pub fn new(sources: CompareSources) -> Self {
        Self {
            slots: [
                Slot {
                    id: SlotId::GroundTruth,
                    label: "Ground Truth",
                    color: "blue",
                    priority: 0,
                    source: sources.ground_truth,
                },
                Slot {
                    id: SlotId::AiInferred,
                    label: "AI Inferred",
                    color: "purple",
                    priority: 1,
                    source: sources.ai_inferred,
                },
                Slot {
                    id: SlotId::Brightfield,
                    label: "Brightfield Input",
                    color: "amber",
                    priority: 2,
                    source: sources.brightfield,
                },
            ],
        }
    }

    pub fn slot(&self, id: SlotId) -> &Slot {
        match id {
            SlotId::GroundTruth => &self.slots[0],
            SlotId::AiInferred => &self.slots[1],
            SlotId::Brightfield => &self.slots[2],
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(CompareSources::default())
    }
}

/// Selected slots, oldest addition first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    members: Vec<SlotId>,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            members: vec![SlotId::GroundTruth, SlotId::AiInferred],
        }
    }
}

impl Selection {
    pub fn members(&self) -> &[SlotId] {
        &self.members
    }

    /// Returns the selection after toggling `id`, or `None` when the toggle is
    /// rejected because it would leave fewer than two members.
    pub fn toggled(&self, id: SlotId) -> Option<Selection> {
        let mut members = self.members.clone();
        if let Some(index) = members.iter().position(|member| *member == id) {
            if members.len() - 1 < SELECTION_SIZE {
                return None;
            }
            members.remove(index);
        } else {
            members.push(id);
            while members.len() > SELECTION_SIZE {
                members.remove(0);
            }
        }
        Some(Selection { members })
    }
}

/// Horizontal extent of the comparison container in pointer coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerBounds {
    pub left: f64,
    pub width: f64,
}

/// Projects a pointer's x coordinate to a percentage of the container width.
///
/// Returns `None` for degenerate geometry (zero, negative or non-finite width)
/// or a non-finite coordinate.
pub fn slider_position(client_x: f64, bounds: ContainerBounds) -> Option<f64> {
    if !bounds.width.is_finite() || bounds.width <= 0.0 || !client_x.is_finite() {
        return None;
    }
    if !bounds.left.is_finite() {
        return None;
    }

    let x = (client_x - bounds.left).clamp(0.0, bounds.width);
    Some((x / bounds.width * 100.0).clamp(SLIDER_MIN, SLIDER_MAX))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    MouseDown { client_x: f64 },
    MouseMove { client_x: f64, primary_pressed: bool },
    TouchMove { client_x: f64 },
}

impl PointerInput {
    /// The coordinate to track, if this input should move the slider at all.
    fn tracked_x(self) -> Option<f64> {
        match self {
            Self::MouseDown { client_x } | Self::TouchMove { client_x } => Some(client_x),
            Self::MouseMove {
                client_x,
                primary_pressed: true,
            } => Some(client_x),
            Self::MouseMove { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompareEvent {
    Toggle(SlotId),
    Pointer {
        input: PointerInput,
        bounds: ContainerBounds,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layers<'a> {
    pub base: &'a Slot,
    pub overlay: &'a Slot,
}

/// Orders the two selected slots into base and overlay by layering priority.
pub fn compute_layers<'a>(selection: &Selection, catalog: &'a Catalog) -> Layers<'a> {
    let mut slots: Vec<&Slot> = selection
        .members()
        .iter()
        .map(|id| catalog.slot(*id))
        .collect();
    slots.sort_by_key(|slot| (slot.priority, slot.id));

    let base = slots.first().copied().unwrap_or_else(|| catalog.slot(SlotId::GroundTruth));
    let overlay = slots.last().copied().unwrap_or(base);
    Layers { base, overlay }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSide {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerLabel<'a> {
    pub text: &'static str,
    pub color: &'static str,
    pub side: LabelSide,
    pub slot: &'a Slot,
}

/// Everything needed to draw the comparison frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition<'a> {
    pub layers: Layers<'a>,
    /// Overlay is visible over `[0, clip_end]` percent of the width.
    pub clip_end: f64,
    pub labels: [LayerLabel<'a>; 2],
}

impl Composition<'_> {
    pub fn clip_polygon(&self) -> String {
        let p = self.clip_end;
        format!("polygon(0 0, {p}% 0, {p}% 100%, 0 100%)")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompareState {
    selection: Selection,
    slider: f64,
}

impl Default for CompareState {
    fn default() -> Self {
        Self {
            selection: Selection::default(),
            slider: SLIDER_RESET,
        }
    }
}

impl CompareState {
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn slider(&self) -> f64 {
        self.slider
    }

    pub fn apply(self, event: CompareEvent) -> CompareState {
        match event {
            CompareEvent::Toggle(id) => self.toggle_selection(id),
            CompareEvent::Pointer { input, bounds } => match input.tracked_x() {
                Some(client_x) => self.set_slider_position(client_x, bounds),
                None => self,
            },
        }
    }

    pub fn toggle_selection(self, id: SlotId) -> CompareState {
        match self.selection.toggled(id) {
            Some(selection) => CompareState {
                selection,
                slider: SLIDER_RESET,
            },
            None => self,
        }
    }

    pub fn set_slider_position(self, client_x: f64, bounds: ContainerBounds) -> CompareState {
        match slider_position(client_x, bounds) {
            Some(slider) => CompareState { slider, ..self },
            None => {
                tracing::debug!(width = bounds.width, "ignoring pointer over degenerate container");
                self
            }
        }
    }

    pub fn compose<'a>(&self, catalog: &'a Catalog) -> Composition<'a> {
        let layers = compute_layers(&self.selection, catalog);
        let overlay = LayerLabel {
            text: layers.overlay.label,
            color: layers.overlay.color,
            side: LabelSide::Left,
            slot: layers.overlay,
        };
        let base = LayerLabel {
            text: layers.base.label,
            color: layers.base.color,
            side: LabelSide::Right,
            slot: layers.base,
        };
        Composition {
            layers,
            clip_end: self.slider,
            labels: [overlay, base],
        }
    }
}
