#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure construct-mode system responsible for emitting bridge commit, removal and rotation commands.

use riverford_core::{
    BridgeKind, BridgeRejection, BridgeSpan, Command, Event, GridOffset, RemovalMode, Rotation,
    TileCoord, ToolMode,
};

/// Declarative preview describing the bridge the cursor would build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BridgePreview {
    /// Kind of bridge proposed for construction.
    pub kind: BridgeKind,
    /// Shoreline tile the detection started from.
    pub origin: TileCoord,
    /// Detection result for the hovered shoreline.
    pub outcome: Result<BridgeSpan, BridgeRejection>,
}

impl BridgePreview {
    /// Creates a new bridge preview descriptor.
    #[must_use]
    pub const fn new(
        kind: BridgeKind,
        origin: TileCoord,
        outcome: Result<BridgeSpan, BridgeRejection>,
    ) -> Self {
        Self {
            kind,
            origin,
            outcome,
        }
    }

    /// Span that can be committed as-is, if the preview describes a buildable bridge.
    #[must_use]
    pub fn placeable(&self) -> Option<BridgeSpan> {
        self.outcome
            .ok()
            .filter(|span| span.kind() == self.kind && span.meets_minimum_length())
    }
}

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuilderInput {
    /// Indicates whether the player confirmed construction on this frame.
    pub confirm_action: bool,
    /// Indicates whether the player requested bridge removal on this frame.
    pub remove_action: bool,
    /// Quarter turn requested for the map view on this frame.
    pub rotate: Option<Rotation>,
    /// Tile currently hovered by the cursor.
    pub cursor: Option<GridOffset>,
}

impl BuilderInput {
    /// Creates a new input descriptor with explicit field values.
    #[must_use]
    pub const fn new(
        confirm_action: bool,
        remove_action: bool,
        rotate: Option<Rotation>,
        cursor: Option<GridOffset>,
    ) -> Self {
        Self {
            confirm_action,
            remove_action,
            rotate,
            cursor,
        }
    }
}

/// Construct-mode system that translates preview + input into bridge commands.
///
/// Bridges with walkers on them are only marked for deletion. The system
/// remembers them and clears each one on the first frame its deck is empty.
#[derive(Debug, Clone, Default)]
pub struct BridgeBuilder {
    tool_mode: ToolMode,
    pending_removals: Vec<GridOffset>,
    routing_stale: bool,
}

impl BridgeBuilder {
    /// Creates a new bridge builder system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tool_mode: ToolMode::Inspect,
            pending_removals: Vec::new(),
            routing_stale: false,
        }
    }

    /// Bridges marked for deletion that are still waiting for walkers to leave.
    #[must_use]
    pub fn pending_removals(&self) -> &[GridOffset] {
        &self.pending_removals
    }

    /// Consumes world events and adapter-derived input to emit builder commands.
    ///
    /// The `units_on_bridge` closure should mirror the semantics of the
    /// world's `query::count_units_on_bridge` helper.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        preview: Option<BridgePreview>,
        input: BuilderInput,
        mut units_on_bridge: F,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(GridOffset) -> u32,
    {
        for event in events {
            self.observe(event);
        }

        if let Some(rotation) = input.rotate {
            out.push(Command::RotateMap { rotation });
        }

        self.finalize_vacated(&mut units_on_bridge, out);

        if self.routing_stale {
            self.routing_stale = false;
            out.push(Command::RecomputeRouting);
        }

        if self.tool_mode != ToolMode::Construct {
            return;
        }

        if input.confirm_action {
            if let Some(span) = preview.as_ref().and_then(BridgePreview::placeable) {
                out.push(Command::CommitBridge { span });
            }
        }

        if input.remove_action {
            if let Some(offset) = input.cursor {
                let mode = if units_on_bridge(offset) == 0 {
                    RemovalMode::Clear
                } else {
                    RemovalMode::MarkDeleted
                };
                out.push(Command::RemoveBridge { offset, mode });
            }
        }
    }

    fn observe(&mut self, event: &Event) {
        match event {
            Event::ToolModeChanged { mode } => self.tool_mode = *mode,
            Event::MapConfigured { .. } => {
                self.pending_removals.clear();
                self.routing_stale = false;
            }
            Event::BridgeRemoved {
                start,
                mode: RemovalMode::MarkDeleted,
                ..
            } => {
                if !self.pending_removals.contains(start) {
                    self.pending_removals.push(*start);
                }
            }
            Event::BridgeRemoved {
                start,
                mode: RemovalMode::Clear,
                ..
            } => {
                self.pending_removals.retain(|pending| pending != start);
                self.routing_stale = true;
            }
            Event::BridgeRestored { start, .. } => {
                self.pending_removals.retain(|pending| pending != start);
            }
            _ => {}
        }
    }

    fn finalize_vacated<F>(&mut self, units_on_bridge: &mut F, out: &mut Vec<Command>)
    where
        F: FnMut(GridOffset) -> u32,
    {
        self.pending_removals.retain(|&start| {
            if units_on_bridge(start) > 0 {
                return true;
            }
            out.push(Command::RemoveBridge {
                offset: start,
                mode: RemovalMode::Clear,
            });
            false
        });
    }
}
