use crate::world::EntityId;

use super::selector::Mode;

/// Who is responsible for a grab or activation: the selector's anchor/grabber pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Holder {
    pub anchor: EntityId,
    pub grabber: EntityId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionEvent {
    Grab { entity: EntityId, holder: Holder },
    Drop { entity: EntityId, holder: Holder },
    Active { entity: EntityId, holder: Holder },
    Inactive { entity: EntityId, holder: Holder },
    ModeChanged { from: Mode, to: Mode },
}

impl InteractionEvent {
    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Self::Grab { entity, .. }
            | Self::Drop { entity, .. }
            | Self::Active { entity, .. }
            | Self::Inactive { entity, .. } => Some(*entity),
            Self::ModeChanged { .. } => None,
        }
    }

    fn kind(&self) -> InteractionEventKind {
        match self {
            Self::Grab { .. } => InteractionEventKind::Grab,
            Self::Drop { .. } => InteractionEventKind::Drop,
            Self::Active { .. } => InteractionEventKind::Active,
            Self::Inactive { .. } => InteractionEventKind::Inactive,
            Self::ModeChanged { .. } => InteractionEventKind::ModeChanged,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InteractionEventKind {
    Grab,
    Drop,
    Active,
    Inactive,
    ModeChanged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionEventCounts {
    pub total: u32,
    pub grabs: u32,
    pub drops: u32,
    pub activations: u32,
    pub deactivations: u32,
    pub mode_changes: u32,
}

impl InteractionEventCounts {
    fn record(&mut self, kind: InteractionEventKind) {
        self.total = self.total.saturating_add(1);
        match kind {
            InteractionEventKind::Grab => self.grabs = self.grabs.saturating_add(1),
            InteractionEventKind::Drop => self.drops = self.drops.saturating_add(1),
            InteractionEventKind::Active => {
                self.activations = self.activations.saturating_add(1)
            }
            InteractionEventKind::Inactive => {
                self.deactivations = self.deactivations.saturating_add(1)
            }
            InteractionEventKind::ModeChanged => {
                self.mode_changes = self.mode_changes.saturating_add(1)
            }
        }
    }
}

/// Ordered outbox for interaction notifications.
///
/// Events are appended in the exact order transitions happen and drained by
/// the session once the current callback has finished mutating state.
#[derive(Debug, Default)]
pub struct InteractionEventBus {
    pending: Vec<InteractionEvent>,
    lifetime_counts: InteractionEventCounts,
}

impl InteractionEventBus {
    pub fn emit(&mut self, event: InteractionEvent) {
        self.lifetime_counts.record(event.kind());
        self.pending.push(event);
    }

    pub fn pending(&self) -> &[InteractionEvent] {
        &self.pending
    }

    pub fn drain(&mut self) -> Vec<InteractionEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn lifetime_counts(&self) -> InteractionEventCounts {
        self.lifetime_counts
    }
}
