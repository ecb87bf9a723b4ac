use crate::world::EntityId;

use super::input::Handedness;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Desktop,
    Mobile,
    Xr,
    Loading,
}

impl Mode {
    pub fn as_token(self) -> &'static str {
        match self {
            Mode::Desktop => "desktop",
            Mode::Mobile => "mobile",
            Mode::Xr => "xr",
            Mode::Loading => "loading",
        }
    }

    pub fn from_token(token: &str) -> Option<Mode> {
        match token.trim().to_ascii_lowercase().as_str() {
            "desktop" => Some(Mode::Desktop),
            "mobile" => Some(Mode::Mobile),
            "xr" => Some(Mode::Xr),
            "loading" => Some(Mode::Loading),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SelectorId(pub u32);

/// Which physical device drives a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorDevice {
    /// Mouse on desktop, on-screen buttons on mobile.
    Pointer,
    Controller(Handedness),
}

/// An anchor/grabber pair plus its committed and candidate entities.
///
/// `target` is recomputed every frame; `grabbed` only changes through
/// explicit grab requests on the manager.
#[derive(Debug, Clone)]
pub struct Selector {
    pub id: SelectorId,
    pub device: SelectorDevice,
    pub anchor: EntityId,
    pub grabber: EntityId,
    modes: Vec<Mode>,
    pub(crate) grabbed: Option<EntityId>,
    pub(crate) target: Option<EntityId>,
}

impl Selector {
    pub fn is_live_in(&self, mode: Mode) -> bool {
        self.modes.contains(&mode)
    }

    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    pub fn grabbed(&self) -> Option<EntityId> {
        self.grabbed
    }

    pub fn target(&self) -> Option<EntityId> {
        self.target
    }
}

#[derive(Debug, Default)]
pub struct SelectorIdAllocator {
    next: u32,
}

impl SelectorIdAllocator {
    pub fn allocate(&mut self) -> SelectorId {
        let id = SelectorId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Insertion-ordered selector storage. Iteration order is registration order.
#[derive(Debug, Default)]
pub struct SelectorTable {
    allocator: SelectorIdAllocator,
    selectors: Vec<Selector>,
}

impl SelectorTable {
    pub fn register(
        &mut self,
        device: SelectorDevice,
        anchor: EntityId,
        grabber: EntityId,
        modes: &[Mode],
    ) -> SelectorId {
        let id = self.allocator.allocate();
        let mut modes = modes.to_vec();
        modes.dedup();
        self.selectors.push(Selector {
            id,
            device,
            anchor,
            grabber,
            modes,
            grabbed: None,
            target: None,
        });
        id
    }

    pub fn get(&self, id: SelectorId) -> Option<&Selector> {
        self.selectors.iter().find(|selector| selector.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: SelectorId) -> Option<&mut Selector> {
        self.selectors.iter_mut().find(|selector| selector.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Selector> {
        self.selectors.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Selector> {
        self.selectors.iter_mut()
    }

    pub fn live_in(&self, mode: Mode) -> impl Iterator<Item = &Selector> {
        self.selectors
            .iter()
            .filter(move |selector| selector.is_live_in(mode))
    }

    pub fn find_live(&self, mode: Mode, device: SelectorDevice) -> Option<SelectorId> {
        self.live_in(mode)
            .find(|selector| selector.device == device)
            .map(|selector| selector.id)
    }

    /// Selector currently holding `entity`, if any.
    pub fn holder_of(&self, entity: EntityId) -> Option<SelectorId> {
        self.selectors
            .iter()
            .find(|selector| selector.grabbed == Some(entity))
            .map(|selector| selector.id)
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_never_reuses_ids() {
        let mut allocator = SelectorIdAllocator::default();
        assert_eq!(allocator.allocate(), SelectorId(0));
        assert_eq!(allocator.allocate(), SelectorId(1));
    }

    #[test]
    fn selectors_are_only_live_in_registered_modes() {
        let mut table = SelectorTable::default();
        let pointer = table.register(
            SelectorDevice::Pointer,
            EntityId(1),
            EntityId(2),
            &[Mode::Desktop, Mode::Mobile],
        );
        let left = table.register(
            SelectorDevice::Controller(Handedness::Left),
            EntityId(3),
            EntityId(4),
            &[Mode::Xr],
        );

        assert_eq!(table.find_live(Mode::Mobile, SelectorDevice::Pointer), Some(pointer));
        assert_eq!(table.find_live(Mode::Xr, SelectorDevice::Pointer), None);
        assert_eq!(
            table.find_live(Mode::Xr, SelectorDevice::Controller(Handedness::Left)),
            Some(left)
        );
        assert_eq!(table.live_in(Mode::Loading).count(), 0);
    }

    #[test]
    fn mode_tokens_parse_case_insensitively() {
        assert_eq!(Mode::from_token(" XR "), Some(Mode::Xr));
        assert_eq!(Mode::from_token("Desktop"), Some(Mode::Desktop));
        assert_eq!(Mode::from_token("vr"), None);
        assert_eq!(Mode::Mobile.as_token(), "mobile");
    }
}
