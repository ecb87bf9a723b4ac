use winit::event::{ElementState, MouseButton};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub const ALL: [Handedness; 2] = [Handedness::Left, Handedness::Right];

    pub(crate) const fn index(self) -> usize {
        match self {
            Handedness::Left => 0,
            Handedness::Right => 1,
        }
    }
}

/// The two on-screen buttons shown in mobile mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchButton {
    Grab,
    Use,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XrComponent {
    Squeeze,
    Trigger,
}

/// Raw device callback, delivered between frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputSignal {
    Pointer {
        button: MouseButton,
        state: ElementState,
    },
    Touch {
        button: TouchButton,
        pressed: bool,
    },
    Xr {
        hand: Handedness,
        component: XrComponent,
        value: f32,
        pressed: bool,
    },
}

impl InputSignal {
    pub fn source(&self) -> InputSource {
        match self {
            InputSignal::Pointer { .. } => InputSource::Pointer,
            InputSignal::Touch { .. } => InputSource::TouchButtons,
            InputSignal::Xr { hand, .. } => InputSource::XrController(*hand),
        }
    }
}

/// Key a handler subscribes with; signals from unsubscribed sources are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    Pointer,
    TouchButtons,
    XrController(Handedness),
}

const COMPONENT_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ControllerStates {
    values: [[f32; COMPONENT_COUNT]; 2],
    pressed: [[bool; COMPONENT_COUNT]; 2],
}

impl ControllerStates {
    pub(crate) fn set(
        &mut self,
        hand: Handedness,
        component: XrComponent,
        value: f32,
        pressed: bool,
    ) {
        self.values[hand.index()][component.index()] = value;
        self.pressed[hand.index()][component.index()] = pressed;
    }

    pub(crate) fn value(&self, hand: Handedness, component: XrComponent) -> f32 {
        self.values[hand.index()][component.index()]
    }

    pub(crate) fn is_pressed(&self, hand: Handedness, component: XrComponent) -> bool {
        self.pressed[hand.index()][component.index()]
    }
}

impl XrComponent {
    const fn index(self) -> usize {
        match self {
            XrComponent::Squeeze => 0,
            XrComponent::Trigger => 1,
        }
    }
}
