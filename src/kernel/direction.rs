/// Signed heading offset in degrees.
pub type Heading = f64;

/// Degrees added per avoidance turn.
pub const TURN_DEGREES: f64 = 60.0;

/// Next heading after one avoidance turn.
///
/// The sign flip alternates the net rotation under the actuator's own sign
/// convention, so repeated turns don't keep spinning the body the same way.
/// The remainder is taken euclidean-style, so the result is always in
/// `(-360, 0]` whatever the input.
pub fn next_heading(current: Heading) -> Heading {
    let wrapped = (current + TURN_DEGREES).rem_euclid(360.0);
    if wrapped == 0.0 || wrapped >= 360.0 {
        0.0
    } else {
        -wrapped
    }
}

/// Heading owned by a single controller. Only [`DirectionState::turn`] changes it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DirectionState {
    heading: Heading,
}

impl DirectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn turn(&mut self) -> Heading {
        self.heading = next_heading(self.heading);
        self.heading
    }
}
