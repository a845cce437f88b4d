use opshift_bindings::ButtonMode;

/// Turns a raw button signal into the output of a digital binding.
///
/// Click and toggle keep the previous raw value to detect rising edges, so an
/// evaluator must see each cycle at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvaluator {
    Simple,
    Click { previous: bool },
    Toggle { previous: bool, state: bool },
}

impl From<ButtonMode> for ButtonEvaluator {
    fn from(mode: ButtonMode) -> Self {
        match mode {
            ButtonMode::Simple => ButtonEvaluator::Simple,
            ButtonMode::Click => ButtonEvaluator::Click { previous: false },
            ButtonMode::Toggle => ButtonEvaluator::Toggle {
                previous: false,
                state: false,
            },
        }
    }
}

impl ButtonEvaluator {
    #[inline]
    pub fn evaluate(&mut self, raw: bool) -> bool {
        match self {
            ButtonEvaluator::Simple => raw,
            ButtonEvaluator::Click { previous } => {
                let fired = raw && !*previous;
                *previous = raw;
                fired
            }
            ButtonEvaluator::Toggle { previous, state } => {
                if raw && !*previous {
                    *state = !*state;
                }
                *previous = raw;
                *state
            }
        }
    }

    /// Turns a latched toggle off. The remembered raw value is kept, so a
    /// button still held does not count as a new press.
    pub fn release_latch(&mut self) {
        if let ButtonEvaluator::Toggle { state, .. } = self {
            *state = false;
        }
    }

    /// Turns a toggle on without a press, keeping the remembered raw value.
    pub fn engage_latch(&mut self) {
        if let ButtonEvaluator::Toggle { state, .. } = self {
            *state = true;
        }
    }

    /// Forgets edges and latched state.
    pub fn reset(&mut self) {
        match self {
            ButtonEvaluator::Simple => {}
            ButtonEvaluator::Click { previous } => *previous = false,
            ButtonEvaluator::Toggle { previous, state } => {
                *previous = false;
                *state = false;
            }
        }
    }
}
