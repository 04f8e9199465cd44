//! PIN challenge guarding restricted categories.

use zeroize::Zeroize;

use crate::api::Category;
use crate::store::SharedStore;

pub const PIN_LENGTH: usize = 4;
const PIN_KEY: &str = "pin_code";

#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// Digit accepted, more needed
    Pending,
    Granted(Category),
    /// Wrong PIN; the gate has closed without feedback
    Denied,
    /// Gate not open, or the input was not a digit
    Ignored,
}

#[derive(Debug)]
enum GateState {
    Closed,
    Challenge { pending: Category, pin_buffer: String },
}

pub struct AccessGate {
    store: SharedStore,
    restricted_keywords: Vec<String>,
    default_pin: String,
    state: GateState,
}

impl AccessGate {
    pub fn new(store: SharedStore, restricted_keywords: &[String], default_pin: &str) -> Self {
        Self {
            store,
            restricted_keywords: restricted_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            default_pin: default_pin.to_string(),
            state: GateState::Closed,
        }
    }

    pub fn should_gate(&self, category: &Category) -> bool {
        let name = category.category_name.to_lowercase();
        self.restricted_keywords.iter().any(|k| name.contains(k.as_str()))
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, GateState::Challenge { .. })
    }

    pub fn pending_category(&self) -> Option<&Category> {
        match &self.state {
            GateState::Challenge { pending, .. } => Some(pending),
            GateState::Closed => None,
        }
    }

    /// Number of digits typed so far, for masked display
    pub fn entered_len(&self) -> usize {
        match &self.state {
            GateState::Challenge { pin_buffer, .. } => pin_buffer.len(),
            GateState::Closed => 0,
        }
    }

    pub fn open(&mut self, category: Category) {
        self.close();
        tracing::debug!("gate opened for {}", category.category_name);
        self.state = GateState::Challenge {
            pending: category,
            pin_buffer: String::with_capacity(PIN_LENGTH),
        };
    }

    pub fn submit_digit(&mut self, digit: char) -> GateOutcome {
        if !digit.is_ascii_digit() {
            return GateOutcome::Ignored;
        }
        let GateState::Challenge { pin_buffer, .. } = &mut self.state else {
            return GateOutcome::Ignored;
        };
        pin_buffer.push(digit);
        if pin_buffer.len() < PIN_LENGTH {
            return GateOutcome::Pending;
        }

        let state = std::mem::replace(&mut self.state, GateState::Closed);
        let GateState::Challenge { pending, mut pin_buffer } = state else {
            return GateOutcome::Ignored;
        };
        let expected = self.stored_pin();
        let granted = pin_buffer == expected;
        pin_buffer.zeroize();

        if granted {
            tracing::info!("gate granted for {}", pending.category_name);
            GateOutcome::Granted(pending)
        } else {
            tracing::info!("gate denied for {}", pending.category_name);
            GateOutcome::Denied
        }
    }

    /// Abandon the challenge without granting
    pub fn cancel(&mut self) {
        self.close();
    }

    fn close(&mut self) {
        if let GateState::Challenge { mut pin_buffer, .. } =
            std::mem::replace(&mut self.state, GateState::Closed)
        {
            pin_buffer.zeroize();
        }
    }

    fn stored_pin(&self) -> String {
        self.store
            .get(PIN_KEY)
            .filter(|pin| !pin.is_empty())
            .unwrap_or_else(|| self.default_pin.clone())
    }
}
