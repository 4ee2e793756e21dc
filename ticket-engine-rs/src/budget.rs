//! Splits the space left after essential content across the variable sections.

use serde::Serialize;

/// Largest description accepted upstream, minus a safety margin
pub const CEILING: usize = 32_000;

/// Character allocations for one ticket document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Budget {
    pub ceiling: usize,
    pub essential_length: usize,
    pub remaining: usize,
    pub network_calls: usize,
    pub headers: usize,
    pub response: usize,
    pub payload: usize,
}

impl Budget {
    /// Network calls get half, headers and response a fifth each, and the
    /// payload whatever integer division leaves over.
    pub fn allocate(ceiling: usize, essential_length: usize) -> Self {
        let remaining = ceiling.saturating_sub(essential_length);
        let network_calls = remaining / 2;
        let headers = remaining / 5;
        let response = remaining / 5;
        let payload = remaining - network_calls - headers - response;

        Self {
            ceiling,
            essential_length,
            remaining,
            network_calls,
            headers,
            response,
            payload,
        }
    }

    pub fn total(&self) -> usize {
        self.network_calls + self.headers + self.response + self.payload
    }
}
