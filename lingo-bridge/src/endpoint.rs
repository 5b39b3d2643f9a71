//! Typed endpoint descriptors.

use std::fmt;
use std::marker::PhantomData;

use crate::protocol::{request_topic, response_topic};

/// A named request/response pair with input `I` and output `O`.
///
/// Descriptors are plain constants shared by both contexts; the types
/// only exist at compile time.
pub struct Endpoint<I, O> {
    name: &'static str,
    exclusive: bool,
    _marker: PhantomData<fn(I) -> O>,
}

impl<I, O> Endpoint<I, O> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            exclusive: false,
            _marker: PhantomData,
        }
    }

    /// An endpoint that allows at most one outstanding call per bridge.
    pub const fn exclusive(name: &'static str) -> Self {
        Self {
            name,
            exclusive: true,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    pub fn request_topic(&self) -> String {
        request_topic(self.name)
    }

    pub fn response_topic(&self) -> String {
        response_topic(self.name)
    }
}

impl<I, O> Clone for Endpoint<I, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I, O> Copy for Endpoint<I, O> {}

impl<I, O> fmt::Debug for Endpoint<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("exclusive", &self.exclusive)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ECHO: Endpoint<String, String> = Endpoint::new("ECHO");
    const SHOTS: Endpoint<(), Vec<u8>> = Endpoint::exclusive("GET_SCREENSHOTS");

    #[test]
    fn test_topics() {
        assert_eq!(ECHO.request_topic(), "ECHO_IN");
        assert_eq!(ECHO.response_topic(), "ECHO_OUT");
        assert!(!ECHO.is_exclusive());
        assert!(SHOTS.is_exclusive());
    }

    #[test]
    fn test_copy_and_debug() {
        let copy = SHOTS;
        assert_eq!(copy.name(), "GET_SCREENSHOTS");
        let printed = format!("{copy:?}");
        assert!(printed.contains("GET_SCREENSHOTS"));
        assert!(printed.contains("exclusive: true"));
    }
}
