//! Opaque data handed to a view when it is shown.
//!
//! The controller moves payloads around (and drops them when a queued target
//! is superseded) but never looks inside. The requesting view and the shown
//! view agree on the concrete type between themselves.

use std::{any::Any, fmt};

/// Caller-defined value passed to [`crate::View::on_show_start`].
#[derive(Default)]
pub struct Payload(Option<Box<dyn Any>>);

impl Payload {
    /// An empty payload.
    pub fn none() -> Self {
        Self(None)
    }

    /// Wrap a value.
    pub fn new<T: Any>(value: T) -> Self {
        Self(Some(Box::new(value)))
    }

    /// True if no value was supplied.
    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    /// Borrow the value if it has type `T`.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|value| value.downcast_ref::<T>())
    }

    /// Take the value out if it has type `T`, handing the payload back
    /// otherwise.
    pub fn take<T: Any>(self) -> Result<T, Self> {
        match self.0 {
            Some(value) => {
                value.downcast::<T>().map(|value| *value).map_err(|value| Self(Some(value)))
            },
            None => Err(Self(None)),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Payload(..)"),
            None => f.write_str("Payload(None)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_access() {
        let payload = Payload::new(String::from("level 3"));
        assert_eq!(payload.get::<String>().map(String::as_str), Some("level 3"));
        assert!(payload.get::<u32>().is_none());

        let payload = payload.take::<u32>().unwrap_err();
        assert_eq!(payload.take::<String>().unwrap(), "level 3");
    }

    #[test]
    fn empty_payload() {
        let payload = Payload::none();
        assert!(payload.is_none());
        assert!(payload.get::<String>().is_none());
        assert_eq!(format!("{payload:?}"), "Payload(None)");
    }
}
