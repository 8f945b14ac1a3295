//! Per-input gradient entries handed back to an autodiff driver.

/// Gradient of one operation input.
///
/// Structural inputs (axis indices, shapes) never carry a gradient and are reported
/// as [`Grad::Disconnected`] rather than as zeros.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grad<T> {
    /// The input influences the output; this is its gradient.
    Connected(T),
    /// The input does not influence the output through differentiable paths.
    Disconnected,
}

impl<T> Grad<T> {
    /// Whether a gradient is present.
    pub fn is_connected(&self) -> bool {
        matches!(self, Grad::Connected(_))
    }

    /// Extracts the gradient, if any.
    pub fn connected(self) -> Option<T> {
        match self {
            Grad::Connected(g) => Some(g),
            Grad::Disconnected => None,
        }
    }

    /// Borrows the gradient.
    pub fn as_ref(&self) -> Grad<&T> {
        match self {
            Grad::Connected(g) => Grad::Connected(g),
            Grad::Disconnected => Grad::Disconnected,
        }
    }

    /// Maps the gradient, keeping disconnection.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Grad<U> {
        match self {
            Grad::Connected(g) => Grad::Connected(f(g)),
            Grad::Disconnected => Grad::Disconnected,
        }
    }
}

impl<T> From<Option<T>> for Grad<T> {
    fn from(g: Option<T>) -> Self {
        g.map_or(Grad::Disconnected, Grad::Connected)
    }
}
