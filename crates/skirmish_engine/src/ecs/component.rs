//! Component trait and implementations

/// Marker trait for components
///
/// Components are plain data. An entity holds at most one instance of each
/// component type; engine components implement this next to their definition.
pub trait Component: 'static {}
