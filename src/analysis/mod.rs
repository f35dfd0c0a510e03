/// Hydrograph statistics.
///
/// Submodules:
/// - `window`: rolling-window durations (`3H`, `90min`, `1 day`, ...)
/// - `hydrograph`: peak, trough, mean and rolling-mean extrema of one series

pub mod hydrograph;
pub mod window;

pub use hydrograph::analyze;
pub use window::RollingWindow;
