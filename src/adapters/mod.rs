// Adapters layer: concrete implementations of the domain ports
// (planogram lookup, cart store, diagnostics, clock, raw input sources).

pub mod cart;
pub mod clock;
pub mod diagnostics;
pub mod planogram;
pub mod source;

pub use cart::SharedCart;
pub use clock::{FixedClock, SystemClock};
pub use diagnostics::{JsonLinesDiagnostics, MemoryDiagnostics, NullDiagnostics, TracingDiagnostics};
pub use planogram::Planogram;
pub use source::{open_input, InputEncoding, ReaderSource};
