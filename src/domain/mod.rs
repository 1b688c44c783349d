// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits that describe what a training
// run is made of, independent of the tensor framework:
//
//   digit.rs      — one labelled 28×28 MNIST image
//   throughput.rs — warmup-aware step timing and the
//                   iterations/second figure reported at the end
//   traits.rs     — the seams other layers implement
//                   (sample sources, the device runtime)
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A labelled handwritten digit
pub mod digit;

// Step timer and throughput computation
pub mod throughput;

// Core abstractions (traits) that other layers implement
pub mod traits;
