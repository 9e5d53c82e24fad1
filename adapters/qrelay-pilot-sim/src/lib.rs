//! Local statevector simulator pilot (spec §4.3's SIMULATOR provider).
//!
//! Exact, shot-sampled statevector simulation. No network calls, no
//! provider token, no external SDK — it exists so a deployment can be
//! smoke-tested without touching real quantum hardware.
//!
//! # Performance
//!
//! | Qubits | Memory | Simulation Speed |
//! |--------|--------|------------------|
//! | 10 | ~16 KB | Instant |
//! | 15 | ~512 KB | Fast |
//! | 20 | ~16 MB | Moderate |
//! | 25 | ~512 MB | Slow |
//! | 30+ | ~16 GB+ | Not recommended |

mod pilot;
pub mod statevector;

pub use pilot::SimPilot;
pub use statevector::Statevector;
