//! AWS Braket pilot: drives Braket's quantum-task API over the AWS SDK,
//! submitting OpenQASM 3 text and reading results back from S3.
//!
//! # Supported Devices
//!
//! | Device | Qubits | Provider | Native Gates |
//! |--------|--------|----------|--------------|
//! | Rigetti Ankaa-3 | 84 | Rigetti | RX, RZ, CZ |
//! | IonQ Aria | 25 | IonQ | RX, RY, RZ, XX |
//! | IonQ Forte | 36 | IonQ | RX, RY, RZ, XX |
//! | IQM Garnet | 20 | IQM | PRX, CZ |
//! | Amazon SV1 | 34 | Amazon | Universal |
//! | Amazon TN1 | 50 | Amazon | Universal |
//! | Amazon DM1 | 17 | Amazon | Universal |
//!
//! # Authentication
//!
//! AWS credentials are loaded from the standard AWS credential chain:
//! environment variables, shared config, SSO, or IAM role.
//!
//! Required environment variables:
//! - `ARVAK_BRAKET_S3_BUCKET` — S3 bucket for storing task results
//!
//! Optional environment variables:
//! - `ARVAK_BRAKET_S3_PREFIX` — S3 key prefix (default: `"arvak-results"`)
//! - `AWS_REGION` — AWS region (default: `"us-east-1"`)

mod api;
pub mod device;
mod error;
mod pilot;
mod qasm;

pub use error::{BraketError, BraketResult};
pub use pilot::BraketPilot;
