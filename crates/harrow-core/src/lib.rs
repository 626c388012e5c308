//! Transfer-agnostic domain types and the capabilities injected into Harrow services.
//!
//! Layout: `model` (units, destinations, command specs and outcomes), `service`
//! (process, disk and discovery traits), `error` (`CoreError`).

pub mod error;
pub mod model;
pub mod service;

pub use error::{CoreError, CoreResult};
pub use model::{CommandOutput, CommandSpec, Destination, ExitClass, FileEntry, TransferUnit};
pub use service::{CommandRunner, DiskInspector, PathObserver, PathStream};
