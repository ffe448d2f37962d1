// Application layer: the store that owns wallets and transactions, and the
// report structures the CLI and exporters build on top of the ledger.

pub mod error;
pub mod reporting;
pub mod store;

pub use error::*;
pub use reporting::*;
pub use store::*;
