//! Marketplace adapters - inventory search, buyer directory, and order
//! submission.

mod directory;
mod inventory;
mod mock;
mod order;

pub use directory::HttpDirectoryService;
pub use inventory::HttpProductLookup;
pub use mock::{RecordingOrderPlacement, StaticDirectory, StaticProductLookup};
pub use order::HttpOrderPlacement;
