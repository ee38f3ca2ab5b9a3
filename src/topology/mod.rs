mod address;
mod path;

pub use address::{Addressing, GslEndpoint, IslLink, NodeAddress, NodeCategory};
pub use path::{AccessPath, PathResolver};
