//! Dataset loaders

pub mod libsvm;

pub use self::libsvm::*;
