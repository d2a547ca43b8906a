pub mod universe;

pub use universe::TagUniverse;
