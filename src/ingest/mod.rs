pub mod chunker;
pub mod grammar;
pub mod loader;
pub mod parse;
pub mod scanner;
pub mod text;

pub use chunker::{Budget, BoundedChunker};
pub use loader::Loader;
pub use scanner::Scanner;
