//! Read lines from a list of files (or stdin) as one continuous input,
//! keeping track of where each line came from.
//!
//! ```no_run
//! let mut sc = lineinput::lines(std::env::args().skip(1));
//! let mut lines = Vec::new();
//! while sc.advance() {
//!     lines.push(sc.text().to_string());
//! }
//! if let Some(err) = sc.error() {
//!     eprintln!("{err}");
//!     std::process::exit(1);
//! }
//! ```

#[macro_use]
extern crate log;

pub mod error;
pub mod opener;
pub mod scanner;
pub mod split;
pub mod stopwatch;

pub use error::{Result, ScanError};
pub use opener::{MemoryOpen, Open, SkipUnreadable, StdOpen, Stream, STDIN};
pub use scanner::{Line, Lines, ScanOptions, Scanner};
pub use split::{SplitPolicy, Tokenizer, MAX_TOKEN_SIZE};

/// Scanner over the lines of `args`, read from the filesystem.
/// An empty `args` reads stdin.
pub fn lines<I, S>(args: I) -> Scanner
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Scanner::new(args)
}
