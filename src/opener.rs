use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};

/// Name that stands for the process's standard input
pub const STDIN: &str = "-";

/// An open source. Dropping it closes the underlying handle.
pub type Stream = Box<dyn Read>;

/// Turns a source name into an open stream.
///
/// Any `Fn(&str) -> io::Result<Stream>` is an opener, so tests and callers
/// with unusual sources can pass a closure instead of writing a type.
pub trait Open {
    fn open(&self, name: &str) -> io::Result<Stream>;
}

impl<F> Open for F
where
    F: Fn(&str) -> io::Result<Stream>,
{
    fn open(&self, name: &str) -> io::Result<Stream> {
        self(name)
    }
}

/// Opens files from the filesystem, and stdin for `"-"`
#[derive(Debug, Default, Clone, Copy)]
pub struct StdOpen;

impl Open for StdOpen {
    fn open(&self, name: &str) -> io::Result<Stream> {
        if name == STDIN {
            return Ok(Box::new(io::stdin()));
        }
        let file = File::open(name)?;
        Ok(Box::new(file))
    }
}

/// Serves sources from memory. Unknown names fail with `NotFound`.
#[derive(Debug, Default, Clone)]
pub struct MemoryOpen {
    data: HashMap<String, Vec<u8>>,
}

impl MemoryOpen {
    pub fn new() -> Self {
        MemoryOpen::default()
    }

    pub fn insert<S: Into<String>, B: Into<Vec<u8>>>(&mut self, name: S, content: B) {
        self.data.insert(name.into(), content.into());
    }

    pub fn with<S: Into<String>, B: Into<Vec<u8>>>(mut self, name: S, content: B) -> Self {
        self.insert(name, content);
        self
    }
}

impl<S: Into<String>, B: Into<Vec<u8>>> FromIterator<(S, B)> for MemoryOpen {
    fn from_iter<T: IntoIterator<Item = (S, B)>>(iter: T) -> Self {
        let mut m = MemoryOpen::new();
        for (name, content) in iter {
            m.insert(name, content);
        }
        m
    }
}

impl Open for MemoryOpen {
    fn open(&self, name: &str) -> io::Result<Stream> {
        match self.data.get(name) {
            Some(content) => Ok(Box::new(io::Cursor::new(content.clone()))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such source: {name}"),
            )),
        }
    }
}

/// Wraps another opener and turns open failures into empty sources, so one
/// unreadable file does not end the whole scan.
pub struct SkipUnreadable {
    inner: Box<dyn Open>,
}

impl SkipUnreadable {
    pub fn new<O: Open + 'static>(inner: O) -> Self {
        SkipUnreadable::from_box(Box::new(inner))
    }

    pub fn from_box(inner: Box<dyn Open>) -> Self {
        SkipUnreadable { inner }
    }
}

impl Open for SkipUnreadable {
    fn open(&self, name: &str) -> io::Result<Stream> {
        match self.inner.open(name) {
            Ok(stream) => Ok(stream),
            Err(err) => {
                warn!("skipping {name}: {err}");
                Ok(Box::new(io::empty()))
            }
        }
    }
}
