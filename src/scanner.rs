use std::mem;

use crate::error::{Result, ScanError};
use crate::opener::{Open, SkipUnreadable, StdOpen, STDIN};
use crate::split::{SplitPolicy, Tokenizer, MAX_TOKEN_SIZE};
use crate::stopwatch::Stopwatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub split:        SplitPolicy,
    /// longest token the tokenizer accepts, in bytes; for lines that is the
    /// whole line, for words a single word
    pub buffer_limit: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            split: SplitPolicy::default(),
            buffer_limit: MAX_TOKEN_SIZE,
        }
    }
}

/*
Reads the sources one after another as if they were one input.

Only one source is open at a time: it's opened when the previous one is
exhausted and dropped (closed) as soon as it runs out of data or fails.
The first error, from the opener or from the tokenizer, stops the scan for
good; error() keeps returning it and advance() keeps returning false.

    let mut sc = Scanner::new(["a.txt", "b.txt"]);
    while sc.advance() {
        println!("{}:{} {}", sc.source_name().unwrap_or("?"), sc.source_line_no(), sc.text());
    }
    if let Some(err) = sc.error() { ... }
*/
pub struct Scanner {
    sources:        Vec<String>,
    opener:         Box<dyn Open>,
    options:        ScanOptions,
    // source being read; == sources.len() once all are done
    index:          usize,
    current:        Option<Tokenizer>,
    stopwatch:      Option<Stopwatch>,
    token:          Option<String>,
    line_no:        usize,
    source_line_no: usize,
    error:          Option<ScanError>,
}

// what a single pull from the open tokenizer gave
enum Step {
    Line,
    End,
    Failed,
}

impl Scanner {
    /// Scanner over `sources` read with the standard opener. No sources means stdin.
    pub fn new<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut sources = sources.into_iter().map(Into::into).collect::<Vec<String>>();
        if sources.is_empty() {
            sources.push(STDIN.to_string());
        }
        Scanner {
            sources,
            opener: Box::new(StdOpen),
            options: ScanOptions::default(),
            index: 0,
            current: None,
            stopwatch: None,
            token: None,
            line_no: 0,
            source_line_no: 0,
            error: None,
        }
    }

    pub fn with_opener<O: Open + 'static>(mut self, opener: O) -> Self {
        self.opener = Box::new(opener);
        self
    }

    pub fn with_split(mut self, split: SplitPolicy) -> Self {
        self.options.split = split;
        self
    }

    pub fn with_buffer_limit(mut self, limit: usize) -> Self {
        self.options.buffer_limit = limit;
        self
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Treat sources that fail to open as empty instead of stopping the scan.
    /// Wraps whatever opener is set at the moment of the call.
    pub fn skip_unreadable(mut self) -> Self {
        let inner = mem::replace(&mut self.opener, Box::new(StdOpen));
        self.opener = Box::new(SkipUnreadable::from_box(inner));
        self
    }

    /// Moves to the next token, opening the following sources as needed.
    /// Returns false at the end of all sources or on error; see error().
    pub fn advance(&mut self) -> bool {
        if self.error.is_some() {
            return false;
        }
        if self.current.is_some() {
            match self.pull() {
                Step::Line => return true,
                Step::Failed => return false,
                Step::End => {
                    self.close_current();
                    self.index += 1;
                }
            }
        }

        while self.index < self.sources.len() && self.current.is_none() {
            let name = self.sources[self.index].clone();
            let stream = match self.opener.open(&name) {
                Ok(stream) => stream,
                Err(err) => {
                    debug!("failed to open {name}: {err}");
                    self.error = Some(ScanError::Open {
                        source_name: name,
                        source: err,
                    });
                    return false;
                }
            };
            debug!("open {name} ({}/{})", self.index + 1, self.sources.len());
            self.current = Some(Tokenizer::new(stream, self.options.split, self.options.buffer_limit));
            self.stopwatch = Some(Stopwatch::new(name.as_str(), 0));
            self.source_line_no = 0;

            match self.pull() {
                Step::Line => return true,
                Step::Failed => return false,
                Step::End => {
                    debug!("{name} is empty");
                    self.close_current();
                    self.index += 1;
                }
            }
        }
        false
    }

    /// Current token; empty before the first advance() and after the scan ended
    pub fn text(&self) -> &str {
        if self.error.is_some() {
            return "";
        }
        self.token.as_deref().unwrap_or("")
    }

    /// First error met by the opener or the tokenizer
    pub fn error(&self) -> Option<&ScanError> {
        self.error.as_ref()
    }

    /// Tokens yielded so far, over all sources
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    /// Tokens yielded so far from the current source
    pub fn source_line_no(&self) -> usize {
        self.source_line_no
    }

    pub fn is_first_line(&self) -> bool {
        self.source_line_no == 1
    }

    /// Name of the source the current token came from
    pub fn source_name(&self) -> Option<&str> {
        self.current.as_ref().map(|_| self.sources[self.index].as_str())
    }

    pub fn source_index(&self) -> usize {
        self.index
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Drop the rest of the current source. The next advance() starts with
    /// the following one. Does nothing when no source is open.
    pub fn next_source(&mut self) {
        if self.current.is_some() {
            self.close_current();
            self.index += 1;
        }
    }

    /// Close the open source, if any, and end the scan. A recorded error is kept.
    pub fn close(&mut self) {
        self.close_current();
        self.index = self.sources.len();
    }

    /// Iterator over the remaining lines with their positions
    pub fn lines(self) -> Lines {
        Lines {
            scanner: self,
            done: false,
        }
    }

    fn pull(&mut self) -> Step {
        let tokenizer = match self.current.as_mut() {
            Some(t) => t,
            None => return Step::End,
        };
        match tokenizer.next_token() {
            Ok(Some(token)) => {
                self.token = Some(token);
                self.line_no += 1;
                self.source_line_no += 1;
                if let Some(sw) = self.stopwatch.as_mut() {
                    sw.tick();
                }
                Step::Line
            }
            Ok(None) => Step::End,
            Err(err) => {
                let name = self.sources[self.index].clone();
                debug!("failed to read {name}: {err}");
                self.error = Some(ScanError::Read {
                    source_name: name,
                    line: self.source_line_no,
                    source: err,
                });
                self.close_current();
                Step::Failed
            }
        }
    }

    fn close_current(&mut self) {
        if let Some(tokenizer) = self.current.take() {
            drop(tokenizer.into_inner());
        }
        if let Some(mut sw) = self.stopwatch.take() {
            sw.stop();
        }
        self.token = None;
    }
}

/// One token with its position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text:           String,
    pub line_no:        usize,
    pub source_line_no: usize,
    pub source_name:    String,
}

impl Line {
    pub fn is_first_line(&self) -> bool {
        self.source_line_no == 1
    }
}

/// Yields every line as `Ok`, then the scan error (if any) once, then stops
pub struct Lines {
    scanner: Scanner,
    done:    bool,
}

impl Lines {
    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }
}

impl Iterator for Lines {
    type Item = Result<Line>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.scanner.advance() {
            let source_name = self.scanner.source_name().unwrap_or_default().to_string();
            return Some(Ok(Line {
                text: self.scanner.text().to_string(),
                line_no: self.scanner.line_no,
                source_line_no: self.scanner.source_line_no,
                source_name,
            }));
        }
        self.done = true;
        self.scanner.error.as_ref().map(|err| Err(err.duplicate()))
    }
}
