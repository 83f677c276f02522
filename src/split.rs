use std::collections::VecDeque;
use std::fmt;
use std::io::{self, BufRead, BufReader, Read};
use std::mem;
use std::str::FromStr;

use crate::opener::Stream;

/// Largest token the tokenizer buffers by default, in bytes
pub const MAX_TOKEN_SIZE: usize = 64 * 1024;

/// How a stream is cut into tokens
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SplitPolicy {
    /// one token per line, terminator (`\n` or `\r\n`) removed
    #[default]
    Lines,
    /// whitespace separated words, lines may be of any length
    Words,
    /// one token per unicode char, `\r` and `\n` included; bytes that are
    /// not UTF-8 come out as U+FFFD instead of failing
    Chars,
}

impl FromStr for SplitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lines" | "line" => Ok(SplitPolicy::Lines),
            "words" | "word" => Ok(SplitPolicy::Words),
            "chars" | "char" => Ok(SplitPolicy::Chars),
            _ => Err(format!("unknown split policy {s:?}, expected lines, words or chars")),
        }
    }
}

impl fmt::Display for SplitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SplitPolicy::Lines => "lines",
            SplitPolicy::Words => "words",
            SplitPolicy::Chars => "chars",
        };
        f.write_str(s)
    }
}

fn too_long() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "token too long")
}

/// Pulls tokens from one open stream.
///
/// Forward only: once the stream is exhausted or an error was returned,
/// every later call gives `Ok(None)`. `limit` caps the length of a single
/// token in bytes.
pub struct Tokenizer {
    reader:  BufReader<Stream>,
    policy:  SplitPolicy,
    limit:   usize,
    // split but not handed out yet; an Err ends the stream once reached
    pending: VecDeque<io::Result<String>>,
    // bytes of a word or char cut by a chunk boundary
    carry:   Vec<u8>,
    done:    bool,
}

impl Tokenizer {
    pub fn new(stream: Stream, policy: SplitPolicy, limit: usize) -> Self {
        Tokenizer {
            reader: BufReader::new(stream),
            policy,
            limit,
            pending: VecDeque::new(),
            carry: Vec::new(),
            done: false,
        }
    }

    pub fn policy(&self) -> SplitPolicy {
        self.policy
    }

    /// Next token, `Ok(None)` at end of data
    pub fn next_token(&mut self) -> io::Result<Option<String>> {
        loop {
            match self.pending.pop_front() {
                Some(Ok(token)) => return Ok(Some(token)),
                Some(Err(err)) => {
                    self.finish();
                    return Err(err);
                }
                None => {}
            }
            if self.done {
                return Ok(None);
            }
            let more = match self.policy {
                SplitPolicy::Lines => self.fill_line(),
                SplitPolicy::Words => self.fill_words(),
                SplitPolicy::Chars => self.fill_chars(),
            };
            match more {
                Ok(true) => {}
                Ok(false) => self.done = true,
                Err(err) => {
                    self.finish();
                    return Err(err);
                }
            }
        }
    }

    /// Give back the stream, e.g. to close it right away
    pub fn into_inner(self) -> Stream {
        self.reader.into_inner()
    }

    fn finish(&mut self) {
        self.done = true;
        self.pending.clear();
        self.carry.clear();
    }

    // Each fill_* queues what it could split and returns false once the
    // stream is at its end.

    // one `\n` terminated record without its terminator; a last record
    // without terminator counts too
    fn fill_line(&mut self) -> io::Result<bool> {
        let mut buf = Vec::new();
        // terminator may take two more bytes (\r\n)
        let max = self.limit.saturating_add(2) as u64;
        let n = (&mut self.reader).take(max).read_until(b'\n', &mut buf)?;
        if n == 0 {
            return Ok(false);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        // also a lone \r at the very end of the stream
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        if buf.len() > self.limit {
            return Err(too_long());
        }
        let line = String::from_utf8(buf)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "stream did not contain valid UTF-8"))?;
        self.pending.push_back(Ok(line));
        Ok(true)
    }

    /*
    Reads at most `limit` bytes at a time. Everything up to the last ascii
    whitespace of the chunk is split right away; the tail may be the start
    of a word that goes on in the next chunk, so it is carried over. Only
    a carried tail longer than `limit` (a word without end in sight) fails.
    */
    fn fill_words(&mut self) -> io::Result<bool> {
        loop {
            let mut chunk = Vec::new();
            let n = (&mut self.reader)
                .take(self.limit.max(1) as u64)
                .read_until(b'\n', &mut chunk)?;
            let mut buf = mem::take(&mut self.carry);
            buf.extend_from_slice(&chunk);

            let complete = if n == 0 || chunk.last() == Some(&b'\n') {
                buf.len()
            }
            else {
                buf.iter().rposition(|b| b.is_ascii_whitespace()).map_or(0, |p| p + 1)
            };
            self.carry = buf.split_off(complete);

            for word in String::from_utf8_lossy(&buf).split_whitespace() {
                if word.len() > self.limit {
                    self.pending.push_back(Err(too_long()));
                    return Ok(true);
                }
                self.pending.push_back(Ok(word.to_string()));
            }
            if self.carry.len() > self.limit {
                self.pending.push_back(Err(too_long()));
                return Ok(true);
            }
            if n == 0 {
                return Ok(false);
            }
            if !self.pending.is_empty() {
                return Ok(true);
            }
        }
    }

    fn fill_chars(&mut self) -> io::Result<bool> {
        let chunk = self.reader.fill_buf()?;
        let eof = chunk.is_empty();
        let mut buf = mem::take(&mut self.carry);
        buf.extend_from_slice(chunk);
        let n = chunk.len();
        self.reader.consume(n);

        let mut rest = &buf[..];
        loop {
            match std::str::from_utf8(rest) {
                Ok(s) => {
                    self.pending.extend(s.chars().map(|c| Ok(c.to_string())));
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    self.pending
                        .extend(String::from_utf8_lossy(valid).chars().map(|c| Ok(c.to_string())));
                    match e.error_len() {
                        Some(len) => {
                            self.pending.push_back(Ok(char::REPLACEMENT_CHARACTER.to_string()));
                            rest = &after[len..];
                        }
                        // a char cut at the end of the chunk
                        None if !eof => {
                            self.carry = after.to_vec();
                            break;
                        }
                        None => {
                            self.pending.push_back(Ok(char::REPLACEMENT_CHARACTER.to_string()));
                            break;
                        }
                    }
                }
            }
        }
        Ok(!eof)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tokens(data: &'static [u8], policy: SplitPolicy) -> io::Result<Vec<String>> {
        let mut t = Tokenizer::new(Box::new(data), policy, MAX_TOKEN_SIZE);
        assert_eq!(t.policy(), policy);
        let mut res = Vec::new();
        while let Some(tok) = t.next_token()? {
            res.push(tok);
        }
        Ok(res)
    }

    // hands out at most `step` bytes per read
    struct Trickle {
        data: Vec<u8>,
        pos:  usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn test_lines() {
        let cases: Vec<(&'static [u8], Vec<&str>)> = vec![
            (b"", vec![]),
            (b"a01\na02\na03", vec!["a01", "a02", "a03"]),
            (b"b01\nb02\nb03\n", vec!["b01", "b02", "b03"]),
            (b"x\r\ny\r\n", vec!["x", "y"]),
            (b"\n\n", vec!["", ""]),
            (b"only", vec!["only"]),
            (b"mid\rdle\n", vec!["mid\rdle"]),
            (b"abc\r", vec!["abc"]),
            (b"x\nabc\r", vec!["x", "abc"]),
        ];
        for (data, expected) in cases {
            assert_eq!(tokens(data, SplitPolicy::Lines).unwrap(), expected);
        }
    }

    #[test]
    fn test_words() {
        let res = tokens(b"  one two\n\nthree\tfour  \nfive", SplitPolicy::Words).unwrap();
        assert_eq!(res, vec!["one", "two", "three", "four", "five"]);
        assert!(tokens(b" \n \n", SplitPolicy::Words).unwrap().is_empty());
    }

    #[test]
    fn test_words_long_line() {
        // one line, far longer than the limit, of short words
        let line = "ab ".repeat(40_000);
        let stream = Box::new(io::Cursor::new(line.into_bytes()));
        let mut t = Tokenizer::new(stream, SplitPolicy::Words, 16);
        let mut n = 0;
        while let Some(word) = t.next_token().unwrap() {
            assert_eq!(word, "ab");
            n += 1;
        }
        assert_eq!(n, 40_000);
    }

    #[test]
    fn test_words_across_chunks() {
        let mut t = Tokenizer::new(Box::new(&b"abcd efgh\nij"[..]), SplitPolicy::Words, 6);
        assert_eq!(t.next_token().unwrap(), Some("abcd".to_string()));
        assert_eq!(t.next_token().unwrap(), Some("efgh".to_string()));
        assert_eq!(t.next_token().unwrap(), Some("ij".to_string()));
        assert_eq!(t.next_token().unwrap(), None);
    }

    #[test]
    fn test_words_too_long() {
        let mut t = Tokenizer::new(Box::new(&b"ok fine waytoolongword next"[..]), SplitPolicy::Words, 5);
        assert_eq!(t.next_token().unwrap(), Some("ok".to_string()));
        assert_eq!(t.next_token().unwrap(), Some("fine".to_string()));
        let err = t.next_token().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(t.next_token().unwrap(), None);
    }

    #[test]
    fn test_chars() {
        let res = tokens("ab\r\nжё".as_bytes(), SplitPolicy::Chars).unwrap();
        assert_eq!(res, vec!["a", "b", "\r", "\n", "ж", "ё"]);
    }

    #[test]
    fn test_chars_bad_bytes() {
        let res = tokens(b"a\xffb\xe2\x82", SplitPolicy::Chars).unwrap();
        assert_eq!(res, vec!["a", "\u{fffd}", "b", "\u{fffd}"]);
    }

    #[test]
    fn test_chars_cut_by_reads() {
        let data = "жёx€".as_bytes().to_vec();
        let stream = Box::new(Trickle { data, pos: 0, step: 1 });
        let mut t = Tokenizer::new(stream, SplitPolicy::Chars, MAX_TOKEN_SIZE);
        let mut res = Vec::new();
        while let Some(c) = t.next_token().unwrap() {
            res.push(c);
        }
        assert_eq!(res, vec!["ж", "ё", "x", "€"]);
    }

    #[test]
    fn test_token_too_long() {
        let mut t = Tokenizer::new(Box::new(&b"12345\n123456\nabc"[..]), SplitPolicy::Lines, 5);
        assert_eq!(t.next_token().unwrap(), Some("12345".to_string()));
        let err = t.next_token().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        // no restart after an error
        assert_eq!(t.next_token().unwrap(), None);
    }

    #[test]
    fn test_limit_with_crlf() {
        let mut t = Tokenizer::new(Box::new(&b"12345\r\nab"[..]), SplitPolicy::Lines, 5);
        assert_eq!(t.next_token().unwrap(), Some("12345".to_string()));
        assert_eq!(t.next_token().unwrap(), Some("ab".to_string()));
        assert_eq!(t.next_token().unwrap(), None);
    }

    #[test]
    fn test_invalid_utf8() {
        let err = tokens(b"ok\n\xff\xfe\n", SplitPolicy::Lines).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_read_error() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
            }
        }
        let mut t = Tokenizer::new(Box::new(Broken), SplitPolicy::Lines, MAX_TOKEN_SIZE);
        let err = t.next_token().unwrap_err();
        assert_eq!(err.to_string(), "disk on fire");
        assert_eq!(t.next_token().unwrap(), None);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("lines".parse::<SplitPolicy>().unwrap(), SplitPolicy::Lines);
        assert_eq!("words".parse::<SplitPolicy>().unwrap(), SplitPolicy::Words);
        assert_eq!("chars".parse::<SplitPolicy>().unwrap(), SplitPolicy::Chars);
        assert!("bytes".parse::<SplitPolicy>().is_err());
        assert_eq!(SplitPolicy::Words.to_string(), "words");
    }
}
