//  INPUT.rs
//    by Lut99
//
//  Created:
//    14 Oct 2024, 10:22:17
//  Last edited:
//    27 May 2025, 09:44:51
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the line-based input layer for the dialog engine. Input
//!   either comes from a live terminal (in which case prompts are shown
//!   and the user may retry) or from a redirected stream (in which case
//!   answers are consumed silently, line by line).
//

use std::io::{BufRead, ErrorKind};

use dialoguer::Input;
use log::debug;


/***** CONSTANTS *****/
/// Everything after this marker on an input line is discarded.
const COMMENT_MARKER: char = '#';

/// A line consisting of exactly this token requests a clean, successful abort.
pub const ABORT_SENTINEL: &str = "EOF";





/***** ERRORS *****/
/// Defines errors that relate to reading user input.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to read a line from the terminal.
    #[error("Failed to read input from the terminal")]
    Terminal { source: dialoguer::Error },
    /// Failed to read a line from a redirected stream.
    #[error("Failed to read input from the input stream")]
    Stream { source: std::io::Error },
}





/***** LIBRARY *****/
/// What came out of a single read on a [`LineSource`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Response {
    /// A line of raw text, scrubbed of comments and surrounding whitespace.
    Line(String),
    /// The user pressed Ctrl+C (or equivalent) while we were reading.
    Interrupted,
    /// The source ran out of input.
    EndOfInput,
}

/// Abstracts over where the dialog engine reads its answers from.
///
/// The two implementations are [`Terminal`], which prompts an interactive user, and [`Stream`],
/// which consumes pre-scripted answers from any [`BufRead`]er without echoing prompts.
pub trait LineSource {
    /// Reads a single answer line from this source.
    ///
    /// The returned line is scrubbed (see [`scrub()`]): comments and surrounding whitespace have
    /// already been removed. Note that the [abort sentinel](ABORT_SENTINEL) is _not_ interpreted
    /// here; that is the engine's call to make.
    ///
    /// # Arguments
    /// - `prompt`: The question to show to the user, if this source shows questions at all.
    ///
    /// # Returns
    /// A [`Response`] describing what happened.
    ///
    /// # Errors
    /// This function errors if the underlying read failed for reasons other than the stream
    /// ending or the user interrupting it.
    fn read_answer(&mut self, prompt: &str) -> Result<Response, Error>;

    /// Checks whether this source is attached to a live user.
    ///
    /// # Returns
    /// True if prompts are shown and retries make sense, or false otherwise.
    fn is_interactive(&self) -> bool;
}



/// A [`LineSource`] that queries a live user on the terminal.
#[derive(Clone, Copy, Debug, Default)]
pub struct Terminal;
impl LineSource for Terminal {
    fn read_answer(&mut self, prompt: &str) -> Result<Response, Error> {
        // Query the user through dialoguer, which pretty-prints the prompt for us
        let raw: String = match Input::new().with_prompt(prompt).allow_empty(true).interact_text() {
            Ok(raw) => raw,

            // dialoguer reads the terminal in raw mode, so Ctrl+C surfaces as an `Interrupted`
            // read error instead of killing the process
            Err(dialoguer::Error::IO(err)) if err.kind() == ErrorKind::Interrupted => {
                debug!("Terminal read interrupted by the user");
                return Ok(Response::Interrupted);
            },
            Err(dialoguer::Error::IO(err)) if err.kind() == ErrorKind::UnexpectedEof => {
                debug!("Terminal closed while reading");
                return Ok(Response::EndOfInput);
            },
            Err(err) => return Err(Error::Terminal { source: err }),
        };

        Ok(Response::Line(scrub(&raw).into()))
    }

    #[inline]
    fn is_interactive(&self) -> bool { true }
}



/// A [`LineSource`] that consumes scripted answers from a [`BufRead`]er.
///
/// No prompts are echoed; every read simply takes the next line.
#[derive(Debug)]
pub struct Stream<R> {
    /// The reader we pop lines from.
    reader: R,
}
impl<R: BufRead> Stream<R> {
    /// Constructor for the Stream.
    ///
    /// # Arguments
    /// - `reader`: The [`BufRead`]er to consume answers from.
    ///
    /// # Returns
    /// A new Stream that reads from the given reader.
    #[inline]
    pub fn new(reader: R) -> Self { Self { reader } }
}
impl<R: BufRead> LineSource for Stream<R> {
    fn read_answer(&mut self, _prompt: &str) -> Result<Response, Error> {
        let mut line: String = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => Ok(Response::EndOfInput),
            Ok(_) => Ok(Response::Line(scrub(&line).into())),
            Err(err) if err.kind() == ErrorKind::Interrupted => Ok(Response::Interrupted),
            Err(err) => Err(Error::Stream { source: err }),
        }
    }

    #[inline]
    fn is_interactive(&self) -> bool { false }
}





/***** LIBRARY FUNCTIONS *****/
/// Scrubs a raw input line.
///
/// Everything from the first `#` onwards is discarded, as is any whitespace around what remains.
/// This lets scripted answer files carry comments.
///
/// # Arguments
/// - `raw`: The raw line as read from the source.
///
/// # Returns
/// The scrubbed slice of the input.
#[inline]
pub fn scrub(raw: &str) -> &str {
    match raw.find(COMMENT_MARKER) {
        Some(pos) => raw[..pos].trim(),
        None => raw.trim(),
    }
}

/// Deals with all the various ways people represent the truth.
///
/// # Arguments
/// - `text`: Some user answer to a yes/no question.
///
/// # Returns
/// True if the answer is one of the accepted spellings of "yes" (case-insensitive), including the
/// empty answer; or false otherwise.
#[inline]
pub fn truthy(text: &str) -> bool { matches!(text.to_lowercase().as_str(), "y" | "yes" | "t" | "true" | "ok" | "1" | "") }





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;


    #[test]
    fn test_scrub() {
        assert_eq!(scrub("  myjob  "), "myjob");
        assert_eq!(scrub("20 # gigabytes"), "20");
        assert_eq!(scrub("# only a comment"), "");
        assert_eq!(scrub(""), "");
        assert_eq!(scrub("basic\n"), "basic");
    }

    #[test]
    fn test_truthy() {
        for yes in ["y", "Y", "yes", "YES", "t", "true", "True", "ok", "OK", "1", ""] {
            assert!(truthy(yes), "{yes:?} should be truthy");
        }
        for no in ["n", "no", "false", "0", "nope", "yes please"] {
            assert!(!truthy(no), "{no:?} should not be truthy");
        }
    }

    #[test]
    fn test_stream_reads_scrubbed_lines() {
        let mut source = Stream::new(Cursor::new("myjob\n\n20 # comment\n"));
        assert_eq!(source.read_answer("ignored").unwrap(), Response::Line("myjob".into()));
        assert_eq!(source.read_answer("ignored").unwrap(), Response::Line("".into()));
        assert_eq!(source.read_answer("ignored").unwrap(), Response::Line("20".into()));
        assert_eq!(source.read_answer("ignored").unwrap(), Response::EndOfInput);
        assert!(!source.is_interactive());
    }
}
