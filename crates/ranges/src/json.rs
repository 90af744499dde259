//! JSON structural parser.
//!
//! [`parse_json`] scans a JSON text once, left to right, and returns a
//! [`Commitment`] for the root container and for every object member it
//! encounters. A member commitment spans from the opening quote of its key to
//! the last byte of its value, so slicing the text with its range yields
//! `"key":value` exactly as it was written, including whitespace around the
//! colon.
//!
//! Arrays are delimited but never descended into: an array value is covered
//! by the commitment of the member holding it and its elements produce no
//! commitments of their own.
//!
//! # Limitations
//!
//! Strings are terminated by the first `"` following the opening quote. There
//! is no lookahead for backslash escapes, so a string containing `\"` ends
//! early and the remainder of the text is then rejected as malformed.

use tracing::{debug, instrument, trace};

use crate::{commit::Commitment, Error};

/// An element of the parse stack.
///
/// Every frame records the offset at which it was opened. Member frames refer
/// back to the object they belong to (`object_id`) and to the commitment slot
/// reserved when their key was opened (`key_id`).
#[derive(Debug, Clone, Copy)]
enum Frame {
    Object {
        id: usize,
        start: usize,
    },
    Array {
        id: usize,
        start: usize,
        /// Nesting depth of brackets inside the array.
        depth: usize,
        in_string: bool,
    },
    /// A key literal. Once its closing quote is consumed the frame waits for
    /// the `:` separator.
    ObjectKey {
        id: usize,
        object_id: usize,
        key_id: usize,
        start: usize,
        closed: bool,
    },
    /// Waits for the first character of a member value. Stays on the stack
    /// beneath a nested object or array until that container is closed.
    ObjectValue {
        id: usize,
        object_id: usize,
        key_id: usize,
        start: usize,
    },
    ObjectValueString {
        id: usize,
        object_id: usize,
        key_id: usize,
        start: usize,
    },
    /// A bare literal: a number, `true`, `false` or `null`.
    ObjectValueNumber {
        id: usize,
        object_id: usize,
        key_id: usize,
        start: usize,
    },
}

impl Frame {
    fn start(&self) -> usize {
        match self {
            Frame::Object { start, .. }
            | Frame::Array { start, .. }
            | Frame::ObjectKey { start, .. }
            | Frame::ObjectValue { start, .. }
            | Frame::ObjectValueString { start, .. }
            | Frame::ObjectValueNumber { start, .. } => *start,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Frame::Object { .. } => "object",
            Frame::Array { .. } => "array",
            Frame::ObjectKey { .. } => "object key",
            Frame::ObjectValue { .. } => "object value",
            Frame::ObjectValueString { .. } => "string value",
            Frame::ObjectValueNumber { .. } => "literal value",
        }
    }
}

/// A commitment whose range is not closed yet.
#[derive(Debug)]
struct Slot {
    path: Option<String>,
    start: usize,
    end: Option<usize>,
}

#[derive(Debug)]
struct Parser<'a> {
    text: &'a str,
    stack: Vec<Frame>,
    path: Vec<&'a str>,
    slots: Vec<Slot>,
    nonce: usize,
    root_closed: bool,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            stack: Vec::new(),
            path: Vec::new(),
            slots: Vec::new(),
            nonce: 0,
            root_closed: false,
        }
    }

    fn next_id(&mut self) -> usize {
        let id = self.nonce;
        self.nonce += 1;
        id
    }

    fn replace_top(&mut self, frame: Frame) {
        if let Some(top) = self.stack.last_mut() {
            *top = frame;
        }
    }

    fn unexpected(&self, pos: usize, c: char) -> Error {
        let context = self
            .stack
            .last()
            .map(Frame::name)
            .unwrap_or("top level");

        Error::malformed_json(format!(
            "unexpected character {:?} at offset {} in {}",
            c, pos, context
        ))
    }

    fn step(&mut self, pos: usize, c: char) -> Result<(), Error> {
        let Some(top) = self.stack.last().copied() else {
            return self.step_top_level(pos, c);
        };

        match top {
            Frame::Object { id, .. } => match c {
                c if c.is_ascii_whitespace() => {}
                ',' => {}
                '"' => self.open_key(id, pos),
                '}' => self.close_container(pos)?,
                _ => return Err(self.unexpected(pos, c)),
            },
            Frame::Array {
                id,
                start,
                depth,
                in_string,
            } => {
                if in_string {
                    if c == '"' {
                        self.replace_top(Frame::Array {
                            id,
                            start,
                            depth,
                            in_string: false,
                        });
                    }
                    return Ok(());
                }

                match c {
                    '"' => self.replace_top(Frame::Array {
                        id,
                        start,
                        depth,
                        in_string: true,
                    }),
                    '[' | '{' => self.replace_top(Frame::Array {
                        id,
                        start,
                        depth: depth + 1,
                        in_string,
                    }),
                    ']' | '}' if depth > 0 => self.replace_top(Frame::Array {
                        id,
                        start,
                        depth: depth - 1,
                        in_string,
                    }),
                    ']' => self.close_container(pos)?,
                    '}' => return Err(self.unexpected(pos, c)),
                    _ => {}
                }
            }
            Frame::ObjectKey {
                id,
                object_id,
                key_id,
                start,
                closed,
            } => {
                if !closed {
                    if c == '"' {
                        self.close_key(key_id, start, pos);
                        self.replace_top(Frame::ObjectKey {
                            id,
                            object_id,
                            key_id,
                            start,
                            closed: true,
                        });
                    }
                    return Ok(());
                }

                match c {
                    c if c.is_ascii_whitespace() => {}
                    ':' => {
                        let id = self.next_id();
                        self.replace_top(Frame::ObjectValue {
                            id,
                            object_id,
                            key_id,
                            start: pos,
                        });
                    }
                    _ => return Err(self.unexpected(pos, c)),
                }
            }
            Frame::ObjectValue {
                object_id, key_id, ..
            } => match c {
                c if c.is_ascii_whitespace() => {}
                '{' => {
                    let id = self.next_id();
                    trace!(id, pos, "opening nested object");
                    self.stack.push(Frame::Object { id, start: pos });
                }
                '[' => {
                    let id = self.next_id();
                    trace!(id, pos, "opening nested array");
                    self.stack.push(Frame::Array {
                        id,
                        start: pos,
                        depth: 0,
                        in_string: false,
                    });
                }
                '"' => {
                    let id = self.next_id();
                    self.replace_top(Frame::ObjectValueString {
                        id,
                        object_id,
                        key_id,
                        start: pos,
                    });
                }
                c if c == '-' || c.is_ascii_alphanumeric() => {
                    let id = self.next_id();
                    self.replace_top(Frame::ObjectValueNumber {
                        id,
                        object_id,
                        key_id,
                        start: pos,
                    });
                }
                _ => return Err(self.unexpected(pos, c)),
            },
            Frame::ObjectValueString {
                id,
                object_id,
                key_id,
                ..
            } => {
                if c == '"' {
                    trace!(id, key_id, "closing string value");
                    self.stack.pop();
                    self.close_member(object_id, key_id, pos + 1)?;
                }
            }
            Frame::ObjectValueNumber {
                id,
                object_id,
                key_id,
                ..
            } => {
                if c == ',' || c == '}' || c.is_ascii_whitespace() {
                    trace!(id, key_id, "closing literal value");
                    self.stack.pop();
                    self.close_member(object_id, key_id, pos)?;
                    // The terminator belongs to the enclosing object.
                    return self.step(pos, c);
                }
            }
        }

        Ok(())
    }

    fn step_top_level(&mut self, pos: usize, c: char) -> Result<(), Error> {
        if c.is_ascii_whitespace() {
            return Ok(());
        }

        if self.root_closed {
            return Err(Error::malformed_json(format!(
                "unexpected character {:?} at offset {} after the root value",
                c, pos
            )));
        }

        let id = self.next_id();
        let frame = match c {
            '{' => Frame::Object { id, start: pos },
            '[' => Frame::Array {
                id,
                start: pos,
                depth: 0,
                in_string: false,
            },
            _ => return Err(self.unexpected(pos, c)),
        };

        self.slots.push(Slot {
            path: None,
            start: pos,
            end: None,
        });
        self.stack.push(frame);

        Ok(())
    }

    fn open_key(&mut self, object_id: usize, pos: usize) {
        let id = self.next_id();
        let key_id = self.slots.len();

        self.slots.push(Slot {
            path: None,
            start: pos,
            end: None,
        });
        self.stack.push(Frame::ObjectKey {
            id,
            object_id,
            key_id,
            start: pos,
            closed: false,
        });
    }

    fn close_key(&mut self, key_id: usize, start: usize, pos: usize) {
        let text = self.text;
        self.path.push(&text[start + 1..pos]);

        let path = self.path.join(".");
        trace!(key_id, %path, "closed key");

        if let Some(slot) = self.slots.get_mut(key_id) {
            slot.path = Some(path);
        }
    }

    /// Closes the object or array on top of the stack, whose closing bracket
    /// is at `pos`.
    fn close_container(&mut self, pos: usize) -> Result<(), Error> {
        self.stack.pop();
        let end = pos + 1;

        match self.stack.last().copied() {
            None => {
                if let Some(root) = self.slots.first_mut() {
                    root.end = Some(end);
                }
                self.root_closed = true;
                Ok(())
            }
            Some(Frame::ObjectValue {
                id,
                object_id,
                key_id,
                ..
            }) => {
                trace!(id, key_id, "closing container value");
                self.stack.pop();
                self.close_member(object_id, key_id, end)
            }
            Some(frame) => Err(Error::malformed_json(format!(
                "container closed at offset {} inside {} opened at offset {}",
                pos,
                frame.name(),
                frame.start()
            ))),
        }
    }

    /// Closes the member stored in slot `key_id` at `end` (exclusive). The
    /// value frames must already be popped.
    fn close_member(&mut self, object_id: usize, key_id: usize, end: usize) -> Result<(), Error> {
        match self.stack.last() {
            Some(Frame::Object { id, .. }) if *id == object_id => {}
            _ => {
                return Err(Error::malformed_json(format!(
                    "member ending at offset {} is not enclosed by its object",
                    end
                )))
            }
        }

        if let Some(slot) = self.slots.get_mut(key_id) {
            slot.end = Some(end);
        }
        self.path.pop();

        Ok(())
    }

    fn finish(self) -> Result<Vec<Commitment>, Error> {
        if let Some(frame) = self.stack.last() {
            return Err(Error::malformed_json(format!(
                "unexpected end of input, {} opened at offset {} is not closed",
                frame.name(),
                frame.start()
            )));
        }

        if !self.root_closed {
            return Err(Error::malformed_json("no object or array found"));
        }

        self.slots
            .into_iter()
            .map(|slot| {
                let end = slot.end.ok_or_else(|| {
                    Error::malformed_json(format!(
                        "value starting at offset {} is not closed",
                        slot.start
                    ))
                })?;

                Ok(Commitment {
                    path: slot.path,
                    name: None,
                    range: slot.start..end,
                })
            })
            .collect()
    }
}

/// Parses the structure of a JSON text.
///
/// Returns one commitment for the root object or array (without a path) and
/// one for every object member (with the dot-joined path of keys leading to
/// it), ordered by their start offset. All ranges are shifted by `offset`,
/// the position of `text` within the enclosing buffer.
///
/// # Errors
///
/// Returns a [`MalformedJson`](crate::ErrorKind::MalformedJson) error if the
/// text has no valid transition at some character or if a value is still
/// open at the end of the input.
///
/// # Arguments
///
/// * `text` - The JSON text.
/// * `offset` - The byte offset of `text` in the enclosing buffer.
#[instrument(level = "trace", skip(text), err)]
pub fn parse_json(text: &str, offset: usize) -> Result<Vec<Commitment>, Error> {
    let mut parser = Parser::new(text);

    for (pos, c) in text.char_indices() {
        parser.step(pos, c)?;
    }

    let commitments: Vec<Commitment> = parser
        .finish()?
        .into_iter()
        .map(|commitment| commitment.shift(offset))
        .collect();

    debug!(count = commitments.len(), "parsed json structure");

    Ok(commitments)
}
