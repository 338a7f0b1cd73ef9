use std::fmt;

use log::trace;

use crate::proto::ProtoIntegerType;
use crate::{Result, SchemaError};

/// Marker tag meaning "no tag".
///
/// Protobuf reserves field numbers 19000 to 19999 for protocol use, so 19500 can never be
/// produced by a declared field. It is never pushed onto a [`TagStack`] and never written out.
pub const MISSING_TAG: TagDescriptor = TagDescriptor(19_500);

const FIELD_NUMBER_MASK: u64 = 0xFFFF_FFFF;
const INTEGER_TYPE_SHIFT: u32 = 32;
const INTEGER_TYPE_MASK: u64 = 0b11 << INTEGER_TYPE_SHIFT;
const PACKED_BIT: u64 = 1 << 34;

const INITIAL_CAPACITY: usize = 8;

/// A field's wire tag: protocol field number plus encoding hints, packed into 64 bits.
///
/// Bits 0..32 hold the field number, bits 32..34 the [`ProtoIntegerType`] and bit 34 the
/// packed flag.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagDescriptor(u64);

impl TagDescriptor {
    pub const fn new(field_number: u32, integer_type: ProtoIntegerType, packed: bool) -> Self {
        let mut raw = field_number as u64 | ((integer_type as u64) << INTEGER_TYPE_SHIFT);
        if packed {
            raw |= PACKED_BIT;
        }
        TagDescriptor(raw)
    }

    pub const fn from_raw(raw: u64) -> Self {
        TagDescriptor(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub const fn field_number(self) -> u32 {
        (self.0 & FIELD_NUMBER_MASK) as u32
    }

    pub const fn integer_type(self) -> ProtoIntegerType {
        ProtoIntegerType::from_bits((self.0 & INTEGER_TYPE_MASK) >> INTEGER_TYPE_SHIFT)
    }

    pub const fn is_packed(self) -> bool {
        self.0 & PACKED_BIT != 0
    }

    pub const fn is_missing(self) -> bool {
        self.0 == MISSING_TAG.0
    }
}

impl fmt::Debug for TagDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_missing() {
            return f.write_str("MISSING_TAG");
        }
        f.debug_struct("TagDescriptor")
            .field("field_number", &self.field_number())
            .field("integer_type", &self.integer_type())
            .field("packed", &self.is_packed())
            .finish()
    }
}

impl From<TagDescriptor> for u64 {
    #[inline]
    fn from(tag: TagDescriptor) -> u64 {
        tag.0
    }
}

/// The field path a tag-prefixed codec is currently inside.
///
/// Codecs push the tag of a nested field before descending into it and pop it on return.
/// One stack belongs to exactly one encode/decode traversal.
///
/// # Example
/// ```rust
/// use senax_schema::{TagDescriptor, TagStack, MISSING_TAG};
/// use senax_schema::proto::ProtoIntegerType;
///
/// let mut stack = TagStack::new();
/// stack.push(TagDescriptor::new(1, ProtoIntegerType::Default, false));
/// stack.push(MISSING_TAG);
/// assert_eq!(stack.len(), 1);
/// assert_eq!(stack.peek().unwrap().field_number(), 1);
/// assert_eq!(stack.pop().unwrap().field_number(), 1);
/// assert_eq!(stack.pop_or_missing(), MISSING_TAG);
/// ```
#[derive(Clone)]
pub struct TagStack {
    tags: Box<[TagDescriptor]>,
    size: usize,
}

impl TagStack {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        TagStack {
            tags: vec![MISSING_TAG; capacity.max(1)].into_boxed_slice(),
            size: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.tags.len()
    }

    /// Pushes `tag` on top of the stack. Pushing [`MISSING_TAG`] does nothing.
    #[inline]
    pub fn push(&mut self, tag: TagDescriptor) {
        if tag.is_missing() {
            return;
        }
        if self.size == self.tags.len() {
            self.expand();
        }
        self.tags[self.size] = tag;
        self.size += 1;
    }

    #[inline(never)]
    fn expand(&mut self) {
        let new_capacity = self.tags.len() * 2;
        trace!(
            "Growing tag stack from {} to {} entries",
            self.tags.len(),
            new_capacity
        );
        let mut tags = vec![MISSING_TAG; new_capacity].into_boxed_slice();
        tags[..self.size].copy_from_slice(&self.tags[..self.size]);
        self.tags = tags;
    }

    /// Returns the current tag.
    ///
    /// # Errors
    /// Returns [`SchemaError::EmptyStack`] if nothing was pushed.
    #[inline]
    pub fn peek(&self) -> Result<TagDescriptor> {
        self.peek_or_none().ok_or(SchemaError::EmptyStack)
    }

    /// Returns the current tag, or [`MISSING_TAG`] if the stack is empty.
    #[inline]
    pub fn peek_or_missing(&self) -> TagDescriptor {
        self.peek_or_none().unwrap_or(MISSING_TAG)
    }

    #[inline]
    pub fn peek_or_none(&self) -> Option<TagDescriptor> {
        self.size.checked_sub(1).map(|top| self.tags[top])
    }

    /// Removes and returns the current tag, or [`MISSING_TAG`] if the stack is empty.
    #[inline]
    pub fn pop_or_missing(&mut self) -> TagDescriptor {
        self.pop_or_none().unwrap_or(MISSING_TAG)
    }

    /// Removes and returns the current tag.
    ///
    /// # Errors
    /// Returns [`SchemaError::EmptyStack`] if nothing was pushed.
    #[inline]
    pub fn pop(&mut self) -> Result<TagDescriptor> {
        self.pop_or_none().ok_or(SchemaError::EmptyStack)
    }

    #[inline]
    fn pop_or_none(&mut self) -> Option<TagDescriptor> {
        let top = self.size.checked_sub(1)?;
        self.size = top;
        Some(self.tags[top])
    }

    /// Pushes `tag` and runs `body`.
    ///
    /// The matching pop is left to the caller: a decoder typically pops when it returns from
    /// the nested element. Use [`TagStack::scoped`] when the pop should happen here.
    pub fn with_tag<R>(&mut self, tag: TagDescriptor, body: impl FnOnce(&mut Self) -> R) -> R {
        self.push(tag);
        body(self)
    }

    /// Pushes `tag`, runs `body` and pops again, on success and on error alike.
    ///
    /// Pushing [`MISSING_TAG`] pushes nothing, so nothing is popped either.
    pub fn scoped<T, E>(
        &mut self,
        tag: TagDescriptor,
        body: impl FnOnce(&mut Self) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        let depth = self.size;
        self.push(tag);
        let result = body(self);
        self.size = self.size.min(depth);
        result
    }

    /// Tags from the outermost to the innermost open field.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = TagDescriptor> + '_ {
        self.tags[..self.size].iter().copied()
    }

    /// Field numbers of the open path, outermost first.
    pub fn path(&self) -> Vec<u32> {
        self.iter().map(TagDescriptor::field_number).collect()
    }

    /// Drops every entry. Capacity is kept.
    pub fn clear(&mut self) {
        self.size = 0;
    }
}

impl Default for TagStack {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TagStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
