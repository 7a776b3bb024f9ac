/// Marker trait for bit-oriented buffers with incremental append operations
///
/// In most ways, it is convenient to think of `Target` as an analogous trait to
/// [`std::io::Write`], at single-bit rather than byte granularity. The `push_XXX`
/// methods on `Target` are infallible and total; while they return a `usize`
/// value representing the number of bits written, this is used only for summary
/// book-keeping on the caller side, rather than a feedback mechanism that may
/// indicate failure or partial success.
///
/// All implementors of `Target` must define these methods as infallible and total.
pub trait Target {
    /// Performs any necessary operations that amortize the cost incurred by
    /// writing a certain number of additional bits to the end of the `Target`.
    ///
    /// For many implementors, this may simply be a no-op.
    fn anticipate(&mut self, extra: usize);

    /// Returns a fresh object of the `Self` type with an initially empty buffer.
    fn create() -> Self;

    /// Appends a single bit to a Target object.
    ///
    /// The return value must be `1`.
    fn push_bit(&mut self, bit: bool) -> usize;

    /// Appends the low `width` bits of `value`, most significant first.
    ///
    /// The operational semantics of this method should be indistinguishable from
    /// `width` calls to `push_bit`, and the return value must be `width`.
    /// Bits of `value` above `width` are ignored.
    fn push_uint(&mut self, value: u64, width: usize) -> usize {
        for shift in (0..width).rev() {
            let bit = shift < 64 && (value >> shift) & 1 == 1;
            self.push_bit(bit);
        }
        width
    }

    /// Appends every bit of a slice, in order
    fn push_all(&mut self, bits: &[bool]) -> usize {
        self.anticipate(bits.len());
        bits.iter().map(|&b| self.push_bit(b)).sum()
    }
}

/// Zero-allocation target that only counts the number of bits that
/// would be required to serialize a value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BitCounter(usize);

impl BitCounter {
    /// Returns the number of bits 'written' so far
    #[inline]
    #[must_use]
    pub const fn count(&self) -> usize {
        self.0
    }
}

impl Target for BitCounter {
    #[inline(always)]
    fn anticipate(&mut self, _: usize) {}

    #[inline]
    fn create() -> Self {
        Self(0)
    }

    #[inline(always)]
    fn push_bit(&mut self, _: bool) -> usize {
        self.0 += 1;
        1
    }

    #[inline(always)]
    fn push_uint(&mut self, _: u64, width: usize) -> usize {
        self.0 += width;
        width
    }

    #[inline(always)]
    fn push_all(&mut self, bits: &[bool]) -> usize {
        self.0 += bits.len();
        bits.len()
    }
}

impl Target for Vec<bool> {
    #[inline]
    fn anticipate(&mut self, extra: usize) {
        self.reserve(extra)
    }

    #[inline]
    fn create() -> Self {
        Self::new()
    }

    #[inline]
    fn push_bit(&mut self, bit: bool) -> usize {
        self.push(bit);
        1
    }

    #[inline]
    fn push_all(&mut self, bits: &[bool]) -> usize {
        self.extend_from_slice(bits);
        bits.len()
    }
}
