//! Shape-directed binary value codec.
//!
//! Every supported type knows how to append itself to an output buffer
//! ([`Encode`]) and how to rebuild itself from a cursor ([`Decode`]). The
//! shape is chosen statically by the type; nothing in the stream says what
//! comes next.
//!
//! ```text
//!  scalar     [raw host-native bytes]                 (no prefix)
//!  text       [usize len][len bytes]
//!  pair       [first][second]
//!  sequence   [usize count][elem]...[elem]
//!  map        [usize count][key][value]...[key][value]
//!  tuple      [c0][c1]...[cN]                          (arity is static)
//! ```
//!
//! Byte order and widths are those of the host. The format is not portable
//! across machines with a different `usize` width or endianness.
//!
//! Decoding with a different shape than the one used for encoding is not
//! detected in general; it yields garbage or an error further down the
//! stream. Running out of bytes is always reported as
//! [`DecodeError::Underrun`] and never leaves a partially built value behind.
//!
//! Container elements that decode from zero bytes (`()`, `[T; 0]`, ...) are
//! not bounded by the input length, so one message may hold at most
//! [`MAX_ZERO_WIDTH_ELEMENTS`] of them.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::{BuildHasher, Hash};

use crate::error::DecodeError;

/// Width of every size prefix (text length, container count).
pub const SIZE_WIDTH: usize = core::mem::size_of::<usize>();

/// Zero-width container elements one [`Reader`] will decode.
pub const MAX_ZERO_WIDTH_ELEMENTS: usize = 1 << 16;

// ═══════════════════════════════════════════════════════════════
//  Traits
// ═══════════════════════════════════════════════════════════════

/// Append the canonical encoding of `self` to a byte sink.
pub trait Encode {
    fn encode(&self, out: &mut Vec<u8>);
}

/// Rebuild a value from the front of a byte cursor.
pub trait Decode: Sized {
    fn decode(input: &mut Reader<'_>) -> Result<Self, DecodeError>;
}

/// Encode a single value into a fresh buffer.
pub fn to_bytes<T: Encode + ?Sized>(value: &T) -> Vec<u8> {
    let mut out = Vec::new();
    value.encode(&mut out);
    out
}

/// Decode a single value from the front of `bytes`. Trailing bytes are left
/// unread.
pub fn from_bytes<T: Decode>(bytes: &[u8]) -> Result<T, DecodeError> {
    T::decode(&mut Reader::new(bytes))
}

// ═══════════════════════════════════════════════════════════════
//  Input cursor
// ═══════════════════════════════════════════════════════════════

/// Forward-only cursor over an input message.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    zero_width_left: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            zero_width_left: MAX_ZERO_WIDTH_ELEMENTS,
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The unconsumed tail, without advancing.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    /// Consume exactly `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(DecodeError::Underrun {
                needed: n,
                remaining,
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let bytes = self.take(N)?;
        let mut arr = [0u8; N];
        arr.copy_from_slice(bytes);
        Ok(arr)
    }

    /// Account for one container element that consumed no input.
    fn charge_zero_width(&mut self) -> Result<(), DecodeError> {
        self.zero_width_left = self
            .zero_width_left
            .checked_sub(1)
            .ok_or(DecodeError::ZeroWidthLimit {
                limit: MAX_ZERO_WIDTH_ELEMENTS,
            })?;
        Ok(())
    }

    /// Read a size prefix.
    pub fn read_size(&mut self) -> Result<usize, DecodeError> {
        self.read_array().map(usize::from_ne_bytes)
    }
}

/// Write a size prefix.
pub fn encode_size(len: usize, out: &mut Vec<u8>) {
    out.extend_from_slice(&len.to_ne_bytes());
}

// ═══════════════════════════════════════════════════════════════
//  Scalars
// ═══════════════════════════════════════════════════════════════

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl Encode for $ty {
            #[inline]
            fn encode(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_ne_bytes());
            }
        }

        impl Decode for $ty {
            #[inline]
            fn decode(input: &mut Reader<'_>) -> Result<Self, DecodeError> {
                input.read_array().map(<$ty>::from_ne_bytes)
            }
        }
    )*};
}

impl_scalar!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

impl Encode for bool {
    fn encode(&self, out: &mut Vec<u8>) {
        out.push(u8::from(*self));
    }
}

impl Decode for bool {
    fn decode(input: &mut Reader<'_>) -> Result<Self, DecodeError> {
        match u8::decode(input)? {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(DecodeError::InvalidBool(b)),
        }
    }
}

impl Encode for char {
    fn encode(&self, out: &mut Vec<u8>) {
        u32::from(*self).encode(out);
    }
}

impl Decode for char {
    fn decode(input: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let raw = u32::decode(input)?;
        char::from_u32(raw).ok_or(DecodeError::InvalidChar(raw))
    }
}

/// Fixed-length arrays carry no prefix: the length is part of the type.
impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode(&self, out: &mut Vec<u8>) {
        for item in self {
            item.encode(out);
        }
    }
}

impl<T: Decode, const N: usize> Decode for [T; N] {
    fn decode(input: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let items = (0..N)
            .map(|_| T::decode(input))
            .collect::<Result<Vec<T>, _>>()?;
        // Exactly N items were collected above.
        items.try_into().map_err(|_| DecodeError::Underrun {
            needed: N,
            remaining: 0,
        })
    }
}

// ═══════════════════════════════════════════════════════════════
//  Text
// ═══════════════════════════════════════════════════════════════

impl Encode for str {
    fn encode(&self, out: &mut Vec<u8>) {
        encode_size(self.len(), out);
        out.extend_from_slice(self.as_bytes());
    }
}

impl Encode for String {
    fn encode(&self, out: &mut Vec<u8>) {
        self.as_str().encode(out);
    }
}

impl Decode for String {
    fn decode(input: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let len = input.read_size()?;
        let bytes = input.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Indirection
// ═══════════════════════════════════════════════════════════════

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, out: &mut Vec<u8>) {
        (**self).encode(out);
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode(&self, out: &mut Vec<u8>) {
        (**self).encode(out);
    }
}

impl<T: Decode> Decode for Box<T> {
    fn decode(input: &mut Reader<'_>) -> Result<Self, DecodeError> {
        T::decode(input).map(Box::new)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Sequences
// ═══════════════════════════════════════════════════════════════

fn encode_seq<'a, T, I>(len: usize, items: I, out: &mut Vec<u8>)
where
    T: Encode + 'a,
    I: IntoIterator<Item = &'a T>,
{
    encode_size(len, out);
    for item in items {
        item.encode(out);
    }
}

/// Decode `count` then that many elements, handing each to `insert`.
fn decode_seq<T, F>(input: &mut Reader<'_>, mut insert: F) -> Result<(), DecodeError>
where
    T: Decode,
    F: FnMut(T),
{
    let count = input.read_size()?;
    for _ in 0..count {
        let before = input.position();
        insert(T::decode(input)?);
        if input.position() == before {
            input.charge_zero_width()?;
        }
    }
    Ok(())
}

/// Pre-allocation bound: never trust a count beyond what the input could hold.
fn capacity_hint(count_hint: usize, input: &Reader<'_>) -> usize {
    count_hint.min(input.remaining())
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, out: &mut Vec<u8>) {
        encode_seq(self.len(), self, out);
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, out: &mut Vec<u8>) {
        self.as_slice().encode(out);
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(input: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let peek = input.clone().read_size()?;
        let mut v = Vec::with_capacity(capacity_hint(peek, input));
        decode_seq::<T, _>(input, |item| v.push(item))?;
        Ok(v)
    }
}

impl<T: Encode> Encode for VecDeque<T> {
    fn encode(&self, out: &mut Vec<u8>) {
        encode_seq(self.len(), self, out);
    }
}

impl<T: Decode> Decode for VecDeque<T> {
    fn decode(input: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let mut v = VecDeque::new();
        decode_seq::<T, _>(input, |item| v.push_back(item))?;
        Ok(v)
    }
}

impl<T: Encode> Encode for BTreeSet<T> {
    fn encode(&self, out: &mut Vec<u8>) {
        encode_seq(self.len(), self, out);
    }
}

impl<T: Decode + Ord> Decode for BTreeSet<T> {
    fn decode(input: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let mut set = BTreeSet::new();
        decode_seq::<T, _>(input, |item| {
            set.insert(item);
        })?;
        Ok(set)
    }
}

impl<T: Encode, S> Encode for HashSet<T, S> {
    fn encode(&self, out: &mut Vec<u8>) {
        encode_seq(self.len(), self, out);
    }
}

impl<T, S> Decode for HashSet<T, S>
where
    T: Decode + Eq + Hash,
    S: BuildHasher + Default,
{
    fn decode(input: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let mut set = HashSet::with_hasher(S::default());
        decode_seq::<T, _>(input, |item| {
            set.insert(item);
        })?;
        Ok(set)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Associative containers
// ═══════════════════════════════════════════════════════════════

fn encode_map<'a, K, V, I>(len: usize, entries: I, out: &mut Vec<u8>)
where
    K: Encode + 'a,
    V: Encode + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    encode_size(len, out);
    for (k, v) in entries {
        k.encode(out);
        v.encode(out);
    }
}

impl<K: Encode, V: Encode> Encode for BTreeMap<K, V> {
    fn encode(&self, out: &mut Vec<u8>) {
        encode_map(self.len(), self, out);
    }
}

impl<K: Decode + Ord, V: Decode> Decode for BTreeMap<K, V> {
    fn decode(input: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let mut map = BTreeMap::new();
        decode_seq::<(K, V), _>(input, |(k, v)| {
            map.insert(k, v);
        })?;
        Ok(map)
    }
}

impl<K: Encode, V: Encode, S> Encode for HashMap<K, V, S> {
    fn encode(&self, out: &mut Vec<u8>) {
        encode_map(self.len(), self, out);
    }
}

impl<K, V, S> Decode for HashMap<K, V, S>
where
    K: Decode + Eq + Hash,
    V: Decode,
    S: BuildHasher + Default,
{
    fn decode(input: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let mut map = HashMap::with_hasher(S::default());
        decode_seq::<(K, V), _>(input, |(k, v)| {
            map.insert(k, v);
        })?;
        Ok(map)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tuples (pairs are the 2-ary case)
// ═══════════════════════════════════════════════════════════════

macro_rules! impl_tuple {
    ($($name:ident)*) => {
        impl<$($name: Encode),*> Encode for ($($name,)*) {
            #[allow(non_snake_case, unused_variables)]
            fn encode(&self, out: &mut Vec<u8>) {
                let ($($name,)*) = self;
                $($name.encode(out);)*
            }
        }

        impl<$($name: Decode),*> Decode for ($($name,)*) {
            #[allow(unused_variables)]
            fn decode(input: &mut Reader<'_>) -> Result<Self, DecodeError> {
                Ok(($($name::decode(input)?,)*))
            }
        }
    };
}

impl_tuple!();
impl_tuple!(A);
impl_tuple!(A B);
impl_tuple!(A B C);
impl_tuple!(A B C D);
impl_tuple!(A B C D E);
impl_tuple!(A B C D E F);
impl_tuple!(A B C D E F G);
impl_tuple!(A B C D E F G H);
impl_tuple!(A B C D E F G H I);
impl_tuple!(A B C D E F G H I J);
impl_tuple!(A B C D E F G H I J K);
impl_tuple!(A B C D E F G H I J K L);

// ── Tests ────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn size(n: usize) -> Vec<u8> {
        n.to_ne_bytes().to_vec()
    }

    #[test]
    fn scalar_is_raw_native_bytes() {
        assert_eq!(to_bytes(&0x0102_0304u32), 0x0102_0304u32.to_ne_bytes());
        assert_eq!(to_bytes(&-7i64), (-7i64).to_ne_bytes());
        assert_eq!(to_bytes(&1.5f64), 1.5f64.to_ne_bytes());
        assert_eq!(to_bytes(&true), [1]);
    }

    #[test]
    fn text_is_size_then_bytes() {
        let mut expected = size(5);
        expected.extend_from_slice(b"hello");
        assert_eq!(to_bytes("hello"), expected);
        assert_eq!(to_bytes(&String::from("hello")), expected);
    }

    #[test]
    fn empty_text_and_containers_encode_only_the_size() {
        assert_eq!(to_bytes(""), size(0));
        assert_eq!(to_bytes(&Vec::<u32>::new()), size(0));
        assert_eq!(to_bytes(&BTreeMap::<String, i32>::new()), size(0));

        assert_eq!(from_bytes::<String>(&size(0)).unwrap(), "");
        assert!(from_bytes::<Vec<u64>>(&size(0)).unwrap().is_empty());
    }

    #[test]
    fn pair_and_tuple_have_no_joint_prefix() {
        let mut expected = 7u16.to_ne_bytes().to_vec();
        expected.extend_from_slice(&size(1));
        expected.push(b'x');
        assert_eq!(to_bytes(&(7u16, "x")), expected);

        expected.extend_from_slice(&9u8.to_ne_bytes());
        assert_eq!(to_bytes(&(7u16, "x", 9u8)), expected);

        assert!(to_bytes(&()).is_empty());
    }

    #[test]
    fn sequence_layout() {
        let mut expected = size(3);
        for v in [1i32, 2, 3] {
            expected.extend_from_slice(&v.to_ne_bytes());
        }
        assert_eq!(to_bytes(&vec![1i32, 2, 3]), expected);
        assert_eq!(to_bytes(&[1i32, 2, 3][..]), expected);
    }

    #[test]
    fn fixed_array_has_no_prefix() {
        let bytes = to_bytes(&[1u8, 2, 3, 4]);
        assert_eq!(bytes, [1, 2, 3, 4]);
        assert_eq!(from_bytes::<[u8; 4]>(&bytes).unwrap(), [1, 2, 3, 4]);
    }

    #[test]
    fn map_layout_is_count_then_key_value_pairs() {
        let mut map = BTreeMap::new();
        map.insert(1u8, 10u8);
        map.insert(2u8, 20u8);

        let mut expected = size(2);
        expected.extend_from_slice(&[1, 10, 2, 20]);
        assert_eq!(to_bytes(&map), expected);

        // A sequence of pairs has the same layout as the map.
        assert_eq!(to_bytes(&vec![(1u8, 10u8), (2u8, 20u8)]), expected);
        let back: HashMap<u8, u8> = from_bytes(&expected).unwrap();
        assert_eq!(back.get(&2), Some(&20));
    }

    #[test]
    fn nested_composite_roundtrip() {
        let mut inner = HashMap::new();
        inner.insert("a".to_string(), vec![(1u32, 'é'), (2, 'z')]);
        inner.insert(String::new(), Vec::new());
        let value = (
            -3i16,
            inner,
            VecDeque::from(vec![BTreeSet::from([5u64, 1]), BTreeSet::new()]),
            ("pair".to_string(), 2.25f32),
            false,
        );

        let bytes = to_bytes(&value);
        let mut reader = Reader::new(&bytes);
        let back = <(
            i16,
            HashMap<String, Vec<(u32, char)>>,
            VecDeque<BTreeSet<u64>>,
            (String, f32),
            bool,
        )>::decode(&mut reader)
        .unwrap();
        assert_eq!(back, value);
        assert!(reader.is_empty(), "decode must consume exactly what encode wrote");
    }

    #[test]
    fn scalar_underrun_is_reported() {
        let err = from_bytes::<u32>(&[1, 2]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Underrun {
                needed: 4,
                remaining: 2
            }
        );
    }

    #[test]
    fn text_shorter_than_its_prefix_is_underrun() {
        let mut bytes = size(10);
        bytes.extend_from_slice(b"abc");
        assert!(matches!(
            from_bytes::<String>(&bytes),
            Err(DecodeError::Underrun {
                needed: 10,
                remaining: 3
            })
        ));
    }

    #[test]
    fn huge_count_does_not_preallocate() {
        let bytes = size(usize::MAX);
        assert!(matches!(
            from_bytes::<Vec<u8>>(&bytes),
            Err(DecodeError::Underrun { .. })
        ));
    }

    #[test]
    fn zero_width_elements_are_budgeted() {
        let limit = Err(DecodeError::ZeroWidthLimit {
            limit: MAX_ZERO_WIDTH_ELEMENTS,
        });
        assert_eq!(from_bytes::<Vec<()>>(&size(usize::MAX)), limit);
        assert_eq!(
            from_bytes::<Vec<[u8; 0]>>(&size(usize::MAX)),
            Err(DecodeError::ZeroWidthLimit {
                limit: MAX_ZERO_WIDTH_ELEMENTS,
            })
        );
        assert!(from_bytes::<HashSet<()>>(&size(usize::MAX)).is_err());

        let units = vec![(); 3];
        assert_eq!(from_bytes::<Vec<()>>(&to_bytes(&units)).unwrap(), units);
        let at_limit = vec![(); MAX_ZERO_WIDTH_ELEMENTS];
        let decoded = from_bytes::<Vec<()>>(&to_bytes(&at_limit)).unwrap();
        assert_eq!(decoded.len(), MAX_ZERO_WIDTH_ELEMENTS);
    }

    #[test]
    fn zero_width_budget_spans_nested_containers() {
        let half = MAX_ZERO_WIDTH_ELEMENTS / 2 + 1;
        let nested = vec![vec![(); half], vec![(); half]];
        assert!(matches!(
            from_bytes::<Vec<Vec<()>>>(&to_bytes(&nested)),
            Err(DecodeError::ZeroWidthLimit { .. })
        ));
    }

    #[test]
    fn invalid_bool_char_and_utf8_are_rejected() {
        assert_eq!(from_bytes::<bool>(&[2]), Err(DecodeError::InvalidBool(2)));
        assert_eq!(
            from_bytes::<char>(&0xD800u32.to_ne_bytes()),
            Err(DecodeError::InvalidChar(0xD800))
        );
        let mut bytes = size(2);
        bytes.extend_from_slice(&[0xFF, 0xFE]);
        assert_eq!(from_bytes::<String>(&bytes), Err(DecodeError::InvalidUtf8));
    }

    #[test]
    fn reader_tracks_position_and_rest() {
        let bytes = [1u8, 2, 3, 4, 5];
        let mut r = Reader::new(&bytes);
        assert_eq!(r.take(2).unwrap(), &[1, 2]);
        assert_eq!(r.position(), 2);
        assert_eq!(r.rest(), &[3, 4, 5]);
        assert_eq!(r.remaining(), 3);
    }
}
