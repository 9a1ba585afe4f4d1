//! Traits for text (human readable) and byte encodings of keys, signatures and digests.
use anyhow::Context as _;

/// Utility for parsing human-readable text representations via TextFmt::decode.
/// It keeps a reference to the initial text and a reference to the remaining unparsed text.
/// This allows to provide more context when a parsing error is encountered.
pub struct Text<'a> {
    /// Initial text.
    context: &'a str,
    /// Remaining unparsed text.
    inner: &'a str,
}

impl<'a> Text<'a> {
    /// Constructs a new unparsed text. Use other methods of Text
    /// to parse it afterwards. Text is an argument to TextFmt::decode
    /// trait method.
    pub fn new(s: &'a str) -> Self {
        Self {
            context: s,
            inner: s,
        }
    }

    /// Prefix of this text, which has been already parsed.
    fn prefix(&self) -> &'a str {
        &self.context[..self.context.len() - self.inner.len()]
        // ^ This should not panic since `self.inner` is a valid `str` by construction; thus,
        // the range end cannot break a multibyte UTF-8 character
    }

    /// Strips a fixed prefix from the remaining text.
    pub fn strip(mut self, prefix: &str) -> anyhow::Result<Self> {
        let Some(inner) = self.inner.strip_prefix(prefix) else {
            anyhow::bail!("{}: expected {} got {}", self.prefix(), prefix, self.inner);
        };
        self.inner = inner;
        Ok(self)
    }

    /// Parses the remaining text, assuming that it is in hex format.
    /// The parsed bytes are then converted to T, using ByteFmt trait.
    pub fn decode_hex<T: ByteFmt>(self) -> anyhow::Result<T> {
        let raw = hex::decode(self.inner).context(self.prefix().to_owned())?;
        ByteFmt::decode(&raw).context(self.prefix().to_owned())
    }

    /// Returns the remaining unparsed text, consuming it.
    pub fn rest(self) -> &'a str {
        self.inner
    }

    /// Syntax sugar for `TextFmt::decode`:
    /// instead of `<T as TextFmt>::decode(t)`, you can write
    /// `t.decode::<T>()`.
    pub fn decode<T: TextFmt>(self) -> anyhow::Result<T> {
        TextFmt::decode(self)
    }
}

/// Trait converting a type from/to a human-readable text format.
/// It is roughly equivalent to str::FromStr + std::fmt::Display,
/// but has additional requirements:
/// - `x == decode(x.encode())` has to hold.
/// - encoding collision between different types should be unlikely.
///   For example, cryptographic keys of different types/roles should
///   not parse if type/role doesn't match.
/// - the encoding is stable: it is used in config files, in the JSON
///   form of ballots and voteproofs, and (for public keys) in the signed
///   ballot envelope bytes.
pub trait TextFmt: Sized {
    /// Decodes the object from a text representation.
    fn decode(text: Text) -> anyhow::Result<Self>;
    /// Encodes the object to a text representation.
    fn encode(&self) -> String;
}

/// Trait converting a type from/to a sparse byte format.
/// It is roughly equivalent to serde::Serialize + serde::Deserialize,
/// but has additional requirements:
/// - binary encoding should be well defined, rather than rely on the internals
///   of the serde::Serializer implementation.
/// - encoding is unique (i.e. `decode(b).encode()==b`), because the encoded
///   bytes are hashed and signed.
pub trait ByteFmt: Sized {
    /// Decodes the object from the byte representation.
    fn decode(bytes: &[u8]) -> anyhow::Result<Self>;
    /// Encodes the object to the byte representation.
    fn encode(&self) -> Vec<u8>;
}

/// Serde adapters encoding values in their `TextFmt` form, so that keys,
/// signatures and digests appear in JSON the same way as in config files.
pub mod serde_text {
    use super::{Text, TextFmt};

    /// Serializes `v` as its text representation.
    pub fn serialize<T: TextFmt, S: serde::Serializer>(v: &T, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&v.encode())
    }

    /// Deserializes a value from its text representation.
    pub fn deserialize<'de, T: TextFmt, D: serde::Deserializer<'de>>(d: D) -> Result<T, D::Error> {
        let s: String = serde::Deserialize::deserialize(d)?;
        Text::new(&s)
            .decode()
            .map_err(|err| serde::de::Error::custom(format!("{err:#}")))
    }
}
