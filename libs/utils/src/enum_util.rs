//! Code generic over the variants of an enum type.
//!
//! The consensus core has several closed sum types (facts, voteproofs)
//! whose variants are also used on their own, e.g. an ACCEPT ballot
//! needs an `AcceptFact` rather than an arbitrary `Fact`.

/// Error returned when `Variant::extract` fails.
#[derive(Debug, thiserror::Error)]
#[error("bad enum variant")]
pub struct BadVariantError;

/// `impl Variant<E> for A` defines an unique embedding of `A` in `E`.
/// For example for
/// ```ignore
/// enum Fact {
///   Init(InitFact),
///   Accept(AcceptFact),
/// }
///
/// impl Variant<Fact> for InitFact {
///   fn insert(self) -> Fact { Fact::Init(self) }
///   fn extract(f: Fact) -> Result<Self, BadVariantError> {
///     let Fact::Init(this) = f else { return Err(BadVariantError) };
///     Ok(this)
///   }
/// }
/// ```
///
/// It works just like `#[from]` in `thiserror::Error`, but additionally
/// provides a method to extract the embedded value.
/// We require that `A::extract(a.insert()) == a`.
pub trait Variant<Enum: Sized>: Sized {
    /// Constructs an enum value from a value of its variant.
    fn insert(self) -> Enum;
    /// Destructs the enum value expecting a particular variant.
    fn extract(e: Enum) -> Result<Self, BadVariantError>;
}
