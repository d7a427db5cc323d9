//! Support for `oneof` fields: a set of fields that share storage, of which
//! at most one may be set at a time.
//!
//! A generated `oneof` is represented as a tagged union -- an enum named
//! `<Field>Kind` with one variant per member field plus a distinguished
//! `Unset` variant, rather than as a set of `Option<T>` fields that the
//! generator would otherwise need to keep mutually exclusive by
//! convention. Assigning one variant is the only way to clear the others,
//! so exclusivity is enforced by the type itself.

/// Implemented by every generated `<Field>Kind` enum. `field_number`
/// dispatches a decoded tag to the right `merge_field` arm, and `UNSET`
/// names the discriminator both sides agree means "no member present".
pub trait OneofKind: Clone + PartialEq {
    /// The wire field number of the currently set member, or `None` if no
    /// member is set (the `Unset` variant).
    fn field_number(&self) -> Option<u32>;

    /// The discriminator value for "nothing set". Every generated
    /// `<Field>Kind` enum's `Unset` variant implements this as its
    /// `Default`.
    fn unset() -> Self;

    fn is_unset(&self) -> bool {
        self.field_number().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::OneofKind;

    #[derive(Clone, PartialEq, Debug)]
    enum ContactKind {
        Unset,
        Email(alloc::string::String),
        Phone(alloc::string::String),
    }

    impl OneofKind for ContactKind {
        fn field_number(&self) -> Option<u32> {
            match self {
                ContactKind::Unset => None,
                ContactKind::Email(_) => Some(1),
                ContactKind::Phone(_) => Some(2),
            }
        }

        fn unset() -> Self {
            ContactKind::Unset
        }
    }

    #[test]
    fn assigning_one_member_is_exclusive_by_construction() {
        let mut contact = ContactKind::Email("a@example.com".into());
        assert_eq!(contact.field_number(), Some(1));
        contact = ContactKind::Phone("555".into());
        assert_eq!(contact.field_number(), Some(2));
        assert!(!contact.is_unset());
    }

    #[test]
    fn unset_has_no_field_number() {
        assert!(ContactKind::unset().is_unset());
    }
}
