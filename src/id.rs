//! Code for handling IDs
use anyhow::{Context, Result};
use indexmap::{IndexMap, IndexSet};
use std::borrow::Borrow;
use unicase::UniCase;

/// A trait alias for ID types
pub trait IDLike:
    Eq + std::hash::Hash + std::borrow::Borrow<str> + Clone + std::fmt::Display + From<String>
{
}
impl<T> IDLike for T where
    T: Eq + std::hash::Hash + std::borrow::Borrow<str> + Clone + std::fmt::Display + From<String>
{
}

macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(
            Clone,
            std::hash::Hash,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            serde::Deserialize,
            Debug,
            serde::Serialize,
        )]
        /// An ID type (e.g. `LocationID`, `CareerID`, etc.)
        pub struct $name(pub std::rc::Rc<str>);

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl $name {
            /// Create a new ID from a string slice
            pub fn new(id: &str) -> Self {
                $name(std::rc::Rc::from(id))
            }
        }
    };
}
pub(crate) use define_id_type;

#[cfg(test)]
define_id_type!(GenericID);

/// Indicates that the struct has an ID field
pub trait HasID<ID: IDLike> {
    /// Get the struct's ID
    fn get_id(&self) -> &ID;
}

/// Implement the `HasID` trait for the given type, assuming it has a field called `id`
macro_rules! define_id_getter {
    ($t:ty, $id_ty:ty) => {
        impl crate::id::HasID<$id_ty> for $t {
            fn get_id(&self) -> &$id_ty {
                &self.id
            }
        }
    };
}
pub(crate) use define_id_getter;

/// A data structure containing a set of IDs
pub trait IDCollection<ID: IDLike> {
    /// Get the ID from the collection by its string representation.
    ///
    /// An exact match is preferred. Failing that, a case-insensitive match is accepted, so that
    /// "la latina" will find "La Latina".
    ///
    /// # Arguments
    ///
    /// * `id` - The string representation of the ID
    ///
    /// # Returns
    ///
    /// A copy of the ID in `self`, or an error if not found.
    fn get_id_by_str(&self, id: &str) -> Result<ID>;

    /// Find the ID without raising an error
    fn find_id(&self, id: &str) -> Option<ID>;
}

/// Find an ID matching `id` ignoring case
fn find_caseless<'a, ID, I>(mut ids: I, id: &str) -> Option<ID>
where
    ID: IDLike + 'a,
    I: Iterator<Item = &'a ID>,
{
    let wanted = UniCase::new(id);
    ids.find(|candidate| UniCase::new(Borrow::<str>::borrow(*candidate)) == wanted)
        .cloned()
}

impl<ID: IDLike> IDCollection<ID> for IndexSet<ID> {
    fn get_id_by_str(&self, id: &str) -> Result<ID> {
        self.find_id(id)
            .with_context(|| format!("Unknown ID {id} found"))
    }

    fn find_id(&self, id: &str) -> Option<ID> {
        self.get(id)
            .cloned()
            .or_else(|| find_caseless(self.iter(), id))
    }
}

impl<ID: IDLike, V> IDCollection<ID> for IndexMap<ID, V> {
    fn get_id_by_str(&self, id: &str) -> Result<ID> {
        self.find_id(id)
            .with_context(|| format!("Unknown ID {id} found"))
    }

    fn find_id(&self, id: &str) -> Option<ID> {
        self.get_key_value(id)
            .map(|(key, _)| key.clone())
            .or_else(|| find_caseless(self.keys(), id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::rstest;

    fn ids() -> IndexSet<GenericID> {
        ["La Latina".into(), "Segovia".into()].into_iter().collect()
    }

    #[rstest]
    #[case("La Latina", "La Latina")]
    #[case("la latina", "La Latina")]
    #[case("SEGOVIA", "Segovia")]
    fn test_get_id_by_str(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(ids().get_id_by_str(input).unwrap(), GenericID::new(expected));
    }

    #[test]
    fn test_get_id_by_str_unknown() {
        assert_error!(ids().get_id_by_str("Toledo"), "Unknown ID Toledo found");
    }

    #[test]
    fn test_find_id_in_map() {
        let map: IndexMap<GenericID, u32> = [("Segovia".into(), 1)].into_iter().collect();
        assert_eq!(map.find_id("segovia"), Some("Segovia".into()));
        assert_eq!(map.find_id("Toledo"), None);
    }
}
