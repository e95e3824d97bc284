//! Recursive relaxation of strict shapes into lenient ones.
//!
//! A strict type `T` is paired with a lenient counterpart `T::Lenient` in which
//! every field, at every depth, may be absent:
//!
//! - primitives relax to themselves (optionality lives on the enclosing record);
//! - `Vec<T>` relaxes element-wise to `Vec<T::Lenient>`;
//! - records relax to a parallel struct whose fields are `Option<_::Lenient>`.
//!
//! `relax` never fails. `tighten` walks the lenient value back and rejects the
//! first absent field, naming it by its [`FieldPath`].

use std::fmt;

use crate::error::SchemaError;

/// A strict shape with a lenient counterpart.
pub trait Relax: Sized {
    type Lenient;

    /// Converts a strict value into its lenient form without loss.
    fn relax(self) -> Self::Lenient;

    /// Converts a lenient value back, failing on the first missing field under `at`.
    fn tighten(lenient: Self::Lenient, at: &FieldPath) -> Result<Self, SchemaError>;
}

macro_rules! relax_as_is {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Relax for $ty {
                type Lenient = $ty;

                fn relax(self) -> Self::Lenient {
                    self
                }

                fn tighten(lenient: Self::Lenient, _at: &FieldPath) -> Result<Self, SchemaError> {
                    Ok(lenient)
                }
            }
        )*
    };
}

relax_as_is!(bool, u32, u64, f64, String);

impl<T: Relax> Relax for Vec<T> {
    type Lenient = Vec<T::Lenient>;

    fn relax(self) -> Self::Lenient {
        self.into_iter().map(Relax::relax).collect()
    }

    fn tighten(lenient: Self::Lenient, at: &FieldPath) -> Result<Self, SchemaError> {
        lenient
            .into_iter()
            .enumerate()
            .map(|(i, item)| T::tighten(item, &at.index(i)))
            .collect()
    }
}

/// Tightens an optional lenient field, reporting `at` when it is absent.
pub fn require<T: Relax>(value: Option<T::Lenient>, at: FieldPath) -> Result<T, SchemaError> {
    match value {
        Some(v) => T::tighten(v, &at),
        None => Err(SchemaError::missing(at.to_string())),
    }
}

/// Location of a field inside a document, e.g. `runs[1].hash`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn field(&self, name: &str) -> Self {
        if self.0.is_empty() {
            Self(name.to_string())
        } else {
            Self(format!("{}.{}", self.0, name))
        }
    }

    pub fn index(&self, i: usize) -> Self {
        Self(format!("{}[{}]", self.0, i))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("$")
        } else {
            f.write_str(&self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_path_formatting() {
        let root = FieldPath::root();
        assert!(root.is_root());
        assert_eq!(root.to_string(), "$");

        let path = root.field("runs").index(3).field("hash");
        assert_eq!(path.to_string(), "runs[3].hash");

        let top_index = root.index(2).field("implementation");
        assert_eq!(top_index.to_string(), "[2].implementation");
    }

    #[test]
    fn test_primitives_relax_to_themselves() {
        assert_eq!(42u64.relax(), 42);
        assert_eq!("libcuckoo".to_string().relax(), "libcuckoo");
        let back = f64::tighten(1.5, &FieldPath::root()).unwrap();
        assert_eq!(back, 1.5);
    }

    #[test]
    fn test_vec_relaxes_element_wise() {
        let relaxed = vec![1u32, 2, 3].relax();
        assert_eq!(relaxed, vec![1, 2, 3]);
        let back = Vec::<u32>::tighten(relaxed, &FieldPath::root()).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }

    #[test]
    fn test_require_reports_path() {
        let at = FieldPath::root().field("num_threads");
        let err = require::<u32>(None, at).unwrap_err();
        assert!(matches!(err, SchemaError::MissingField { ref path } if path == "num_threads"));

        let ok: u32 = require(Some(16), FieldPath::root().field("num_threads")).unwrap();
        assert_eq!(ok, 16);
    }
}
