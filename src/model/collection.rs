//! Homogeneous, named groups of parameters or relationships.
//!
//! A collection is addressed either by string key (a *mapping*, keys may be
//! tuples for multi-axis addressing) or by position in a fixed multi-dimensional
//! shape (an *array*, stored row-major).

use super::error::ModelError;
use super::parameter::Parameter;
use super::relationship::Relationship;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MappingKey {
    Single(String),
    Tuple(Vec<String>),
}

impl MappingKey {
    pub fn tuple<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MappingKey::Tuple(parts.into_iter().map(Into::into).collect())
    }

    /// A one-part tuple is the same key as its single part.
    pub fn normalized(self) -> Self {
        match self {
            MappingKey::Tuple(mut parts) if parts.len() == 1 => MappingKey::Single(parts.remove(0)),
            key => key,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            MappingKey::Single(_) => 1,
            MappingKey::Tuple(parts) => parts.len(),
        }
    }

    pub fn parts(&self) -> Vec<&str> {
        match self {
            MappingKey::Single(s) => vec![s.as_str()],
            MappingKey::Tuple(parts) => parts.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for MappingKey {
    fn from(s: &str) -> Self { MappingKey::Single(s.to_string()) }
}

impl From<String> for MappingKey {
    fn from(s: String) -> Self { MappingKey::Single(s) }
}

impl fmt::Display for MappingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts().join(", "))
    }
}

/// An element handed to a collection constructor.
#[derive(Debug, Clone)]
pub enum Member {
    Parameter(Parameter),
    Relationship(Relationship),
}

impl From<Parameter> for Member {
    fn from(p: Parameter) -> Self { Member::Parameter(p) }
}

impl From<Relationship> for Member {
    fn from(r: Relationship) -> Self { Member::Relationship(r) }
}

impl From<super::FunctionRelationship> for Member {
    fn from(r: super::FunctionRelationship) -> Self { Member::Relationship(r.into()) }
}

impl From<super::SubModelRelationship> for Member {
    fn from(r: super::SubModelRelationship) -> Self { Member::Relationship(r.into()) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionLayout {
    /// One key per member, parallel to the member list.
    Mapping(Vec<MappingKey>),
    /// Member list is row-major over this shape.
    Array(Vec<usize>),
}

#[derive(Debug, Clone)]
pub enum Members {
    Parameters(Vec<Parameter>),
    Relationships(Vec<Relationship>),
}

#[derive(Debug, Clone)]
pub struct Collection {
    name: String,
    layout: CollectionLayout,
    members: Members,
}

impl Collection {
    pub fn mapping<K, M, I>(name: impl Into<String>, entries: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (K, M)>,
        K: Into<MappingKey>,
        M: Into<Member>,
    {
        let name = name.into();
        let (keys, members): (Vec<MappingKey>, Vec<Member>) =
            entries.into_iter().map(|(k, m)| (k.into().normalized(), m.into())).unzip();

        let mut seen = BTreeSet::new();
        for key in &keys {
            if !seen.insert(key.clone()) {
                return Err(ModelError::DuplicateKey { name, key: key.to_string() });
            }
            let expected = keys[0].arity();
            if key.arity() != expected {
                return Err(ModelError::KeyArity { name, expected, actual: key.arity() });
            }
        }

        let labels = keys.iter().map(ToString::to_string).collect();
        Self::assemble(name, CollectionLayout::Mapping(keys), members, labels)
    }

    pub fn array<M, I>(name: impl Into<String>, shape: Vec<usize>, members: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = M>,
        M: Into<Member>,
    {
        let name = name.into();
        if shape.is_empty() {
            return Err(ModelError::EmptyShape(name));
        }
        let members: Vec<Member> = members.into_iter().map(Into::into).collect();
        let expected: usize = shape.iter().product();
        if members.len() != expected {
            return Err(ModelError::ShapeMismatch { name, shape, expected, actual: members.len() });
        }
        let labels = (0..members.len())
            .map(|flat| {
                unravel(flat, &shape).iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
            })
            .collect();
        Self::assemble(name, CollectionLayout::Array(shape), members, labels)
    }

    fn assemble(
        name: String,
        layout: CollectionLayout,
        members: Vec<Member>,
        labels: Vec<String>,
    ) -> Result<Self, ModelError> {
        if members.is_empty() {
            return Err(ModelError::EmptyCollection(name));
        }

        let holds_parameters = matches!(members[0], Member::Parameter(_));
        let members = if holds_parameters {
            let mut params = Vec::with_capacity(members.len());
            for (member, label) in members.into_iter().zip(&labels) {
                match member {
                    Member::Parameter(mut p) => {
                        if p.name.is_empty() {
                            p.name = format!("{}[{}]", name, label);
                        }
                        params.push(p);
                    }
                    Member::Relationship(_) => return Err(ModelError::MixedCollection(name)),
                }
            }
            if params.iter().any(|p| p.is_time_series != params[0].is_time_series) {
                return Err(ModelError::MixedTimeSeries(name));
            }
            Members::Parameters(params)
        } else {
            let mut rels = Vec::with_capacity(members.len());
            for (member, label) in members.into_iter().zip(&labels) {
                match member {
                    Member::Relationship(mut r) => {
                        if r.name().is_empty() {
                            r.set_name(format!("{}[{}]", name, label));
                        }
                        rels.push(r);
                    }
                    Member::Parameter(_) => return Err(ModelError::MixedCollection(name)),
                }
            }
            Members::Relationships(rels)
        };

        Ok(Self { name, layout, members })
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn layout(&self) -> &CollectionLayout { &self.layout }

    pub fn members(&self) -> &Members { &self.members }

    pub fn len(&self) -> usize {
        match &self.members {
            Members::Parameters(p) => p.len(),
            Members::Relationships(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn parameters(&self) -> Option<&[Parameter]> {
        match &self.members {
            Members::Parameters(p) => Some(p),
            Members::Relationships(_) => None,
        }
    }

    pub fn relationships(&self) -> Option<&[Relationship]> {
        match &self.members {
            Members::Relationships(r) => Some(r),
            Members::Parameters(_) => None,
        }
    }

    pub fn is_time_series(&self) -> bool {
        self.parameters().is_some_and(|p| p.iter().any(|p| p.is_time_series))
    }
}

/// Converts a row-major flat position into a multi-dimensional index.
fn unravel(mut flat: usize, shape: &[usize]) -> Vec<usize> {
    let mut index = vec![0; shape.len()];
    for (slot, &dim) in index.iter_mut().zip(shape).rev() {
        *slot = flat % dim;
        flat /= dim;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::computation::Value;
    use crate::model::FunctionRelationship;

    #[test]
    fn test_members_are_named_after_keys() {
        let m = Collection::mapping(
            "price",
            [(MappingKey::tuple(["a", "x"]), Parameter::real("")), (MappingKey::tuple(["b", "x"]), Parameter::real("named"))],
        )
        .unwrap();
        let names: Vec<&str> = m.parameters().unwrap().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["price[a, x]", "named"]);

        let a = Collection::array("a", vec![2, 2], (0..4).map(|_| Parameter::real(""))).unwrap();
        let names: Vec<&str> = a.parameters().unwrap().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a[0, 0]", "a[0, 1]", "a[1, 0]", "a[1, 1]"]);
    }

    #[test]
    fn test_rejects_mixed_members() {
        let rel = FunctionRelationship::new("", |_| Ok(vec![Value::Real(0.0)]));
        let err = Collection::mapping(
            "mixed",
            [("a", Member::from(Parameter::real(""))), ("b", Member::from(rel))],
        )
        .unwrap_err();
        assert_eq!(err, ModelError::MixedCollection("mixed".into()));
    }

    #[test]
    fn test_rejects_bad_shapes_and_keys() {
        let err = Collection::array("a", vec![2, 3], (0..5).map(|_| Parameter::real(""))).unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { expected: 6, actual: 5, .. }));

        let err = Collection::mapping("m", [(MappingKey::from("a"), Parameter::real("")), (MappingKey::tuple(["a", "b"]), Parameter::real(""))])
            .unwrap_err();
        assert!(matches!(err, ModelError::KeyArity { expected: 1, actual: 2, .. }));

        let err = Collection::mapping("m", [("a", Parameter::real("")), ("a", Parameter::real(""))]).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateKey { .. }));

        let err = Collection::mapping("m", [("a", Parameter::real("").time_series()), ("b", Parameter::real(""))])
            .unwrap_err();
        assert_eq!(err, ModelError::MixedTimeSeries("m".into()));
    }

    #[test]
    fn test_one_part_tuple_keys_collapse_to_single() {
        let err = Collection::mapping(
            "m",
            [(MappingKey::from("a"), Parameter::real("")), (MappingKey::tuple(["a"]), Parameter::real(""))],
        )
        .unwrap_err();
        assert_eq!(err, ModelError::DuplicateKey { name: "m".into(), key: "a".into() });

        let m = Collection::mapping("m", [(MappingKey::tuple(["b"]), Parameter::real(""))]).unwrap();
        assert_eq!(m.layout(), &CollectionLayout::Mapping(vec![MappingKey::from("b")]));
    }

    #[test]
    fn test_rejects_zero_dimensional_array() {
        let err = Collection::array("a", vec![], [Parameter::real("")]).unwrap_err();
        assert_eq!(err, ModelError::EmptyShape("a".into()));
    }

    #[test]
    fn test_unravel_row_major() {
        assert_eq!(unravel(5, &[2, 3]), vec![1, 2]);
        assert_eq!(unravel(0, &[4]), vec![0]);
    }
}
