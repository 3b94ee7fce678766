//! The author-facing model: named parameters, relationships and collections,
//! possibly nesting whole models through sub-model relationships.

use super::collection::Collection;
use super::error::ModelError;
use super::parameter::Parameter;
use super::relationship::Relationship;
use crate::graph::ParameterId;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct DeclarativeModel {
    pub name: String,
    /// Top-level parameters; collection members are not included.
    pub parameters: BTreeMap<String, Parameter>,
    /// Top-level relationships; collection members are not included.
    pub relationships: BTreeMap<String, Relationship>,
    pub collections: BTreeMap<String, Collection>,
}

impl DeclarativeModel {
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder::new(name)
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    /// All parameters of this model, including collection members but not sub-models.
    pub fn iter_all_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .values()
            .chain(self.collections.values().filter_map(Collection::parameters).flatten())
    }

    /// All relationships of this model, including collection members but not sub-models.
    pub fn iter_all_relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships
            .values()
            .chain(self.collections.values().filter_map(Collection::relationships).flatten())
    }

    /// True if any parameter is a time series.
    pub fn is_dynamic(&self) -> bool {
        self.iter_all_parameters().any(|p| p.is_time_series)
    }

    /// The model embedded by the sub-model relationship `name`.
    pub fn submodel(&self, name: &str) -> Option<&DeclarativeModel> {
        self.iter_all_relationships().find_map(|r| match r {
            Relationship::SubModel(sub) if sub.name == name => Some(sub.model.as_ref()),
            _ => None,
        })
    }

    /// Walks the id's path through sub-models to the declaring parameter.
    pub fn find_parameter(&self, id: &ParameterId) -> Option<&Parameter> {
        let mut model = self;
        for segment in id.path().segments() {
            model = model.submodel(segment)?;
        }
        model.iter_all_parameters().find(|p| p.name == id.name())
    }
}

/// Fluent construction of a `DeclarativeModel`; the first problem is reported by `build`.
#[derive(Debug)]
pub struct ModelBuilder {
    model: DeclarativeModel,
    error: Option<ModelError>,
}

impl ModelBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            model: DeclarativeModel { name: name.into(), ..Default::default() },
            error: None,
        }
    }

    fn duplicate(&mut self, kind: &'static str, name: &str) {
        if self.error.is_none() {
            self.error = Some(ModelError::DuplicateName {
                model: self.model.name.clone(),
                kind,
                name: name.to_string(),
            });
        }
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        if self.model.parameters.contains_key(&parameter.name) {
            self.duplicate("parameter", &parameter.name);
        } else {
            self.model.parameters.insert(parameter.name.clone(), parameter);
        }
        self
    }

    pub fn relationship(mut self, relationship: impl Into<Relationship>) -> Self {
        let relationship = relationship.into();
        let name = relationship.name().to_string();
        if self.model.relationships.contains_key(&name) {
            self.duplicate("relationship", &name);
        } else {
            self.model.relationships.insert(name, relationship);
        }
        self
    }

    pub fn collection(mut self, collection: Collection) -> Self {
        let name = collection.name().to_string();
        if self.model.collections.contains_key(&name) {
            self.duplicate("collection", &name);
        } else {
            self.model.collections.insert(name, collection);
        }
        self
    }

    pub fn build(self) -> Result<DeclarativeModel, ModelError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ModelPath;
    use crate::testing;

    #[test]
    fn test_duplicate_names_are_rejected() {
        let err = DeclarativeModel::builder("m")
            .parameter(Parameter::real("x"))
            .parameter(Parameter::boolean("x"))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::DuplicateName { model: "m".into(), kind: "parameter", name: "x".into() }
        );
    }

    #[test]
    fn test_find_parameter_descends_into_submodels() {
        let model = testing::polynomial_model();
        let inner = ParameterId::new_static(ModelPath::root().child("calc_square_term"), "y");
        let found = model.find_parameter(&inner).expect("inner parameter");
        assert_eq!(found.name, "y");

        let missing = ParameterId::new_static(ModelPath::root().child("nope"), "y");
        assert!(model.find_parameter(&missing).is_none());
    }

    #[test]
    fn test_iter_all_parameters_includes_collection_members() {
        let model = testing::array_polynomial_model();
        let names: Vec<&str> = model.iter_all_parameters().map(|p| p.name.as_str()).collect();
        assert!(names.contains(&"a[1]"));
        assert!(names.contains(&"x"));
        assert!(!model.is_dynamic());
    }
}
