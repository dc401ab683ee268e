//! Rows and the constructors they are pickled as.

use std::sync::Arc;

use serde::Deserialize;

use crate::error::{Result, RowError};
use crate::pickle::PickleValue;

/// One field of a row schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StructField {
    pub name: String,
    /// Spark data type: a type name, or a nested struct/array/map object.
    #[serde(rename = "type")]
    pub data_type: serde_json::Value,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

/// Field layout of a row, parsed from Spark struct-type JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RowSchema {
    #[serde(rename = "type")]
    kind: String,
    fields: Vec<StructField>,
}

impl RowSchema {
    /// Parse `{"type":"struct","fields":[...]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let schema: Self = serde_json::from_str(json)?;
        if schema.kind != "struct" {
            return Err(RowError::Schema(serde::de::Error::custom(format!(
                "expected a struct type, got {:?}",
                schema.kind
            ))));
        }
        Ok(schema)
    }

    pub fn fields(&self) -> &[StructField] {
        &self.fields
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// A finalized row: ordered field values, optionally with a schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    schema: Option<Arc<RowSchema>>,
    values: Vec<PickleValue>,
}

impl Row {
    pub fn new(values: Vec<PickleValue>) -> Self {
        Self {
            schema: None,
            values,
        }
    }

    /// Create a row whose values match `schema` field for field.
    pub fn with_schema(schema: Arc<RowSchema>, values: Vec<PickleValue>) -> Result<Self> {
        if schema.fields().len() != values.len() {
            return Err(RowError::SchemaMismatch {
                fields: schema.fields().len(),
                values: values.len(),
            });
        }
        Ok(Self {
            schema: Some(schema),
            values,
        })
    }

    pub fn schema(&self) -> Option<&RowSchema> {
        self.schema.as_deref()
    }

    pub fn values(&self) -> &[PickleValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<PickleValue> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PickleValue> {
        self.values.get(index)
    }

    /// Look a field up by schema name.
    pub fn get_as(&self, name: &str) -> Option<&PickleValue> {
        let index = self.schema.as_ref()?.index_of(name)?;
        self.values.get(index)
    }

    /// Finalize every nested constructor in place, to any depth.
    ///
    /// Row values, list elements and tuple elements are walked; dict
    /// contents are left as they are.
    pub fn expand_nested(&mut self) -> Result<()> {
        for value in &mut self.values {
            expand_value(value)?;
        }
        Ok(())
    }
}

fn expand_value(value: &mut PickleValue) -> Result<()> {
    match value {
        PickleValue::Row(row) => row.expand_nested(),
        PickleValue::Constructor(ctor) => {
            let mut row = std::mem::take(ctor).into_row()?;
            row.expand_nested()?;
            *value = PickleValue::Row(row);
            Ok(())
        }
        PickleValue::List(items) | PickleValue::Tuple(items) => {
            items.iter_mut().try_for_each(expand_value)
        }
        _ => Ok(()),
    }
}

/// A pickled row that has not been finalized yet.
///
/// Holds the raw constructor arguments and the schema JSON the pickled
/// object was created with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowConstructor {
    schema: Option<String>,
    args: Vec<PickleValue>,
}

impl RowConstructor {
    pub fn new(args: Vec<PickleValue>) -> Self {
        Self { schema: None, args }
    }

    pub fn with_schema(schema: impl Into<String>, args: Vec<PickleValue>) -> Self {
        Self {
            schema: Some(schema.into()),
            args,
        }
    }

    pub fn schema_json(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn args(&self) -> &[PickleValue] {
        &self.args
    }

    /// Finalize into a row.
    ///
    /// Arguments are moved over unchanged: nested constructors stay
    /// constructors until [`Row::expand_nested`] is called.
    pub fn into_row(self) -> Result<Row> {
        match self.schema {
            Some(json) => {
                let schema = Arc::new(RowSchema::from_json(&json)?);
                Row::with_schema(schema, self.args)
            }
            None => Ok(Row::new(self.args)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"{"type":"struct","fields":[
        {"name":"id","type":"integer","nullable":false,"metadata":{}},
        {"name":"inner","type":{"type":"struct","fields":[]},"nullable":true,"metadata":{}}
    ]}"#;

    fn nested_ctor() -> RowConstructor {
        RowConstructor::new(vec![
            PickleValue::Int(1),
            PickleValue::Constructor(RowConstructor::new(vec![PickleValue::String(
                "deep".into(),
            )])),
        ])
    }

    #[test]
    fn finalizing_is_shallow() {
        let row = nested_ctor().into_row().unwrap();
        assert_eq!(row.len(), 2);
        assert!(row.get(1).unwrap().as_constructor().is_some());
    }

    #[test]
    fn expansion_reaches_every_depth() {
        let deepest = RowConstructor::new(vec![PickleValue::Int(3)]);
        let middle = RowConstructor::new(vec![PickleValue::List(vec![
            PickleValue::Constructor(deepest),
            PickleValue::Int(2),
        ])]);
        let mut row = Row::new(vec![
            PickleValue::Tuple(vec![PickleValue::Constructor(middle)]),
            PickleValue::Row(nested_ctor().into_row().unwrap()),
        ]);

        row.expand_nested().unwrap();

        let PickleValue::Tuple(items) = &row.values()[0] else {
            panic!("expected tuple");
        };
        let middle = items[0].as_row().expect("middle row");
        let PickleValue::List(list) = &middle.values()[0] else {
            panic!("expected list");
        };
        let deepest = list[0].as_row().expect("deepest row");
        assert_eq!(deepest.values(), &[PickleValue::Int(3)]);

        let sibling = row.values()[1].as_row().unwrap();
        let inner = sibling.get(1).unwrap().as_row().expect("inner row");
        assert_eq!(inner.values(), &[PickleValue::String("deep".into())]);
    }

    #[test]
    fn dict_contents_are_left_alone() {
        let ctor = RowConstructor::new(vec![]);
        let mut row = Row::new(vec![PickleValue::Dict(vec![(
            PickleValue::Int(1),
            PickleValue::Constructor(ctor),
        )])]);
        row.expand_nested().unwrap();
        let PickleValue::Dict(entries) = &row.values()[0] else {
            panic!("expected dict");
        };
        assert!(entries[0].1.as_constructor().is_some());
    }

    #[test]
    fn schema_gives_field_names() {
        let ctor = RowConstructor::with_schema(
            SCHEMA,
            vec![PickleValue::Int(7), PickleValue::None],
        );
        let row = ctor.into_row().unwrap();
        let schema = row.schema().unwrap();
        assert_eq!(schema.fields()[0].name, "id");
        assert!(!schema.fields()[0].nullable);
        assert_eq!(row.get_as("id"), Some(&PickleValue::Int(7)));
        assert_eq!(row.get_as("inner"), Some(&PickleValue::None));
        assert_eq!(row.get_as("missing"), None);
    }

    #[test]
    fn schema_field_count_must_match() {
        let ctor = RowConstructor::with_schema(SCHEMA, vec![PickleValue::Int(7)]);
        assert!(matches!(
            ctor.into_row(),
            Err(RowError::SchemaMismatch {
                fields: 2,
                values: 1
            })
        ));
    }

    #[test]
    fn invalid_schema_is_reported() {
        let ctor = RowConstructor::with_schema("not json", vec![]);
        assert!(matches!(ctor.into_row(), Err(RowError::Schema(_))));

        let err = RowSchema::from_json(r#"{"type":"array","fields":[]}"#).unwrap_err();
        assert!(err.to_string().contains("expected a struct type"));
    }

    #[test]
    fn rows_without_schema_have_no_names() {
        let row = Row::new(vec![PickleValue::Bool(true)]);
        assert!(row.get_as("anything").is_none());
        assert_eq!(row.into_values(), vec![PickleValue::Bool(true)]);
    }
}
