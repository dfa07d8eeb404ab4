use indexmap::IndexMap;
use schema_types::{MethodDef, TypeDef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/* ============================================================================
   Schema File
   ============================================================================ */

/* On-disk form of a schema program as published by an endpoint */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub struct SchemaFile {
    pub package: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub types: Vec<TypeDef>,
    #[serde(default)]
    pub methods: Vec<MethodDef>,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid schema YAML: {0}")]
    Yaml(#[from] serde_yml::Error),
    #[error("type '{0}' is defined more than once")]
    DuplicateType(String),
    #[error("method '{0}' is defined more than once")]
    DuplicateMethod(String),
}

/* ============================================================================
   Schema Program
   ============================================================================ */

/* A parsed schema file with name indexes for types and methods */
#[derive(Debug, Clone)]
pub struct SchemaProgram {
    file: SchemaFile,
    types: IndexMap<String, usize>,
    methods: IndexMap<String, usize>,
}

impl SchemaProgram {
    pub fn from_yaml(content: &str) -> Result<Self, ParseError> {
        let file: SchemaFile = serde_yml::from_str(content)?;
        Self::from_file(file)
    }

    pub fn from_file(file: SchemaFile) -> Result<Self, ParseError> {
        let mut types = IndexMap::new();
        for (idx, def) in file.types.iter().enumerate() {
            if types.insert(def.name.clone(), idx).is_some() {
                return Err(ParseError::DuplicateType(def.name.clone()));
            }
        }

        let mut methods = IndexMap::new();
        for (idx, def) in file.methods.iter().enumerate() {
            if methods.insert(def.name.clone(), idx).is_some() {
                return Err(ParseError::DuplicateMethod(def.name.clone()));
            }
        }

        Ok(Self {
            file,
            types,
            methods,
        })
    }

    pub fn package(&self) -> &str {
        &self.file.package
    }

    pub fn file(&self) -> &SchemaFile {
        &self.file
    }

    pub fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name).map(|idx| &self.file.types[*idx])
    }

    pub fn method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.get(name).map(|idx| &self.file.methods[*idx])
    }

    /* Type names in declaration order */
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(|k| k.as_str())
    }

    /* Method names in declaration order */
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(|k| k.as_str())
    }
}
