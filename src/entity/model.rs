use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use convert_case::Case;
use convert_case::Casing;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use super::Entity;
use super::FieldDef;
use crate::error::Error;
use crate::error::Result;

static MODELS: Lazy<RwLock<HashMap<TypeId, Arc<EntityModel>>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Parsed field tag
///
/// Tokens are comma separated and trimmed. `pk` and `readOnly` are flags,
/// `key=value` tokens land in [`TagSet::values`], anything else is ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagSet {
    pub primary_key: bool,
    pub read_only:   bool,
    pub values:      HashMap<String, String>,
}

impl TagSet {
    pub fn parse(tag: &str) -> Self {
        let mut tags = Self::default();

        for token in tag.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.split_once('=') {
                Some((key, value)) => {
                    tags.values.insert(key.trim().to_string(), value.trim().to_string());
                }
                None if token == "pk" => tags.primary_key = true,
                None if token == "readOnly" => tags.read_only = true,
                None => {}
            }
        }

        tags
    }

    pub fn column_name(&self) -> Option<&str> {
        self.values.get("columnName").map(String::as_str).filter(|name| !name.is_empty())
    }
}

/// One persisted field of an entity
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    name:     String,
    position: usize,
    tags:     TagSet,
}

impl Field {
    fn new(def: &FieldDef, position: usize) -> Self {
        let tags = TagSet::parse(def.tag);
        let name = match tags.column_name() {
            Some(name) => name.to_string(),
            None => def.ident.trim_start_matches("r#").to_case(Case::Snake),
        };

        Self { name, position, tags }
    }

    /// Column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declaration index inside the entity
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_primary_key(&self) -> bool {
        self.tags.primary_key
    }

    pub fn is_read_only(&self) -> bool {
        self.tags.read_only
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.values.get(key).map(String::as_str)
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }
}

/// Runtime description of an entity type
#[derive(Clone, Debug)]
pub struct EntityModel {
    entity:      &'static str,
    table_name:  String,
    fields:      Vec<Field>,
    lookup:      HashMap<String, usize>,
    primary_key: Option<usize>,
}

impl EntityModel {
    /// Cached model of `E`, built on first use
    pub fn of<E: Entity>() -> Result<Arc<Self>> {
        let key = TypeId::of::<E>();

        if let Some(model) = MODELS.read().get(&key).cloned() {
            return Ok(model);
        }

        let model = Arc::new(Self::from_defs(std::any::type_name::<E>(), E::table_name(), E::field_defs())?);
        tracing::debug!(entity = model.entity, table = %model.table_name, fields = model.fields.len(), "Built entity model");

        Ok(MODELS.write().entry(key).or_insert(model).clone())
    }

    pub fn from_defs(entity: &'static str, table_name: Option<&str>, defs: &[FieldDef]) -> Result<Self> {
        let mut fields: Vec<Field> = Vec::with_capacity(defs.len());
        let mut lookup = HashMap::with_capacity(defs.len());
        let mut primary_key: Option<usize> = None;

        for (position, def) in defs.iter().enumerate() {
            let field = Field::new(def, position);

            if field.is_primary_key() {
                if let Some(first) = primary_key {
                    return Err(Error::DuplicatePrimaryKey {
                        entity,
                        first: fields[first].name.clone(),
                        second: field.name,
                    });
                }
                primary_key = Some(position);
            }

            lookup.insert(field.name.clone(), position);
            fields.push(field);
        }

        Ok(Self { entity, table_name: table_name.unwrap_or_default().to_string(), fields, lookup, primary_key })
    }

    /// Rust type name of the entity
    pub fn entity(&self) -> &'static str {
        self.entity
    }

    /// Table name from the naming hook, empty when the entity has none
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Field mapped to `column`
    pub fn field(&self, column: &str) -> Option<&Field> {
        self.lookup.get(column).map(|&position| &self.fields[position])
    }

    pub fn primary_key(&self) -> Option<&Field> {
        self.primary_key.map(|position| &self.fields[position])
    }

    pub fn require_primary_key(&self) -> Result<&Field> {
        self.primary_key().ok_or(Error::MissingPrimaryKey(self.entity))
    }

    /// Fields written by insert and update
    pub fn writable_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|field| !field.is_read_only())
    }
}
