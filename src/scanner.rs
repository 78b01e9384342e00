//! Row scanning into entities
//!
//! A [`Scanner`] is bound to one destination for one call. It owns the cursor
//! it is given and closes it on every exit path, including when the scanner
//! is dropped without converting.

use std::sync::Arc;

use crate::connection::Cursor;
use crate::entity::Entity;
use crate::entity::EntityModel;
use crate::entity::ScanTarget;
use crate::entity::Shape;
use crate::error::Error;
use crate::error::Result;
use crate::value::Value;

enum Binding<'a, T: ?Sized> {
    Read(&'a T),
    Write(&'a mut T),
}

pub struct Scanner<'a, T: ScanTarget + ?Sized> {
    binding: Binding<'a, T>,
    model:   Arc<EntityModel>,
    cursor:  Option<Box<dyn Cursor>>,
}

impl<'a, T: ScanTarget + ?Sized> Scanner<'a, T> {
    /// Binds a writable destination: a struct or a growable sequence
    pub fn bind(dest: &'a mut T) -> Result<Self> {
        if dest.shape() == Shape::Slice {
            return Err(Error::ScannerUnsupportedShape);
        }
        Ok(Self { model: T::Entity::model()?, binding: Binding::Write(dest), cursor: None })
    }

    /// Binds a destination for reading its records only
    pub fn inspect(dest: &'a T) -> Result<Self> {
        Ok(Self { model: T::Entity::model()?, binding: Binding::Read(dest), cursor: None })
    }

    pub fn model(&self) -> &EntityModel {
        &self.model
    }

    pub fn table_name(&self) -> &str {
        self.model.table_name()
    }

    pub fn shape(&self) -> Shape {
        match &self.binding {
            Binding::Read(dest) => dest.shape(),
            Binding::Write(dest) => dest.shape(),
        }
    }

    /// Records held by the destination
    pub fn records(&self) -> Vec<&T::Entity> {
        match &self.binding {
            Binding::Read(dest) => dest.records(),
            Binding::Write(dest) => dest.records(),
        }
    }

    pub fn attach(&mut self, cursor: Box<dyn Cursor>) {
        if let Some(mut previous) = self.cursor.replace(cursor) {
            previous.close();
        }
    }

    /// Reads the attached cursor into the destination
    ///
    /// A struct destination takes the first row or fails with
    /// [`Error::RecordNotFound`]; a sequence destination is replaced with one
    /// entity per row.
    pub async fn convert(&mut self) -> Result<()> {
        let mut cursor = self.cursor.take().ok_or(Error::ScannerCursorMissing)?;
        let result = self.convert_from(cursor.as_mut()).await;
        cursor.close();
        result
    }

    async fn convert_from(&mut self, cursor: &mut dyn Cursor) -> Result<()> {
        let Self { binding, model, .. } = self;
        let dest = match binding {
            Binding::Write(dest) => dest,
            Binding::Read(_) => return Err(Error::ScannerNotWritable),
        };

        let columns = cursor.columns();

        match dest.shape() {
            Shape::Struct => {
                if !cursor.next().await? {
                    return Err(Error::RecordNotFound);
                }
                let cells = cursor.scan()?;
                let entity = dest.entity_mut().ok_or(Error::ScannerUnsupportedShape)?;

                let mut staged = entity.clone();
                materialize(model, &columns, &cells, &mut staged)?;
                *entity = staged;
                Ok(())
            }
            Shape::Sequence => {
                let mut rows = Vec::new();
                while cursor.next().await? {
                    let cells = cursor.scan()?;
                    let mut entity = T::Entity::default();
                    materialize(model, &columns, &cells, &mut entity)?;
                    rows.push(entity);
                }
                tracing::trace!(rows = rows.len(), entity = model.entity(), "Scanned rows");
                dest.replace_all(rows)
            }
            Shape::Slice => Err(Error::ScannerUnsupportedShape),
        }
    }
}

impl<T: ScanTarget + ?Sized> Drop for Scanner<'_, T> {
    fn drop(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            cursor.close();
        }
    }
}

fn materialize<E: Entity>(model: &EntityModel, columns: &[String], cells: &[Value], entity: &mut E) -> Result<()> {
    for (column, cell) in columns.iter().zip(cells) {
        let Some(field) = model.field(column) else {
            continue;
        };
        if cell.is_null() {
            continue;
        }

        entity.set_field(field.position(), cell).map_err(|e| {
            log_row(columns, cells);
            e.for_field(field.name())
        })?;
    }
    Ok(())
}

#[cfg(feature = "serde")]
fn log_row(columns: &[String], cells: &[Value]) {
    let row: serde_json::Map<String, serde_json::Value> = columns
        .iter()
        .zip(cells)
        .map(|(column, cell)| {
            let json = match cell {
                Value::Null => serde_json::Value::Null,
                Value::Bool(v) => serde_json::Value::from(*v),
                Value::Integer(v) => serde_json::Value::from(*v),
                Value::Unsigned(v) => serde_json::Value::from(*v),
                Value::Float(v) => serde_json::Value::from(*v),
                Value::Text(_) | Value::Bytes(_) => serde_json::Value::from(cell.raw_text()),
            };
            (column.clone(), json)
        })
        .collect();

    match serde_json::to_string(&row) {
        Ok(json) => tracing::debug!("Failed to convert row: {}", json),
        Err(e) => tracing::debug!("Failed to convert row: {:?} ({})", cells, e),
    }
}

#[cfg(not(feature = "serde"))]
fn log_row(_columns: &[String], cells: &[Value]) {
    tracing::debug!("Failed to convert row: {:?}", cells);
}
