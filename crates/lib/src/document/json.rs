//! Conversion between documents and JSON.
//!
//! Text objects and strings both become JSON strings; counters and
//! timestamps become numbers; bytes become arrays of numbers. Conflicts are
//! resolved to their winning value.

use serde_json::{Map, Number, Value as Json};

use super::Transaction;
use crate::{
    Result,
    store::{Object, Store, StoreError},
    types::{ObjId, ObjType, Prop, ScalarValue, Value},
};

/// Materialize the object `obj` and everything below it.
pub(crate) fn object_to_json(store: &Store, obj: &ObjId) -> Result<Json> {
    Ok(match store.object(obj)? {
        Object::Map(map) => {
            let mut out = Map::new();
            for (key, register) in map.iter() {
                if let Some(value) = register.value() {
                    out.insert(key.to_string(), value_to_json(store, value)?);
                }
            }
            Json::Object(out)
        }
        Object::List(seq) => Json::Array(
            seq.visible()
                .filter_map(|e| e.value())
                .map(|value| value_to_json(store, value))
                .collect::<Result<Vec<_>>>()?,
        ),
        Object::Text(seq) => Json::String(
            seq.visible()
                .filter_map(|e| e.value().and_then(Value::as_str))
                .collect(),
        ),
    })
}

fn value_to_json(store: &Store, value: &Value) -> Result<Json> {
    match value {
        Value::Object(_, id) => object_to_json(store, id),
        Value::Scalar(scalar) => Ok(scalar_to_json(scalar)),
    }
}

/// Convert a scalar to JSON.
pub fn scalar_to_json(scalar: &ScalarValue) -> Json {
    match scalar {
        ScalarValue::Null => Json::Null,
        ScalarValue::Bool(b) => Json::Bool(*b),
        ScalarValue::Int(i) | ScalarValue::Timestamp(i) | ScalarValue::Counter(i) => {
            Json::Number((*i).into())
        }
        ScalarValue::Uint(u) => Json::Number((*u).into()),
        ScalarValue::F64(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
        ScalarValue::Str(s) => Json::String(s.clone()),
        ScalarValue::Bytes(bytes) => {
            Json::Array(bytes.iter().map(|b| Json::Number((*b).into())).collect())
        }
    }
}

fn json_scalar(json: &Json) -> Option<ScalarValue> {
    Some(match json {
        Json::Null => ScalarValue::Null,
        Json::Bool(b) => ScalarValue::Bool(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                ScalarValue::Int(i)
            } else if let Some(u) = n.as_u64() {
                ScalarValue::Uint(u)
            } else {
                ScalarValue::F64(n.as_f64()?)
            }
        }
        Json::String(s) => ScalarValue::Str(s.clone()),
        Json::Array(_) | Json::Object(_) => return None,
    })
}

impl Transaction<'_> {
    /// Write a JSON value at `prop`, creating maps for objects and lists for
    /// arrays. Strings are stored as scalars.
    pub fn put_json<P: Into<Prop>>(&mut self, obj: &ObjId, prop: P, json: &Json) -> Result<()> {
        match json {
            Json::Object(fields) => {
                let map = self.put_object(obj, prop, ObjType::Map)?;
                self.fill_map(&map, fields)
            }
            Json::Array(items) => {
                let list = self.put_object(obj, prop, ObjType::List)?;
                self.fill_list(&list, items)
            }
            scalar => self.put(obj, prop, scalar_or_invalid(scalar)?),
        }
    }

    /// Copy every field of a JSON object into the map `obj`.
    pub fn merge_json(&mut self, obj: &ObjId, fields: &Map<String, Json>) -> Result<()> {
        self.fill_map(obj, fields)
    }

    fn fill_map(&mut self, map: &ObjId, fields: &Map<String, Json>) -> Result<()> {
        for (key, value) in fields {
            self.put_json(map, key.as_str(), value)?;
        }
        Ok(())
    }

    fn fill_list(&mut self, list: &ObjId, items: &[Json]) -> Result<()> {
        for item in items {
            match item {
                Json::Object(fields) => {
                    let map = self.push_object(list, ObjType::Map)?;
                    self.fill_map(&map, fields)?;
                }
                Json::Array(inner) => {
                    let nested = self.push_object(list, ObjType::List)?;
                    self.fill_list(&nested, inner)?;
                }
                scalar => self.push(list, scalar_or_invalid(scalar)?)?,
            }
        }
        Ok(())
    }
}

fn scalar_or_invalid(json: &Json) -> Result<ScalarValue> {
    json_scalar(json).ok_or_else(|| {
        StoreError::InvalidValue {
            reason: format!("unrepresentable JSON value {json}"),
        }
        .into()
    })
}
