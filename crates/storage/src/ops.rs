//! Application of single-record operations to a working copy of its bins
//!
//! `operate` clones the record's bins, applies every operation here, and
//! only commits the copy if all of them succeed. A failing operation
//! therefore leaves the stored record untouched.
//!
//! Collection bins emptied by a removal (`ListPop`, `ListTrim`, `MapRemove`)
//! are dropped, so a record whose last list or map drains disappears.

use redshim_core::{BinMap, Error, Operation, Result, Value};

/// Apply one operation; returns its positional result
pub fn apply(bins: &mut BinMap, op: &Operation) -> Result<Value> {
    match op {
        Operation::Add { bin, delta } => {
            let current = int_bin(bins, bin)?;
            let sum = current
                .checked_add(*delta)
                .ok_or_else(|| Error::InvalidOperation(format!("integer overflow in bin '{}'", bin)))?;
            bins.insert(bin.clone(), Value::Int(sum));
            Ok(Value::Nil)
        }
        Operation::Read { bin } => Ok(bins.get(bin).cloned().unwrap_or(Value::Nil)),
        Operation::Write { bin, value } => {
            if value.is_nil() {
                bins.remove(bin);
            } else {
                bins.insert(bin.clone(), value.clone());
            }
            Ok(Value::Nil)
        }
        Operation::Touch => Ok(Value::Nil),
        Operation::ListAppend { bin, value } => {
            let list = list_bin_mut(bins, bin)?;
            list.push(value.clone());
            Ok(Value::Int(list.len() as i64))
        }
        Operation::ListInsert { bin, index, value } => {
            let list = list_bin_mut(bins, bin)?;
            let at = insert_position(*index, list.len());
            list.insert(at, value.clone());
            Ok(Value::Int(list.len() as i64))
        }
        Operation::ListPop { bin, index } => {
            let popped = match existing_list_mut(bins, bin)? {
                Some(list) => match element_position(*index, list.len()) {
                    Some(at) => list.remove(at),
                    None => Value::Nil,
                },
                None => Value::Nil,
            };
            drop_if_empty(bins, bin);
            Ok(popped)
        }
        Operation::ListSize { bin } => match bins.get(bin) {
            None => Ok(Value::Int(0)),
            Some(Value::List(list)) => Ok(Value::Int(list.len() as i64)),
            Some(other) => Err(incompatible(bin, other)),
        },
        Operation::ListTrim { bin, start, count } => {
            let removed = match existing_list_mut(bins, bin)? {
                Some(list) => {
                    let len = list.len();
                    let begin = (*start).min(len);
                    let end = begin.saturating_add(*count).min(len);
                    list.truncate(end);
                    list.drain(..begin);
                    len - list.len()
                }
                None => 0,
            };
            drop_if_empty(bins, bin);
            Ok(Value::Int(removed as i64))
        }
        Operation::MapPut { bin, key, value } => {
            let map = map_bin_mut(bins, bin)?;
            map.insert(key.clone(), value.clone());
            Ok(Value::Int(map.len() as i64))
        }
        Operation::MapGet { bin, key } => match bins.get(bin) {
            None => Ok(Value::Nil),
            Some(Value::Map(map)) => Ok(map.get(key).cloned().unwrap_or(Value::Nil)),
            Some(other) => Err(incompatible(bin, other)),
        },
        Operation::MapRemove { bin, key } => {
            let removed = match bins.get_mut(bin) {
                None => Value::Nil,
                Some(Value::Map(map)) => map.remove(key).unwrap_or(Value::Nil),
                Some(other) => return Err(incompatible(bin, other)),
            };
            drop_if_empty(bins, bin);
            Ok(removed)
        }
        Operation::MapIncrement { bin, key, delta } => {
            let map = map_bin_mut(bins, bin)?;
            let current = match map.get(key) {
                None => 0,
                Some(Value::Int(i)) => *i,
                Some(other) => {
                    return Err(Error::BinIncompatibleType {
                        bin: bin.clone(),
                        found: other.type_name(),
                    })
                }
            };
            let sum = current.checked_add(*delta).ok_or_else(|| {
                Error::InvalidOperation(format!("integer overflow in map entry '{}'", key))
            })?;
            map.insert(key.clone(), Value::Int(sum));
            Ok(Value::Int(sum))
        }
    }
}

/// Position for an insert, clamped to `[0, len]`
fn insert_position(index: i64, len: usize) -> usize {
    if index < 0 {
        (len as i64 + index).max(0) as usize
    } else {
        (index as usize).min(len)
    }
}

/// Position of an existing element, `None` if out of range
fn element_position(index: i64, len: usize) -> Option<usize> {
    let at = if index < 0 { len as i64 + index } else { index };
    if at >= 0 && (at as usize) < len {
        Some(at as usize)
    } else {
        None
    }
}

fn incompatible(bin: &str, found: &Value) -> Error {
    Error::BinIncompatibleType {
        bin: bin.to_string(),
        found: found.type_name(),
    }
}

fn int_bin(bins: &BinMap, bin: &str) -> Result<i64> {
    match bins.get(bin) {
        None => Ok(0),
        Some(Value::Int(i)) => Ok(*i),
        Some(other) => Err(incompatible(bin, other)),
    }
}

fn list_bin_mut<'a>(bins: &'a mut BinMap, bin: &str) -> Result<&'a mut Vec<Value>> {
    let slot = bins
        .entry(bin.to_string())
        .or_insert_with(|| Value::List(Vec::new()));
    match slot {
        Value::List(list) => Ok(list),
        other => Err(incompatible(bin, other)),
    }
}

fn existing_list_mut<'a>(bins: &'a mut BinMap, bin: &str) -> Result<Option<&'a mut Vec<Value>>> {
    match bins.get_mut(bin) {
        None => Ok(None),
        Some(Value::List(list)) => Ok(Some(list)),
        Some(other) => Err(incompatible(bin, other)),
    }
}

fn map_bin_mut<'a>(
    bins: &'a mut BinMap,
    bin: &str,
) -> Result<&'a mut std::collections::BTreeMap<String, Value>> {
    let slot = bins
        .entry(bin.to_string())
        .or_insert_with(|| Value::Map(Default::default()));
    match slot {
        Value::Map(map) => Ok(map),
        other => Err(incompatible(bin, other)),
    }
}

fn drop_if_empty(bins: &mut BinMap, bin: &str) {
    let empty = match bins.get(bin) {
        Some(Value::List(list)) => list.is_empty(),
        Some(Value::Map(map)) => map.is_empty(),
        _ => false,
    };
    if empty {
        bins.remove(bin);
    }
}
