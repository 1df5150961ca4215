//! Response assertions
//!
//! Every check returns `Ok(())` or an [`HarnessError::Assertion`] describing
//! the first mismatch. Nothing here panics on malformed bodies.

use std::cmp::Ordering;

use serde_json::Value;

use crate::client::ApiResponse;
use crate::error::{HarnessError, HarnessResult};

fn fail<T>(message: String) -> HarnessResult<T> {
    Err(HarnessError::Assertion(message))
}

fn body(resp: &ApiResponse) -> HarnessResult<&Value> {
    match resp.json() {
        Some(v) => Ok(v),
        None => fail(format!(
            "Response body is not JSON (status {}): '{}'",
            resp.status,
            resp.text.chars().take(200).collect::<String>()
        )),
    }
}

fn array(resp: &ApiResponse) -> HarnessResult<&Vec<Value>> {
    match body(resp)?.as_array() {
        Some(items) => Ok(items),
        None => fail("Response is not a list".to_string()),
    }
}

fn item_at(resp: &ApiResponse, index: usize) -> HarnessResult<&Value> {
    let items = array(resp)?;
    match items.get(index) {
        Some(item) => Ok(item),
        None => fail(format!(
            "Index {} out of bounds for list of length {}",
            index,
            items.len()
        )),
    }
}

fn field<'a>(obj: &'a Value, name: &str, location: &str) -> HarnessResult<&'a Value> {
    match obj.get(name) {
        Some(v) => Ok(v),
        None => fail(format!("Field '{}' not found in {}", name, location)),
    }
}

fn list_field<'a>(obj: &'a Value, name: &str, location: &str) -> HarnessResult<&'a Vec<Value>> {
    let value = match obj.get(name) {
        Some(v) => v,
        None => return fail(format!("List field '{}' not found in {}", name, location)),
    };
    match value.as_array() {
        Some(items) => Ok(items),
        None => fail(format!("Field '{}' is not a list in {}", name, location)),
    }
}

/// String form used for text matching: raw contents for strings, JSON text otherwise
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn any_item_eq(items: &[Value], field: &str, expected: &Value) -> bool {
    items.iter().any(|item| item.get(field) == Some(expected))
}

fn any_item_contains(items: &[Value], field: &str, text: &str) -> bool {
    items.iter().any(|item| {
        let rendered = item.get(field).map(render).unwrap_or_default();
        contains_ci(&rendered, text)
    })
}

pub fn status_code(resp: &ApiResponse, expected: u16) -> HarnessResult<()> {
    if resp.status != expected {
        return fail(format!(
            "Expected status code {}, got {}",
            expected, resp.status
        ));
    }
    Ok(())
}

pub fn json_field(resp: &ApiResponse, name: &str, expected: &Value) -> HarnessResult<()> {
    let actual = field(body(resp)?, name, "response")?;
    if actual != expected {
        return fail(format!(
            "Expected {}='{}', got '{}'",
            name,
            render(expected),
            render(actual)
        ));
    }
    Ok(())
}

/// Case-insensitive substring match on a top-level field
pub fn json_field_contains_text(resp: &ApiResponse, name: &str, text: &str) -> HarnessResult<()> {
    let actual = render(field(body(resp)?, name, "response")?);
    if !contains_ci(&actual, text) {
        return fail(format!(
            "Expected text '{}' not found in field '{}': '{}'",
            text, name, actual
        ));
    }
    Ok(())
}

pub fn json_fields_present(resp: &ApiResponse, names: &[&str]) -> HarnessResult<()> {
    let data = body(resp)?;
    for name in names {
        if data.get(*name).is_none() {
            return fail(format!("Required field '{}' not found in response", name));
        }
    }
    Ok(())
}

/// A list-valued field holds an item whose `field` equals `expected`
pub fn list_field_contains(
    resp: &ApiResponse,
    list: &str,
    name: &str,
    expected: &Value,
) -> HarnessResult<()> {
    let items = list_field(body(resp)?, list, "response")?;
    if !any_item_eq(items, name, expected) {
        return fail(format!(
            "No item with {}='{}' found in '{}'",
            name,
            render(expected),
            list
        ));
    }
    Ok(())
}

/// A list-valued field holds an item whose `field` contains `text`, ignoring case
pub fn list_field_contains_text(
    resp: &ApiResponse,
    list: &str,
    name: &str,
    text: &str,
) -> HarnessResult<()> {
    let items = list_field(body(resp)?, list, "response")?;
    if !any_item_contains(items, name, text) {
        return fail(format!(
            "No item with {} containing '{}' found in '{}'",
            name, text, list
        ));
    }
    Ok(())
}

pub fn list_length(resp: &ApiResponse, expected: usize) -> HarnessResult<()> {
    let len = array(resp)?.len();
    if len != expected {
        return fail(format!("Expected list length {}, got {}", expected, len));
    }
    Ok(())
}

pub fn minimum_list_length(resp: &ApiResponse, min: usize) -> HarnessResult<()> {
    let len = array(resp)?.len();
    if len < min {
        return fail(format!("Expected list length at least {}, got {}", min, len));
    }
    Ok(())
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// The top-level array is ordered by `field`, ascending unless `reverse`
pub fn sorted_by_field(resp: &ApiResponse, name: &str, reverse: bool) -> HarnessResult<()> {
    let items = array(resp)?;
    let mut values = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        values.push(field(item, name, &format!("item at index {}", i))?);
    }

    for pair in values.windows(2) {
        let ord = match compare(pair[0], pair[1]) {
            Some(ord) => ord,
            None => {
                return fail(format!(
                    "Values of '{}' are not comparable: '{}' and '{}'",
                    name,
                    render(pair[0]),
                    render(pair[1])
                ))
            }
        };
        let in_order = if reverse {
            ord != Ordering::Less
        } else {
            ord != Ordering::Greater
        };
        if !in_order {
            return fail(format!("Response not sorted by '{}'", name));
        }
    }
    Ok(())
}

pub fn field_at_index(
    resp: &ApiResponse,
    index: usize,
    name: &str,
    expected: &Value,
) -> HarnessResult<()> {
    let location = format!("item at index {}", index);
    let actual = field(item_at(resp, index)?, name, &location)?;
    if actual != expected {
        return fail(format!(
            "Expected {}='{}' at index {}, got '{}'",
            name,
            render(expected),
            index,
            render(actual)
        ));
    }
    Ok(())
}

pub fn list_field_contains_at_index(
    resp: &ApiResponse,
    index: usize,
    list: &str,
    name: &str,
    expected: &Value,
) -> HarnessResult<()> {
    let location = format!("item at index {}", index);
    let items = list_field(item_at(resp, index)?, list, &location)?;
    if !any_item_eq(items, name, expected) {
        return fail(format!(
            "No item with {}='{}' found in '{}' at index {}",
            name,
            render(expected),
            list,
            index
        ));
    }
    Ok(())
}

pub fn list_field_contains_text_at_index(
    resp: &ApiResponse,
    index: usize,
    list: &str,
    name: &str,
    text: &str,
) -> HarnessResult<()> {
    let location = format!("item at index {}", index);
    let items = list_field(item_at(resp, index)?, list, &location)?;
    if !any_item_contains(items, name, text) {
        return fail(format!(
            "No item with {} containing '{}' found in '{}' at index {}",
            name, text, list, index
        ));
    }
    Ok(())
}
