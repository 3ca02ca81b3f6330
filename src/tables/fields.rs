//! Field access over the raw JSON responses.
//!
//! Every lookup is addressed by JSON pointer so that a missing or malformed
//! field reports exactly where the response diverged from what the builders
//! expect.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

use crate::error::{PullError, Result};

/// Value at `pointer`; JSON `null` counts as missing
pub(crate) fn at<'a>(root: &'a Value, resource: &str, pointer: &str) -> Result<&'a Value> {
    root.pointer(pointer)
        .filter(|v| !v.is_null())
        .ok_or_else(|| PullError::missing(resource, pointer))
}

pub(crate) fn int_at(root: &Value, resource: &str, pointer: &str) -> Result<i64> {
    to_int(at(root, resource, pointer)?, resource, pointer)
}

pub(crate) fn float_at(root: &Value, resource: &str, pointer: &str) -> Result<f64> {
    to_float(at(root, resource, pointer)?, resource, pointer)
}

/// Like [`float_at`], but an absent field is `None` rather than an error
pub(crate) fn opt_float_at(root: &Value, resource: &str, pointer: &str) -> Result<Option<f64>> {
    match root.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => to_float(v, resource, pointer).map(Some),
    }
}

pub(crate) fn array_at<'a>(root: &'a Value, resource: &str, pointer: &str) -> Result<&'a [Value]> {
    at(root, resource, pointer)?
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| PullError::invalid(resource, pointer, "expected an array"))
}

/// Integer from a JSON number or numeric string; decimals truncate toward zero
pub(crate) fn to_int(value: &Value, resource: &str, pointer: &str) -> Result<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(|| {
                PullError::invalid(resource, pointer, format!("{} is not an integer", n))
            }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f.trunc() as i64)
                })
                .ok_or_else(|| {
                    PullError::invalid(resource, pointer, format!("'{}' is not numeric", s))
                })
        }
        other => Err(PullError::invalid(
            resource,
            pointer,
            format!("expected a number, found {}", other),
        )),
    }
}

pub(crate) fn to_float(value: &Value, resource: &str, pointer: &str) -> Result<f64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| PullError::invalid(resource, pointer, format!("{} is not a float", n))),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| PullError::invalid(resource, pointer, format!("'{}' is not numeric", s))),
        other => Err(PullError::invalid(
            resource,
            pointer,
            format!("expected a number, found {}", other),
        )),
    }
}

/// One element of a sample array: its time-of-day key combined with `date`,
/// and its raw value
pub(crate) fn sample<'a>(
    item: &'a Value,
    date: NaiveDate,
    resource: &str,
    base: &str,
    index: usize,
    time_key: &str,
) -> Result<(NaiveDateTime, &'a Value)> {
    let time = item
        .get(time_key)
        .and_then(Value::as_str)
        .ok_or_else(|| PullError::missing(resource, format!("{}/{}/{}", base, index, time_key)))?;
    let time = parse_time(time).ok_or_else(|| {
        PullError::invalid(
            resource,
            &format!("{}/{}/{}", base, index, time_key),
            format!("'{}' is not a time of day", time),
        )
    })?;
    let value = item
        .get("value")
        .filter(|v| !v.is_null())
        .ok_or_else(|| PullError::missing(resource, format!("{}/{}/value", base, index)))?;

    Ok((date.and_time(time), value))
}

/// Pointer to the value of sample `index` under `base`, for error reports
pub(crate) fn sample_value_pointer(base: &str, index: usize) -> String {
    format!("{}/{}/value", base, index)
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}
