//! JSON encoding for `f64` fields that may legitimately be `NaN`.
//!
//! JSON has no `NaN`; such values are written as `null` and read back as `NaN`.
//! Infinities are written as `null` too and so also come back as `NaN`.
//!
//! Use with `#[serde(with = "crate::domain::nan_as_null")]`.

use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_some(value)
    } else {
        serializer.serialize_none()
    }
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Row {
        #[serde(with = "super")]
        value: f64,
    }

    #[test]
    fn nan_is_written_as_null_and_read_back() {
        let text = serde_json::to_string(&Row { value: f64::NAN }).unwrap();
        assert_eq!(text, r#"{"value":null}"#);
        let row: Row = serde_json::from_str(&text).unwrap();
        assert!(row.value.is_nan());
    }

    #[test]
    fn finite_values_are_exact() {
        let value = -199.562_192_113_174_46;
        let text = serde_json::to_string(&Row { value }).unwrap();
        let row: Row = serde_json::from_str(&text).unwrap();
        assert_eq!(row.value.to_bits(), value.to_bits());
    }
}
