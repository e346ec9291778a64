use crate::statics;
use serde::{Deserialize, Deserializer, de};

/// A single panel cell. Panels mix numeric indicators with a few text columns.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Interpret a raw CSV field: blanks and NA markers are null, numbers are numbers.
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() || statics::NA_MARKERS.iter().any(|m| m.eq_ignore_ascii_case(s)) {
            return CellValue::Null;
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_nan() => CellValue::Null,
            Ok(v) => CellValue::Number(v),
            Err(_) => CellValue::Text(s.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Null => "null",
            CellValue::Number(_) => "number",
            CellValue::Text(_) => "text",
        }
    }

    /// Short display form; integral values print without a fractional part.
    pub fn preview(&self) -> String {
        match self {
            CellValue::Null => statics::EN_LITERAL_MISSING.to_string(),
            CellValue::Number(v) => format_number(*v),
            CellValue::Text(s) => s.clone(),
        }
    }
}

pub fn format_number(v: f64) -> String {
    if v.is_infinite() {
        return if v.is_sign_negative() {
            "-Infinity".to_string()
        } else {
            "Infinity".to_string()
        };
    }
    if v.fract() == 0.0 && v.abs() < 1e15 {
        return format!("{}", v as i64);
    }
    let mut buf = ryu::Buffer::new();
    buf.format(v).to_string()
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CellVisitor;

        impl<'de> de::Visitor<'de> for CellVisitor {
            type Value = CellValue;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a number, string or null")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(CellValue::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(CellValue::Null)
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(CellValue::Number(if v { 1.0 } else { 0.0 }))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(CellValue::Number(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(CellValue::Number(v as f64))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                if v.is_nan() {
                    Ok(CellValue::Null)
                } else {
                    Ok(CellValue::Number(v))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(CellValue::Text(v.to_owned()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(CellValue::Text(v))
            }
        }

        deserializer.deserialize_any(CellVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::{CellValue, format_number};
    use indexmap::IndexMap;

    #[test]
    fn parse_recognises_nulls_numbers_and_text() {
        assert_eq!(CellValue::parse(""), CellValue::Null);
        assert_eq!(CellValue::parse("NA"), CellValue::Null);
        assert_eq!(CellValue::parse("nan"), CellValue::Null);
        assert_eq!(CellValue::parse(" 0.25 "), CellValue::Number(0.25));
        assert_eq!(CellValue::parse("1e-3"), CellValue::Number(0.001));
        assert_eq!(
            CellValue::parse("Brazil"),
            CellValue::Text("Brazil".to_string())
        );
    }

    #[test]
    fn preview_formats_numbers_compactly() {
        assert_eq!(format_number(2000.0), "2000");
        assert_eq!(format_number(0.873), "0.873");
        assert_eq!(CellValue::Null.preview(), "<missing>");
    }

    #[test]
    fn deserializes_from_json5_rows() {
        let row: IndexMap<String, CellValue> =
            json5::from_str("{ country_name: 'Chile', year: 1990, v2x_libdem: 0.5, note: null }")
                .unwrap();
        assert_eq!(row["country_name"].as_str(), Some("Chile"));
        assert_eq!(row["year"].as_f64(), Some(1990.0));
        assert_eq!(row["v2x_libdem"].as_f64(), Some(0.5));
        assert!(row["note"].is_null());
    }
}
