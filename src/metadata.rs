//! The shared metadata model tying the pipeline stages together.
//!
//! A `CommandMetadata` is created by the analyzer, enriched by the
//! initializer interpreter, and then consumed read-only by the help
//! formatter and the code generator. Serialization mirrors the `scan` JSON
//! schema; fields outside that schema are skipped.

use std::fmt;

use serde::de::{Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Everything known about one command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandMetadata {
    #[serde(rename = "Name")]
    pub name: String,
    /// Doc comment of the run function, newlines preserved.
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "RunFunc")]
    pub run_func: RunFunc,
    #[serde(rename = "Options")]
    pub options: Vec<OptionSpec>,
    /// Position of the existing `main` function; `None` means append mode.
    #[serde(rename = "MainFuncPosition")]
    pub main_func_position: Option<MainPosition>,
    /// Open-question notes accumulated across the pipeline.
    #[serde(skip)]
    pub notes: Vec<String>,
}

/// The function the generated `main` dispatches to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFunc {
    #[serde(rename = "Name")]
    pub name: String,
    /// Short name of the declaring package.
    #[serde(rename = "PackageName")]
    pub package_name: String,
    #[serde(rename = "ContextArg")]
    pub context_arg: Option<ContextArg>,
    #[serde(rename = "OptionsArg")]
    pub options_arg: Option<OptionsArg>,
    #[serde(rename = "InitializerName")]
    pub initializer_name: Option<String>,
    /// Whether the named initializer returns `*Options` rather than
    /// `Options`.
    #[serde(skip)]
    pub initializer_returns_pointer: bool,
    /// Whether the run function's result is exactly `error`.
    #[serde(skip)]
    pub returns_error: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextArg {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub written_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsArg {
    #[serde(rename = "Name")]
    pub name: String,
    /// The type as written, e.g. `*Options`.
    #[serde(rename = "Type")]
    pub written_type: String,
    /// The written type with a leading `*` removed.
    #[serde(rename = "BaseType")]
    pub base_type: String,
    #[serde(rename = "IsPointer")]
    pub is_pointer: bool,
}

/// One CLI option derived from one struct field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Exact Go identifier of the field.
    #[serde(rename = "Name")]
    pub field_name: String,
    /// Kebab-case flag name.
    #[serde(rename = "CliName")]
    pub cli_name: String,
    /// Stripped base type (written type with a leading `*` removed).
    #[serde(rename = "TypeName")]
    pub base_type: String,
    /// Field doc comment, newlines preserved.
    #[serde(rename = "HelpText")]
    pub help_text: String,
    #[serde(rename = "IsPointer")]
    pub is_pointer: bool,
    #[serde(rename = "IsRequired")]
    pub is_required: bool,
    /// Environment variable name from the `env` tag; empty when absent.
    #[serde(rename = "EnvVar")]
    pub env_var: String,
    #[serde(rename = "DefaultValue")]
    pub default: Option<DefaultValue>,
    #[serde(rename = "EnumValues")]
    pub enum_values: Option<Vec<String>>,
    #[serde(rename = "IsTextUnmarshaler")]
    pub is_text_unmarshaler: bool,
    #[serde(rename = "IsTextMarshaler")]
    pub is_text_marshaler: bool,
    /// `"string"`, `"int"` or `"bool"` when the type (or its same-package
    /// underlying declaration) is that kind; empty when unresolved.
    #[serde(rename = "UnderlyingKind")]
    pub underlying_kind: String,
    #[serde(rename = "FileMustExist")]
    pub file_must_exist: bool,
    #[serde(rename = "FileGlobPattern")]
    pub file_glob_pattern: bool,
    /// Full source spelling of the field type, e.g. `*pkg.MyType`.
    #[serde(skip)]
    pub written_type: String,
    /// Open-question notes attached to this option.
    #[serde(skip)]
    pub notes: Vec<String>,
}

/// Position of the existing `main` function in the target file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainPosition {
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "Offset")]
    pub offset: usize,
    #[serde(rename = "Line")]
    pub line: u32,
    #[serde(rename = "Column")]
    pub column: u32,
}

/// A default value extracted from the initializer, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Nil,
}

impl DefaultValue {
    /// The `%v`-style rendering used for enum comparison and help text.
    pub fn string_form(&self) -> String {
        match self {
            DefaultValue::Str(v) => v.clone(),
            DefaultValue::Int(v) => v.to_string(),
            DefaultValue::Bool(v) => v.to_string(),
            DefaultValue::Nil => "<nil>".to_owned(),
        }
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.string_form())
    }
}

impl Serialize for DefaultValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            DefaultValue::Str(v) => serializer.serialize_str(v),
            DefaultValue::Int(v) => serializer.serialize_i64(*v),
            DefaultValue::Bool(v) => serializer.serialize_bool(*v),
            DefaultValue::Nil => serializer.serialize_unit(),
        }
    }
}

impl<'de> Deserialize<'de> for DefaultValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DefaultValueVisitor;

        impl<'de> Visitor<'de> for DefaultValueVisitor {
            type Value = DefaultValue;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string, integer, boolean or null")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<DefaultValue, E> {
                Ok(DefaultValue::Str(v.to_owned()))
            }

            fn visit_string<E: serde::de::Error>(self, v: String) -> Result<DefaultValue, E> {
                Ok(DefaultValue::Str(v))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<DefaultValue, E> {
                Ok(DefaultValue::Int(v))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<DefaultValue, E> {
                Ok(DefaultValue::Int(v as i64))
            }

            fn visit_bool<E: serde::de::Error>(self, v: bool) -> Result<DefaultValue, E> {
                Ok(DefaultValue::Bool(v))
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<DefaultValue, E> {
                Ok(DefaultValue::Nil)
            }
        }

        deserializer.deserialize_any(DefaultValueVisitor)
    }
}

impl OptionSpec {
    /// Whether the base type is `[]string`.
    pub fn is_string_slice(&self) -> bool {
        self.base_type == "[]string"
    }

    /// Whether the stored default came out of the initializer as non-nil.
    pub fn has_value_default(&self) -> bool {
        matches!(
            self.default,
            Some(DefaultValue::Str(_)) | Some(DefaultValue::Int(_)) | Some(DefaultValue::Bool(_))
        )
    }

    pub fn note(&mut self, text: impl Into<String>) {
        self.notes.push(text.into());
    }
}

impl CommandMetadata {
    /// Recomputes the fields the `scan` schema omits after deserialization.
    pub fn hydrate(&mut self) {
        for opt in &mut self.options {
            opt.written_type = if opt.is_pointer {
                format!("*{}", opt.base_type)
            } else {
                opt.base_type.clone()
            };
        }
    }

    pub fn option(&self, field_name: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.field_name == field_name)
    }

    pub fn option_mut(&mut self, field_name: &str) -> Option<&mut OptionSpec> {
        self.options.iter_mut().find(|o| o.field_name == field_name)
    }
}

#[cfg(test)]
mod test {
    use super::{DefaultValue, OptionSpec};

    #[test]
    fn test_default_value_json() {
        let spec = OptionSpec {
            field_name: "Port".into(),
            default: Some(DefaultValue::Int(8080)),
            ..OptionSpec::default()
        };

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["DefaultValue"], serde_json::json!(8080));
        assert_eq!(json["Name"], serde_json::json!("Port"));

        let back: OptionSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back.default, Some(DefaultValue::Int(8080)));
    }

    #[test]
    fn test_nil_default_serializes_as_null() {
        let spec = OptionSpec {
            default: Some(DefaultValue::Nil),
            ..OptionSpec::default()
        };

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["DefaultValue"], serde_json::Value::Null);
    }

    #[test]
    fn test_string_form() {
        assert_eq!(DefaultValue::Str("a".into()).string_form(), "a");
        assert_eq!(DefaultValue::Int(-3).string_form(), "-3");
        assert_eq!(DefaultValue::Bool(true).string_form(), "true");
        assert_eq!(DefaultValue::Nil.string_form(), "<nil>");
    }
}
