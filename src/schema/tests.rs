//! Schema table tests

use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;

const SURVEY: &[Field] = &[Field::integer("id"), Field::string("name")];
const ATTRS: &[Field] = &[Field::string("custom_attribute")];
const TAG: FieldType = FieldType::String;
const MEMBER: FieldType = FieldType::Object {
    fields: SURVEY,
    additional: false,
};

const SAMPLE: &[Field] = &[
    Field::integer("id").required(),
    Field::datetime("created"),
    Field::object("survey", SURVEY),
    Field::open_object("custom_attributes", ATTRS),
    Field::array("tags", &TAG),
    Field::array("members", &MEMBER),
];

#[test]
fn test_field_constructors() {
    let id = Field::integer("id").required();
    assert_eq!(id.name, "id");
    assert_eq!(id.field_type, FieldType::Integer);
    assert!(id.required);

    assert!(!Field::string("name").required);
    assert!(FieldType::DateTime.is_scalar());
    assert!(!FieldType::Array(&TAG).is_scalar());
    assert!(matches!(
        Field::object("survey", SURVEY).field_type,
        FieldType::Object { fields, additional: false } if fields == SURVEY
    ));
}

#[test]
fn test_json_schema_rendering() {
    let schema = to_json_schema(SAMPLE).to_json();

    assert_eq!(
        schema,
        json!({
            "type": "object",
            "additionalProperties": false,
            "required": ["id"],
            "properties": {
                "id": {"type": "integer"},
                "created": {"type": ["string", "null"], "format": "date-time"},
                "survey": {
                    "type": ["object", "null"],
                    "additionalProperties": false,
                    "properties": {
                        "id": {"type": ["integer", "null"]},
                        "name": {"type": ["string", "null"]}
                    }
                },
                "custom_attributes": {
                    "type": ["object", "null"],
                    "additionalProperties": true,
                    "properties": {
                        "custom_attribute": {"type": ["string", "null"]}
                    }
                },
                "tags": {
                    "type": ["array", "null"],
                    "items": {"type": ["string", "null"]}
                },
                "members": {
                    "type": ["array", "null"],
                    "items": {
                        "type": ["object", "null"],
                        "additionalProperties": false,
                        "properties": {
                            "id": {"type": ["integer", "null"]},
                            "name": {"type": ["string", "null"]}
                        }
                    }
                }
            }
        })
    );
}

#[test]
fn test_json_schema_required_not_nullable() {
    let schema = to_json_schema(SAMPLE);
    assert!(schema.is_required("id"));
    assert!(!schema.get_property("id").unwrap().is_nullable());
    assert!(schema.get_property("created").unwrap().is_nullable());
}

#[test]
fn test_validate_fields_ok() {
    assert!(validate_fields("sample", SAMPLE).is_ok());
}

#[test]
fn test_validate_fields_duplicate() {
    const DUP: &[Field] = &[Field::integer("id"), Field::string("id")];
    let err = validate_fields("dup", DUP).unwrap_err();
    assert!(err.to_string().contains("duplicate field 'id'"));
}

#[test]
fn test_validate_fields_nested_duplicate() {
    const INNER: &[Field] = &[Field::string("text"), Field::string("text")];
    const OUTER: &[Field] = &[Field::integer("id"), Field::object("question", INNER)];
    let err = validate_fields("nested", OUTER).unwrap_err();
    assert!(err.to_string().contains("question.text"));
}

#[test]
fn test_validate_fields_empty() {
    assert!(validate_fields("empty", &[]).is_err());

    const NOTHING: &[Field] = &[];
    const HOLLOW: &[Field] = &[Field::object("inner", NOTHING)];
    assert!(validate_fields("hollow", HOLLOW).is_err());
}

#[test]
fn test_conform_drops_undeclared() {
    let mut record = json!({
        "id": 1,
        "created": "2024-01-01T00:00:00Z",
        "unexpected": "x",
        "survey": {"id": 2, "name": "NPS", "extra": true},
        "custom_attributes": {"custom_attribute": "a", "plan": "pro"},
        "members": [{"id": 3, "email": "a@b.c"}, {"id": 4}]
    });

    let dropped = conform(SAMPLE, record.as_object_mut().unwrap());

    assert_eq!(dropped, 3);
    assert_eq!(
        record,
        json!({
            "id": 1,
            "created": "2024-01-01T00:00:00Z",
            "survey": {"id": 2, "name": "NPS"},
            "custom_attributes": {"custom_attribute": "a", "plan": "pro"},
            "members": [{"id": 3}, {"id": 4}]
        })
    );
}

#[test]
fn test_conform_ignores_type_mismatch() {
    let mut record = json!({"id": 1, "survey": null, "tags": "not-an-array"});
    let dropped = conform(SAMPLE, record.as_object_mut().unwrap());
    assert_eq!(dropped, 0);
    assert_eq!(record["tags"], "not-an-array");
}

#[test]
fn test_json_type_display() {
    assert_eq!(JsonType::Integer.to_string(), "integer");
    assert_eq!(JsonType::Null.to_string(), "null");
}

#[test]
fn test_json_type_or_array() {
    let nullable = JsonTypeOrArray::nullable(JsonType::String);
    assert!(nullable.is_nullable());
    assert_eq!(nullable.primary_type(), Some(&JsonType::String));

    let single = JsonTypeOrArray::single(JsonType::Boolean);
    assert!(!single.is_nullable());
}
