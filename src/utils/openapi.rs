//! Small builders for the OpenAPI fragments modules contribute.

use serde_json::{json, Map, Value};
use utoipa::{PartialSchema, ToSchema};

/// Add `T`'s schema, and every schema it references, to `schemas`.
pub fn add_schema<T: ToSchema>(schemas: &mut Map<String, Value>) {
    let mut nested = Vec::new();
    T::schemas(&mut nested);

    for (name, schema) in nested {
        if let Ok(value) = serde_json::to_value(schema) {
            schemas.insert(name, value);
        }
    }

    if let Ok(value) = serde_json::to_value(<T as PartialSchema>::schema()) {
        schemas.insert(T::name().into_owned(), value);
    }
}

pub fn schema_ref(name: &str) -> Value {
    json!({ "$ref": format!("#/components/schemas/{}", name) })
}

pub fn json_content(description: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": schema
            }
        }
    })
}

/// The 500 response every route shares.
pub fn error_response() -> Value {
    json_content("Persistence failure", schema_ref("ErrorResponse"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(utoipa::ToSchema)]
    #[allow(dead_code)]
    struct Inner {
        value: i64,
    }

    #[derive(utoipa::ToSchema)]
    #[allow(dead_code)]
    struct Outer {
        inner: Inner,
    }

    #[test]
    fn add_schema_includes_referenced_types() {
        let mut schemas = Map::new();
        add_schema::<Outer>(&mut schemas);

        assert!(schemas.contains_key("Outer"));
        assert!(schemas.contains_key("Inner"));
    }

    #[test]
    fn error_response_points_at_shared_schema() {
        let response = error_response();
        assert_eq!(
            response["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/ErrorResponse"
        );
    }
}
