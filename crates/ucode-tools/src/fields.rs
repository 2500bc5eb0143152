//! Tool `create_field`: add a field to a ucode table.

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::UcodeClient;
use crate::tool::{parse_args, Tool};
use crate::types::{ToolResult, ToolSpec};

#[derive(Debug, Deserialize)]
struct CreateFieldParams {
    #[serde(default)]
    label: Option<String>,
    #[serde(default, rename = "defaultValue")]
    default_value: Option<String>,
    #[serde(default)]
    label_en: Option<String>,
    #[serde(default)]
    enable_multilanguage: Option<bool>,
    table_id: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default, rename = "type")]
    field_type: Option<String>,
    #[serde(default)]
    required: Option<bool>,
    x_api_key: String,
    #[serde(default)]
    collection: Option<String>,
}

pub struct CreateField {
    client: UcodeClient,
}

impl CreateField {
    pub fn new(client: UcodeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CreateField {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "create_field".to_string(),
            description: "Create a field in Ucode Items API.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "label": { "type": "string", "description": "The label for the field." },
                    "defaultValue": { "type": "string", "description": "The default value for the field." },
                    "label_en": { "type": "string", "description": "The English label for the field." },
                    "enable_multilanguage": { "type": "boolean", "description": "Whether to enable multilanguage support." },
                    "table_id": { "type": "string", "description": "The ID of the table to which the field belongs." },
                    "slug": { "type": "string", "description": "The slug for the field." },
                    "type": { "type": "string", "description": "The type of the field (e.g., SINGLE_LINE)." },
                    "required": { "type": "boolean", "description": "Whether the field is required." },
                    "x_api_key": { "type": "string", "description": "The X-API-KEY of the environment." },
                    "collection": { "type": "string", "description": "The collection to which the field belongs (e.g., relaunch)." }
                },
                "required": ["table_id", "slug", "type", "x_api_key"]
            }),
        }
    }

    async fn execute(&self, args: Value) -> ToolResult<Value> {
        let params: CreateFieldParams = parse_args(args)?;
        let multilanguage = params.enable_multilanguage.unwrap_or(false);
        let label = non_empty(params.label);

        let body = json!({
            "attributes": {
                "label": label.clone().unwrap_or_default(),
                "defaultValue": params.default_value.unwrap_or_default(),
                "label_en": non_empty(params.label_en).unwrap_or_else(|| "Name".to_string()),
                "enable_multilanguage": multilanguage,
                "number_of_rounds": null
            },
            "default": "",
            "label": label.unwrap_or_else(|| "Name".to_string()),
            "required": params.required.unwrap_or(false),
            "slug": non_empty(params.slug).unwrap_or_else(|| "name".to_string()),
            "table_id": params.table_id,
            "type": non_empty(params.field_type).unwrap_or_else(|| "SINGLE_LINE".to_string()),
            "enable_multilanguage": multilanguage,
            "show_label": true
        });

        let path = match params.collection.as_deref() {
            Some(collection) if !collection.is_empty() => format!("/v2/fields/{collection}"),
            _ => "/v2/fields".to_string(),
        };

        self.client
            .send(Method::POST, &path, Some(&params.x_api_key), &[], Some(&body))
            .await
    }
}

/// Empty strings count as absent, like an unset argument.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
