//! Tools for DBML schemas: dbml_to_ucode, get_dbml.

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::UcodeClient;
use crate::tool::{parse_args, Tool};
use crate::types::{ToolResult, ToolSpec};

#[derive(Debug, Deserialize)]
struct DbmlToUcodeParams {
    dbml: String,
    x_api_key: String,
    view_fields: Value,
    menus: Value,
}

pub struct DbmlToUcode {
    client: UcodeClient,
}

impl DbmlToUcode {
    pub fn new(client: UcodeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for DbmlToUcode {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "dbml_to_ucode".to_string(),
            description: "Convert DBML to Ucode.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "dbml": { "type": "string", "description": "The DBML string to be converted." },
                    "x_api_key": { "type": "string", "description": "The X-API-KEY of the environment." },
                    "view_fields": {
                        "type": "object",
                        "description": "Additional dynamic view_fields (keys and values can vary).",
                        "additionalProperties": true
                    },
                    "menus": {
                        "type": "object",
                        "description": "An object where each value is an array of strings ([]string).",
                        "additionalProperties": { "type": "array", "items": { "type": "string" } }
                    }
                },
                "required": ["dbml", "x_api_key", "view_fields", "menus"]
            }),
        }
    }

    async fn execute(&self, args: Value) -> ToolResult<Value> {
        let params: DbmlToUcodeParams = parse_args(args)?;
        let body = json!({
            "dbml": params.dbml,
            "view_fields": params.view_fields,
            "menus": params.menus,
        });

        self.client
            .send(Method::POST, "/v1/dbml-to-ucode", Some(&params.x_api_key), &[], Some(&body))
            .await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetDbmlParams {
    project_id: String,
    environment_id: String,
}

pub struct GetDbml {
    client: UcodeClient,
}

impl GetDbml {
    pub fn new(client: UcodeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetDbml {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "get_dbml".to_string(),
            description: "Retrieve DBML from the Ucode API.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "projectId": { "type": "string", "description": "The ID of the project." },
                    "environmentId": { "type": "string", "description": "The ID of the environment." }
                },
                "required": ["projectId", "environmentId"]
            }),
        }
    }

    async fn execute(&self, args: Value) -> ToolResult<Value> {
        let params: GetDbmlParams = parse_args(args)?;
        let query = [
            ("project-id", params.project_id.as_str()),
            ("environment-id", params.environment_id.as_str()),
        ];

        // The chart endpoint is public; no API key is sent.
        self.client
            .send(Method::GET, "/v1/chart", None, &query, None)
            .await
    }
}
