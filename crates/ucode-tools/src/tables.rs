//! Tools for ucode tables and their rows.

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::UcodeClient;
use crate::tool::{parse_args, Tool};
use crate::types::{ToolError, ToolResult, ToolSpec};

fn default_true() -> bool {
    true
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

#[derive(Debug, Deserialize)]
struct CreateTableParams {
    app_id: String,
    label: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    slug: String,
    #[serde(default = "default_true")]
    show_in_menu: bool,
    #[serde(default = "empty_object")]
    attributes: Value,
    #[serde(default)]
    is_login_table: bool,
    #[serde(default)]
    is_cached: bool,
    #[serde(default)]
    soft_delete: bool,
    #[serde(default)]
    order_by: bool,
    x_api_key: String,
}

/// Tool `create_table`: create a new table in a ucode application.
pub struct CreateTable {
    client: UcodeClient,
}

impl CreateTable {
    pub fn new(client: UcodeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CreateTable {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "create_table".to_string(),
            description: "Create a new table in Ucode API.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "app_id": { "type": "string", "description": "The application ID for the table." },
                    "label": { "type": "string", "description": "The label for the table." },
                    "description": { "type": "string", "description": "The description for the table." },
                    "slug": { "type": "string", "description": "The slug for the table." },
                    "show_in_menu": { "type": "boolean", "description": "Whether to show the table in the menu." },
                    "attributes": { "type": "object", "description": "Additional attributes for the table." },
                    "is_login_table": { "type": "boolean", "description": "Whether the table is a login table." },
                    "is_cached": { "type": "boolean", "description": "Whether the table is cached." },
                    "soft_delete": { "type": "boolean", "description": "Whether the table supports soft delete." },
                    "order_by": { "type": "boolean", "description": "Whether to order by the table." },
                    "x_api_key": { "type": "string", "description": "The X-API-KEY of the environment." }
                },
                "required": ["app_id", "label", "x_api_key"]
            }),
        }
    }

    async fn execute(&self, args: Value) -> ToolResult<Value> {
        let params: CreateTableParams = parse_args(args)?;
        let body = json!({
            "show_in_menu": params.show_in_menu,
            "app_id": params.app_id,
            "label": params.label,
            "description": params.description,
            "slug": params.slug,
            "icon": "",
            "attributes": params.attributes,
            "is_login_table": params.is_login_table,
            "is_cached": params.is_cached,
            "soft_delete": params.soft_delete,
            "order_by": params.order_by,
        });

        self.client
            .send(Method::POST, "/v1/table", Some(&params.x_api_key), &[], Some(&body))
            .await
    }
}

#[derive(Debug, Deserialize)]
struct CreateTableItemParams {
    table_slug: String,
    data: Value,
    x_api_key: String,
}

/// Tool `create_table_item`: insert a row into a table.
pub struct CreateTableItem {
    client: UcodeClient,
}

impl CreateTableItem {
    pub fn new(client: UcodeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CreateTableItem {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "create_table_item".to_string(),
            description: "Create a new item (row) in a Ucode table. Accepts dynamic field data based on the table schema.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "table_slug": {
                        "type": "string",
                        "description": "The slug of the table where the item will be created (e.g., \"enrollment\", \"users\")."
                    },
                    "data": {
                        "type": "object",
                        "description": "An object containing field names as keys and their values. The fields must match the table schema. Example: { \"enrollment_date\": \"2026-01-01\", \"status\": [null], \"monthly_deduction\": 324 }"
                    },
                    "x_api_key": { "type": "string", "description": "The X-API-KEY for authentication." }
                },
                "required": ["table_slug", "data", "x_api_key"]
            }),
        }
    }

    async fn execute(&self, args: Value) -> ToolResult<Value> {
        let params: CreateTableItemParams = parse_args(args)?;
        if params.table_slug.is_empty() {
            return Err(ToolError::InvalidArgument(
                "Missing required table_slug.".to_string(),
            ));
        }
        if !params.data.is_object() {
            return Err(ToolError::InvalidArgument(
                "Data must be an object with field names and values.".to_string(),
            ));
        }

        let path = format!("/v2/items/{}", params.table_slug);
        let body = json!({ "data": params.data });

        self.client
            .send(Method::POST, &path, Some(&params.x_api_key), &[], Some(&body))
            .await
    }
}

#[derive(Debug, Deserialize)]
struct GetTableDetailsParams {
    collection: String,
    x_api_key: String,
}

/// Tool `get_table_details`: fetch a table's fields and settings by slug.
pub struct GetTableDetails {
    client: UcodeClient,
}

impl GetTableDetails {
    pub fn new(client: UcodeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetTableDetails {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "get_table_details".to_string(),
            description: "Retrieve details for a specific table (collection) using its slug."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "collection": {
                        "type": "string",
                        "description": "The slug of the table (e.g., the part after table-details/ in the URL)."
                    },
                    "x_api_key": { "type": "string", "description": "The X-API-KEY for authentication." }
                },
                "required": ["collection", "x_api_key"]
            }),
        }
    }

    async fn execute(&self, args: Value) -> ToolResult<Value> {
        let params: GetTableDetailsParams = parse_args(args)?;
        if params.collection.is_empty() {
            return Err(ToolError::InvalidArgument(
                "Missing required collection (table slug).".to_string(),
            ));
        }

        let path = format!("/v1/table-details/{}", params.collection);
        let body = json!({ "data": {} });

        self.client
            .send(Method::POST, &path, Some(&params.x_api_key), &[], Some(&body))
            .await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTableParams {
    table_slug: String,
    xapikey: String,
    fields: Value,
    relations: Value,
}

/// Tool `update_table`: apply field and relation changes to a table.
pub struct UpdateTable {
    client: UcodeClient,
}

impl UpdateTable {
    pub fn new(client: UcodeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for UpdateTable {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "update_table".to_string(),
            description: "Update a table in the Ucode Items API.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "tableSlug": { "type": "string", "description": "The table slug for the API." },
                    "xapikey": { "type": "string", "description": "The API key for authorization." },
                    "fields": {
                        "type": "array",
                        "description": "The fields to be updated in the table.",
                        "items": {
                            "type": "object",
                            "properties": {
                                "label": { "type": "string", "description": "The human-readable label for the field." },
                                "slug": { "type": "string", "description": "The machine-readable slug for the field." },
                                "type": { "type": "string", "description": "The database type for the field (e.g., VARCHAR, INT, ENUM)." },
                                "action": { "type": "string", "description": "The action to perform on the field (e.g., create, update, delete)." },
                                "enum": {
                                    "type": "array",
                                    "description": "The enum values for the field. Only required if the type is ENUM.",
                                    "items": { "type": "string" }
                                }
                            },
                            "required": ["label", "slug", "type", "action"],
                            "additionalProperties": false
                        }
                    },
                    "relations": {
                        "type": "array",
                        "description": "The relations to be updated in the table.",
                        "items": {
                            "type": "object",
                            "properties": {
                                "table_to": { "type": "string", "description": "The name of the table to relate to." },
                                "label_to": { "type": "string", "description": "The label for the related table." },
                                "type": { "type": "string", "description": "The type of relation (e.g., Many2One, Recursive)." },
                                "action": { "type": "string", "description": "The action to perform on the relation (e.g., create, update, delete)." }
                            },
                            "required": ["table_to", "type", "label_to", "action"],
                            "additionalProperties": false
                        }
                    }
                },
                "required": ["tableSlug", "xapikey", "fields", "relations"]
            }),
        }
    }

    async fn execute(&self, args: Value) -> ToolResult<Value> {
        let params: UpdateTableParams = parse_args(args)?;
        let path = format!("/v1/table/{}/mcp", params.table_slug);
        let body = json!({
            "fields": params.fields,
            "relations": params.relations,
        });

        self.client
            .send(Method::PUT, &path, Some(&params.xapikey), &[], Some(&body))
            .await
    }
}
