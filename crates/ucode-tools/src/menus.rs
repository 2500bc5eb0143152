//! Tools for ucode menus: create_menu, get_menus.

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::UcodeClient;
use crate::tool::{parse_args, Tool};
use crate::types::{ToolResult, ToolSpec};

#[derive(Debug, Deserialize, Serialize)]
struct CreateMenuParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
    attributes: Value,
    parent_id: String,
    #[serde(rename = "type")]
    menu_type: String,
    label: String,
    #[serde(skip_serializing)]
    x_api_key: String,
}

pub struct CreateMenu {
    client: UcodeClient,
}

impl CreateMenu {
    pub fn new(client: UcodeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CreateMenu {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "create_menu".to_string(),
            description: "Create a new menu in Ucode API.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "icon": { "type": "string", "description": "The icon for the menu." },
                    "attributes": {
                        "type": "object",
                        "properties": {
                            "label": { "type": "string", "description": "The label for the menu." },
                            "label_en": { "type": "string", "description": "The English label for the menu." }
                        },
                        "required": ["label", "label_en"]
                    },
                    "parent_id": { "type": "string", "description": "The ID of the parent menu." },
                    "type": { "type": "string", "description": "The type of the menu (e.g., \"FOLDER\")." },
                    "label": { "type": "string", "description": "The label for the menu." },
                    "x_api_key": { "type": "string", "description": "The X-API-KEY of the environment." }
                },
                "required": ["parent_id", "type", "label", "attributes", "x_api_key"]
            }),
        }
    }

    async fn execute(&self, args: Value) -> ToolResult<Value> {
        let params: CreateMenuParams = parse_args(args)?;
        let body = serde_json::to_value(&params)?;

        self.client
            .send(Method::POST, "/v2/menus", Some(&params.x_api_key), &[], Some(&body))
            .await
    }
}

#[derive(Debug, Deserialize)]
struct GetMenusParams {
    project_id: String,
    parent_id: String,
    x_api_key: String,
}

pub struct GetMenus {
    client: UcodeClient,
}

impl GetMenus {
    pub fn new(client: UcodeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetMenus {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "get_menus".to_string(),
            description: "Retrieve a list of menus for a specific project and parent menu."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "project_id": { "type": "string", "description": "The UUID of the project." },
                    "parent_id": { "type": "string", "description": "The UUID of the parent menu/folder." },
                    "x_api_key": { "type": "string", "description": "The X-API-KEY for authentication." }
                },
                "required": ["project_id", "parent_id", "x_api_key"]
            }),
        }
    }

    async fn execute(&self, args: Value) -> ToolResult<Value> {
        let params: GetMenusParams = parse_args(args)?;
        let query = [
            ("project-id", params.project_id.as_str()),
            ("parent_id", params.parent_id.as_str()),
        ];

        self.client
            .send(Method::GET, "/v3/menus", Some(&params.x_api_key), &query, None)
            .await
    }
}
