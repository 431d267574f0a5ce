//! The fixed set of tools exposed by the gateway

use crate::error::{GatewayError, Result};
use crate::registry::types::{Effect, Operation, ParamSpec, ToolDescriptor};
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;

use crate::registry::types::ParamKind::{Array, Integer, Object, String as Str};

const START_CURSOR: ParamSpec = ParamSpec::optional(
    "start_cursor",
    Str,
    "Pagination cursor returned as next_cursor by a previous call",
);
const PAGE_SIZE: ParamSpec = ParamSpec::optional(
    "page_size",
    Integer,
    "Number of results to return (max 100)",
);

pub static TOOLS: &[ToolDescriptor] = &[
    ToolDescriptor {
        name: "executeQuery",
        description: "Execute a SQL query against your Improvado data",
        params: &[
            ParamSpec::required("query", Str, "SQL query to execute"),
            ParamSpec::optional(
                "params",
                Array,
                "Parameters to substitute in the query (optional)",
            ),
        ],
        operation: Operation::ExecuteQuery,
        effect: Effect::ReadOnly,
    },
    // Blocks
    ToolDescriptor {
        name: "notion_append_block_children",
        description: "Append new children blocks to a parent block in Notion",
        params: &[
            ParamSpec::required("block_id", Str, "ID of the parent block or page"),
            ParamSpec::required("children", Array, "Array of block objects to append"),
            ParamSpec::optional("after", Str, "ID of the existing block to append after"),
        ],
        operation: Operation::AppendBlockChildren,
        effect: Effect::Write,
    },
    ToolDescriptor {
        name: "notion_retrieve_block",
        description: "Retrieve a block from Notion",
        params: &[ParamSpec::required("block_id", Str, "ID of the block to retrieve")],
        operation: Operation::RetrieveBlock,
        effect: Effect::ReadOnly,
    },
    ToolDescriptor {
        name: "notion_retrieve_block_children",
        description: "Retrieve the children of a block or page",
        params: &[
            ParamSpec::required("block_id", Str, "ID of the block or page"),
            START_CURSOR,
            PAGE_SIZE,
        ],
        operation: Operation::RetrieveBlockChildren,
        effect: Effect::ReadOnly,
    },
    ToolDescriptor {
        name: "notion_delete_block",
        description: "Delete (archive) a block in Notion",
        params: &[ParamSpec::required("block_id", Str, "ID of the block to delete")],
        operation: Operation::DeleteBlock,
        effect: Effect::Destructive,
    },
    // Pages
    ToolDescriptor {
        name: "notion_retrieve_page",
        description: "Retrieve a page and its properties from Notion",
        params: &[ParamSpec::required("page_id", Str, "ID of the page to retrieve")],
        operation: Operation::RetrievePage,
        effect: Effect::ReadOnly,
    },
    ToolDescriptor {
        name: "notion_update_page_properties",
        description: "Update the properties of a Notion page",
        params: &[
            ParamSpec::required("page_id", Str, "ID of the page to update"),
            ParamSpec::required("properties", Object, "Property values keyed by property name"),
        ],
        operation: Operation::UpdatePageProperties,
        effect: Effect::Write,
    },
    // Users
    ToolDescriptor {
        name: "notion_list_all_users",
        description: "List all users in the Notion workspace",
        params: &[START_CURSOR, PAGE_SIZE],
        operation: Operation::ListAllUsers,
        effect: Effect::ReadOnly,
    },
    ToolDescriptor {
        name: "notion_retrieve_user",
        description: "Retrieve a specific user from Notion",
        params: &[ParamSpec::required("user_id", Str, "ID of the user")],
        operation: Operation::RetrieveUser,
        effect: Effect::ReadOnly,
    },
    ToolDescriptor {
        name: "notion_retrieve_bot_user",
        description: "Retrieve the bot user associated with the Notion token",
        params: &[ParamSpec::required(
            "random_string",
            Str,
            "Dummy parameter for clients that cannot call tools without arguments",
        )],
        operation: Operation::RetrieveBotUser,
        effect: Effect::ReadOnly,
    },
    // Databases
    ToolDescriptor {
        name: "notion_create_database",
        description: "Create a database in Notion",
        params: &[
            ParamSpec::required("parent", Object, "Parent object, e.g. {\"type\": \"page_id\", \"page_id\": \"...\"}"),
            ParamSpec::required("title", Array, "Database title as an array of rich text objects"),
            ParamSpec::required("properties", Object, "Property schema of the database"),
        ],
        operation: Operation::CreateDatabase,
        effect: Effect::Write,
    },
    ToolDescriptor {
        name: "notion_query_database",
        description: "Query a Notion database with optional filter and sorts",
        params: &[
            ParamSpec::required("database_id", Str, "ID of the database to query"),
            ParamSpec::optional("filter", Object, "Filter conditions"),
            ParamSpec::optional("sorts", Array, "Sort conditions"),
            START_CURSOR,
            PAGE_SIZE,
        ],
        operation: Operation::QueryDatabase,
        effect: Effect::ReadOnly,
    },
    ToolDescriptor {
        name: "notion_retrieve_database",
        description: "Retrieve a database's schema and metadata from Notion",
        params: &[ParamSpec::required("database_id", Str, "ID of the database")],
        operation: Operation::RetrieveDatabase,
        effect: Effect::ReadOnly,
    },
    ToolDescriptor {
        name: "notion_update_database",
        description: "Update a Notion database's title, description or properties",
        params: &[
            ParamSpec::required("database_id", Str, "ID of the database to update"),
            ParamSpec::optional("title", Array, "New title as an array of rich text objects"),
            ParamSpec::optional("description", Array, "New description as an array of rich text objects"),
            ParamSpec::optional("properties", Object, "Property schema changes"),
        ],
        operation: Operation::UpdateDatabase,
        effect: Effect::Write,
    },
    ToolDescriptor {
        name: "notion_create_database_item",
        description: "Create a new item (page) in a Notion database",
        params: &[
            ParamSpec::required("database_id", Str, "ID of the database"),
            ParamSpec::required("properties", Object, "Property values of the new item"),
        ],
        operation: Operation::CreateDatabaseItem,
        effect: Effect::Write,
    },
    // Comments
    ToolDescriptor {
        name: "notion_create_comment",
        description: "Create a comment on a page or in an existing discussion",
        params: &[
            ParamSpec::required("rich_text", Array, "Comment content as an array of rich text objects"),
            ParamSpec::optional("parent", Object, "Parent page, e.g. {\"page_id\": \"...\"}"),
            ParamSpec::optional("discussion_id", Str, "ID of an existing discussion thread"),
        ],
        operation: Operation::CreateComment,
        effect: Effect::Write,
    },
    ToolDescriptor {
        name: "notion_retrieve_comments",
        description: "Retrieve unresolved comments on a block or page",
        params: &[
            ParamSpec::required("block_id", Str, "ID of the block or page"),
            START_CURSOR,
            PAGE_SIZE,
        ],
        operation: Operation::RetrieveComments,
        effect: Effect::ReadOnly,
    },
    // Search
    ToolDescriptor {
        name: "notion_search",
        description: "Search pages and databases shared with the integration by title",
        params: &[
            ParamSpec::optional("query", Str, "Text to search for in titles"),
            ParamSpec::optional("filter", Object, "Limit results, e.g. {\"property\": \"object\", \"value\": \"page\"}"),
            ParamSpec::optional("sort", Object, "Sort order, e.g. {\"direction\": \"descending\", \"timestamp\": \"last_edited_time\"}"),
            START_CURSOR,
            PAGE_SIZE,
        ],
        operation: Operation::Search,
        effect: Effect::ReadOnly,
    },
];

static SCHEMAS: Lazy<HashMap<&'static str, std::result::Result<JSONSchema, String>>> =
    Lazy::new(|| {
        TOOLS
            .iter()
            .map(|tool| {
                let schema = tool.input_schema();
                let compiled = JSONSchema::compile(&schema).map_err(|e| e.to_string());
                (tool.name, compiled)
            })
            .collect()
    });

pub fn all() -> &'static [ToolDescriptor] {
    TOOLS
}

pub fn find(name: &str) -> Option<&'static ToolDescriptor> {
    TOOLS.iter().find(|tool| tool.name == name)
}

/// Resolve a tool by name and check the arguments against its schema
pub fn resolve(name: &str, arguments: &Value) -> Result<&'static ToolDescriptor> {
    let descriptor = find(name).ok_or_else(|| GatewayError::unknown_tool(name))?;

    let schema = match SCHEMAS.get(descriptor.name) {
        Some(Ok(schema)) => schema,
        Some(Err(e)) => {
            return Err(GatewayError::config(format!(
                "Schema for tool '{}' failed to compile: {}",
                name, e
            )))
        }
        None => return Err(GatewayError::unknown_tool(name)),
    };

    if let Err(errors) = schema.validate(arguments) {
        let messages: Vec<String> = errors.map(|e| format!("  - {}", e)).collect();
        return Err(GatewayError::validation(format!(
            "Invalid arguments for tool '{}':\n{}",
            name,
            messages.join("\n")
        )));
    }

    Ok(descriptor)
}
