//! Registry types and structures

use crate::auth::NOTION_PROVIDER;
use crate::mcp::{Tool, ToolAnnotations};
use serde_json::{json, Map, Value};

/// Name of the output selector accepted by every Notion tool
pub const FORMAT_PARAM: &str = "format";

/// JSON type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Object,
    Array,
}

impl ParamKind {
    pub fn json_type(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Object => "object",
            ParamKind::Array => "array",
        }
    }
}

/// A single declared tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            description,
        }
    }

    pub const fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            description,
        }
    }
}

/// Service a tool talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Downstream {
    /// Improvado itself, authenticated with the session API key
    Improvado,
    /// Notion, authenticated with a token exchanged per invocation
    Notion,
}

impl Downstream {
    /// Provider to exchange the session key with, if any
    pub fn exchange_provider(self) -> Option<&'static str> {
        match self {
            Downstream::Improvado => None,
            Downstream::Notion => Some(NOTION_PROVIDER),
        }
    }
}

/// Downstream binding of a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ExecuteQuery,
    AppendBlockChildren,
    RetrieveBlock,
    RetrieveBlockChildren,
    DeleteBlock,
    RetrievePage,
    UpdatePageProperties,
    ListAllUsers,
    RetrieveUser,
    RetrieveBotUser,
    CreateDatabase,
    QueryDatabase,
    RetrieveDatabase,
    UpdateDatabase,
    CreateDatabaseItem,
    CreateComment,
    RetrieveComments,
    Search,
}

impl Operation {
    pub fn downstream(self) -> Downstream {
        match self {
            Operation::ExecuteQuery => Downstream::Improvado,
            _ => Downstream::Notion,
        }
    }
}

/// Whether a tool changes anything downstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    ReadOnly,
    Write,
    Destructive,
}

/// Static description of one exposed tool
#[derive(Debug, Clone, Copy)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
    pub operation: Operation,
    pub effect: Effect,
}

impl ToolDescriptor {
    pub fn downstream(&self) -> Downstream {
        self.operation.downstream()
    }

    /// Notion tools accept `format: json | markdown`
    pub fn supports_format(&self) -> bool {
        self.downstream() == Downstream::Notion
    }

    /// Generate the JSON Schema for this tool's arguments
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in self.params {
            let mut schema = json!({
                "type": param.kind.json_type(),
                "description": param.description,
            });
            if param.kind == ParamKind::Integer {
                schema["minimum"] = json!(1);
            }
            properties.insert(param.name.to_string(), schema);
            if param.required {
                required.push(Value::String(param.name.to_string()));
            }
        }

        if self.supports_format() {
            properties.insert(
                FORMAT_PARAM.to_string(),
                json!({
                    "type": "string",
                    "enum": ["json", "markdown"],
                    "default": "json",
                    "description": "Response format: raw JSON or a readable markdown rendering"
                }),
            );
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn to_tool(&self) -> Tool {
        let annotations = match self.effect {
            Effect::ReadOnly => ToolAnnotations::read_only(),
            Effect::Write => ToolAnnotations::writes(false),
            Effect::Destructive => ToolAnnotations::writes(true),
        };
        Tool {
            name: self.name.to_string(),
            description: self.description.to_string(),
            input_schema: self.input_schema(),
            annotations: Some(annotations),
        }
    }
}
