//! Markdown rendering of Notion API responses
//!
//! Recognises the Notion object kinds (`list`, `page`, `database`, `block`,
//! `user`, `comment`) by their `object` field. Anything else, including
//! Improvado payloads, falls back to a fenced JSON block.

use serde_json::Value;

pub fn to_markdown(value: &Value) -> String {
    match object_kind(value) {
        Some("list") => render_list(value),
        Some("page") => render_page(value),
        Some("database") => render_database(value),
        Some("block") => render_block(value),
        Some("user") => render_user(value),
        Some("comment") => render_comment(value),
        _ => fenced_json(value),
    }
}

fn object_kind(value: &Value) -> Option<&str> {
    value.get("object").and_then(Value::as_str)
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

pub fn fenced_json(value: &Value) -> String {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    format!("```json\n{}\n```", pretty)
}

/// Concatenated `plain_text` of a rich text array
fn plain_text(rich_text: Option<&Value>) -> String {
    rich_text
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| str_field(item, "plain_text"))
                .collect::<String>()
        })
        .unwrap_or_default()
}

fn render_list(value: &Value) -> String {
    let results = value
        .get("results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let all_blocks = results.iter().all(|r| object_kind(r) == Some("block"));
    let separator = if all_blocks { "\n" } else { "\n\n---\n\n" };

    let mut out = if results.is_empty() {
        "_No results._".to_string()
    } else {
        results.iter().map(to_markdown).collect::<Vec<_>>().join(separator)
    };

    if value.get("has_more").and_then(Value::as_bool) == Some(true) {
        if let Some(cursor) = str_field(value, "next_cursor") {
            out.push_str(&format!(
                "\n\n_More results available. Use start_cursor: `{}`_",
                cursor
            ));
        }
    }
    out
}

fn page_title(page: &Value) -> Option<String> {
    page.get("properties")?
        .as_object()?
        .values()
        .find(|prop| str_field(prop, "type") == Some("title"))
        .map(|prop| plain_text(prop.get("title")))
}

fn render_page(page: &Value) -> String {
    let title = page_title(page)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());
    let mut out = format!("# {}\n", title);

    if let Some(url) = str_field(page, "url") {
        out.push_str(&format!("\n[Open in Notion]({})\n", url));
    }

    if let Some(properties) = page.get("properties").and_then(Value::as_object) {
        let lines: Vec<String> = properties
            .iter()
            .filter(|(_, prop)| str_field(prop, "type") != Some("title"))
            .map(|(name, prop)| format!("- **{}**: {}", name, property_value(prop)))
            .collect();
        if !lines.is_empty() {
            out.push_str("\n## Properties\n\n");
            out.push_str(&lines.join("\n"));
            out.push('\n');
        }
    }
    out
}

/// Human readable value of a page property
fn property_value(prop: &Value) -> String {
    let kind = str_field(prop, "type").unwrap_or_default();
    let inner = prop.get(kind);

    let rendered = match kind {
        "title" | "rich_text" => Some(plain_text(inner)),
        "select" | "status" => inner.and_then(|v| str_field(v, "name")).map(str::to_string),
        "multi_select" => inner.and_then(Value::as_array).map(|options| {
            options
                .iter()
                .filter_map(|o| str_field(o, "name"))
                .collect::<Vec<_>>()
                .join(", ")
        }),
        "date" => inner.and_then(|d| {
            let start = str_field(d, "start")?;
            Some(match str_field(d, "end") {
                Some(end) => format!("{} → {}", start, end),
                None => start.to_string(),
            })
        }),
        "checkbox" => inner
            .and_then(Value::as_bool)
            .map(|checked| (if checked { "Yes" } else { "No" }).to_string()),
        "people" => inner.and_then(Value::as_array).map(|people| {
            people
                .iter()
                .map(|p| str_field(p, "name").unwrap_or("Unknown user"))
                .collect::<Vec<_>>()
                .join(", ")
        }),
        "relation" => inner
            .and_then(Value::as_array)
            .map(|related| format!("{} related page(s)", related.len())),
        "formula" => inner.map(|f| {
            let formula_kind = str_field(f, "type").unwrap_or_default();
            scalar(f.get(formula_kind))
        }),
        _ => inner.map(|v| scalar(Some(v))),
    };

    rendered
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "_empty_".to_string())
}

fn scalar(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn render_database(database: &Value) -> String {
    let title = plain_text(database.get("title"));
    let title = if title.is_empty() { "Untitled database".to_string() } else { title };
    let mut out = format!("# {}\n", title);

    let description = plain_text(database.get("description"));
    if !description.is_empty() {
        out.push_str(&format!("\n{}\n", description));
    }
    if let Some(url) = str_field(database, "url") {
        out.push_str(&format!("\n[Open in Notion]({})\n", url));
    }

    if let Some(properties) = database.get("properties").and_then(Value::as_object) {
        out.push_str("\n## Properties\n\n");
        let lines: Vec<String> = properties
            .iter()
            .map(|(name, prop)| {
                format!("- **{}** ({})", name, str_field(prop, "type").unwrap_or("unknown"))
            })
            .collect();
        out.push_str(&lines.join("\n"));
        out.push('\n');
    }
    out
}

fn render_block(block: &Value) -> String {
    let kind = str_field(block, "type").unwrap_or_default();
    let inner = block.get(kind);
    let text = || plain_text(inner.and_then(|b| b.get("rich_text")));

    match kind {
        "paragraph" => text(),
        "heading_1" => format!("# {}", text()),
        "heading_2" => format!("## {}", text()),
        "heading_3" => format!("### {}", text()),
        "bulleted_list_item" => format!("- {}", text()),
        "numbered_list_item" => format!("1. {}", text()),
        "to_do" => {
            let checked = inner
                .and_then(|b| b.get("checked"))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            format!("- [{}] {}", if checked { "x" } else { " " }, text())
        }
        "toggle" => format!("<details><summary>{}</summary></details>", text()),
        "quote" => format!("> {}", text()),
        "callout" => format!("> **Note:** {}", text()),
        "code" => {
            let language = inner.and_then(|b| str_field(b, "language")).unwrap_or("");
            format!("```{}\n{}\n```", language, text())
        }
        "divider" => "---".to_string(),
        "child_page" | "child_database" => {
            let title = inner.and_then(|b| str_field(b, "title")).unwrap_or("Untitled");
            let label = if kind == "child_page" { "Page" } else { "Database" };
            format!("**{}:** {}", label, title)
        }
        "bookmark" | "embed" | "link_preview" => {
            let url = inner.and_then(|b| str_field(b, "url")).unwrap_or("");
            format!("<{}>", url)
        }
        "" => fenced_json(block),
        other => format!("_[{} block]_", other),
    }
}

fn render_user(user: &Value) -> String {
    let name = str_field(user, "name").unwrap_or("Unknown user");
    let kind = str_field(user, "type").unwrap_or("user");
    let mut out = format!("**{}** ({})", name, kind);

    if let Some(email) = user.get("person").and_then(|p| str_field(p, "email")) {
        out.push_str(&format!(" - {}", email));
    }
    if let Some(id) = str_field(user, "id") {
        out.push_str(&format!(" `{}`", id));
    }
    out
}

fn render_comment(comment: &Value) -> String {
    let text = plain_text(comment.get("rich_text"));
    match str_field(comment, "created_time") {
        Some(created) => format!("{}\n_{}_", text, created),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rich(text: &str) -> Value {
        json!([{ "type": "text", "plain_text": text }])
    }

    #[test]
    fn test_unknown_shapes_fall_back_to_fenced_json() {
        let value = json!({ "rows": [1, 2] });
        let rendered = to_markdown(&value);
        assert!(rendered.starts_with("```json\n"));
        assert!(rendered.ends_with("\n```"));
        assert!(rendered.contains("\"rows\""));
    }

    #[test]
    fn test_page_rendering() {
        let page = json!({
            "object": "page",
            "url": "https://notion.so/p1",
            "properties": {
                "Name": { "type": "title", "title": rich("Roadmap") },
                "Status": { "type": "status", "status": { "name": "In progress" } },
                "Done": { "type": "checkbox", "checkbox": false },
                "Tags": { "type": "multi_select", "multi_select": [{ "name": "a" }, { "name": "b" }] }
            }
        });
        let rendered = to_markdown(&page);
        assert!(rendered.starts_with("# Roadmap\n"));
        assert!(rendered.contains("[Open in Notion](https://notion.so/p1)"));
        assert!(rendered.contains("- **Status**: In progress"));
        assert!(rendered.contains("- **Done**: No"));
        assert!(rendered.contains("- **Tags**: a, b"));
    }

    #[test]
    fn test_block_list_with_cursor() {
        let list = json!({
            "object": "list",
            "results": [
                { "object": "block", "type": "heading_2", "heading_2": { "rich_text": rich("Intro") } },
                { "object": "block", "type": "to_do", "to_do": { "rich_text": rich("Ship"), "checked": true } },
                { "object": "block", "type": "divider", "divider": {} }
            ],
            "has_more": true,
            "next_cursor": "c2"
        });
        assert_eq!(
            to_markdown(&list),
            "## Intro\n- [x] Ship\n---\n\n_More results available. Use start_cursor: `c2`_"
        );
    }

    #[test]
    fn test_empty_list() {
        let list = json!({ "object": "list", "results": [], "has_more": false });
        assert_eq!(to_markdown(&list), "_No results._");
    }

    #[test]
    fn test_database_user_comment() {
        let database = json!({
            "object": "database",
            "title": rich("Tasks"),
            "properties": { "Name": { "type": "title" }, "Due": { "type": "date" } }
        });
        let rendered = to_markdown(&database);
        assert!(rendered.starts_with("# Tasks\n"));
        assert!(rendered.contains("- **Due** (date)"));

        let user = json!({
            "object": "user",
            "id": "u1",
            "type": "person",
            "name": "Ada",
            "person": { "email": "ada@example.com" }
        });
        assert_eq!(to_markdown(&user), "**Ada** (person) - ada@example.com `u1`");

        let comment = json!({
            "object": "comment",
            "rich_text": rich("Looks good"),
            "created_time": "2024-01-01T00:00:00.000Z"
        });
        assert_eq!(to_markdown(&comment), "Looks good\n_2024-01-01T00:00:00.000Z_");
    }
}
