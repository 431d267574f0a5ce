//! HTML pages served by the gateway
//!
//! Plain string templates. Every interpolated value goes through
//! [`escape_html`], including the pending-request token echoed in the
//! consent form (base64 never needs escaping, so the echo stays byte-exact).

use crate::auth::{ConsentScope, PendingAuthorization};

const STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; background: #f5f7fb; color: #1f2933; margin: 0; }
main { max-width: 560px; margin: 48px auto; background: #fff; border-radius: 12px; padding: 32px; box-shadow: 0 4px 16px rgba(0,0,0,.06); }
h1 { font-size: 1.5rem; margin-top: 0; }
ul.scopes { padding-left: 1.2rem; }
label { display: block; margin: 16px 0 6px; font-weight: 600; }
input[type=password] { width: 100%; box-sizing: border-box; padding: 10px; border: 1px solid #cbd2d9; border-radius: 6px; }
.error { background: #fde8e8; color: #9b1c1c; padding: 10px 14px; border-radius: 6px; }
.actions { display: flex; gap: 12px; margin-top: 24px; }
button { padding: 10px 18px; border-radius: 6px; border: 0; cursor: pointer; font-size: 1rem; }
button.approve { background: #2563eb; color: #fff; }
button.reject { background: #e4e7eb; }
"#;

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn layout(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
<main>
{content}
</main>
</body>
</html>"#,
        title = escape_html(title),
        style = STYLE,
        content = content,
    )
}

pub fn render_home() -> String {
    layout(
        "Improvado MCP",
        r#"<h1>Improvado MCP</h1>
<p>This server lets MCP clients query your Improvado data and work with your connected Notion workspace.</p>
<p>Add it to your client as a remote MCP server. You will be asked to authorize access with your Improvado API key.</p>"#,
    )
}

/// The consent screen, optionally with an inline error from a previous attempt
pub fn render_authorize(
    pending: &PendingAuthorization,
    scopes: &[ConsentScope],
    error: Option<&str>,
) -> String {
    let client = escape_html(&pending.request().client_id);
    let scope_items: String = scopes
        .iter()
        .map(|scope| {
            format!(
                "<li><strong>{}</strong>: {}</li>\n",
                escape_html(scope.name),
                escape_html(scope.description)
            )
        })
        .collect();
    let error_block = error
        .map(|message| format!(r#"<p class="error">{}</p>"#, escape_html(message)))
        .unwrap_or_default();

    let content = format!(
        r#"<h1>Authorize {client}</h1>
<p><strong>{client}</strong> is requesting access to:</p>
<ul class="scopes">
{scope_items}</ul>
{error_block}
<form method="post" action="/approve">
<input type="hidden" name="state" value="{state}">
<label for="improvadoApiKey">Improvado API key</label>
<input type="password" id="improvadoApiKey" name="improvadoApiKey" autocomplete="off" placeholder="Paste your Improvado API key">
<div class="actions">
<button type="submit" name="action" value="approve" class="approve">Approve</button>
<button type="submit" name="action" value="reject" class="reject">Reject</button>
</div>
</form>"#,
        client = client,
        scope_items = scope_items,
        error_block = error_block,
        state = escape_html(pending.encoded()),
    );
    layout("Authorize access", &content)
}

pub fn render_rejected(return_to: &str) -> String {
    let content = format!(
        r#"<h1>Authorization rejected</h1>
<p>No access was granted.</p>
<p><a href="{}">Return home</a></p>"#,
        escape_html(return_to)
    );
    layout("Authorization rejected", &content)
}

pub fn render_approved(redirect_to: &str) -> String {
    let target = escape_html(redirect_to);
    let content = format!(
        r#"<h1>Authorization approved</h1>
<p>You can return to your application now.</p>
<p><a href="{target}">Continue</a></p>
<meta http-equiv="refresh" content="2;url={target}">"#,
        target = target
    );
    layout("Authorization approved", &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthRequest, CONSENT_SCOPES};
    use serde_json::Map;

    fn pending() -> PendingAuthorization {
        PendingAuthorization::new(AuthRequest {
            response_type: "code".to_string(),
            client_id: "<script>".to_string(),
            redirect_uri: "https://client.example/cb".to_string(),
            scope: vec![],
            state: String::new(),
            code_challenge: None,
            code_challenge_method: None,
            extra: Map::new(),
        })
        .unwrap()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_authorize_page_embeds_token_and_error() {
        let pending = pending();
        let html = render_authorize(&pending, CONSENT_SCOPES, Some("Invalid API key."));

        assert!(html.contains(&format!(r#"name="state" value="{}""#, pending.encoded())));
        assert!(html.contains("improvado_api"));
        assert!(html.contains(r#"<p class="error">Invalid API key.</p>"#));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_result_pages() {
        assert!(render_rejected("/").contains(r#"<a href="/">"#));
        let html = render_approved("https://client.example/cb?code=1&state=2");
        assert!(html.contains("https://client.example/cb?code=1&amp;state=2"));
    }
}
