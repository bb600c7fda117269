//! Template rendering for dynamic mock bodies.
//!
//! String leaves of a mock body are Handlebars templates rendered against the
//! request context (`method`, `url`, `path`, `query`, `headers`, `body`).

use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderError, RenderErrorReason,
};
use serde_json::Value;

use crate::http::body::RequestContext;

/// Handlebars registry with the mock helpers installed.
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();

        handlebars.register_helper("uuid", Box::new(uuid_helper));
        handlebars.register_helper("now", Box::new(now_helper));
        handlebars.register_helper("random", Box::new(random_helper));
        handlebars.register_helper("default", Box::new(default_helper));
        handlebars.register_helper("upper", Box::new(upper_helper));
        handlebars.register_helper("lower", Box::new(lower_helper));

        // Output is JSON, not HTML.
        handlebars.register_escape_fn(handlebars::no_escape);

        Self { handlebars }
    }

    /// Render one template string.
    pub fn render(&self, template: &str, request: &RequestContext) -> Result<String, RenderError> {
        self.handlebars.render_template(template, request)
    }

    /// Render every templated string inside a JSON value.
    pub fn render_value(&self, value: &Value, request: &RequestContext) -> Result<Value, RenderError> {
        match value {
            Value::String(s) if s.contains("{{") => Ok(Value::String(self.render(s, request)?)),
            Value::Array(items) => items
                .iter()
                .map(|item| self.render_value(item, request))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(fields) => {
                let mut rendered = serde_json::Map::with_capacity(fields.len());
                for (key, field) in fields {
                    rendered.insert(key.clone(), self.render_value(field, request)?);
                }
                Ok(Value::Object(rendered))
            }
            other => Ok(other.clone()),
        }
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine").finish_non_exhaustive()
    }
}

fn str_param<'a>(h: &'a Helper, index: usize) -> Option<&'a str> {
    h.param(index).and_then(|p| p.value().as_str())
}

fn uuid_helper(
    _: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&uuid::Uuid::new_v4().to_string())?;
    Ok(())
}

fn now_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    use std::fmt::Write;

    let format = str_param(h, 0).unwrap_or("%Y-%m-%dT%H:%M:%S%.3fZ");
    let mut rendered = String::new();
    // Unknown specifiers surface as fmt errors here instead of panicking in `to_string`.
    write!(rendered, "{}", chrono::Utc::now().format(format))
        .map_err(|_| RenderErrorReason::Other(format!("invalid date format '{format}'")))?;
    out.write(&rendered)?;
    Ok(())
}

fn random_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    use rand::Rng;

    let min = h.param(0).and_then(|p| p.value().as_i64()).unwrap_or(0);
    let max = h.param(1).and_then(|p| p.value().as_i64()).unwrap_or(100);
    let (low, high) = if min <= max { (min, max) } else { (max, min) };

    let value = rand::thread_rng().gen_range(low..=high);
    out.write(&value.to_string())?;
    Ok(())
}

fn default_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let fallback = str_param(h, 1).unwrap_or("");
    match h.param(0).map(|p| p.value()) {
        Some(Value::String(s)) if !s.is_empty() => out.write(s)?,
        Some(Value::Null) | Some(Value::String(_)) | None => out.write(fallback)?,
        Some(other) => out.write(&other.to_string())?,
    }
    Ok(())
}

fn upper_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&str_param(h, 0).unwrap_or("").to_uppercase())?;
    Ok(())
}

fn lower_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&str_param(h, 0).unwrap_or("").to_lowercase())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use serde_json::json;

    fn request(uri: &str, body: &[u8]) -> RequestContext {
        let (parts, _) = Request::builder()
            .method("POST")
            .uri(uri)
            .header("user-agent", "test-client")
            .body(())
            .unwrap()
            .into_parts();
        RequestContext::new(&parts, body.to_vec())
    }

    #[test]
    fn renders_request_fields() {
        let engine = TemplateEngine::new();
        let req = request("/api/users?page=3", b"");
        let out = engine
            .render("{{method}} {{path}} page={{query.page}} ua={{headers.user-agent}}", &req)
            .unwrap();
        assert_eq!(out, "POST /api/users page=3 ua=test-client");
    }

    #[test]
    fn json_body_fields_are_addressable() {
        let engine = TemplateEngine::new();
        let req = request("/api/users", br#"{"name":"Ada"}"#);
        assert_eq!(engine.render("Hello {{body.name}}", &req).unwrap(), "Hello Ada");
    }

    #[test]
    fn raw_text_body_renders_as_is() {
        let engine = TemplateEngine::new();
        let req = request("/api/users", b"not json");
        assert_eq!(engine.render("got {{body}}", &req).unwrap(), "got not json");
    }

    #[test]
    fn helpers() {
        let engine = TemplateEngine::new();
        let req = request("/api/users?name=Ada", b"");

        let id = engine.render("{{uuid}}", &req).unwrap();
        assert_eq!(id.len(), 36);

        assert_eq!(
            engine.render("{{default query.missing \"none\"}}", &req).unwrap(),
            "none"
        );
        assert_eq!(
            engine.render("{{upper query.name}} {{lower query.name}}", &req).unwrap(),
            "ADA ada"
        );

        let n: i64 = engine.render("{{random 5 5}}", &req).unwrap().parse().unwrap();
        assert_eq!(n, 5);
    }

    #[test]
    fn bad_date_format_is_a_render_error() {
        let engine = TemplateEngine::new();
        let req = request("/api/users", b"");
        assert!(engine.render("{{now \"%Q\"}}", &req).is_err());
        assert_eq!(engine.render("{{now \"%Y\"}}", &req).unwrap().len(), 4);
    }

    #[test]
    fn render_value_walks_nested_json() {
        let engine = TemplateEngine::new();
        let req = request("/api/users/7", b"");
        let value = json!({
            "path": "{{path}}",
            "items": [1, "{{method}}", {"static": "plain"}],
            "flag": true
        });

        let rendered = engine.render_value(&value, &req).unwrap();
        assert_eq!(
            rendered,
            json!({
                "path": "/api/users/7",
                "items": [1, "POST", {"static": "plain"}],
                "flag": true
            })
        );
    }
}
