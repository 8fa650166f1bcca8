//! Typed prompts with structured output
//!
//! A [`Prompt`] pairs a template with a declared input shape and a declared
//! output shape. Executing it renders the template from the input, asks the
//! provider for JSON matching the output schema, and checks the reply
//! against that schema before deserializing it.
//!
//! Template placeholders follow the mustache convention: `{{{name}}}` is
//! substituted verbatim and `{{name}}` is HTML-escaped. Values come from the
//! input plus any fixed variables set with [`Prompt::with_var`]; substituted
//! text is never scanned for further placeholders.

use jsonschema::JSONSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::marker::PhantomData;

use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, LlmRequest};

pub struct Prompt<I, O> {
    name: String,
    template: String,
    vars: Map<String, Value>,
    input_validator: JSONSchema,
    output_schema: Value,
    output_validator: JSONSchema,
    system_prompt: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    _shape: PhantomData<fn(&I) -> O>,
}

impl<I, O> std::fmt::Debug for Prompt<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prompt")
            .field("name", &self.name)
            .field("template_len", &self.template.len())
            .field("vars", &self.vars.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn compile(prompt: &str, which: &str, schema: &Value) -> Result<JSONSchema> {
    JSONSchema::compile(schema).map_err(|e| {
        LlmError::ConfigError(format!("{}: invalid {} schema: {}", prompt, which, e))
    })
}

/// Every violation of `validator` by `value`, joined into one message
fn check(validator: &JSONSchema, value: &Value) -> std::result::Result<(), String> {
    validator.validate(value).map_err(|errors| {
        errors
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{}: {}", path, e)
                }
            })
            .collect::<Vec<_>>()
            .join("; ")
    })
}

impl<I, O> Prompt<I, O>
where
    I: Serialize,
    O: DeserializeOwned,
{
    /// Fails if either schema isn't a valid JSON Schema
    pub fn new(
        name: impl Into<String>,
        template: impl Into<String>,
        input_schema: Value,
        output_schema: Value,
    ) -> Result<Self> {
        let name = name.into();
        let input_validator = compile(&name, "input", &input_schema)?;
        let output_validator = compile(&name, "output", &output_schema)?;

        Ok(Self {
            name,
            template: template.into(),
            vars: Map::new(),
            input_validator,
            output_schema,
            output_validator,
            system_prompt: None,
            max_tokens: None,
            temperature: None,
            _shape: PhantomData,
        })
    }

    /// Fixed template variable. Input fields with the same name take precedence.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn output_schema(&self) -> &Value {
        &self.output_schema
    }

    /// Render the template for `input`
    pub fn render(&self, input: &I) -> Result<String> {
        let value = serde_json::to_value(input).map_err(|e| {
            LlmError::Template(format!("{}: cannot serialize input: {}", self.name, e))
        })?;
        check(&self.input_validator, &value)
            .map_err(|e| LlmError::Template(format!("{}: invalid input: {}", self.name, e)))?;

        let Value::Object(input_fields) = value else {
            return Err(LlmError::Template(format!(
                "{}: input must serialize to an object",
                self.name
            )));
        };

        let mut fields = self.vars.clone();
        fields.extend(input_fields);
        render_template(&self.template, &fields)
    }

    /// Run the prompt against `provider`.
    ///
    /// Returns `Ok(None)` when the provider answered but produced no output
    /// (an empty reply or a JSON `null`). Provider errors are passed through
    /// as-is; replies that don't match the output shape are
    /// [`LlmError::SchemaValidation`].
    pub async fn execute(&self, provider: &dyn LlmProvider, input: &I) -> Result<Option<O>> {
        let request = LlmRequest {
            prompt: self.render(input)?,
            system_prompt: self.system_prompt.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            json_schema: Some(self.output_schema.clone()),
        };

        log::debug!("Executing prompt '{}' with {}", self.name, provider.name());

        let response = provider.complete(request).await?;

        if let Some(usage) = &response.usage {
            log::debug!(
                "Tokens: {} in, {} out",
                usage.input_tokens, usage.output_tokens
            );
        }

        self.parse_output(&response.content)
    }

    /// Parse and check a raw model reply
    pub fn parse_output(&self, content: &str) -> Result<Option<O>> {
        let body = strip_code_fence(content);
        if body.is_empty() {
            return Ok(None);
        }

        let value: Value = serde_json::from_str(body).map_err(|e| {
            LlmError::SchemaValidation(format!("{}: reply is not valid JSON: {}", self.name, e))
        })?;
        if value.is_null() {
            return Ok(None);
        }

        check(&self.output_validator, &value)
            .map_err(|e| LlmError::SchemaValidation(format!("{}: {}", self.name, e)))?;

        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| LlmError::SchemaValidation(format!("{}: {}", self.name, e)))
    }
}

/// Replace `{{name}}` and `{{{name}}}` placeholders with values from `fields`
pub fn render_template(template: &str, fields: &Map<String, Value>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start..];

        let (raw, open, close) = if after.starts_with("{{{") {
            (true, 3, "}}}")
        } else {
            (false, 2, "}}")
        };

        let end = after[open..].find(close).ok_or_else(|| {
            LlmError::Template(format!(
                "unterminated placeholder at byte {}",
                template.len() - after.len()
            ))
        })?;
        let key = after[open..open + end].trim();

        let value = fields
            .get(key)
            .ok_or_else(|| LlmError::Template(format!("unknown placeholder '{}'", key)))?;
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        if raw {
            out.push_str(&text);
        } else {
            out.push_str(&escape_html(&text));
        }

        rest = &after[open + end + close.len()..];
    }

    out.push_str(rest);
    Ok(out)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '`' => out.push_str("&#x60;"),
            '=' => out.push_str("&#x3D;"),
            c => out.push(c),
        }
    }
    out
}

/// Models sometimes wrap JSON in a Markdown fence even when asked not to
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|s| s.strip_suffix("```"))
    else {
        return trimmed;
    };

    // Info string ("json"), with or without a newline before the body
    let tag_end = inner
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(inner.len());
    let (tag, body) = inner.split_at(tag_end);
    let tagged = !tag.is_empty()
        && (body.is_empty() || body.starts_with(char::is_whitespace) || body.starts_with(['{', '[']));

    if tagged { body.trim() } else { inner.trim() }
}
