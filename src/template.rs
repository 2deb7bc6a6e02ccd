//! Templates rendered once their inputs have resolved.
//!
//! Variables may be plain values or [Output]s; the template is compiled immediately but only executed once every
//! output it was given has resolved, much like `format!` over values that are not known yet.
//!
//! ```
//! use deferkit::{template::{self, TemplateVar}, Output};
//!
//! let bucket_arn = Output::known("arn:aws:s3:::my-bucket".to_string());
//! let rendered = template::render_json(
//!     [("BucketArn", TemplateVar::from(bucket_arn)), ("IdentityArn", TemplateVar::from("my-identity"))],
//!     r#"{"Principal": {"AWS": "{{ IdentityArn }}"}, "Resource": "{{ BucketArn }}/*"}"#,
//! );
//!
//! assert_eq!(
//!     futures::executor::block_on(rendered).unwrap(),
//!     r#"{"Principal": {"AWS": "my-identity"}, "Resource": "arn:aws:s3:::my-bucket/*"}"#
//! );
//! ```
//!
//! Templates use [Handlebars](https://handlebarsjs.com/) syntax in strict mode: referring to a variable or field
//! that does not exist is an error rather than an empty string. Output is never HTML-escaped.

use {
    crate::{DeferError, Output},
    derive_builder::Builder,
    handlebars::Handlebars,
    log::{debug, trace},
    serde::de::IgnoredAny,
    serde_json::{error::Category, Map, Value},
    std::sync::Arc,
};

/// Options controlling how a template is compiled and rendered.
#[derive(Builder, Clone, Debug, Eq, PartialEq)]
pub struct RenderOptions {
    /// Name of the template, used in error messages.
    #[builder(setter(into), default = "\"template\".to_string()")]
    name: String,

    /// Fail with [DeferError::InvalidJson] if the rendered text does not parse as JSON.
    #[builder(default)]
    validate_json: bool,
}

impl RenderOptions {
    #[inline]
    pub fn builder() -> RenderOptionsBuilder {
        RenderOptionsBuilder::default()
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn validate_json(&self) -> bool {
        self.validate_json
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            name: "template".to_string(),
            validate_json: false,
        }
    }
}

/// A template variable: a value known now, or one that will be known once an output resolves.
#[derive(Clone, Debug)]
pub enum TemplateVar {
    Known(Value),
    Deferred(Output<Value>),
}

impl TemplateVar {
    fn resolve(&self) -> Output<Value> {
        match self {
            Self::Known(v) => Output::known(v.clone()),
            Self::Deferred(o) => o.clone(),
        }
    }
}

impl From<Value> for TemplateVar {
    fn from(v: Value) -> Self {
        Self::Known(v)
    }
}

impl From<&str> for TemplateVar {
    fn from(s: &str) -> Self {
        Self::Known(Value::from(s))
    }
}

impl From<String> for TemplateVar {
    fn from(s: String) -> Self {
        Self::Known(Value::from(s))
    }
}

impl From<bool> for TemplateVar {
    fn from(b: bool) -> Self {
        Self::Known(Value::from(b))
    }
}

impl From<i64> for TemplateVar {
    fn from(n: i64) -> Self {
        Self::Known(Value::from(n))
    }
}

impl From<Vec<String>> for TemplateVar {
    fn from(l: Vec<String>) -> Self {
        Self::Known(Value::from(l))
    }
}

impl From<Output<Value>> for TemplateVar {
    fn from(o: Output<Value>) -> Self {
        Self::Deferred(o)
    }
}

impl From<Output<String>> for TemplateVar {
    fn from(o: Output<String>) -> Self {
        Self::Deferred(o.apply(Value::from))
    }
}

impl From<Output<Vec<String>>> for TemplateVar {
    fn from(o: Output<Vec<String>>) -> Self {
        Self::Deferred(o.apply(Value::from))
    }
}

/// A compiled template that can be rendered against any number of variable sets.
#[derive(Clone)]
pub struct Template {
    name: String,
    validate_json: bool,
    registry: Arc<Handlebars<'static>>,
}

impl Template {
    /// Compile `text`. Syntax errors are reported as [DeferError::TemplateCompile].
    pub fn compile(text: &str, options: &RenderOptions) -> Result<Self, DeferError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);

        if let Err(e) = registry.register_template_string(&options.name, text) {
            debug!("Failed to compile template {:?}: {}", options.name, e);
            return Err(DeferError::TemplateCompile(format!("template {:?}: {}", options.name, e)));
        }

        Ok(Self {
            name: options.name.clone(),
            validate_json: options.validate_json,
            registry: Arc::new(registry),
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render the template once every variable has resolved.
    pub fn render<I, K, V>(&self, vars: I) -> Output<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<TemplateVar>,
    {
        let (names, values): (Vec<String>, Vec<Output<Value>>) = vars
            .into_iter()
            .map(|(name, var)| {
                let var: TemplateVar = var.into();
                (name.into(), var.resolve())
            })
            .unzip();

        let template = self.clone();
        Output::all(values).try_apply(move |values| {
            let data = names.into_iter().zip(values).collect::<Map<String, Value>>();
            template.execute(&Value::Object(data))
        })
    }

    fn execute(&self, data: &Value) -> Result<String, DeferError> {
        trace!("Rendering template {:?}", self.name);
        let result = match self.registry.render(&self.name, data) {
            Ok(result) => result,
            Err(e) => {
                debug!("Failed to execute template {:?}: {}", self.name, e);
                return Err(DeferError::TemplateExecute(format!("template {:?}: {}", self.name, e)));
            }
        };

        if self.validate_json {
            check_json(&self.name, &result)?;
        }

        Ok(result)
    }
}

fn check_json(name: &str, text: &str) -> Result<(), DeferError> {
    let e = match serde_json::from_str::<IgnoredAny>(text) {
        Ok(_) => return Ok(()),
        Err(e) => e,
    };

    debug!("Template {:?} rendered invalid JSON: {}", name, e);
    let offset = match e.classify() {
        Category::Syntax | Category::Eof => Some(byte_offset(text, e.line(), e.column())),
        _ => None,
    };

    Err(DeferError::InvalidJson {
        offset,
        detail: format!("template {:?}: {}\n{}", name, e, text),
    })
}

/// Convert serde_json's 1-based line and column into the number of bytes consumed when the error was found.
fn byte_offset(text: &str, line: usize, column: usize) -> usize {
    let line_start = text.split_inclusive('\n').take(line.saturating_sub(1)).map(str::len).sum::<usize>();
    line_start + column
}

/// Render `text` against `vars`, validating the result as JSON if `validate_json` is set.
pub fn render<I, K, V>(vars: I, text: &str, validate_json: bool) -> Output<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<TemplateVar>,
{
    let options = RenderOptions {
        validate_json,
        ..Default::default()
    };
    render_with(vars, text, &options)
}

/// Render `text` against `vars`.
pub fn render_text<I, K, V>(vars: I, text: &str) -> Output<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<TemplateVar>,
{
    render(vars, text, false)
}

/// Render `text` against `vars`, failing if the result is not valid JSON.
pub fn render_json<I, K, V>(vars: I, text: &str) -> Output<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<TemplateVar>,
{
    render(vars, text, true)
}

/// Render `text` against `vars` with explicit options.
///
/// A template that fails to compile yields an output that has already failed; none of `vars` is waited on.
pub fn render_with<I, K, V>(vars: I, text: &str, options: &RenderOptions) -> Output<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<TemplateVar>,
{
    match Template::compile(text, options) {
        Ok(template) => template.render(vars),
        Err(e) => Output::failed(e),
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{byte_offset, render, render_json, render_text, render_with, RenderOptions, Template, TemplateVar},
        crate::{DeferError, Output},
        futures::{channel::oneshot, executor::block_on},
        indoc::indoc,
        pretty_assertions::assert_eq,
        serde_json::json,
    };

    fn vars() -> Vec<(&'static str, TemplateVar)> {
        vec![
            ("StringOut", TemplateVar::from(Output::known("ok!".to_string()))),
            ("NormalString", TemplateVar::from("normal")),
        ]
    }

    fn deferred() -> (oneshot::Sender<String>, Output<String>) {
        let (tx, rx) = oneshot::channel::<String>();
        (tx, Output::new(async move { rx.await.map_err(|e| DeferError::Upstream(e.to_string())) }))
    }

    #[test_log::test]
    fn test_simple() {
        let out = render_text(vars(), r"result: {{StringOut}}\nline2: {{ NormalString }}");
        assert_eq!(block_on(out), Ok(r"result: ok!\nline2: normal".to_string()));
    }

    #[test_log::test]
    fn test_known_inputs_resolve_immediately() {
        let text = "{{NormalString}}-{{StringOut}}";
        let first = render_text(vars(), text).now_or_never();
        let second = render_text(vars(), text).now_or_never();
        assert_eq!(first, Some(Ok("normal-ok!".to_string())));
        assert_eq!(first, second);
    }

    #[test_log::test]
    fn test_invalid_template() {
        let (_tx, never) = deferred();
        let out = render_text([("StringOut", never)], "result: {{StringOut}");

        // Reported without waiting for the pending variable.
        let err = out.now_or_never().unwrap().unwrap_err();
        assert!(matches!(err, DeferError::TemplateCompile(_)), "{:?}", err);
        assert!(err.to_string().starts_with(r#"Template compile error: template "template": "#));
    }

    #[test_log::test]
    fn test_invalid_reference() {
        let err = block_on(render_text(vars(), "result: {{StringOut.Foo}}")).unwrap_err();
        assert!(matches!(err, DeferError::TemplateExecute(_)), "{:?}", err);

        let err = block_on(render_text(vars(), "result: {{Missing}}")).unwrap_err();
        assert!(matches!(err, DeferError::TemplateExecute(_)), "{:?}", err);
    }

    #[test_log::test]
    fn test_json() {
        let text = r#"{"field": "{{StringOut}}"}"#;
        assert_eq!(block_on(render_json(vars(), text)), Ok(r#"{"field": "ok!"}"#.to_string()));
        assert_eq!(block_on(render(vars(), text, true)), block_on(render(vars(), text, false)));
    }

    #[test_log::test]
    fn test_invalid_json() {
        let err = block_on(render_json(vars(), "result: {{StringOut}}")).unwrap_err();
        match err {
            DeferError::InvalidJson {
                offset,
                detail,
            } => {
                assert_eq!(offset, Some(1));
                assert!(detail.ends_with("\nresult: ok!"), "{}", detail);
            }
            _ => panic!("expected InvalidJson, got {:?}", err),
        }

        // Not validated unless requested.
        assert_eq!(block_on(render_text(vars(), "result: {{StringOut}}")), Ok("result: ok!".to_string()));
    }

    #[test_log::test]
    fn test_invalid_json_offset_multiline() {
        let text = indoc! { r#"
            {
              "a": {{Bad}}
            }"# };
        let err = block_on(render_json([("Bad", "xyz")], text)).unwrap_err();
        assert!(matches!(err, DeferError::InvalidJson { offset: Some(10), .. }), "{:?}", err);

        assert_eq!(byte_offset("{\n  \"a\": x\n}", 2, 8), 10);
        assert_eq!(byte_offset("abc", 1, 2), 2);
    }

    #[test_log::test]
    fn test_no_escaping() {
        let out = render_text([("Value", r#"a"b<c>&"#)], "{{Value}}");
        assert_eq!(block_on(out), Ok(r#"a"b<c>&"#.to_string()));
    }

    #[test_log::test]
    fn test_structured_values() {
        let bucket = json!({"arn": "arn:aws:s3:::b", "tags": ["x", "y"]});
        let ids = Output::known(vec!["id1".to_string(), "id2".to_string()]);
        let out = render_json(
            vec![("Bucket", TemplateVar::from(bucket)), ("Ids", ids.into()), ("Count", 2i64.into())],
            r#"{"arn": "{{Bucket.arn}}", "ids": [{{#each Ids}}{{#if @index}}, {{/if}}"{{this}}"{{/each}}], "n": {{Count}}}"#,
        );
        assert_eq!(block_on(out), Ok(r#"{"arn": "arn:aws:s3:::b", "ids": ["id1", "id2"], "n": 2}"#.to_string()));
    }

    #[test_log::test]
    fn test_waits_for_all_inputs() {
        let (tx1, first) = deferred();
        let (tx2, second) = deferred();
        let out = render_text([("A", first), ("B", second)], "{{A}}/{{B}}");

        assert_eq!(out.now_or_never(), None);
        tx1.send("one".to_string()).unwrap();
        assert_eq!(out.now_or_never(), None);
        tx2.send("two".to_string()).unwrap();
        assert_eq!(block_on(out), Ok("one/two".to_string()));
    }

    #[test_log::test]
    fn test_upstream_failure() {
        let (tx, pending) = deferred();
        let out = render_text([("A", pending)], "{{A}}");
        drop(tx);
        assert_eq!(block_on(out), Err(DeferError::Upstream("oneshot canceled".to_string())));
    }

    #[test_log::test]
    fn test_compiled_template_reuse() {
        let options = RenderOptions::builder().name("greeting").build().unwrap();
        assert_eq!(options.name(), "greeting");
        assert!(!options.validate_json());

        let template = Template::compile("hello {{Who}}", &options).unwrap();
        assert_eq!(template.name(), "greeting");
        assert_eq!(block_on(template.render([("Who", "world")])), Ok("hello world".to_string()));
        assert_eq!(block_on(template.render([("Who", "there")])), Ok("hello there".to_string()));

        let err = block_on(template.render(Vec::<(String, TemplateVar)>::new())).unwrap_err();
        assert!(err.to_string().starts_with(r#"Template execution error: template "greeting": "#), "{}", err);
    }

    #[test_log::test]
    fn test_render_with_options() {
        let options = RenderOptions::builder().name("policy-doc").validate_json(true).build().unwrap();
        let err = block_on(render_with(vars(), "{{NormalString}}", &options)).unwrap_err();
        assert!(err.to_string().contains(r#"template "policy-doc""#), "{}", err);

        assert_eq!(RenderOptions::default(), RenderOptions::builder().build().unwrap());
    }
}
