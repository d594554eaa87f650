//! HTML embed page for a visualization session

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use crate::viz::VizDocument;

const PAGE_TEMPLATE_NAME: &str = "session";

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{title}}</title>
<script src="{{script_url}}"></script>
</head>
<body>
<div id="formplot-root" data-session-id="{{session_id}}"></div>
<script type="application/json" id="formplot-document">{{{document}}}</script>
<script>
window.formplot && window.formplot.embed(
  document.getElementById("formplot-root"),
  JSON.parse(document.getElementById("formplot-document").textContent),
  "/sessions/{{session_id}}"
);
</script>
</body>
</html>
"#;

#[derive(Serialize)]
struct PageContext<'a> {
    title: String,
    script_url: &'a str,
    session_id: String,
    document: String,
}

/// JSON that is safe inside a `<script>` element
fn embed_json(doc: &VizDocument) -> Result<String> {
    let json = serde_json::to_string(doc)?;
    Ok(json.replace('<', "\\u003c"))
}

/// Renders session documents into standalone pages
pub struct PageRenderer {
    hbs: Handlebars<'static>,
    script_url: String,
}

impl PageRenderer {
    pub fn new(script_url: impl Into<String>) -> Result<Self> {
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(true);
        hbs.register_template_string(PAGE_TEMPLATE_NAME, PAGE_TEMPLATE)
            .map_err(|e| eyre!("Failed to register page template: {}", e))?;
        Ok(Self {
            hbs,
            script_url: script_url.into(),
        })
    }

    pub fn render(&self, doc: &VizDocument) -> Result<String> {
        debug!(session_id = %doc.session_id, app = doc.app, "render: called");
        let context = PageContext {
            title: format!("formplot {}", doc.app),
            script_url: &self.script_url,
            session_id: doc.session_id.to_string(),
            document: embed_json(doc)?,
        };
        self.hbs
            .render(PAGE_TEMPLATE_NAME, &context)
            .map_err(|e| eyre!("Failed to render session page: {}", e))
    }
}
