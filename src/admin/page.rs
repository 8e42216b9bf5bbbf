use minijinja::{context, Environment};

use crate::amis::PageDescriptor;
use crate::error::ApiError;

const PAGE_TEMPLATE_NAME: &str = "form_page.html";

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1, maximum-scale=1" />
  <title>{{ title }}</title>
  <link rel="stylesheet" href="{{ cdn }}/sdk/sdk.css" />
  <link rel="stylesheet" href="{{ cdn }}/sdk/helper.css" />
  <style>html, body, #root { position: relative; width: 100%; height: 100%; margin: 0; padding: 0; }</style>
</head>
<body>
  <div id="root"></div>
  <script src="{{ cdn }}/sdk/sdk.js"></script>
  <script>
    (function () {
      var amis = amisRequire('amis/embed');
      amis.embed('#root', {{ page_json|safe }});
    })();
  </script>
</body>
</html>
"#;

/// Render the HTML shell that boots the amis SDK with `page` embedded.
pub fn render_html(title: &str, cdn: &str, page: &PageDescriptor) -> Result<String, ApiError> {
    let page_json = serde_json::to_string(page)
        .map_err(|e| {
            tracing::error!("Failed to serialize page descriptor: {}", e);
            ApiError::internal_server_error("Failed to render page")
        })?
        // Keep a "</script>" inside a string value from closing the tag
        .replace("</", "<\\/");

    let mut env = Environment::new();
    env.add_template(PAGE_TEMPLATE_NAME, PAGE_TEMPLATE)?;
    let html = env
        .get_template(PAGE_TEMPLATE_NAME)?
        .render(context! { title => title, cdn => cdn.trim_end_matches('/'), page_json => page_json })?;

    Ok(html)
}
