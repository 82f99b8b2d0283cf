use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use codesnip_auth::session::SessionStatus;
use tera::{Context, Tera};

use crate::error::WebError;

const TEMPLATES: [(&str, &str); 9] = [
    ("layout.html", include_str!("../templates/layout.html")),
    ("auth.html", include_str!("../templates/auth.html")),
    ("list.html", include_str!("../templates/list.html")),
    ("editor.html", include_str!("../templates/editor.html")),
    ("detail.html", include_str!("../templates/detail.html")),
    ("confirm_delete.html", include_str!("../templates/confirm_delete.html")),
    ("loading.html", include_str!("../templates/loading.html")),
    ("unavailable.html", include_str!("../templates/unavailable.html")),
    ("not_found.html", include_str!("../templates/not_found.html")),
];

/// Page templates, compiled once at startup.
pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)?;
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<String, WebError> {
        Ok(self.tera.render(name, context)?)
    }

    /// Render `name` as an HTML response with `status`.
    pub fn page(
        &self,
        status: StatusCode,
        name: &str,
        context: &Context,
    ) -> Result<Response, WebError> {
        Ok((status, Html(self.render(name, context)?)).into_response())
    }
}

/// Context every page starts from: what the header needs.
pub fn page_context(status: &SessionStatus) -> Context {
    let mut context = Context::new();
    let identity = status.identity();
    context.insert("signed_in", &identity.is_some());
    context.insert("user_name", &identity.map(|i| i.display_name()).unwrap_or_default());
    context
}
