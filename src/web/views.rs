//! Server-rendered pages.

use crate::{
    core::{money, period},
    errors::Result,
};
use axum::response::Html;
use minijinja::Environment;
use serde::Serialize;

const TEMPLATES: [(&str, &str); 10] = [
    ("base.html", include_str!("../../templates/base.html")),
    ("login.html", include_str!("../../templates/login.html")),
    ("index.html", include_str!("../../templates/index.html")),
    ("opening.html", include_str!("../../templates/opening.html")),
    ("closing.html", include_str!("../../templates/closing.html")),
    ("summary.html", include_str!("../../templates/summary.html")),
    ("history.html", include_str!("../../templates/history.html")),
    ("admin_users.html", include_str!("../../templates/admin_users.html")),
    ("ledger.html", include_str!("../../templates/ledger.html")),
    ("report.html", include_str!("../../templates/report.html")),
];

/// Template environment shared by every handler.
pub struct Views {
    env: Environment<'static>,
}

fn br_date(value: String) -> String {
    period::parse_date(&value).map_or(value, period::format_br)
}

impl Views {
    /// Compiles every embedded template and registers the filters.
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        env.add_filter("brl", money::format_brl);
        env.add_filter("percent", money::format_percent);
        env.add_filter("br_date", br_date);
        Ok(Self { env })
    }

    /// Renders the named template.
    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<Html<String>> {
        let template = self.env.get_template(name)?;
        Ok(Html(template.render(context)?))
    }
}
