use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use time::macros::format_description;

use crate::users::repo_types::User;

/// View-model handed across the template boundary: a page renders either
/// nothing, the current user, or a batch of error messages.
pub enum View<'a> {
    Empty,
    User(&'a User),
    Errors(&'a [String]),
}

pub trait PageRenderer: Send + Sync {
    fn render(&self, template: &str, view: View<'_>) -> anyhow::Result<String>;
}

/// Renderer over a directory of HTML files loaded once at startup.
///
/// Values are substituted into `{{slot}}` placeholders, HTML-escaped.
/// Anything beyond that belongs in the templates themselves.
pub struct TemplateDir {
    templates: HashMap<String, String>,
}

impl TemplateDir {
    pub fn load(dir: &str) -> anyhow::Result<Self> {
        let mut templates = HashMap::new();
        let entries =
            std::fs::read_dir(dir).with_context(|| format!("read templates dir {dir}"))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("html") {
                continue;
            }
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_string())
                .context("template file name is not utf-8")?;
            let body = std::fs::read_to_string(&path)
                .with_context(|| format!("read template {}", path.display()))?;
            templates.insert(name, body);
        }
        anyhow::ensure!(!templates.is_empty(), "no templates found in {dir}");
        Ok(Self { templates })
    }

    fn fill(template: &str, slots: &[(&str, String)]) -> String {
        let mut out = template.to_string();
        for (slot, value) in slots {
            out = out.replace(&format!("{{{{{slot}}}}}"), value);
        }
        out
    }
}

impl PageRenderer for TemplateDir {
    fn render(&self, template: &str, view: View<'_>) -> anyhow::Result<String> {
        let body = self
            .templates
            .get(template)
            .with_context(|| format!("unknown template {template}"))?;

        let slots = match view {
            View::Empty => vec![],
            View::User(user) => {
                let dob = user
                    .date_of_birth
                    .format(format_description!("[year]-[month]-[day]"))
                    .context("format date of birth")?;
                vec![
                    ("name", escape(&user.name)),
                    ("email", escape(&user.email)),
                    ("bio", escape(&user.bio)),
                    ("dob", dob),
                    ("category", user.category.to_string()),
                    ("avatar", escape(&user.avatar)),
                ]
            }
            View::Errors(messages) => {
                let items: String = messages
                    .iter()
                    .map(|m| format!("<li>{}</li>", escape(m)))
                    .collect();
                vec![("errors", items)]
            }
        };

        Ok(Self::fill(body, &slots))
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;
    use uuid::Uuid;

    fn renderer_with(name: &str, body: &str) -> TemplateDir {
        let mut templates = HashMap::new();
        templates.insert(name.to_string(), body.to_string());
        TemplateDir { templates }
    }

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "jo@example.com".into(),
            password_hash: "hash".into(),
            name: "Jo <script>".into(),
            category: 2,
            date_of_birth: date!(1990 - 06 - 15),
            bio: "likes \"quotes\"".into(),
            avatar: String::new(),
        }
    }

    #[test]
    fn renders_every_error_in_the_batch() {
        let r = renderer_with("auth_errors", "<ul>{{errors}}</ul>");
        let out = r
            .render(
                "auth_errors",
                View::Errors(&["Name is required".into(), "Email is required".into()]),
            )
            .unwrap();
        assert!(out.contains("<li>Name is required</li>"));
        assert!(out.contains("<li>Email is required</li>"));
    }

    #[test]
    fn escapes_user_supplied_values() {
        let r = renderer_with("home", "<h1>{{name}}</h1><p>{{bio}}</p><i>{{dob}}</i>");
        let out = r.render("home", View::User(&sample_user())).unwrap();
        assert!(out.contains("Jo &lt;script&gt;"));
        assert!(out.contains("likes &quot;quotes&quot;"));
        assert!(out.contains("1990-06-15"));
        assert!(!out.contains("<script>"));
    }

    #[test]
    fn unknown_template_is_an_error() {
        let r = renderer_with("home", "x");
        assert!(r.render("missing", View::Empty).is_err());
    }
}
