//! HTML fragments written into page containers.
//!
//! Templates are HTML auto-escaped, so gene labels and server-supplied
//! messages are always rendered as text.

use minijinja::{context, Environment, Value};
use url::Url;

use genescope_common::error::Result;
use genescope_common::models::Publication;

use crate::container::ContainerHandle;

pub const LOADING_BOXPLOT: &str = "Loading boxplot data...";
pub const LOADING_PUBLICATIONS: &str = "Loading publication data...";
pub const VOLCANO_PARSE_ERROR: &str = "Error loading volcano plot data. Please check the console for details.";
pub const BOXPLOT_LOAD_ERROR: &str = "Error loading boxplot data. Please try again.";
pub const BOXPLOT_RENDER_ERROR: &str = "Error rendering boxplot.";
pub const PUBLICATIONS_LOAD_ERROR: &str = "Error loading publication data. Please try again.";

const MESSAGE_TEMPLATE: &str = include_str!("../templates/message.html");
const PUBLICATIONS_TEMPLATE: &str = include_str!("../templates/publications.html");
const SNAPSHOT_TEMPLATE: &str = include_str!("../templates/snapshot.html");

pub struct Fragments {
    env: Environment<'static>,
}

impl Fragments {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("message.html", MESSAGE_TEMPLATE)?;
        env.add_template("publications.html", PUBLICATIONS_TEMPLATE)?;
        env.add_template("snapshot.html", SNAPSHOT_TEMPLATE)?;
        Ok(Self { env })
    }

    fn render(&self, name: &str, ctx: Value) -> Result<String> {
        Ok(self.env.get_template(name)?.render(ctx)?)
    }

    /// Plain paragraph.
    pub fn message(&self, message: &str) -> Result<String> {
        self.render("message.html", context! { message, error => false })
    }

    /// Paragraph styled as an error.
    pub fn error(&self, message: &str) -> Result<String> {
        self.render("message.html", context! { message, error => true })
    }

    pub fn no_publications(&self, gene: &str) -> Result<String> {
        self.message(&format!("No publications found for {}.", gene))
    }

    /// Heading plus one list item per publication. Only http(s) URLs become
    /// links; anything else is shown as a bare label.
    pub fn publications(&self, gene: &str, publications: &[Publication]) -> Result<String> {
        let entries: Vec<Value> = publications
            .iter()
            .map(|p| {
                let url = Url::parse(&p.url)
                    .ok()
                    .filter(|u| matches!(u.scheme(), "http" | "https"))
                    .map(|u| Value::from_safe_string(u.to_string()));
                context! { pubmed_id => &p.pubmed_id, url }
            })
            .collect();
        self.render("publications.html", context! { gene, publications => Value::from(entries) })
    }

    /// Standalone document embedding the current markup of `containers`.
    pub fn snapshot(&self, title: &str, containers: &[&ContainerHandle]) -> Result<String> {
        let sections: Vec<Value> = containers
            .iter()
            .map(|c| context! { id => c.id(), html => Value::from_safe_string(c.html()) })
            .collect();
        self.render("snapshot.html", context! { title, sections => Value::from(sections) })
    }
}
