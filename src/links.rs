//! URLs of generated pages and the small bits of HTML the engine emits itself.

use crate::config::Templates;
use crate::reflection::{Element, ElementKind};

/// Replace every character that is not an ASCII word character with `.`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '.'
            }
        })
        .collect()
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// `<a href="...">text</a>` with both parts escaped.
pub fn anchor(href: &str, text: &str) -> String {
    format!(
        "<a href=\"{}\">{}</a>",
        escape_html(href),
        escape_html(text)
    )
}

/// Builds page URLs from the configured filename templates.
#[derive(Debug, Clone, Default)]
pub struct LinkBuilder {
    templates: Templates,
}

impl LinkBuilder {
    pub fn new(templates: Templates) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    fn fill(template: &str, name: &str) -> String {
        let name = name.trim_start_matches('\\');
        template.replacen("%s", &sanitize_name(name), 1)
    }

    pub fn class_url(&self, class: &str) -> String {
        Self::fill(&self.templates.class, class)
    }

    pub fn method_url(&self, class: &str, method: &str) -> String {
        format!("{}#_{}", self.class_url(class), method)
    }

    pub fn property_url(&self, class: &str, property: &str) -> String {
        format!("{}#${}", self.class_url(class), property)
    }

    pub fn class_constant_url(&self, class: &str, constant: &str) -> String {
        format!("{}#{}", self.class_url(class), constant)
    }

    pub fn function_url(&self, function: &str) -> String {
        Self::fill(&self.templates.function, function)
    }

    pub fn constant_url(&self, constant: &str) -> String {
        Self::fill(&self.templates.constant, constant)
    }

    pub fn namespace_url(&self, namespace: &str) -> String {
        Self::fill(&self.templates.namespace, namespace)
    }

    pub fn package_url(&self, package: &str) -> String {
        Self::fill(&self.templates.package, package)
    }

    /// File name of a highlighted source page. `file_base` is used verbatim.
    pub fn source_file(&self, file_base: &str) -> String {
        self.templates.source.replacen("%s", file_base, 1)
    }

    /// URL of the page (or page section) documenting an element.
    ///
    /// Members without a declaring class have no page.
    pub fn element_url(&self, element: &Element) -> Option<String> {
        let class = element.declaring_class.as_deref();
        let url = match element.kind {
            ElementKind::Class | ElementKind::Interface => self.class_url(&element.name),
            ElementKind::Method => self.method_url(class?, &element.name),
            ElementKind::Property => self.property_url(class?, &element.name),
            ElementKind::ClassConstant => self.class_constant_url(class?, &element.name),
            ElementKind::Function => self.function_url(&element.name),
            ElementKind::Constant => self.constant_url(&element.name),
            ElementKind::Namespace => self.namespace_url(&element.name),
        };
        Some(url)
    }
}
