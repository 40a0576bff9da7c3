use tl::{HTMLTag, ParserOptions, VDom};
use url::Url;

use crate::error::DownloadError;

/// A fetched HTML document, kept as text so it can be parsed on demand.
#[derive(Debug, Clone)]
pub struct HtmlPage {
    url: String,
    body: String,
}

impl HtmlPage {
    #[must_use]
    pub fn new<U: Into<String>>(url: U, body: &[u8]) -> Self {
        Self {
            url: url.into(),
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn dom(&self) -> Result<VDom<'_>, DownloadError> {
        tl::parse(&self.body, ParserOptions::default()).map_err(|e| DownloadError::Parse {
            url: self.url.clone(),
            message: format!("{e:?}"),
        })
    }

    /// Values of `attribute` on every `tag_name` element accepted by `filter`,
    /// in document order.
    pub fn attribute_values<F>(
        &self,
        tag_name: &str,
        attribute: &str,
        filter: F,
    ) -> Result<Vec<String>, DownloadError>
    where
        F: Fn(&HTMLTag) -> bool,
    {
        let dom = self.dom()?;
        let parser = dom.parser();

        let Some(nodes) = dom.query_selector(tag_name) else {
            return Err(DownloadError::Parse {
                url: self.url.clone(),
                message: format!("invalid selector {tag_name:?}"),
            });
        };

        let values = nodes
            .filter_map(|x| x.get(parser))
            .filter_map(|x| x.as_tag())
            .filter(|tag| filter(tag))
            .filter_map(|tag| tag_attribute(tag, attribute))
            .collect();

        Ok(values)
    }

    /// The `href` of the first `<link>` whose `rel` list contains `icon`.
    pub fn icon_link(&self) -> Result<Option<String>, DownloadError> {
        let links = self.attribute_values("link", "href", |tag| {
            tag_attribute(tag, "rel").is_some_and(|rel| {
                rel.split_ascii_whitespace()
                    .any(|x| x.eq_ignore_ascii_case("icon"))
            })
        })?;

        Ok(links.into_iter().find(|x| !x.trim().is_empty()))
    }
}

pub(crate) fn tag_attribute(tag: &HTMLTag, attribute: &str) -> Option<String> {
    tag.attributes()
        .get(attribute)
        .flatten()
        .map(|x| decode_entities(&x.as_utf8_str()))
}

// tl hands back attribute values verbatim. Unknown references are kept.
fn decode_entities(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];

        let decoded = rest
            .find(';')
            .and_then(|end| decode_entity(&rest[1..end]).map(|ch| (ch, end)));

        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "lt" => Some('<'),
        "gt" => Some('>'),
        _ => {
            let code = name.strip_prefix('#')?;
            let code = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };

            char::from_u32(code)
        }
    }
}

/// Resolves `href` against `base`. Absolute URLs are returned unchanged.
pub fn resolve_url(base: &str, href: &str) -> Result<Url, DownloadError> {
    let base = Url::parse(base).map_err(|e| DownloadError::invalid_url(base, e))?;

    base.join(href.trim())
        .map_err(|e| DownloadError::invalid_url(href, e))
}
