use pulldown_cmark::{html, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd};
use pulldown_cmark_escape::{escape_href, escape_html};

const SAFE_SCHEMES: [&str; 3] = ["http:", "https:", "mailto:"];

/// Render chat markdown to HTML that is safe to insert into the page.
///
/// Raw HTML in the source is escaped rather than passed through. Links open in a new
/// tab without access to `window.opener`, and only http(s), mailto and relative
/// targets survive. Bold text and list items carry the classes the page styles.
pub fn render_markdown(source: &str) -> String {
    let options =
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;

    let events = Parser::new_ext(source, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            ..
        }) => Event::InlineHtml(open_link(link_type, &dest_url, &title).into()),
        Event::End(TagEnd::Link) => Event::InlineHtml(CowStr::Borrowed("</a>")),
        Event::Start(Tag::Strong) => {
            Event::InlineHtml(CowStr::Borrowed(r#"<strong class="md-strong">"#))
        }
        Event::End(TagEnd::Strong) => Event::InlineHtml(CowStr::Borrowed("</strong>")),
        Event::Start(Tag::Item) => Event::Html(CowStr::Borrowed(r#"<li class="md-item">"#)),
        Event::End(TagEnd::Item) => Event::Html(CowStr::Borrowed("</li>\n")),
        other => other,
    });

    let mut output = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut output, events);
    output
}

fn open_link(link_type: LinkType, dest_url: &str, title: &str) -> String {
    let target = match link_type {
        LinkType::Email => format!("mailto:{}", dest_url),
        _ => dest_url.to_string(),
    };
    let href = if is_safe_url(&target) { target.as_str() } else { "#" };

    // Escaping into a String cannot fail
    let mut tag = String::from(r#"<a href=""#);
    let _ = escape_href(&mut tag, href);
    tag.push_str(r#"" target="_blank" rel="noopener noreferrer" class="md-link""#);
    if !title.is_empty() {
        tag.push_str(r#" title=""#);
        let _ = escape_html(&mut tag, title);
        tag.push('"');
    }
    tag.push('>');
    tag
}

fn is_safe_url(url: &str) -> bool {
    let url = url.trim();
    match url.find(':') {
        // A colon after a path, query or fragment start is not a scheme
        Some(colon) if !url[..colon].contains(['/', '?', '#']) => {
            let scheme = url[..=colon].to_ascii_lowercase();
            SAFE_SCHEMES.contains(&scheme.as_str())
        }
        _ => true,
    }
}
