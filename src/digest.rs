use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::domain::article::DigestItem;

pub const DIGEST_SUBJECT: &str = "Your morning good news digest";

/// Renders the HTML body of a digest email. Article text comes from third
/// parties and is escaped.
pub fn render_digest_html(items: &[DigestItem]) -> String {
    let articles: String = items.iter().map(render_item).collect();

    format!(
        r#"
            <div>
                <h1>Good morning!</h1>
                <p>Here is some good news picked for your interests today.</p>
                {}
                <p>Have a great day.</p>
            </div>
        "#,
        articles
    )
}

fn render_item(item: &DigestItem) -> String {
    let image = match &item.image_url {
        Some(image_url) => format!(
            r#"<img src="{}" alt="" width="560" />"#,
            encode_double_quoted_attribute(image_url)
        ),
        None => String::new(),
    };

    format!(
        r#"
                <div>
                    <p><small>{}</small></p>
                    {}
                    <h2><a href="{}">{}</a></h2>
                    <p>{}</p>
                    <p><small>{}</small></p>
                </div>
        "#,
        encode_text(&item.category.to_uppercase()),
        image,
        encode_double_quoted_attribute(&item.url),
        encode_text(&item.title),
        encode_text(&item.description),
        encode_text(&item.source_name),
    )
}
