//! Block to HTML conversion.
//!
//! Every value coming from props is escaped. Markdown is rendered with raw HTML
//! shown as text, and script URLs are dropped from links.

use std::fmt::Write;

use serde_json::Value;

use crate::components::*;
use crate::media::{safe_url, MediaRef, MediaResolver};
use crate::tailwind::extract_arbitrary_styles;

/// What a block renderer can see besides its own props.
pub struct BlockContext<'a> {
    /// Render key of the instance, written as `data-component-id`.
    pub key: &'a str,
    pub page_data: &'a Value,
    pub media: &'a dyn MediaResolver,
}

impl BlockContext<'_> {
    fn media_url(&self, media: Option<&MediaRef>) -> Option<String> {
        let url = self.media.resolve(media?)?;
        safe_url(&url).map(str::to_string)
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn escape_css_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Builds the opening attributes shared by every block.
///
/// `extra` is the instance's `extraClasses`: arbitrary bracket tokens become
/// inline declarations appended after `style`; everything else joins `class`.
fn build_attrs(key: &str, class: &str, extra: Option<&str>, style: &str) -> String {
    let extracted = extract_arbitrary_styles(extra.unwrap_or(""));
    let mut classes = class.to_string();
    if !extracted.remaining_classes.is_empty() {
        classes.push(' ');
        classes.push_str(&extracted.remaining_classes);
    }
    let mut css = style.to_string();
    css.push_str(&extracted.to_css());

    let mut attrs = format!(
        " data-component-id=\"{}\" class=\"{}\"",
        escape_html(key),
        escape_html(&classes)
    );
    if !css.is_empty() {
        attrs.push_str(" style=\"");
        attrs.push_str(&escape_html(&css));
        attrs.push('"');
    }
    attrs
}

fn align_css(align: Option<TextAlign>) -> String {
    align
        .map(|a| format!("text-align:{};", a.as_css()))
        .unwrap_or_default()
}

fn link_target(url: Option<&str>) -> Option<&str> {
    url.filter(|u| !u.trim().is_empty()).and_then(safe_url)
}

/// Numbers keep their stored precision; strings are shown as given.
fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) => format!("{:.2}", f),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

fn clamp_columns(columns: Option<u32>, default: u32) -> u32 {
    columns.unwrap_or(default).clamp(1, 6)
}

fn grid_style(columns: u32) -> String {
    format!(
        "display:grid;grid-template-columns:repeat({},minmax(0,1fr));",
        columns
    )
}

/// Render markdown with raw HTML shown as text and script URLs removed.
pub fn markdown_to_html(md: &str) -> String {
    use pulldown_cmark::{Event, Options, Parser};
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(md, opts).map(|event| match event {
        Event::Html(raw) => Event::Text(raw),
        Event::Start(tag) => Event::Start(drop_script_destination(tag)),
        other => other,
    });
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);
    html
}

/// Empties link and image destinations that use a script scheme.
fn drop_script_destination(tag: pulldown_cmark::Tag<'_>) -> pulldown_cmark::Tag<'_> {
    use pulldown_cmark::{CowStr, Tag};
    match tag {
        Tag::Link(kind, dest, title) if safe_url(&dest).is_none() => {
            tracing::debug!(destination = %dest, "dropped script link from markdown");
            Tag::Link(kind, CowStr::Borrowed(""), title)
        }
        Tag::Image(kind, dest, title) if safe_url(&dest).is_none() => {
            tracing::debug!(destination = %dest, "dropped script image from markdown");
            Tag::Image(kind, CowStr::Borrowed(""), title)
        }
        other => other,
    }
}

fn plain_text_to_html(text: &str, out: &mut String) -> std::fmt::Result {
    for paragraph in text.split("\n\n").filter(|p| !p.trim().is_empty()) {
        let lines: Vec<String> = paragraph.trim().lines().map(escape_html).collect();
        write!(out, "<p>{}</p>", lines.join("<br>"))?;
    }
    Ok(())
}

/// Placeholder for a `type` with no renderer.
pub fn write_unknown(key: &str, type_key: &str, out: &mut String) -> std::fmt::Result {
    write!(
        out,
        "<div data-component-id=\"{}\" class=\"pc-placeholder\" data-type=\"{}\">Unknown component type: {}</div>",
        escape_html(key),
        escape_html(type_key),
        escape_html(type_key)
    )
}

/// Placeholder for a known `type` whose props could not be decoded.
pub fn invalid_placeholder(key: &str, type_key: &str) -> String {
    format!(
        "<div data-component-id=\"{}\" class=\"pc-placeholder pc-placeholder--invalid\" data-type=\"{}\">Invalid props for component type: {}</div>",
        escape_html(key),
        escape_html(type_key),
        escape_html(type_key)
    )
}

/// Container for a generated block. `html` is inserted verbatim.
pub fn write_dynamic(
    key: &str,
    container_id: &str,
    html: &str,
    script: Option<&str>,
    out: &mut String,
) -> std::fmt::Result {
    write!(
        out,
        "<div data-component-id=\"{}\" class=\"pc-dynamic\" id=\"{}\">{}</div>",
        escape_html(key),
        escape_html(container_id),
        html
    )?;
    if let Some(script) = script {
        out.push_str(script);
    }
    Ok(())
}

/// Render a typed block. Generated and unknown blocks go through
/// [`write_dynamic`] and [`write_unknown`] instead.
pub fn render_block(block: &Block, ctx: &BlockContext<'_>, out: &mut String) -> std::fmt::Result {
    let extra = block.extra_classes();
    match block {
        Block::Heading(h) => {
            let tag = h.level.tag();
            let attrs = build_attrs(ctx.key, "pc-heading", extra, &align_css(h.align));
            write!(out, "<{}{}>{}</{}>", tag, attrs, escape_html(&h.text), tag)?;
        }
        Block::Text(t) => {
            let class = match t.format {
                TextFormat::Plain => "pc-text",
                TextFormat::Markdown => "pc-text pc-markdown",
            };
            let attrs = build_attrs(ctx.key, class, extra, &align_css(t.align));
            write!(out, "<div{}>", attrs)?;
            match t.format {
                TextFormat::Plain => plain_text_to_html(&t.content, out)?,
                TextFormat::Markdown => out.push_str(&markdown_to_html(&t.content)),
            }
            write!(out, "</div>")?;
        }
        Block::Button(b) => {
            let class = format!("pc-button pc-button--{}", b.variant.as_str());
            let attrs = build_attrs(ctx.key, &class, extra, "");
            match link_target(b.url.as_deref()) {
                Some(url) => {
                    let target = if b.new_tab {
                        " target=\"_blank\" rel=\"noopener noreferrer\""
                    } else {
                        ""
                    };
                    write!(
                        out,
                        "<a{} href=\"{}\"{}>{}</a>",
                        attrs,
                        escape_html(url),
                        target,
                        escape_html(&b.text)
                    )?;
                }
                None => write!(out, "<button{} type=\"button\">{}</button>", attrs, escape_html(&b.text))?,
            }
        }
        Block::Image(img) => {
            let attrs = build_attrs(ctx.key, "pc-image", extra, "");
            write!(out, "<figure{}>", attrs)?;
            if let Some(src) = ctx.media_url(img.src.as_ref()) {
                write!(out, "<img src=\"{}\" alt=\"{}\"", escape_html(&src), escape_html(&img.alt))?;
                if let Some(w) = img.width {
                    write!(out, " width=\"{}\"", w)?;
                }
                if let Some(h) = img.height {
                    write!(out, " height=\"{}\"", h)?;
                }
                write!(out, " loading=\"lazy\">")?;
            }
            if let Some(caption) = img.caption.as_deref().filter(|c| !c.is_empty()) {
                write!(out, "<figcaption>{}</figcaption>", escape_html(caption))?;
            }
            write!(out, "</figure>")?;
        }
        Block::Divider(d) => {
            let style = match d.style {
                DividerStyle::Solid => "border-style:solid;",
                DividerStyle::Dashed => "border-style:dashed;",
                DividerStyle::Dotted => "border-style:dotted;",
            };
            write!(out, "<hr{}>", build_attrs(ctx.key, "pc-divider", extra, style))?;
        }
        Block::Spacer(s) => {
            let style = format!("height:{}px;", s.height.unwrap_or(32));
            let attrs = build_attrs(ctx.key, "pc-spacer", extra, &style);
            write!(out, "<div{} aria-hidden=\"true\"></div>", attrs)?;
        }
        Block::Hero(hero) => render_hero(hero, ctx, extra, out)?,
        Block::Features(f) => {
            let attrs = build_attrs(ctx.key, "pc-features", extra, "");
            write!(out, "<section{}>", attrs)?;
            write_section_title(f.title.as_deref(), out)?;
            write!(out, "<div class=\"pc-grid\" style=\"{}\">", grid_style(clamp_columns(f.columns, 3)))?;
            for item in &f.items {
                write!(out, "<article class=\"pc-feature\">")?;
                if let Some(icon) = item.icon.as_deref().filter(|i| !i.is_empty()) {
                    write!(out, "<span class=\"pc-feature__icon\" data-icon=\"{}\"></span>", escape_html(icon))?;
                }
                write!(
                    out,
                    "<h3>{}</h3><p>{}</p></article>",
                    escape_html(&item.title),
                    escape_html(&item.description)
                )?;
            }
            write!(out, "</div></section>")?;
        }
        Block::Testimonials(t) => {
            let attrs = build_attrs(ctx.key, "pc-testimonials", extra, "");
            write!(out, "<section{}>", attrs)?;
            write_section_title(t.title.as_deref(), out)?;
            for item in &t.items {
                write!(out, "<blockquote class=\"pc-testimonial\"><p>{}</p><footer>", escape_html(&item.quote))?;
                if let Some(avatar) = ctx.media_url(item.avatar.as_ref()) {
                    write!(
                        out,
                        "<img class=\"pc-testimonial__avatar\" src=\"{}\" alt=\"{}\">",
                        escape_html(&avatar),
                        escape_html(&item.author)
                    )?;
                }
                write!(out, "<cite>{}</cite>", escape_html(&item.author))?;
                if let Some(role) = item.role.as_deref().filter(|r| !r.is_empty()) {
                    write!(out, "<span class=\"pc-testimonial__role\">{}</span>", escape_html(role))?;
                }
                write!(out, "</footer></blockquote>")?;
            }
            write!(out, "</section>")?;
        }
        Block::CallToAction(cta) => {
            let attrs = build_attrs(ctx.key, "pc-cta", extra, "");
            write!(out, "<section{}><h2>{}</h2>", attrs, escape_html(&cta.title))?;
            if let Some(text) = cta.text.as_deref().filter(|t| !t.is_empty()) {
                write!(out, "<p>{}</p>", escape_html(text))?;
            }
            write_action(cta.button_text.as_deref(), cta.button_url.as_deref(), out)?;
            write!(out, "</section>")?;
        }
        Block::Pricing(p) => {
            let attrs = build_attrs(ctx.key, "pc-pricing", extra, "");
            write!(out, "<section{}>", attrs)?;
            write_section_title(p.title.as_deref(), out)?;
            write!(out, "<div class=\"pc-grid\" style=\"{}\">", grid_style(clamp_columns(Some(p.plans.len() as u32), 3)))?;
            for plan in &p.plans {
                let class = if plan.highlighted {
                    "pc-plan pc-plan--highlighted"
                } else {
                    "pc-plan"
                };
                write!(
                    out,
                    "<article class=\"{}\"><h3>{}</h3><p class=\"pc-plan__price\">{}",
                    class,
                    escape_html(&plan.name),
                    escape_html(&display_value(&plan.price))
                )?;
                if let Some(period) = plan.period.as_deref().filter(|p| !p.is_empty()) {
                    write!(out, "<span class=\"pc-plan__period\">/{}</span>", escape_html(period))?;
                }
                write!(out, "</p>")?;
                if !plan.features.is_empty() {
                    write!(out, "<ul>")?;
                    for feature in &plan.features {
                        write!(out, "<li>{}</li>", escape_html(feature))?;
                    }
                    write!(out, "</ul>")?;
                }
                write_action(plan.button_text.as_deref(), plan.button_url.as_deref(), out)?;
                write!(out, "</article>")?;
            }
            write!(out, "</div></section>")?;
        }
        Block::ProductGrid(grid) => render_product_grid(grid, ctx, extra, out)?,
        Block::DynamicAi(_) | Block::Unknown(_) => {}
    }
    Ok(())
}

fn write_section_title(title: Option<&str>, out: &mut String) -> std::fmt::Result {
    match title.filter(|t| !t.is_empty()) {
        Some(title) => write!(out, "<h2>{}</h2>", escape_html(title)),
        None => Ok(()),
    }
}

/// Call-to-action link; nothing is written without both text and a usable URL.
fn write_action(text: Option<&str>, url: Option<&str>, out: &mut String) -> std::fmt::Result {
    match (text.filter(|t| !t.is_empty()), link_target(url)) {
        (Some(text), Some(url)) => write!(
            out,
            "<a class=\"pc-button pc-button--primary\" href=\"{}\">{}</a>",
            escape_html(url),
            escape_html(text)
        ),
        _ => Ok(()),
    }
}

fn render_hero(hero: &Hero, ctx: &BlockContext<'_>, extra: Option<&str>, out: &mut String) -> std::fmt::Result {
    let mut style = align_css(hero.align);
    if let Some(bg) = ctx.media_url(hero.background_image.as_ref()) {
        write!(
            style,
            "background-image:url(\"{}\");background-size:cover;background-position:center;",
            escape_css_string(&bg)
        )?;
    }
    let attrs = build_attrs(ctx.key, "pc-hero", extra, &style);
    write!(out, "<section{}><h1>{}</h1>", attrs, escape_html(&hero.title))?;
    if let Some(subtitle) = hero.subtitle.as_deref().filter(|s| !s.is_empty()) {
        write!(out, "<p class=\"pc-hero__subtitle\">{}</p>", escape_html(subtitle))?;
    }
    write_action(hero.button_text.as_deref(), hero.button_url.as_deref(), out)?;
    write!(out, "</section>")
}

/// Inline products win; otherwise `page_data.products` is read.
fn grid_products(grid: &ProductGrid, page_data: &Value) -> Vec<Product> {
    if let Some(products) = &grid.products {
        return products.clone();
    }
    match page_data.get("products") {
        Some(Value::Array(_)) => serde_json::from_value(page_data["products"].clone()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "page data products could not be read");
            Vec::new()
        }),
        _ => Vec::new(),
    }
}

fn render_product_grid(
    grid: &ProductGrid,
    ctx: &BlockContext<'_>,
    extra: Option<&str>,
    out: &mut String,
) -> std::fmt::Result {
    let mut products = grid_products(grid, ctx.page_data);
    if let Some(limit) = grid.limit.filter(|l| *l > 0) {
        products.truncate(limit as usize);
    }
    let attrs = build_attrs(ctx.key, "pc-products", extra, "");
    write!(out, "<section{}>", attrs)?;
    write_section_title(grid.title.as_deref(), out)?;
    write!(out, "<div class=\"pc-grid\" style=\"{}\">", grid_style(clamp_columns(grid.columns, 4)))?;
    for product in &products {
        write!(out, "<article class=\"pc-product\">")?;
        if let Some(src) = ctx.media_url(product.image.as_ref()) {
            write!(out, "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">", escape_html(&src), escape_html(&product.name))?;
        }
        match link_target(product.url.as_deref()) {
            Some(url) => write!(out, "<h3><a href=\"{}\">{}</a></h3>", escape_html(url), escape_html(&product.name))?,
            None => write!(out, "<h3>{}</h3>", escape_html(&product.name))?,
        }
        let price = display_value(&product.price);
        if !price.is_empty() {
            write!(out, "<p class=\"pc-product__price\">{}</p>", escape_html(&price))?;
        }
        write!(out, "</article>")?;
    }
    write!(out, "</div></section>")
}
