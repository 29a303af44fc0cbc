//! Server-side rendering of the single page: sidebar controls with status banners,
//! the prompt form, and a two-column grid of generated images.

use crate::{
    error::Result,
    models::{
        Banner, BannerKind, GeneratedImage, GenerationParameters, DIMENSION_RANGE,
        DIMENSION_STEP, GUIDANCE_SCALE_RANGE, IMAGES_NUM_RANGE, MAX_NEW_TOKENS_RANGE,
        STEPS_RANGE, TEMPERATURE_RANGE, TOP_K_RANGE,
    },
    pipeline::to_png_data_uri,
};
use std::fmt::Write as _;
use uuid::Uuid;

pub const TITLE: &str = "Image Generation with SDXL and OpenVino";
pub const GRID_COLUMNS: usize = 2;

pub struct PageView<'a> {
    /// Carried through the form so only this page's submissions share state.
    pub session: Uuid,
    pub status: &'a [Banner],
    pub messages: &'a [Banner],
    pub params: &'a GenerationParameters,
    pub prompt: &'a str,
    pub entries: &'a [GeneratedImage],
    pub generate_enabled: bool,
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Entry `i` goes to column `i % GRID_COLUMNS`, keeping sequence order inside each column.
pub fn split_columns<T>(items: &[T]) -> Vec<Vec<&T>> {
    let mut columns: Vec<Vec<&T>> = (0..GRID_COLUMNS).map(|_| Vec::new()).collect();
    for (i, item) in items.iter().enumerate() {
        columns[i % GRID_COLUMNS].push(item);
    }
    columns
}

pub fn render_page(view: &PageView<'_>) -> Result<String> {
    let mut html = String::with_capacity(8 * 1024);

    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
<aside class="sidebar">
<h1>{title}</h1>
"#,
        title = TITLE,
    );

    for banner in view.status {
        render_banner(&mut html, banner);
    }

    let _ = writeln!(
        html,
        r#"<form id="generate" method="post" action="/generate">
<input type="hidden" name="session" value="{}">"#,
        view.session
    );
    render_controls(&mut html, view.params);
    html.push_str("</aside>\n<main>\n");

    let _ = write!(
        html,
        r#"<label for="prompt">Text Prompt</label>
<input id="prompt" name="prompt" type="text" value="{prompt}" required>
<button type="submit"{disabled}>Generate Images</button>
<div id="spinner" hidden>Generating images...</div>
</form>
"#,
        prompt = escape_html(view.prompt),
        disabled = if view.generate_enabled { "" } else { " disabled" },
    );

    for banner in view.messages {
        render_banner(&mut html, banner);
    }

    render_grid(&mut html, view.entries)?;

    html.push_str(SCRIPT);
    html.push_str("</main>\n</body>\n</html>\n");
    Ok(html)
}

fn render_banner(html: &mut String, banner: &Banner) {
    let (class, icon) = match banner.kind {
        BannerKind::Success => ("success", "👉"),
        BannerKind::Warning => ("warning", "⚠️"),
        BannerKind::Error => ("error", "❌"),
    };
    let _ = writeln!(
        html,
        r#"<div class="banner {}">{} {}</div>"#,
        class,
        icon,
        escape_html(&banner.message)
    );
}

fn render_controls(html: &mut String, params: &GenerationParameters) {
    html.push_str("<h2>Number of images to generate</h2>\n");
    slider(
        html,
        "images_num",
        "num_of_img",
        *IMAGES_NUM_RANGE.start() as f64,
        *IMAGES_NUM_RANGE.end() as f64,
        1.0,
        params.images_num as f64,
    );

    html.push_str("<h2>Llama Model parameters</h2>\n");
    slider(
        html,
        "max_new_tokens",
        "max_new_tokens",
        *MAX_NEW_TOKENS_RANGE.start() as f64,
        *MAX_NEW_TOKENS_RANGE.end() as f64,
        10.0,
        params.max_new_tokens as f64,
    );
    slider(
        html,
        "temperature",
        "temperature",
        *TEMPERATURE_RANGE.start() as f64,
        *TEMPERATURE_RANGE.end() as f64,
        0.1,
        params.temperature as f64,
    );
    slider(
        html,
        "top_k",
        "top_k",
        *TOP_K_RANGE.start() as f64,
        *TOP_K_RANGE.end() as f64,
        1.0,
        params.top_k as f64,
    );

    html.push_str("<h2>SD Model parameters</h2>\n");
    slider(
        html,
        "num_inference_steps",
        "steps",
        *STEPS_RANGE.start() as f64,
        *STEPS_RANGE.end() as f64,
        1.0,
        params.num_inference_steps as f64,
    );
    slider(
        html,
        "guidance_scale",
        "guidance_scale",
        *GUIDANCE_SCALE_RANGE.start() as f64,
        *GUIDANCE_SCALE_RANGE.end() as f64,
        0.5,
        params.guidance_scale as f64,
    );
    for (name, value) in [("height", params.height), ("width", params.width)] {
        slider(
            html,
            name,
            name,
            *DIMENSION_RANGE.start() as f64,
            *DIMENSION_RANGE.end() as f64,
            DIMENSION_STEP as f64,
            value as f64,
        );
    }
}

fn slider(html: &mut String, name: &str, label: &str, min: f64, max: f64, step: f64, value: f64) {
    // f32 parameters are rounded so 0.8f32 renders as 0.8, not 0.800000011920929.
    let value = (value * 100.0).round() / 100.0;
    let _ = writeln!(
        html,
        r#"<label>{label} <output>{value}</output>
<input type="range" name="{name}" min="{min}" max="{max}" step="{step}" value="{value}" oninput="this.previousElementSibling.value=this.value"></label>"#,
    );
}

fn render_grid(html: &mut String, entries: &[GeneratedImage]) -> Result<()> {
    if entries.is_empty() {
        return Ok(());
    }

    html.push_str(r#"<div class="grid">"#);
    for column in split_columns(entries) {
        html.push_str(r#"<div class="column">"#);
        for entry in column {
            let caption = escape_html(&entry.caption);
            let _ = write!(
                html,
                r#"<figure><img src="{}" alt="{}"><figcaption>{}</figcaption></figure>"#,
                to_png_data_uri(&entry.image)?,
                caption,
                caption
            );
        }
        html.push_str("</div>");
    }
    html.push_str("</div>\n");
    Ok(())
}

const STYLE: &str = "\
body{margin:0;display:flex;font-family:sans-serif}\
.sidebar{width:320px;padding:1rem;background:#f0f2f6;min-height:100vh}\
.sidebar label{display:block;margin:.5rem 0}\
.sidebar input{width:100%}\
main{flex:1;padding:2rem}\
main input[type=text]{width:100%;padding:.5rem;margin:.5rem 0}\
.banner{padding:.75rem;border-radius:.5rem;margin:.5rem 0}\
.success{background:#d4edda}.warning{background:#fff3cd}.error{background:#f8d7da}\
.grid{display:flex;gap:1rem;margin-top:1rem}\
.column{flex:1}\
figure{margin:0 0 1rem 0}img{width:100%}figcaption{text-align:center;color:#555}";

const SCRIPT: &str = r#"<script>
document.getElementById("generate").addEventListener("submit", function (e) {
  var button = e.target.querySelector("button[type=submit]");
  if (button) { button.disabled = true; }
  document.getElementById("spinner").hidden = false;
});
</script>
"#;
