//! Prompt text and response schemas

use crate::types::{AssetContext, CopyPrompt, ImagePrompt, TemplatePrompt};
use serde_json::{json, Value};
use std::fmt::Write;

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

fn context_lines(out: &mut String, context: &AssetContext) {
    let _ = writeln!(out, "- Asset: {}", context.asset_name);
    let _ = writeln!(out, "- Project: {}", context.project_name);
    let _ = writeln!(out, "- Client: {}", context.client_name);
}

/// Copywriting prompt
#[must_use]
pub fn copy_prompt(prompt: &CopyPrompt) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str("You are an expert copywriter creating ad variants.\n");
    let _ = writeln!(
        out,
        "Generate {} different text variants for an advertisement based on the provided context.",
        prompt.count
    );
    out.push_str(
        "Each variant should include a headline, subheadline, and call-to-action (CTA).\n\nContext:\n",
    );
    context_lines(&mut out, &prompt.context);
    if let Some(brief) = &prompt.context.project_brief {
        let _ = writeln!(out, "- Brief: {brief}");
    }
    let _ = writeln!(
        out,
        "- Default bindings: {}",
        to_json(&prompt.context.default_bindings)
    );
    let _ = writeln!(out, "- Style hints: {}", to_json(&prompt.context.style_hints));

    if let Some(c) = &prompt.constraints {
        out.push_str("\nConstraints:\n");
        if let Some(words) = c.headline_max_words {
            let _ = writeln!(out, "- Headline: max {words} words");
        }
        if let Some(chars) = c.subheadline_max_chars {
            let _ = writeln!(out, "- Subheadline: max {chars} characters");
        }
        if let Some(tone) = c.tone {
            let _ = writeln!(out, "- Tone: {}", tone.as_str());
        }
        if let Some(allowed) = &c.cta_phrases_allowed {
            let _ = writeln!(out, "- Allowed CTA phrases: {}", allowed.join(", "));
        }
        if let Some(banned) = &c.banned_phrases {
            let _ = writeln!(out, "- Banned phrases: {}", banned.join(", "));
        }
    }

    out.push_str(
        "\nRespond with valid JSON only in this exact format:\n\
         {\"variants\": [{\"headline\": \"...\", \"subheadline\": \"...\", \"cta\": \"...\"}, ...]}",
    );
    out
}

/// Background image prompt
#[must_use]
pub fn image_prompt(prompt: &ImagePrompt) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str("Create a professional advertisement background image for:\n");
    context_lines(&mut out, &prompt.context);
    let _ = writeln!(out, "- Style hints: {}", to_json(&prompt.context.style_hints));
    out.push_str(
        "\nRequirements:\n\
         - High quality, professional advertisement background\n\
         - Suitable for text overlay (ensure text-safe areas)\n\
         - Match the brand palette and style hints provided\n\
         - No embedded text or typography in the image\n\
         - Maintain visual hierarchy for headline, subheadline, and CTA placement\n\
         - Clean, modern aesthetic suitable for digital advertising\n",
    );
    if let Some(seed) = &prompt.seed_image_url {
        let _ = write!(out, "\nReference image style: {seed}");
    }
    out
}

/// Template extraction prompt
#[must_use]
pub fn template_prompt(prompt: &TemplatePrompt) -> String {
    let mut out = String::with_capacity(2048);
    out.push_str(
        "You are a senior ad designer converting a finished creative into a reusable SVG template.\n\
         Recreate the layout of the master asset as a standalone SVG document.\n\n\
         Context:\n",
    );
    let _ = writeln!(out, "- Asset: {}", prompt.asset_name);
    let _ = writeln!(out, "- Project: {}", prompt.project_name);
    if let Some(brief) = &prompt.project_brief {
        let _ = writeln!(out, "- Brief: {brief}");
    }
    let _ = writeln!(out, "- Client: {}", prompt.client_name);
    let _ = writeln!(out, "- Master asset: {}", prompt.master_url);
    out.push_str(
        "\nRequirements:\n\
         - Use {{headline}}, {{subheadline}} and {{cta}} as text placeholders\n\
         - Use {{imageUrl}} as the href of the background image\n\
         - Keep the original dimensions, palette and typography\n\
         - List every font family used in templateFonts\n\
         - Fill defaultBindings with the copy visible in the master asset\n\
         - Describe the palette (hex colors), brand and notes in styleHints\n\
         \nRespond with valid JSON only matching the response schema.",
    );
    out
}

/// Schema for `{variants: [{headline, subheadline, cta}]}`
#[must_use]
pub fn copy_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "variants": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "headline": { "type": "STRING" },
                        "subheadline": { "type": "STRING" },
                        "cta": { "type": "STRING" }
                    },
                    "required": ["headline", "subheadline", "cta"]
                }
            }
        },
        "required": ["variants"]
    })
}

/// Schema for a generated template
#[must_use]
pub fn template_schema() -> Value {
    let string = json!({ "type": "STRING" });
    json!({
        "type": "OBJECT",
        "properties": {
            "templateSvg": string,
            "templateFonts": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "family": string,
                        "url": string,
                        "weight": string,
                        "style": string
                    },
                    "required": ["family"]
                }
            },
            "defaultBindings": {
                "type": "OBJECT",
                "properties": {
                    "headline": string,
                    "subheadline": string,
                    "cta": string,
                    "image": string
                }
            },
            "styleHints": {
                "type": "OBJECT",
                "properties": {
                    "palette": { "type": "ARRAY", "items": string },
                    "brand": string,
                    "notes": string
                }
            }
        },
        "required": ["templateSvg", "templateFonts", "defaultBindings", "styleHints"]
    })
}
