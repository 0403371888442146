use verkove_core::{BaseDesign, ChatMessage, Specifications, SubDesign};

use crate::chat::ChatContext;

/// Turns of project history included in a chat directive.
pub const HISTORY_TURNS: usize = 10;

const PHOTOGRAPHY: &str = "Style: professional studio lighting, clean white background, \
photorealistic product photography, sharp focus on metal and stone detail.";

pub fn persona() -> &'static str {
    "You are an expert jewelry design consultant at Verkove, an AI-assisted jewelry design \
studio. Help the client refine their piece with concrete advice on materials, gemstones, \
proportions, finishes and manufacturability. Keep answers concise, warm and specific."
}

fn materials(spec: Option<&Specifications>) -> Option<String> {
    spec.filter(|s| !s.materials.is_empty())
        .map(|s| s.materials.join(", "))
}

/// Compose the image-generation directive. `prompt` is embedded verbatim.
pub fn generation_directive(prompt: &str, base: Option<&BaseDesign>, editing: bool) -> String {
    let mut out = String::with_capacity(512);

    out.push_str("Create a professional jewelry design image: ");
    out.push_str(prompt.trim());
    out.push('\n');

    match base {
        Some(b) => {
            out.push_str("Base design: \"");
            out.push_str(&b.name);
            out.push_str("\" (");
            out.push_str(b.category.as_str());
            out.push(')');
            if let Some(m) = materials(b.specifications.as_ref()) {
                out.push_str(". Materials: ");
                out.push_str(&m);
            }
            out.push('\n');
        }
        None => out.push_str("Design a custom piece of fine jewelry.\n"),
    }

    if editing {
        out.push_str(
            "Edit the provided image to apply the request. Keep the piece recognizable and \
change only what was asked.\n",
        );
    }

    out.push_str(PHOTOGRAPHY);
    out
}

/// Compact text form of the client's workspace context.
pub fn serialize_context(
    ctx: &ChatContext,
    base: Option<&BaseDesign>,
    enhancements: &[SubDesign],
) -> String {
    let mut out = String::new();

    if let Some(b) = base {
        out.push_str("base design: ");
        out.push_str(&b.name);
        out.push_str(" (");
        out.push_str(b.category.as_str());
        out.push_str(") | \"");
        out.push_str(&b.description);
        out.push_str("\"\n");
    } else if let Some(id) = ctx.base_design {
        out.push_str(&format!("base design id: {id}\n"));
    }

    if let Some(current) = &ctx.current_design {
        if !current.prompt.is_empty() {
            out.push_str("current design: ");
            out.push_str(&current.prompt);
            out.push('\n');
        }
        if let Some(m) = materials(current.specifications.as_ref()) {
            out.push_str("materials: ");
            out.push_str(&m);
            out.push('\n');
        }
        if let Some(spec) = &current.specifications {
            let d = &spec.dimensions;
            if !d.width.is_empty() || !d.height.is_empty() || !d.depth.is_empty() {
                out.push_str(&format!(
                    "dimensions: {} x {} x {}\n",
                    d.width, d.height, d.depth
                ));
            }
            if !spec.weight.is_empty() {
                out.push_str("weight: ");
                out.push_str(&spec.weight);
                out.push('\n');
            }
        }
    }

    if !enhancements.is_empty() {
        out.push_str("selected enhancements: ");
        out.push_str(
            &enhancements
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        );
        out.push('\n');
    }

    if let Some(notes) = ctx.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        out.push_str("notes: ");
        out.push_str(notes.trim());
        out.push('\n');
    }

    out
}

/// Persona, then context, then the recent conversation, then the message.
pub fn chat_directive(message: &str, context: Option<&str>, history: &[ChatMessage]) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str(persona());
    out.push_str("\n\n");

    if let Some(ctx) = context.filter(|c| !c.trim().is_empty()) {
        out.push_str("DESIGN CONTEXT:\n");
        out.push_str(ctx);
        if !ctx.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }

    let recent = &history[history.len().saturating_sub(HISTORY_TURNS)..];
    if !recent.is_empty() {
        out.push_str("CONVERSATION SO FAR:\n");
        for turn in recent {
            out.push_str(if turn.is_user { "Client: " } else { "Consultant: " });
            out.push_str(&turn.content);
            out.push('\n');
        }
        out.push('\n');
    }

    out.push_str("CLIENT MESSAGE:\n");
    out.push_str(message);
    out
}
