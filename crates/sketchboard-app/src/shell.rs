//! Line-oriented shell driving an [`Editor`].

use crate::commands::{Action, USAGE, parse_line};
use peniko::Color;
use sketchboard_core::storage::Confirm;
use sketchboard_core::{CommandOutcome, Editor, Focus, KeyValueStore, ShortcutRegistry};
use std::io::{self, BufRead, Write};

/// Asks yes/no questions on the shell's own input.
struct PromptConfirm<'a> {
    input: &'a mut dyn BufRead,
    output: &'a mut dyn Write,
}

impl Confirm for PromptConfirm<'_> {
    fn confirm(&mut self, message: &str) -> bool {
        let prompt = write!(self.output, "{} [y/N] ", message).and_then(|_| self.output.flush());
        if let Err(e) = prompt {
            log::warn!("Failed to write prompt: {}", e);
            return false;
        }
        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(e) => {
                log::warn!("Failed to read answer: {}", e);
                false
            }
        }
    }
}

/// Read lines until end of input or `quit`.
pub fn run<S: KeyValueStore>(
    editor: &mut Editor<S>,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> io::Result<()> {
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let action = match parse_line(&line) {
            Ok(Some(action)) => action,
            Ok(None) => continue,
            Err(e) => {
                writeln!(output, "error: {}", e)?;
                continue;
            }
        };
        if action == Action::Quit {
            break;
        }
        dispatch(editor, action, input, output)?;
    }
    output.flush()
}

fn dispatch<S: KeyValueStore>(
    editor: &mut Editor<S>,
    action: Action,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> io::Result<()> {
    match action {
        Action::Command(command) => {
            let mut confirm = PromptConfirm {
                input,
                output: &mut *output,
            };
            let outcome = editor.execute(command, &mut confirm);
            report(outcome, output)?;
        }
        Action::Pointer(events) => {
            for event in events {
                editor.pointer(event);
            }
        }
        Action::Key(press) => {
            let focus = if editor.text_session().is_some() {
                Focus::TextEditor
            } else {
                Focus::Canvas
            };
            match editor.key(&press, focus, &mut PromptConfirm { input, output: &mut *output }) {
                Some(outcome) => report(outcome, output)?,
                None => writeln!(output, "no shortcut for {}", press.key)?,
            }
        }
        Action::EditText(id) => {
            if !editor.open_text_edit(&id) {
                writeln!(output, "{} is not an editable text shape", id)?;
            }
        }
        Action::Type(text) => {
            if editor.text_session().is_none() {
                writeln!(output, "no text editor open")?;
            } else {
                editor.live_update_text(&text);
            }
        }
        Action::ImageLoaded { src, size } => editor.image_loaded(&src, size),
        Action::ImageFailed(src) => editor.image_failed(&src),
        Action::Resize(size) => {
            let origin = editor.stage().container_origin();
            editor.resize(size, origin);
        }
        Action::Scroll(origin) => editor.scroll(origin),
        Action::Pan(delta) => editor.pan(delta),
        Action::Zoom { at, factor } => editor.zoom_at(at, factor),
        Action::List => list(editor, output)?,
        Action::Json => match serde_json::to_string_pretty(editor.document()) {
            Ok(json) => writeln!(output, "{}", json)?,
            Err(e) => log::error!("Failed to serialize document: {}", e),
        },
        Action::Help => {
            for line in USAGE {
                writeln!(output, "{}", line)?;
            }
            writeln!(output, "shortcuts:")?;
            for line in ShortcutRegistry::describe() {
                writeln!(output, "  {}", line)?;
            }
        }
        Action::Quit => {}
    }
    Ok(())
}

fn report(outcome: CommandOutcome, output: &mut dyn Write) -> io::Result<()> {
    let message = match outcome {
        CommandOutcome::Changed | CommandOutcome::Unchanged => return Ok(()),
        CommandOutcome::SnapshotSaved => "snapshot saved",
        CommandOutcome::NoSnapshot => "no snapshot stored",
        CommandOutcome::Declined => "cancelled",
        CommandOutcome::StorageFailed => "storage write failed",
    };
    writeln!(output, "{}", message)
}

/// Print one line per shape, bottom to top. `*` marks selected shapes.
fn list<S: KeyValueStore>(editor: &Editor<S>, output: &mut dyn Write) -> io::Result<()> {
    let document = editor.document();
    if document.is_empty() {
        return writeln!(output, "(empty)");
    }
    for shape in document.iter() {
        let marker = if editor.selection().is_selected(&shape.id) { '*' } else { ' ' };
        write!(
            output,
            "{} {} {:<8} x={:.1} y={:.1} w={:.1} h={:.1} r={:.1}",
            marker,
            shape.id,
            shape.kind.name(),
            shape.x,
            shape.y,
            shape.width,
            shape.height,
            shape.rotation
        )?;
        if let Some(node) = editor.registry().get(&shape.id) {
            write!(output, " fill={} stroke={}", hex(node.fill), hex(node.stroke))?;
            if !node.is_visible() {
                write!(output, " placeholder")?;
            }
        }
        if shape.locked {
            write!(output, " locked")?;
        }
        if let Some(text) = shape.as_text() {
            write!(output, " {:?}", text.text)?;
        }
        writeln!(output)?;
    }
    if let Some(session) = editor.text_session() {
        writeln!(output, "editing {}", session.target())?;
    }
    let stage = editor.stage();
    let viewport = stage.viewport();
    writeln!(
        output,
        "zoom {:.2} viewport {:.0}x{:.0}",
        stage.zoom, viewport.width, viewport.height
    )
}

/// `#rrggbbaa` of a resolved paint.
fn hex(color: Color) -> String {
    let rgba = color.to_rgba8();
    format!("#{:02x}{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b, rgba.a)
}
