//! Parsing of shell input lines into editor actions.

use kurbo::{Point, Size, Vec2};
use sketchboard_core::{Command, KeyPress, Modifiers, MouseButton, PointerEvent};
use thiserror::Error;

/// Errors produced while parsing an input line.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
    #[error("Unknown modifier: {0}")]
    UnknownModifier(String),
}

/// One thing the shell was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Command(Command),
    /// Pointer events delivered in order.
    Pointer(Vec<PointerEvent>),
    Key(KeyPress),
    /// Open the text editor on a shape.
    EditText(String),
    /// Replace the text of the open editor.
    Type(String),
    ImageLoaded { src: String, size: Size },
    ImageFailed(String),
    Resize(Size),
    Scroll(Point),
    Pan(Vec2),
    Zoom { at: Point, factor: f64 },
    List,
    Json,
    Help,
    Quit,
}

/// Usage lines printed by `help`.
pub const USAGE: &[&str] = &[
    "add rect|ellipse|triangle|line|text     add a shape",
    "add image <src>...                      add one image per reference",
    "undo | redo | duplicate | front | back | delete | lock | select-all",
    "save | load | clear                     snapshot and document commands",
    "fill <color> | stroke <color>           style the selection",
    "stroke-width <n> | opacity <n> | font-size <n>",
    "click <x> <y> [mods]                    press and release",
    "down <x> <y> [mods] | move <x> <y> [mods] | up <x> <y>",
    "drag <x0> <y0> <x1> <y1> [mods]         press, move and release",
    "dblclick <x> <y> | right <x> <y>",
    "key <combo>                             e.g. key ctrl+shift+z",
    "edit <id> | type <text> | commit | cancel",
    "image-loaded <src> <w> <h> | image-failed <src>",
    "resize <w> <h> | scroll <x> <y> | pan <dx> <dy> | zoom <factor> <x> <y>",
    "list | json | help | quit",
];

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Action>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let mut args = rest.split_whitespace();

    let action = match word.to_ascii_lowercase().as_str() {
        "undo" => Action::Command(Command::Undo),
        "redo" => Action::Command(Command::Redo),
        "add" => parse_add(&mut args)?,
        "duplicate" => Action::Command(Command::DuplicateSelection),
        "front" => Action::Command(Command::BringToFront),
        "back" => Action::Command(Command::SendToBack),
        "delete" => Action::Command(Command::DeleteSelection),
        "lock" => Action::Command(Command::ToggleLockSelection),
        "select-all" => Action::Command(Command::SelectAll),
        "save" => Action::Command(Command::SaveSnapshot),
        "load" => Action::Command(Command::LoadSnapshot),
        "clear" => Action::Command(Command::ClearDocument),
        "fill" => Action::Command(Command::SetFill(word_arg(&mut args, "color")?)),
        "stroke" => Action::Command(Command::SetStroke(word_arg(&mut args, "color")?)),
        "stroke-width" => Action::Command(Command::SetStrokeWidth(number(&mut args, "width")?)),
        "opacity" => Action::Command(Command::SetOpacity(number(&mut args, "opacity")?)),
        "font-size" => Action::Command(Command::SetFontSize(number(&mut args, "size")?)),
        "commit" => Action::Command(Command::CommitTextEdit),
        "cancel" => Action::Command(Command::CancelTextEdit),
        "click" => {
            let position = point(&mut args)?;
            let modifiers = modifiers(args)?;
            Action::Pointer(vec![
                down(position, MouseButton::Left, modifiers),
                PointerEvent::Up { position },
            ])
        }
        "right" => {
            let position = point(&mut args)?;
            Action::Pointer(vec![
                down(position, MouseButton::Right, Modifiers::NONE),
                PointerEvent::Up { position },
            ])
        }
        "down" => {
            let position = point(&mut args)?;
            Action::Pointer(vec![down(position, MouseButton::Left, modifiers(args)?)])
        }
        "move" => {
            let position = point(&mut args)?;
            Action::Pointer(vec![PointerEvent::Move {
                position,
                modifiers: modifiers(args)?,
            }])
        }
        "up" => Action::Pointer(vec![PointerEvent::Up {
            position: point(&mut args)?,
        }]),
        "drag" => {
            let from = point(&mut args)?;
            let to = point(&mut args)?;
            let modifiers = modifiers(args)?;
            Action::Pointer(vec![
                down(from, MouseButton::Left, modifiers),
                PointerEvent::Move { position: to, modifiers },
                PointerEvent::Up { position: to },
            ])
        }
        "dblclick" => Action::Pointer(vec![PointerEvent::DoubleClick {
            position: point(&mut args)?,
        }]),
        "key" => Action::Key(parse_key(args.next().ok_or(ParseError::MissingArgument("key"))?)?),
        "edit" => Action::EditText(word_arg(&mut args, "id")?),
        // Everything after the keyword, spaces included.
        "type" => Action::Type(rest.replace("\\n", "\n")),
        "image-loaded" => {
            let src = word_arg(&mut args, "src")?;
            let width = number(&mut args, "width")?;
            let height = number(&mut args, "height")?;
            Action::ImageLoaded {
                src,
                size: Size::new(width, height),
            }
        }
        "image-failed" => Action::ImageFailed(word_arg(&mut args, "src")?),
        "resize" => {
            let width = number(&mut args, "width")?;
            let height = number(&mut args, "height")?;
            Action::Resize(Size::new(width, height))
        }
        "scroll" => Action::Scroll(point(&mut args)?),
        "pan" => Action::Pan(point(&mut args)?.to_vec2()),
        "zoom" => {
            let factor = number(&mut args, "factor")?;
            Action::Zoom {
                at: point(&mut args)?,
                factor,
            }
        }
        "list" | "ls" => Action::List,
        "json" => Action::Json,
        "help" | "?" => Action::Help,
        "quit" | "exit" => Action::Quit,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(Some(action))
}

fn parse_add<'a>(args: &mut impl Iterator<Item = &'a str>) -> Result<Action, ParseError> {
    let kind = args.next().ok_or(ParseError::MissingArgument("shape kind"))?;
    let command = match kind.to_ascii_lowercase().as_str() {
        "rect" => Command::AddRect,
        "ellipse" | "circle" => Command::AddEllipse,
        "triangle" => Command::AddTriangle,
        "line" => Command::AddLine,
        "text" => Command::AddText,
        "image" => {
            let sources: Vec<String> = args.map(str::to_string).collect();
            if sources.is_empty() {
                return Err(ParseError::MissingArgument("image source"));
            }
            Command::AddImages(sources)
        }
        other => return Err(ParseError::UnknownCommand(format!("add {other}"))),
    };
    Ok(Action::Command(command))
}

/// Parse a combo such as `ctrl+shift+z` or `Delete`.
fn parse_key(combo: &str) -> Result<KeyPress, ParseError> {
    let mut parts: Vec<&str> = combo.split('+').collect();
    let key = parts.pop().filter(|k| !k.is_empty()).ok_or(ParseError::MissingArgument("key"))?;
    let mut modifiers = Modifiers::NONE;
    for part in parts {
        apply_modifier(&mut modifiers, part)?;
    }
    Ok(KeyPress::new(key, modifiers))
}

fn modifiers<'a>(args: impl Iterator<Item = &'a str>) -> Result<Modifiers, ParseError> {
    let mut modifiers = Modifiers::NONE;
    for arg in args {
        apply_modifier(&mut modifiers, arg)?;
    }
    Ok(modifiers)
}

fn apply_modifier(modifiers: &mut Modifiers, name: &str) -> Result<(), ParseError> {
    match name.to_ascii_lowercase().as_str() {
        "shift" => modifiers.shift = true,
        "ctrl" | "control" => modifiers.ctrl = true,
        "alt" => modifiers.alt = true,
        "meta" | "cmd" => modifiers.meta = true,
        _ => return Err(ParseError::UnknownModifier(name.to_string())),
    }
    Ok(())
}

fn down(position: Point, button: MouseButton, modifiers: Modifiers) -> PointerEvent {
    PointerEvent::Down {
        position,
        button,
        modifiers,
    }
}

fn word_arg<'a>(
    args: &mut impl Iterator<Item = &'a str>,
    name: &'static str,
) -> Result<String, ParseError> {
    args.next().map(str::to_string).ok_or(ParseError::MissingArgument(name))
}

/// Only finite values are accepted; `nan` and `inf` parse as floats but are
/// rejected here.
fn number<'a>(
    args: &mut impl Iterator<Item = &'a str>,
    name: &'static str,
) -> Result<f64, ParseError> {
    let raw = args.next().ok_or(ParseError::MissingArgument(name))?;
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ParseError::InvalidNumber(raw.to_string())),
    }
}

fn point<'a>(args: &mut impl Iterator<Item = &'a str>) -> Result<Point, ParseError> {
    let x = number(args, "x")?;
    let y = number(args, "y")?;
    Ok(Point::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Action {
        parse_line(line).unwrap().unwrap()
    }

    #[test]
    fn test_blank_and_comments() {
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("# setup").unwrap(), None);
    }

    #[test]
    fn test_toolbar_commands() {
        assert_eq!(parse("undo"), Action::Command(Command::Undo));
        assert_eq!(parse("add circle"), Action::Command(Command::AddEllipse));
        assert_eq!(parse("ADD Rect"), Action::Command(Command::AddRect));
        assert_eq!(parse("select-all"), Action::Command(Command::SelectAll));
        assert_eq!(
            parse("add image a.png b.png"),
            Action::Command(Command::AddImages(vec!["a.png".into(), "b.png".into()]))
        );
        assert_eq!(parse("fill #ff0000"), Action::Command(Command::SetFill("#ff0000".into())));
        assert_eq!(parse("opacity 0.5"), Action::Command(Command::SetOpacity(0.5)));
    }

    #[test]
    fn test_pointer_gestures() {
        let Action::Pointer(events) = parse("drag 10 20 30 40 shift") else {
            panic!("expected pointer events");
        };
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            PointerEvent::Down {
                position: Point::new(10.0, 20.0),
                button: MouseButton::Left,
                modifiers: Modifiers::SHIFT,
            }
        );
        assert_eq!(
            events[2],
            PointerEvent::Up {
                position: Point::new(30.0, 40.0)
            }
        );

        let Action::Pointer(events) = parse("right 5 5") else {
            panic!("expected pointer events");
        };
        assert!(matches!(
            events[0],
            PointerEvent::Down {
                button: MouseButton::Right,
                ..
            }
        ));
    }

    #[test]
    fn test_key_combos() {
        let ctrl_shift = Modifiers {
            shift: true,
            ..Modifiers::CTRL
        };
        assert_eq!(parse("key ctrl+shift+z"), Action::Key(KeyPress::new("z", ctrl_shift)));
        assert_eq!(parse("key Delete"), Action::Key(KeyPress::new("Delete", Modifiers::NONE)));
        assert_eq!(
            parse_line("key hyper+z"),
            Err(ParseError::UnknownModifier("hyper".into()))
        );
    }

    #[test]
    fn test_type_keeps_spaces() {
        assert_eq!(parse("type Hello  big world"), Action::Type("Hello  big world".into()));
        assert_eq!(parse("type one\\ntwo"), Action::Type("one\ntwo".into()));
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_line("frobnicate"), Err(ParseError::UnknownCommand("frobnicate".into())));
        assert_eq!(parse_line("add"), Err(ParseError::MissingArgument("shape kind")));
        assert_eq!(parse_line("click 1 x"), Err(ParseError::InvalidNumber("x".into())));
        assert_eq!(parse_line("add image"), Err(ParseError::MissingArgument("image source")));
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        assert_eq!(parse_line("zoom nan 1 1"), Err(ParseError::InvalidNumber("nan".into())));
        assert_eq!(parse_line("pan inf 0"), Err(ParseError::InvalidNumber("inf".into())));
        assert!(parse_line("zoom 1.5 10 10").unwrap().is_some());
    }
}
