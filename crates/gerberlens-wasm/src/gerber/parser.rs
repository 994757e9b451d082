//! Line-oriented reader for the subset of RS-274X the previewer draws.
//!
//! Recognized lines: `%ADD` aperture definitions, `[G54]D<n>*` tool selects and
//! `X<int>Y<int>D0<1|2|3>*` operations. Everything else is skipped. Arc and
//! region lines are kept as tags but never move the cursor or the bounds.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::geometry::{BoundingBox, Point};

use super::types::{ApertureShape, DeclaredUnits, GerberCommand, ParsedGerberData, UNITS_PER_MM};

/// D-codes below this are operation codes, not tool selections.
const FIRST_TOOL_DCODE: u32 = 10;

/// Decimal digits implied by [`UNITS_PER_MM`].
const ASSUMED_DECIMAL_DIGITS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Draw,
    Move,
    Flash,
}

#[derive(Debug, Default)]
struct ParserState {
    cursor: Point,
    current_aperture: Option<String>,
    bounds: BoundingBox,
    commands: Vec<GerberCommand>,
    apertures: BTreeMap<String, ApertureShape>,
    declared_units: Option<DeclaredUnits>,
    warnings: Vec<String>,
    warned_no_aperture: bool,
    warned_undefined: BTreeSet<String>,
}

/// Parse the text of one Gerber file.
///
/// Never fails: unrecognized lines are skipped, and a file without any
/// coordinate reports [`BoundingBox::DEFAULT_LAYER`].
pub fn parse(content: &str) -> ParsedGerberData {
    let mut state = ParserState::default();

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        state.apply_line(line);
    }

    state.finish()
}

impl ParserState {
    fn apply_line(&mut self, line: &str) {
        if let Some((id, shape)) = parse_aperture_definition(line) {
            self.apertures.insert(id, shape);
            return;
        }

        if let Some(id) = parse_tool_select(line) {
            if id >= FIRST_TOOL_DCODE {
                self.current_aperture = Some(id.to_string());
            }
            return;
        }

        if let Some((point, op)) = parse_operation(line) {
            self.apply_operation(point, op);
            return;
        }

        if let Some(begin) = parse_region_marker(line) {
            self.commands.push(GerberCommand::Region { begin });
            return;
        }

        if is_arc_line(line) {
            self.commands.push(GerberCommand::Arc {
                source: line.to_string(),
            });
            return;
        }

        self.inspect_header(line);
    }

    fn apply_operation(&mut self, point: Point, op: Operation) {
        let command = match op {
            Operation::Draw => GerberCommand::Draw {
                x1: self.cursor.x,
                y1: self.cursor.y,
                x2: point.x,
                y2: point.y,
                aperture: self.checked_aperture(),
            },
            Operation::Move => GerberCommand::Move {
                x: point.x,
                y: point.y,
            },
            Operation::Flash => GerberCommand::Flash {
                x: point.x,
                y: point.y,
                aperture: self.checked_aperture(),
            },
        };

        self.commands.push(command);
        self.cursor = point;
        self.bounds.update(point.x, point.y);
    }

    /// Current aperture, noting once per file when none is selected and once
    /// per id when it was never defined.
    fn checked_aperture(&mut self) -> Option<String> {
        match &self.current_aperture {
            None => {
                if !self.warned_no_aperture {
                    self.warned_no_aperture = true;
                    self.warnings
                        .push("draw or flash before any aperture was selected".to_string());
                }
                None
            }
            Some(id) => {
                if !self.apertures.contains_key(id) && self.warned_undefined.insert(id.clone()) {
                    self.warnings
                        .push(format!("aperture D{id} is used but never defined"));
                }
                Some(id.clone())
            }
        }
    }

    fn inspect_header(&mut self, line: &str) {
        if let Some(units) = parse_mode_statement(line) {
            if units == DeclaredUnits::Inches {
                self.warnings.push(
                    "file declares inches; coordinates are still read as millimetres".to_string(),
                );
            }
            self.declared_units = Some(units);
            return;
        }

        if let Some(decimals) = parse_format_decimals(line) {
            if decimals != ASSUMED_DECIMAL_DIGITS {
                self.warnings.push(format!(
                    "format statement declares {decimals} decimal digits; \
                     coordinates are scaled assuming {ASSUMED_DECIMAL_DIGITS}"
                ));
            }
        }
    }

    fn finish(self) -> ParsedGerberData {
        let bounds = if self.bounds.is_empty() {
            BoundingBox::DEFAULT_LAYER
        } else {
            self.bounds
        };

        debug!(
            "parsed gerber: {} commands, {} apertures, {} warnings",
            self.commands.len(),
            self.apertures.len(),
            self.warnings.len()
        );

        ParsedGerberData {
            commands: self.commands,
            apertures: self.apertures,
            bounds,
            declared_units: self.declared_units,
            warnings: self.warnings,
        }
    }
}

/// `%ADD<id><C|R|O>,<p1>[X<p2>...]*%`
fn parse_aperture_definition(line: &str) -> Option<(String, ApertureShape)> {
    let body = line.strip_prefix("%ADD")?.strip_suffix('%')?;
    let body = body.strip_suffix('*').unwrap_or(body);

    let digits_end = body.find(|ch: char| !ch.is_ascii_digit())?;
    let (id_raw, rest) = body.split_at(digits_end);
    let id = id_raw.parse::<u32>().ok()?;

    let mut chars = rest.chars();
    let template = chars.next()?;
    let params = chars.as_str().strip_prefix(',')?;

    let mut values = params.split('X').map(|value| value.trim().parse::<f64>());
    let first = values.next()?.ok()?;

    let shape = match template {
        'C' => ApertureShape::Circle { diameter: first },
        'R' | 'O' => {
            let height = match values.next() {
                Some(Ok(height)) => height,
                Some(Err(_)) => return None,
                None => first,
            };
            if template == 'R' {
                ApertureShape::Rectangle {
                    width: first,
                    height,
                }
            } else {
                ApertureShape::Obround {
                    width: first,
                    height,
                }
            }
        }
        _ => return None,
    };

    Some((id.to_string(), shape))
}

/// `[G54]D<n>*`
fn parse_tool_select(line: &str) -> Option<u32> {
    let body = line.strip_prefix("G54").unwrap_or(line);
    let digits = body.strip_prefix('D')?.strip_suffix('*')?;
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// `[G01]X<int>Y<int>D<op>*`
fn parse_operation(line: &str) -> Option<(Point, Operation)> {
    let body = line
        .strip_prefix("G01")
        .or_else(|| line.strip_prefix("G1"))
        .unwrap_or(line);

    let body = body.strip_prefix('X')?;
    let (x, rest) = split_signed_int(body)?;
    let rest = rest.strip_prefix('Y')?;
    let (y, rest) = split_signed_int(rest)?;
    let op_raw = rest.strip_prefix('D')?.strip_suffix('*')?;

    if op_raw.is_empty() || !op_raw.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }

    let op = match op_raw.parse::<u32>().ok()? {
        1 => Operation::Draw,
        2 => Operation::Move,
        3 => Operation::Flash,
        _ => return None,
    };

    Some((Point::new(x / UNITS_PER_MM, y / UNITS_PER_MM), op))
}

/// Splits a leading signed integer off `raw`, returning its value and the rest.
fn split_signed_int(raw: &str) -> Option<(f64, &str)> {
    let sign_len = usize::from(raw.starts_with(['+', '-']));
    let digits_len = raw
        .get(sign_len..)?
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(raw.len() - sign_len);

    if digits_len == 0 {
        return None;
    }

    let (number, rest) = raw.split_at(sign_len + digits_len);
    let value = number.parse::<f64>().ok()?;
    value.is_finite().then_some((value, rest))
}

fn parse_region_marker(line: &str) -> Option<bool> {
    match line {
        "G36*" => Some(true),
        "G37*" => Some(false),
        _ => None,
    }
}

/// Circular interpolation: an explicit `G02`/`G03` prefix or `I`/`J` offsets,
/// ending in a `D01` draw.
fn is_arc_line(line: &str) -> bool {
    let (prefixed, body) = ["G02", "G03", "G2", "G3"]
        .iter()
        .find_map(|prefix| line.strip_prefix(prefix))
        .map_or((false, line), |rest| (true, rest));

    let has_offsets = body.contains('I') || body.contains('J');
    let interpolates = body.ends_with("D01*") || body.ends_with("D1*");

    interpolates && (prefixed || has_offsets) && body.starts_with(['X', 'Y', 'I', 'J'])
}

/// `%MOMM*%` / `%MOIN*%`
fn parse_mode_statement(line: &str) -> Option<DeclaredUnits> {
    match line {
        "%MOMM*%" => Some(DeclaredUnits::Millimeters),
        "%MOIN*%" => Some(DeclaredUnits::Inches),
        _ => None,
    }
}

/// Decimal digit count from `%FS<L|T><A|I>X<i><d>Y<i><d>*%`.
fn parse_format_decimals(line: &str) -> Option<u32> {
    let body = line.strip_prefix("%FS")?;
    let x_at = body.find('X')?;
    let mut digits = body.get(x_at + 1..)?.chars();
    digits.next()?.to_digit(10)?;
    digits.next()?.to_digit(10)
}
