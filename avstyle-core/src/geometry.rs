// ============================================================================
// avstyle-core/src/geometry.rs
// ============================================================================
//
// GEOMETRY: ImageMagick-style geometry directives
//
// Parses strings such as "200x300#", "!x100<" or "150x150" into structured
// resize semantics, and produces the sanitized form handed to the engine as
// the output size parameter.
//
// KEY COMPONENTS:
// - Modifier: leading resize policy character
// - Dimension: pixel count or auto
// - GeometryDirective: the parsed, immutable directive
// - strip_modifier / sanitize: pure string helpers
//
// Parsing is eager: malformed input fails here, before any external process
// is started.

use crate::error::{CoreError, CoreResult, config_error};
use std::fmt;
use std::str::FromStr;

/// Characters removed from a geometry string before it reaches the engine.
pub const DIRECTIVE_CHARS: [char; 5] = ['#', '!', '<', '>', ')'];

/// Directive characters tolerated after the digits of a dimension.
const TRAILING_DIRECTIVE_CHARS: [char; 4] = ['#', '<', '>', ')'];

/// Resize policy selected by the first character of a geometry string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modifier {
    #[default]
    None,
    /// `#`
    Pad,
    /// `<`
    Enlarge,
    /// `>`
    Shrink,
}

impl Modifier {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '#' => Some(Self::Pad),
            '<' => Some(Self::Enlarge),
            '>' => Some(Self::Shrink),
            _ => None,
        }
    }
}

/// One side of a geometry box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Pixels(u32),
    Auto,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Pixels(px) => write!(f, "{px}"),
            Dimension::Auto => f.write_str("auto"),
        }
    }
}

/// Splits a leading modifier off a geometry string.
///
/// Returns the modifier and the remainder; the input is left untouched, so
/// callers can still sanitize the full original value.
pub fn strip_modifier(geometry: &str) -> (Modifier, &str) {
    match geometry.chars().next().and_then(Modifier::from_char) {
        // All modifier characters are one byte wide.
        Some(modifier) => (modifier, &geometry[1..]),
        None => (Modifier::None, geometry),
    }
}

/// Removes every directive character (`# ! < > )`) from `geometry`.
pub fn sanitize(geometry: &str) -> String {
    geometry
        .chars()
        .filter(|c| !DIRECTIVE_CHARS.contains(c))
        .collect()
}

/// A parsed geometry string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryDirective {
    modifier: Modifier,
    width: Dimension,
    height: Dimension,
    keep_aspect: bool,
    sanitized: String,
}

impl GeometryDirective {
    /// Parses an optional geometry string.
    ///
    /// `None` means no resizing was requested and yields `Ok(None)`.
    pub fn parse(geometry: Option<&str>) -> CoreResult<Option<Self>> {
        geometry.map(str::parse).transpose()
    }

    pub fn modifier(&self) -> Modifier {
        self.modifier
    }

    pub fn width(&self) -> Dimension {
        self.width
    }

    pub fn height(&self) -> Dimension {
        self.height
    }

    /// True when either side was marked with `!`.
    pub fn keep_aspect(&self) -> bool {
        self.keep_aspect
    }

    pub fn pad_only(&self) -> bool {
        self.keep_aspect && self.modifier == Modifier::Pad
    }

    pub fn enlarge_only(&self) -> bool {
        self.keep_aspect && self.modifier == Modifier::Enlarge
    }

    pub fn shrink_only(&self) -> bool {
        self.keep_aspect && self.modifier == Modifier::Shrink
    }

    /// The geometry with directive characters removed, e.g. `"320x240"`.
    pub fn sanitized(&self) -> &str {
        &self.sanitized
    }
}

impl FromStr for GeometryDirective {
    type Err = CoreError;

    fn from_str(geometry: &str) -> CoreResult<Self> {
        let (modifier, rest) = strip_modifier(geometry);

        let (raw_width, raw_height) = rest.split_once('x').ok_or_else(|| {
            config_error(format!(
                "geometry '{geometry}' has no 'x' separator between width and height"
            ))
        })?;
        if raw_height.contains('x') {
            return Err(config_error(format!(
                "geometry '{geometry}' has more than one 'x' separator"
            )));
        }

        let keep_aspect = raw_width.starts_with('!') || raw_height.starts_with('!');
        let width = parse_dimension(geometry, "width", raw_width)?;
        let height = parse_dimension(geometry, "height", raw_height)?;

        log::trace!(
            "Parsed geometry '{}': modifier={:?} width={} height={} keep_aspect={}",
            geometry,
            modifier,
            width,
            height,
            keep_aspect
        );

        Ok(Self {
            modifier,
            width,
            height,
            keep_aspect,
            sanitized: sanitize(geometry),
        })
    }
}

fn parse_dimension(geometry: &str, side: &str, raw: &str) -> CoreResult<Dimension> {
    // One optional leading '!', digits, then trailing directive characters.
    let body = raw.strip_prefix('!').unwrap_or(raw);
    let digits = body.trim_end_matches(TRAILING_DIRECTIVE_CHARS);
    if digits.is_empty() {
        // Only "!" (or nothing) after stripping: the side follows the other one.
        if raw.starts_with('!') {
            return Ok(Dimension::Auto);
        }
        return Err(config_error(format!(
            "geometry '{geometry}' is missing its {side}"
        )));
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(config_error(format!(
            "geometry '{geometry}' has a non-numeric {side} '{raw}'"
        )));
    }

    match digits.parse::<u32>() {
        Ok(0) => Err(config_error(format!(
            "geometry '{geometry}' has a zero {side}"
        ))),
        Ok(px) => Ok(Dimension::Pixels(px)),
        Err(_) => Err(config_error(format!(
            "geometry '{geometry}' has an out-of-range {side} '{raw}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> GeometryDirective {
        s.parse().unwrap()
    }

    #[test]
    fn test_absent_geometry_is_none() {
        assert_eq!(GeometryDirective::parse(None).unwrap(), None);
    }

    #[test]
    fn test_plain_geometry() {
        let g = parse("150x150");
        assert_eq!(g.modifier(), Modifier::None);
        assert_eq!(g.width(), Dimension::Pixels(150));
        assert_eq!(g.height(), Dimension::Pixels(150));
        assert!(!g.keep_aspect());
        assert_eq!(g.sanitized(), "150x150");
    }

    #[test]
    fn test_pad_modifier_without_keep_aspect() {
        let g = parse("#200x300");
        assert_eq!(g.modifier(), Modifier::Pad);
        assert!(!g.keep_aspect());
        assert!(!g.pad_only());
        assert_eq!(g.sanitized(), "200x300");
    }

    #[test]
    fn test_trailing_directive_is_not_a_modifier() {
        let g = parse("200x300#");
        assert_eq!(g.modifier(), Modifier::None);
        assert_eq!(g.height(), Dimension::Pixels(300));
        assert_eq!(g.sanitized(), "200x300");
    }

    #[test]
    fn test_auto_width_with_trailing_enlarge() {
        let g = parse("!x100<");
        assert!(g.keep_aspect());
        assert_eq!(g.width(), Dimension::Auto);
        assert_eq!(g.height(), Dimension::Pixels(100));
        assert_eq!(g.sanitized(), "x100");
    }

    #[test]
    fn test_derived_flags_follow_modifier() {
        assert!(parse("#!x100").pad_only());
        assert!(parse("<!x100").enlarge_only());
        assert!(parse(">320x!").shrink_only());
        assert!(!parse(">320x!").pad_only());
    }

    #[test]
    fn test_strip_modifier_is_pure() {
        let original = String::from(">640x480");
        let (modifier, rest) = strip_modifier(&original);
        assert_eq!(modifier, Modifier::Shrink);
        assert_eq!(rest, "640x480");
        assert_eq!(original, ">640x480");
        assert_eq!(strip_modifier("640x480"), (Modifier::None, "640x480"));
    }

    #[test]
    fn test_sanitize_tolerates_closing_paren() {
        assert_eq!(sanitize("320x240)"), "320x240");
        assert_eq!(parse("320x240)").sanitized(), "320x240");
    }

    #[test]
    fn test_malformed_geometry_is_configuration_error() {
        for bad in [
            "320", "", "#", "axb", "320x", "x240", "0x240", "1x2x3", "-5x10", "3!20x240",
            "32<0x240", "320x2#40", "!!320x240", "+320x240", "99999999999x240",
        ] {
            let err = bad.parse::<GeometryDirective>().unwrap_err();
            assert!(
                matches!(err, CoreError::Configuration(_)),
                "expected configuration error for {bad:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_sanitizing_removes_only_directive_chars() {
        let modifiers = ["", "#", "<", ">"];
        let widths = ["320", "!320", "!"];
        let heights = ["240", "!240", "!"];
        for m in modifiers {
            for w in widths {
                for h in heights {
                    let raw = format!("{m}{w}x{h}");
                    let g = parse(&raw);
                    let expected: String =
                        raw.chars().filter(|c| !"#!<>)".contains(*c)).collect();
                    assert_eq!(g.sanitized(), expected);

                    let (sw, sh) = g.sanitized().split_once('x').unwrap();
                    for part in [sw, sh] {
                        assert!(part.is_empty() || part.parse::<u32>().is_ok());
                    }

                    let flags = [g.pad_only(), g.enlarge_only(), g.shrink_only()];
                    assert!(flags.iter().filter(|f| **f).count() <= 1);
                    if !g.keep_aspect() {
                        assert_eq!(flags, [false, false, false]);
                    }
                }
            }
        }
    }
}
