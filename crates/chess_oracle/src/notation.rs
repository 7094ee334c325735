//! Movetext notation codec
//!
//! Canonical game records are PGN movetext: optional `[Tag "value"]` header
//! lines followed by numbered SAN moves and an optional result token. Only the
//! `FEN` header carries meaning here (a non-standard starting position, used
//! by puzzles). The codec is purely textual; turning tokens into moves is the
//! position's job.
//!
//! Parsing skips:
//!
//! - move numbers (`1.`, `1...`, and the glued form `12.e4`)
//! - comments (`{ ... }` and `;` to end of line)
//! - NAGs (`$1`) and annotation glyphs (`!`, `?`)
//! - result tokens (`1-0`, `0-1`, `1/2-1/2`, `*`)
//!
//! Variations (`( ... )`) are not supported and fail the parse.

use crate::error::{OracleError, OracleResult};

const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// A move line read from notation, not yet validated against a position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotationLine {
    /// FEN from the `[FEN "..."]` header, if present
    pub start: Option<String>,
    /// SAN tokens in order, normalized with [`normalize_san`]
    pub tokens: Vec<String>,
}

impl NotationLine {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Strip check, mate and annotation suffixes from a SAN token
pub fn normalize_san(token: &str) -> &str {
    token.trim_end_matches(['+', '#', '!', '?'])
}

/// Parse PGN-style movetext into a [`NotationLine`]
pub fn parse_movetext(input: &str) -> OracleResult<NotationLine> {
    let mut line = NotationLine::default();
    let mut body = String::new();

    for raw in input.lines() {
        let trimmed = raw.trim();
        if trimmed.starts_with('[') {
            if let Some((tag, value)) = parse_header(trimmed) {
                if tag.eq_ignore_ascii_case("FEN") {
                    line.start = Some(value.to_string());
                }
                continue;
            }
            return Err(OracleError::notation(0, format!("malformed header '{trimmed}'")));
        }
        // `;` comments run to the end of the line
        let content = match trimmed.split_once(';') {
            Some((before, _)) => before,
            None => trimmed,
        };
        body.push_str(content);
        body.push(' ');
    }

    let body = strip_brace_comments(&body, line.tokens.len())?;

    for raw_token in body.split_whitespace() {
        if raw_token.starts_with('(') || raw_token.starts_with(')') {
            return Err(OracleError::notation(
                line.tokens.len(),
                "variations are not supported",
            ));
        }
        if raw_token.starts_with('$') || RESULT_TOKENS.contains(&raw_token) {
            continue;
        }

        let token = normalize_san(strip_move_number(raw_token));
        if token.is_empty() {
            continue;
        }
        line.tokens.push(token.to_string());
    }

    Ok(line)
}

/// Write movetext for a line of SAN moves
///
/// `first_move_number` and `white_first` describe the starting position; a
/// black first move is written `N... san`.
pub fn format_movetext<'a>(
    start: Option<&str>,
    first_move_number: u32,
    white_first: bool,
    sans: impl IntoIterator<Item = &'a str>,
    result: Option<&str>,
) -> String {
    let mut out = String::new();
    if let Some(fen) = start {
        out.push_str("[SetUp \"1\"]\n");
        out.push_str(&format!("[FEN \"{fen}\"]\n\n"));
    }

    let mut number = first_move_number;
    let mut white_to_move = white_first;
    let mut words: Vec<String> = Vec::new();

    for (index, san) in sans.into_iter().enumerate() {
        if white_to_move {
            words.push(format!("{number}. {san}"));
        } else if index == 0 {
            words.push(format!("{number}... {san}"));
        } else {
            words.push(san.to_string());
        }
        if !white_to_move {
            number += 1;
        }
        white_to_move = !white_to_move;
    }

    if let Some(result) = result {
        words.push(result.to_string());
    }

    out.push_str(&words.join(" "));
    out
}

fn parse_header(line: &str) -> Option<(&str, &str)> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?;
    let (tag, value) = inner.split_once(char::is_whitespace)?;
    let value = value.trim().strip_prefix('"')?.strip_suffix('"')?;
    Some((tag.trim(), value))
}

fn strip_brace_comments(body: &str, ply: usize) -> OracleResult<String> {
    let mut out = String::with_capacity(body.len());
    let mut depth = 0usize;
    for ch in body.chars() {
        match ch {
            '{' => depth += 1,
            '}' if depth == 0 => {
                return Err(OracleError::notation(ply, "unbalanced '}' in comment"));
            }
            '}' => {
                depth -= 1;
                out.push(' ');
            }
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    if depth != 0 {
        return Err(OracleError::notation(ply, "unterminated comment"));
    }
    Ok(out)
}

fn strip_move_number(token: &str) -> &str {
    let rest = token.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() < token.len() && rest.starts_with('.') {
        rest.trim_start_matches('.')
    } else {
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbered_movetext() {
        let line = parse_movetext("1. e4 e5 2. Nf3 Nc6 3. Bb5+ a6").unwrap();
        assert_eq!(line.tokens, vec!["e4", "e5", "Nf3", "Nc6", "Bb5", "a6"]);
        assert!(line.start.is_none());
    }

    #[test]
    fn test_parse_glued_numbers_and_black_start() {
        //! `12.e4` and `3...Nf6` forms are accepted
        let line = parse_movetext("3...Nf6 4.d4 exd4").unwrap();
        assert_eq!(line.tokens, vec!["Nf6", "d4", "exd4"]);
    }

    #[test]
    fn test_parse_skips_headers_comments_nags_and_result() {
        let text = "[Event \"Casual\"]\n[White \"You\"]\n\n1. e4 {best by test} e5 $1 2. Qh5?! ; risky\nNc6 2... 1-0";
        let line = parse_movetext(text).unwrap();
        assert_eq!(line.tokens, vec!["e4", "e5", "Qh5", "Nc6"]);
    }

    #[test]
    fn test_parse_reads_fen_header() {
        let fen = "8/8/8/8/8/8/4k3/4K2R w K - 0 1";
        let line = parse_movetext(&format!("[SetUp \"1\"]\n[FEN \"{fen}\"]\n\n1. Rh2+")).unwrap();
        assert_eq!(line.start.as_deref(), Some(fen));
        assert_eq!(line.tokens, vec!["Rh2"]);
    }

    #[test]
    fn test_parse_rejects_variations_and_broken_comments() {
        assert!(matches!(
            parse_movetext("1. e4 (1. d4) e5"),
            Err(OracleError::Notation { ply: 1, .. })
        ));
        assert!(parse_movetext("1. e4 { open").is_err());
        assert!(parse_movetext("1. e4 } e5").is_err());
        assert!(parse_movetext("[FEN missing-quotes]").is_err());
    }

    #[test]
    fn test_empty_input_is_empty_line() {
        let line = parse_movetext("  \n ").unwrap();
        assert!(line.is_empty());
    }

    #[test]
    fn test_format_white_first() {
        let text = format_movetext(None, 1, true, ["e4", "e5", "Nf3"], None);
        assert_eq!(text, "1. e4 e5 2. Nf3");
    }

    #[test]
    fn test_format_black_first_with_header_and_result() {
        let text = format_movetext(Some("FEN"), 7, false, ["Qxf2#"], Some("0-1"));
        assert_eq!(text, "[SetUp \"1\"]\n[FEN \"FEN\"]\n\n7... Qxf2# 0-1");
    }

    #[test]
    fn test_format_then_parse_keeps_tokens() {
        let sans = ["d4", "d5", "c4", "dxc4", "e3"];
        let line = parse_movetext(&format_movetext(None, 1, true, sans, Some("*"))).unwrap();
        assert_eq!(line.tokens, sans);
    }
}
