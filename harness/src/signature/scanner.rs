//! Token scanner for C++ declarations
//!
//! Produces just enough structure to find class bodies, member declarations
//! and function bodies: words, grouping punctuation and their byte spans.
//! Comments and preprocessor lines are skipped, string and character literals
//! become a single opaque token, so braces inside them never change depth.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Run of non-space characters without grouping punctuation
    /// (`vector<int>&`, `public:`, `std::string`)
    Word,
    /// String or character literal, kept whole
    Literal,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    Semicolon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
}

impl Token<'_> {
    pub fn is_word(&self, text: &str) -> bool {
        self.kind == TokenKind::Word && self.text == text
    }
}

fn punctuation(c: u8) -> Option<TokenKind> {
    match c {
        b'{' => Some(TokenKind::LBrace),
        b'}' => Some(TokenKind::RBrace),
        b'(' => Some(TokenKind::LParen),
        b')' => Some(TokenKind::RParen),
        b',' => Some(TokenKind::Comma),
        b';' => Some(TokenKind::Semicolon),
        _ => None,
    }
}

fn breaks_word(c: u8) -> bool {
    c.is_ascii_whitespace() || punctuation(c).is_some() || c == b'"' || c == b'\''
}

/// Tokenize C++ source text.
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut line_start = true;

    while i < bytes.len() {
        let c = bytes[i];

        if c == b'\n' {
            line_start = true;
            i += 1;
            continue;
        }
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        // Preprocessor directive, including backslash continuations
        if c == b'#' && line_start {
            while i < bytes.len() && bytes[i] != b'\n' {
                if bytes[i] == b'\\' && bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                i += 1;
            }
            continue;
        }
        line_start = false;

        if c == b'/' && bytes.get(i + 1) == Some(&b'/') {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        if c == b'/' && bytes.get(i + 1) == Some(&b'*') {
            i += 2;
            while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                i += 1;
            }
            i = (i + 2).min(bytes.len());
            continue;
        }

        if c == b'"' || c == b'\'' {
            let start = i;
            i += 1;
            while i < bytes.len() && bytes[i] != c && bytes[i] != b'\n' {
                if bytes[i] == b'\\' {
                    i += 1;
                }
                i += 1;
            }
            i = (i + 1).min(bytes.len());
            tokens.push(Token {
                kind: TokenKind::Literal,
                text: &source[start..i],
                start,
                end: i,
            });
            continue;
        }

        if let Some(kind) = punctuation(c) {
            tokens.push(Token {
                kind,
                text: &source[i..i + 1],
                start: i,
                end: i + 1,
            });
            i += 1;
            continue;
        }

        let start = i;
        while i < bytes.len() && !breaks_word(bytes[i]) {
            if bytes[i] == b'/' && matches!(bytes.get(i + 1), Some(b'/') | Some(b'*')) {
                break;
            }
            i += 1;
        }
        tokens.push(Token {
            kind: TokenKind::Word,
            text: &source[start..i],
            start,
            end: i,
        });
    }

    tokens
}

/// Index of the token closing the group opened at `open`.
///
/// `open` must point at an `LBrace` or `LParen`. Returns `None` when the
/// group is never closed.
pub fn matching_close(tokens: &[Token<'_>], open: usize) -> Option<usize> {
    let (opener, closer) = match tokens.get(open)?.kind {
        TokenKind::LBrace => (TokenKind::LBrace, TokenKind::RBrace),
        TokenKind::LParen => (TokenKind::LParen, TokenKind::RParen),
        _ => return None,
    };

    let mut depth = 0usize;
    for (idx, token) in tokens.iter().enumerate().skip(open) {
        if token.kind == opener {
            depth += 1;
        } else if token.kind == closer {
            depth -= 1;
            if depth == 0 {
                return Some(idx);
            }
        }
    }
    None
}
