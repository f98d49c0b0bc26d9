use super::error::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    True,
    False,
    Null,
    And,
    Or,
    Not,
    In,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Assign,
    PlusAssign,
    MinusAssign,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Int(n) => format!("number {n}"),
            Token::Float(n) => format!("number {n}"),
            Token::Str(s) => format!("string {s:?}"),
            Token::Ident(name) => format!("identifier '{name}'"),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            Token::And => "and",
            Token::Or => "or",
            Token::Not => "not",
            Token::In => "in",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Bang => "!",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::Assign => "=",
            Token::PlusAssign => "+=",
            Token::MinusAssign => "-=",
            Token::Int(_) | Token::Float(_) | Token::Str(_) | Token::Ident(_) => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub fn tokenize(input: &str) -> Result<Vec<Spanned>, ExprError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (offset, ch) = chars[i];
        if ch.is_whitespace() {
            i += 1;
            continue;
        }

        let next = chars.get(i + 1).map(|(_, c)| *c);
        let two = |t: Token| Spanned { token: t, offset };

        let (token, width) = match (ch, next) {
            ('=', Some('=')) => {
                // Accept `===` as `==`.
                let w = if chars.get(i + 2).map(|(_, c)| *c) == Some('=') { 3 } else { 2 };
                (Token::EqEq, w)
            }
            ('!', Some('=')) => {
                let w = if chars.get(i + 2).map(|(_, c)| *c) == Some('=') { 3 } else { 2 };
                (Token::NotEq, w)
            }
            ('<', Some('=')) => (Token::Le, 2),
            ('>', Some('=')) => (Token::Ge, 2),
            ('&', Some('&')) => (Token::And, 2),
            ('|', Some('|')) => (Token::Or, 2),
            ('+', Some('=')) => (Token::PlusAssign, 2),
            ('-', Some('=')) => (Token::MinusAssign, 2),
            ('=', _) => (Token::Assign, 1),
            ('!', _) => (Token::Bang, 1),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('[', _) => (Token::LBracket, 1),
            (']', _) => (Token::RBracket, 1),
            (',', _) => (Token::Comma, 1),
            ('.', Some(d)) if d.is_ascii_digit() => {
                let (tok, end) = lex_number(&chars, i)?;
                tokens.push(two(tok));
                i = end;
                continue;
            }
            ('.', _) => (Token::Dot, 1),
            ('\'' | '"', _) => {
                let (s, end) = lex_string(&chars, i)?;
                tokens.push(two(Token::Str(s)));
                i = end;
                continue;
            }
            (c, _) if c.is_ascii_digit() => {
                let (tok, end) = lex_number(&chars, i)?;
                tokens.push(two(tok));
                i = end;
                continue;
            }
            (c, _) if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len() {
                    let c = chars[i].1;
                    if c.is_alphanumeric() || c == '_' || c == '$' {
                        i += 1;
                    } else {
                        break;
                    }
                }
                let word: String = chars[start..i].iter().map(|(_, c)| *c).collect();
                let tok = match word.as_str() {
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" | "undefined" => Token::Null,
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "in" => Token::In,
                    _ => Token::Ident(word),
                };
                tokens.push(two(tok));
                continue;
            }
            (c, _) => return Err(ExprError::UnexpectedChar { ch: c, offset }),
        };

        tokens.push(two(token));
        i += width;
    }

    Ok(tokens)
}

fn lex_number(chars: &[(usize, char)], start: usize) -> Result<(Token, usize), ExprError> {
    let mut i = start;
    let mut is_float = false;
    while i < chars.len() {
        let c = chars[i].1;
        if c.is_ascii_digit() {
            i += 1;
        } else if c == '.' && !is_float && chars.get(i + 1).is_some_and(|(_, d)| d.is_ascii_digit()) {
            is_float = true;
            i += 1;
        } else if (c == 'e' || c == 'E') && i > start {
            is_float = true;
            i += 1;
            if matches!(chars.get(i).map(|(_, c)| *c), Some('+' | '-')) {
                i += 1;
            }
        } else {
            break;
        }
    }
    let text: String = chars[start..i].iter().map(|(_, c)| *c).collect();
    let token = if is_float {
        Token::Float(
            text.parse::<f64>()
                .map_err(|_| ExprError::InvalidNumber(text.clone()))?,
        )
    } else {
        match text.parse::<i64>() {
            Ok(n) => Token::Int(n),
            Err(_) => Token::Float(
                text.parse::<f64>()
                    .map_err(|_| ExprError::InvalidNumber(text.clone()))?,
            ),
        }
    };
    Ok((token, i))
}

fn lex_string(chars: &[(usize, char)], start: usize) -> Result<(String, usize), ExprError> {
    let (offset, quote) = chars[start];
    let mut out = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i].1;
        if c == quote {
            return Ok((out, i + 1));
        }
        if c == '\\' {
            let escaped = chars.get(i + 1).map(|(_, c)| *c).ok_or(ExprError::UnterminatedString(offset))?;
            out.push(match escaped {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                other => other,
            });
            i += 2;
            continue;
        }
        out.push(c);
        i += 1;
    }
    Err(ExprError::UnterminatedString(offset))
}
