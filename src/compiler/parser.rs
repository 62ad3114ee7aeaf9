use crate::error::{CompileError, CompileErrorKind};
use crate::filter::Filter;
use crate::item::Item;
use crate::plan::{PathStep, Plan};
use crate::schema::{FieldDescriptor, FieldKind, MessageDescriptor};

/// A cursor over a query string, tracking a byte offset for error reporting.
pub(super) struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub(super) fn new(src: &'a str) -> Self {
        Parser { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn err(&self, kind: CompileErrorKind) -> CompileError {
        CompileError::new(kind, self.pos)
    }

    fn err_at(&self, at: usize, kind: CompileErrorKind) -> CompileError {
        CompileError::new(kind, at)
    }

    /// Fails compilation if anything but the end of input remains.
    pub(super) fn expect_exhausted(&self) -> Result<(), CompileError> {
        match self.peek() {
            None => Ok(()),
            Some(found) => Err(self.err(CompileErrorKind::TrailingGarbage { found })),
        }
    }

    fn parse_ident(&mut self) -> Result<String, CompileError> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c == '_' || c.is_ascii_alphabetic() => {
                self.bump();
            }
            _ => return Err(self.err_at(start, CompileErrorKind::InvalidToken)),
        }
        while matches!(self.peek(), Some(c) if c == '_' || c.is_ascii_alphanumeric()) {
            self.bump();
        }
        Ok(self.src[start..self.pos].to_string())
    }

    /// `str := '"' chars '"' | "'" chars "'"`, applying the `\`, `\'`, `\"`
    /// escape rule described on the grammar: any other backslash is taken
    /// literally.
    fn parse_string_literal(&mut self) -> Result<Vec<u8>, CompileError> {
        let start = self.pos;
        let quote = self.bump().expect("caller checked a quote is present");
        let mut out = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.err_at(start, CompileErrorKind::InvalidToken)),
                Some(c) if c == quote => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    match self.peek() {
                        Some(n) if n == '\\' || n == '\'' || n == '"' => {
                            self.bump();
                            let mut buf = [0u8; 4];
                            out.extend_from_slice(n.encode_utf8(&mut buf).as_bytes());
                        }
                        _ => out.push(b'\\'),
                    }
                }
                Some(c) => {
                    self.bump();
                    let mut buf = [0u8; 4];
                    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
            }
        }
        Ok(out)
    }

    /// `int := '-'? digit+`, `float := '-'? digit+ '.' digit*`.
    ///
    /// Scans the digit run once as an integer and once as a float; if both
    /// consume the same number of bytes (no `.` was present), the literal is
    /// an `Item::Int`, otherwise an `Item::Float`.
    fn parse_number(&mut self) -> Result<Item, CompileError> {
        let start = self.pos;
        self.eat('-') || self.eat('+');
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        let int_end = self.pos;
        if self.eat('.') {
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }
        let float_end = self.pos;

        if int_end == float_end {
            let text = &self.src[start..int_end];
            let value: i64 = text
                .parse()
                .map_err(|_| self.err_at(start, CompileErrorKind::InvalidToken))?;
            Ok(Item::Int(value))
        } else {
            let text = &self.src[start..float_end];
            let value: f64 = text
                .parse()
                .map_err(|_| self.err_at(start, CompileErrorKind::InvalidToken))?;
            Ok(Item::Float(value))
        }
    }

    /// `item := path | str | int | float | '@'`
    fn parse_item(&mut self, ctx: &MessageDescriptor) -> Result<Item, CompileError> {
        match self.peek() {
            Some('@') => {
                self.bump();
                Ok(Item::At)
            }
            Some('"') | Some('\'') => Ok(Item::Str(self.parse_string_literal()?)),
            Some(c) if c.is_ascii_digit() => self.parse_number(),
            Some(c) if (c == '+' || c == '-') && self.next_is_digit() => self.parse_number(),
            _ => {
                let plan = self.parse_path(ctx)?;
                Ok(Item::Path(Box::new(plan)))
            }
        }
    }

    /// Whether the character *after* the current one is an ASCII digit,
    /// without consuming anything.
    fn next_is_digit(&self) -> bool {
        self.rest()
            .chars()
            .nth(1)
            .is_some_and(|c| c.is_ascii_digit())
    }

    /// `expr := item op item`, `op := '=' | '!=' | '=~' | 'in'`, plus the
    /// `[N]` index-filter shorthand folded into the same bracket syntax.
    ///
    /// Disambiguation, after parsing the first item and skipping whitespace:
    /// a bare `]` with an `Int` item produces `Idx`; `=`/`!=` produce `Eq`;
    /// `=~` and `in` are recognized but rejected as unsupported operators.
    /// The terminating `]` itself is left for the caller (`parse_node`) to
    /// consume.
    fn parse_filter(&mut self, ctx: &MessageDescriptor) -> Result<Filter, CompileError> {
        self.skip_ws();
        let left_start = self.pos;
        let left = self.parse_item(ctx)?;
        self.skip_ws();

        if self.rest().starts_with("=~") {
            return Err(self.err(CompileErrorKind::UnsupportedOperator { operator: "=~" }));
        }
        if self.rest().starts_with("!=") {
            self.pos += 2;
            self.skip_ws();
            self.check_eq_left(left_start, &left)?;
            let right = self.parse_item(ctx)?;
            self.skip_ws();
            return Ok(Filter::Eq {
                invert: true,
                left,
                right,
            });
        }
        if self.rest().starts_with('=') {
            self.pos += 1;
            self.skip_ws();
            self.check_eq_left(left_start, &left)?;
            let right = self.parse_item(ctx)?;
            self.skip_ws();
            return Ok(Filter::Eq {
                invert: false,
                left,
                right,
            });
        }
        if self.rest().starts_with("in") {
            return Err(self.err(CompileErrorKind::UnsupportedOperator { operator: "in" }));
        }
        if self.peek() == Some(']') {
            if let Item::Int(n) = left {
                return Ok(Filter::Idx(n));
            }
        }
        Err(self.err(CompileErrorKind::InvalidToken))
    }

    /// `EQ`'s `left` operand must be a `PATH` or `AT` (the invariant attached
    /// to the `Filter::Eq` variant): a literal can't stand on the left of
    /// `=`/`!=` since there's nothing for the evaluator to look up against
    /// the buffer. Caught here rather than left for the evaluator to reject,
    /// so a malformed filter like `title[1851=1851]` fails to compile rather
    /// than silently always evaluating to `Unsupported`.
    fn check_eq_left(&self, left_start: usize, left: &Item) -> Result<(), CompileError> {
        if left.is_path_or_at() {
            Ok(())
        } else {
            Err(self.err_at(left_start, CompileErrorKind::InvalidToken))
        }
    }

    /// `node := ident ('[' (int | expr) ']')?`
    ///
    /// Resolves `ident` against `ctx` immediately, so the returned
    /// `FieldDescriptor`'s tag is what ends up in the compiled `Plan` step.
    /// If a bracketed filter is present, it's parsed against the *field's*
    /// descriptor when the field is a message (so paths inside the filter
    /// are rooted at the submessage the filtered node matches), or against
    /// `ctx` itself otherwise.
    fn parse_node(&mut self, ctx: &MessageDescriptor) -> Result<(FieldDescriptor, Filter), CompileError> {
        let ident_start = self.pos;
        let name = self.parse_ident()?;
        let field = ctx.field_by_name(&name).map_err(|_| {
            self.err_at(
                ident_start,
                CompileErrorKind::UnknownField {
                    field: name.clone(),
                    in_type: ctx.name().to_string(),
                },
            )
        })?;
        let field = field.clone();

        let mut filter = Filter::NONE;
        if self.eat('[') {
            let filter_ctx = match field.kind() {
                FieldKind::Message(nested) => nested.clone(),
                FieldKind::Scalar => ctx.clone(),
            };
            filter = self.parse_filter(&filter_ctx)?;
            if !self.eat(']') {
                return Err(self.err(CompileErrorKind::UnbalancedBrackets));
            }
        }
        Ok((field, filter))
    }

    /// `path := node ('.' node)*`
    pub(super) fn parse_path(&mut self, ctx: &MessageDescriptor) -> Result<Plan, CompileError> {
        let root = ctx.clone();
        let mut current = ctx.clone();
        let mut steps = Vec::new();

        loop {
            let node_start = self.pos;
            let (field, filter) = self.parse_node(&current)?;
            steps.push(PathStep {
                tag: field.tag(),
                filter,
            });

            if !self.eat('.') {
                break;
            }
            match field.kind() {
                FieldKind::Message(nested) => current = nested.clone(),
                FieldKind::Scalar => {
                    return Err(self.err_at(
                        node_start,
                        CompileErrorKind::TypeMismatch {
                            field: field.name().to_string(),
                            in_type: current.name().to_string(),
                        },
                    ))
                }
            }
        }

        Ok(Plan::new(root, steps))
    }
}
