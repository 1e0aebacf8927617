//! Declaration parser.
//!
//! Scans source text for top-level type aliases (`type X = ...` and
//! `export type X = ...`) and parses their bodies into [`TypeDeclaration`]s.
//! Everything else in the file is skipped. Constructs outside the supported
//! grammar degrade to [`TypeExpr::Unknown`] with a warning; only a malformed
//! declaration body is an error.

use crate::ast::{
    DeclShape, Literal, ObjectShape, PrimitiveKind, PropertySignature, Span, TypeDeclaration,
    TypeExpr,
};
use crate::error::{CompileError, CompileResult};
use crate::lexer::{Lexer, Token, TokenKind};
use tracing::{debug, warn};

/// Parser for declaration source files.
#[derive(Debug, Clone)]
pub struct DeclarationParser {
    /// Name of the source used in diagnostics (usually the file path).
    origin: String,
}

impl Default for DeclarationParser {
    fn default() -> Self {
        Self::new("<source>")
    }
}

impl DeclarationParser {
    /// Create a parser that reports diagnostics against `origin`.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Parse the source and require at least one exported declaration.
    pub fn parse(&self, source: &str) -> CompileResult<Vec<TypeDeclaration>> {
        let declarations = self.scan(source)?;
        if !declarations.iter().any(|d| d.exported) {
            return Err(CompileError::no_exported_types(&self.origin));
        }
        Ok(declarations)
    }

    /// Parse every top-level type alias, exported or not.
    pub fn scan(&self, source: &str) -> CompileResult<Vec<TypeDeclaration>> {
        let tokens = Lexer::new(source).tokenize();
        let mut cursor = Cursor::new(&tokens, &self.origin);
        let mut declarations = Vec::new();
        let mut depth = 0usize;

        while !cursor.at_end() {
            if depth == 0 {
                if let Some(exported) = cursor.declaration_start() {
                    let decl = cursor.declaration(exported)?;
                    debug!(name = %decl.name, exported = decl.exported, line = decl.span.line, "Parsed declaration");
                    declarations.push(decl);
                    continue;
                }
            }
            match cursor.bump().map(|t| &t.kind) {
                Some(TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket) => depth += 1,
                Some(TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket) => {
                    depth = depth.saturating_sub(1)
                }
                _ => {}
            }
        }

        Ok(declarations)
    }
}

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
    origin: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Token], origin: &'a str) -> Self {
        Self {
            tokens,
            pos: 0,
            origin,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + offset)
    }

    fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn peek_kind_at(&self, offset: usize) -> Option<&'a TokenKind> {
        self.peek_at(offset).map(|t| &t.kind)
    }

    fn bump(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn span(&self) -> Span {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|t| t.span)
            .unwrap_or_default()
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        let span = self.span();
        CompileError::syntax(self.origin, span.line, span.column, message)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> CompileResult<()> {
        if self.eat(&kind) {
            Ok(())
        } else {
            Err(self.error(format!("expected {}, found {}", what, self.describe_next())))
        }
    }

    fn describe_next(&self) -> String {
        match self.peek_kind() {
            None => "end of input".to_string(),
            Some(TokenKind::Ident(id)) => format!("'{}'", id),
            Some(TokenKind::Str(s)) => format!("string \"{}\"", s),
            Some(TokenKind::Num(n)) => format!("number {}", n),
            Some(kind) => format!("{:?}", kind),
        }
    }

    /// If a declaration starts here, returns whether it is exported.
    fn declaration_start(&self) -> Option<bool> {
        let mut offset = 0;
        let exported = self.peek_at(0)?.is_ident("export");
        if exported {
            offset += 1;
        }
        if self.peek_at(offset)?.is_ident("declare") {
            offset += 1;
        }
        if !self.peek_at(offset)?.is_ident("type") {
            return None;
        }
        let name_is_ident = matches!(self.peek_kind_at(offset + 1), Some(TokenKind::Ident(_)));
        let then_eq = matches!(
            self.peek_kind_at(offset + 2),
            Some(TokenKind::Eq | TokenKind::Lt)
        );
        (name_is_ident && then_eq).then_some(exported)
    }

    fn declaration(&mut self, exported: bool) -> CompileResult<TypeDeclaration> {
        let span = self.span();
        if exported {
            self.bump();
        }
        if self.peek().is_some_and(|t| t.is_ident("declare")) {
            self.bump();
        }
        self.bump(); // `type`
        let name = match self.bump().map(|t| &t.kind) {
            Some(TokenKind::Ident(name)) => name.clone(),
            _ => return Err(self.error("expected a type name")),
        };

        let generic = self.peek_kind() == Some(&TokenKind::Lt);
        if generic {
            self.skip_balanced(&TokenKind::Lt, &TokenKind::Gt);
        }
        self.expect(TokenKind::Eq, "'='")?;

        let mut shape = if self.peek_kind() == Some(&TokenKind::LBrace) {
            let object = self.object_shape()?;
            if self.continues_type() {
                warn!(name = %name, "Object literal combined with other types is not supported; accepting any value");
                DeclShape::Expr(self.continue_type(TypeExpr::Unknown)?)
            } else {
                DeclShape::Object(object)
            }
        } else {
            DeclShape::Expr(self.type_expr()?)
        };

        if generic {
            warn!(name = %name, "Generic declarations are not supported; accepting any value");
            shape = DeclShape::Expr(TypeExpr::Unknown);
        }

        self.eat(&TokenKind::Semi);
        Ok(TypeDeclaration::new(name, exported, shape).with_span(span))
    }

    fn object_shape(&mut self) -> CompileResult<ObjectShape> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut properties = Vec::new();

        loop {
            while self.eat(&TokenKind::Semi) || self.eat(&TokenKind::Comma) {}
            match self.peek_kind() {
                None => return Err(self.error("unterminated object type, expected '}'")),
                Some(TokenKind::RBrace) => {
                    self.bump();
                    break;
                }
                _ => {}
            }
            if let Some(property) = self.property()? {
                properties.push(property);
            }
            match self.peek_kind() {
                Some(TokenKind::Semi | TokenKind::Comma | TokenKind::RBrace) => {}
                _ => {
                    return Err(self.error(format!(
                        "expected ';' or '}}' after property, found {}",
                        self.describe_next()
                    )))
                }
            }
        }

        Ok(ObjectShape::new(properties))
    }

    fn property(&mut self) -> CompileResult<Option<PropertySignature>> {
        // `-readonly [K in T]` / `+readonly [K in T]`
        if matches!(self.peek_kind(), Some(TokenKind::Minus | TokenKind::Other('+')))
            && self.peek_at(1).is_some_and(|t| t.is_ident("readonly"))
        {
            warn!(line = self.span().line, "Mapped type members are not supported; skipping member");
            self.skip_member();
            return Ok(None);
        }

        let readonly = self.peek().is_some_and(|t| t.is_ident("readonly"))
            && matches!(
                self.peek_kind_at(1),
                Some(
                    TokenKind::Ident(_)
                        | TokenKind::Str(_)
                        | TokenKind::Num(_)
                        | TokenKind::LBracket
                )
            );
        if readonly {
            self.bump();
        }

        if self.is_accessor() {
            warn!(line = self.span().line, "Accessor signatures are not supported; skipping member");
            self.skip_member();
            return Ok(None);
        }

        let name = match self.peek_kind() {
            Some(TokenKind::Ident(id)) => id.clone(),
            Some(TokenKind::Str(s)) => s.clone(),
            Some(TokenKind::Num(n)) => crate::ast::format_number(*n),
            Some(TokenKind::LBracket | TokenKind::LParen | TokenKind::Lt) => {
                warn!(line = self.span().line, "Index and call signatures are not supported; skipping member");
                self.skip_member();
                return Ok(None);
            }
            _ => {
                return Err(self.error(format!(
                    "expected a property name, found {}",
                    self.describe_next()
                )))
            }
        };
        self.bump();

        let optional = self.eat(&TokenKind::Question);
        if matches!(self.peek_kind(), Some(TokenKind::LParen | TokenKind::Lt)) {
            warn!(member = %name, "Method signatures are not supported; skipping member");
            self.skip_member();
            return Ok(None);
        }
        self.expect(TokenKind::Colon, "':'")?;
        let ty = self.type_expr()?;

        Ok(Some(PropertySignature {
            name,
            ty,
            optional,
            readonly,
        }))
    }

    /// `get name()` / `set name(v)`. A member merely named `get` is not one.
    fn is_accessor(&self) -> bool {
        let keyword = self.peek().is_some_and(|t| t.is_ident("get") || t.is_ident("set"));
        keyword
            && matches!(
                self.peek_kind_at(1),
                Some(
                    TokenKind::Ident(_)
                        | TokenKind::Str(_)
                        | TokenKind::Num(_)
                        | TokenKind::LBracket
                )
            )
    }

    /// Skip to the end of the current object member without consuming `}`.
    fn skip_member(&mut self) {
        let mut depth = 0usize;
        while let Some(kind) = self.peek_kind() {
            match kind {
                TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
                TokenKind::RBrace if depth == 0 => return,
                TokenKind::RBrace => depth -= 1,
                TokenKind::Semi | TokenKind::Comma if depth == 0 => return,
                _ => {}
            }
            self.bump();
        }
    }

    /// Skip a balanced `open ... close` group starting at the cursor.
    fn skip_balanced(&mut self, open: &TokenKind, close: &TokenKind) {
        let mut depth = 0usize;
        while let Some(kind) = self.peek_kind() {
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    self.bump();
                    return;
                }
            }
            self.bump();
        }
    }

    fn continues_type(&self) -> bool {
        match self.peek_kind() {
            Some(TokenKind::Pipe | TokenKind::Amp) => true,
            Some(TokenKind::LBracket) => self.peek_kind_at(1) == Some(&TokenKind::RBracket),
            _ => false,
        }
    }

    fn type_expr(&mut self) -> CompileResult<TypeExpr> {
        self.eat(&TokenKind::Pipe);
        let first = self.intersection()?;
        self.union_rest(first)
    }

    /// Continue parsing a type whose first primary has already been consumed.
    fn continue_type(&mut self, first: TypeExpr) -> CompileResult<TypeExpr> {
        let first = self.postfix_rest(first);
        let first = self.intersection_rest(first)?;
        self.union_rest(first)
    }

    fn union_rest(&mut self, first: TypeExpr) -> CompileResult<TypeExpr> {
        if self.peek_kind() != Some(&TokenKind::Pipe) {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.eat(&TokenKind::Pipe) {
            members.push(self.intersection()?);
        }
        Ok(TypeExpr::Union(members))
    }

    fn intersection(&mut self) -> CompileResult<TypeExpr> {
        let first = self.postfix()?;
        self.intersection_rest(first)
    }

    fn intersection_rest(&mut self, first: TypeExpr) -> CompileResult<TypeExpr> {
        if self.peek_kind() != Some(&TokenKind::Amp) {
            return Ok(first);
        }
        while self.eat(&TokenKind::Amp) {
            self.postfix()?;
        }
        warn!(line = self.span().line, "Intersection types are not supported; accepting any value");
        Ok(TypeExpr::Unknown)
    }

    fn postfix(&mut self) -> CompileResult<TypeExpr> {
        let primary = self.primary()?;
        Ok(self.postfix_rest(primary))
    }

    fn postfix_rest(&mut self, mut ty: TypeExpr) -> TypeExpr {
        while self.peek_kind() == Some(&TokenKind::LBracket)
            && self.peek_kind_at(1) == Some(&TokenKind::RBracket)
        {
            self.bump();
            self.bump();
            ty = TypeExpr::array(ty);
        }
        ty
    }

    fn primary(&mut self) -> CompileResult<TypeExpr> {
        let Some(token) = self.peek() else {
            return Err(self.error("expected a type, found end of input"));
        };
        match &token.kind {
            TokenKind::Ident(id) => self.named(id.clone()),
            TokenKind::Str(s) => {
                self.bump();
                Ok(TypeExpr::Literal(Literal::String(s.clone())))
            }
            TokenKind::Num(n) => {
                self.bump();
                Ok(TypeExpr::Literal(Literal::Number(*n)))
            }
            TokenKind::Minus => match self.peek_kind_at(1) {
                Some(TokenKind::Num(n)) => {
                    let n = -*n;
                    self.bump();
                    self.bump();
                    Ok(TypeExpr::Literal(Literal::Number(n)))
                }
                _ => Err(self.error("expected a number after '-'")),
            },
            TokenKind::Template => {
                self.bump();
                warn!(line = token.span.line, "Template literal types are not supported; accepting any value");
                Ok(TypeExpr::Unknown)
            }
            TokenKind::LBracket => self.tuple(),
            TokenKind::LParen => self.parenthesized(),
            TokenKind::LBrace => {
                warn!(line = token.span.line, "Nested object literal types are not supported; accepting any value");
                self.skip_balanced(&TokenKind::LBrace, &TokenKind::RBrace);
                Ok(TypeExpr::Unknown)
            }
            _ => Err(self.error(format!("expected a type, found {}", self.describe_next()))),
        }
    }

    fn named(&mut self, id: String) -> CompileResult<TypeExpr> {
        self.bump();
        let ty = match id.as_str() {
            "string" => TypeExpr::Primitive(PrimitiveKind::String),
            "number" => TypeExpr::Primitive(PrimitiveKind::Number),
            "boolean" => TypeExpr::Primitive(PrimitiveKind::Boolean),
            "null" => TypeExpr::Literal(Literal::Null),
            "true" => TypeExpr::Literal(Literal::Bool(true)),
            "false" => TypeExpr::Literal(Literal::Bool(false)),
            "object" => TypeExpr::AnyObject,
            "any" | "unknown" => TypeExpr::Unknown,
            "undefined" | "never" | "void" | "bigint" | "symbol" => {
                warn!(keyword = %id, "Unsupported keyword type; accepting any value");
                TypeExpr::Unknown
            }
            "readonly" if self.starts_type() => return self.postfix(),
            "keyof" | "typeof" | "unique" | "infer" if self.starts_type() => {
                self.postfix()?;
                warn!(operator = %id, "Type operators are not supported; accepting any value");
                TypeExpr::Unknown
            }
            _ => return self.reference(id),
        };
        Ok(ty)
    }

    fn starts_type(&self) -> bool {
        matches!(
            self.peek_kind(),
            Some(
                TokenKind::Ident(_)
                    | TokenKind::LBracket
                    | TokenKind::LParen
                    | TokenKind::Str(_)
                    | TokenKind::Num(_)
            )
        )
    }

    fn reference(&mut self, first: String) -> CompileResult<TypeExpr> {
        let mut name = first;
        while self.peek_kind() == Some(&TokenKind::Dot) {
            match self.peek_kind_at(1) {
                Some(TokenKind::Ident(part)) => {
                    name.push('.');
                    name.push_str(part);
                    self.bump();
                    self.bump();
                }
                _ => break,
            }
        }

        if self.peek_kind() != Some(&TokenKind::Lt) {
            if name == "Date" {
                return Ok(TypeExpr::Date);
            }
            return Ok(TypeExpr::Reference(name));
        }

        if name == "Array" || name == "ReadonlyArray" {
            self.bump();
            let inner = self.type_expr()?;
            if self.eat(&TokenKind::Gt) {
                return Ok(TypeExpr::array(inner));
            }
        }
        self.skip_generic_args();
        warn!(name = %name, "Generic type arguments are not supported; accepting any value");
        Ok(TypeExpr::Unknown)
    }

    fn skip_generic_args(&mut self) {
        let mut depth = 0usize;
        while let Some(kind) = self.peek_kind() {
            match kind {
                TokenKind::Lt => depth += 1,
                TokenKind::Gt => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.bump();
                        return;
                    }
                }
                TokenKind::Semi | TokenKind::RBrace if depth <= 1 => return,
                _ => {}
            }
            self.bump();
        }
    }

    fn tuple(&mut self) -> CompileResult<TypeExpr> {
        self.expect(TokenKind::LBracket, "'['")?;
        let mut elements = Vec::new();
        let mut rest: Option<Box<TypeExpr>> = None;

        loop {
            if self.eat(&TokenKind::RBracket) {
                break;
            }
            let spread = self.eat(&TokenKind::Ellipsis);
            // Named tuple members: `label: T` or `label?: T`
            if matches!(self.peek_kind(), Some(TokenKind::Ident(_)))
                && matches!(
                    self.peek_kind_at(1),
                    Some(TokenKind::Colon | TokenKind::Question)
                )
                && (self.peek_kind_at(1) == Some(&TokenKind::Colon)
                    || self.peek_kind_at(2) == Some(&TokenKind::Colon))
            {
                self.bump();
                self.eat(&TokenKind::Question);
                self.bump();
            }
            let element = self.type_expr()?;
            self.eat(&TokenKind::Question);

            if spread {
                if rest.is_some() {
                    warn!("Tuple has more than one rest element; keeping the first");
                } else {
                    rest = Some(Box::new(element));
                }
            } else if rest.is_some() {
                warn!("Tuple elements after a rest element are not supported; ignoring them");
            } else {
                elements.push(element);
            }

            if !self.eat(&TokenKind::Comma) {
                self.expect(TokenKind::RBracket, "',' or ']' in tuple type")?;
                break;
            }
        }

        Ok(TypeExpr::Tuple { elements, rest })
    }

    fn parenthesized(&mut self) -> CompileResult<TypeExpr> {
        if self.is_function_type() {
            self.skip_balanced(&TokenKind::LParen, &TokenKind::RParen);
            self.expect(TokenKind::Arrow, "'=>'")?;
            self.type_expr()?;
            warn!(line = self.span().line, "Function types are not supported; accepting any value");
            return Ok(TypeExpr::Unknown);
        }
        self.expect(TokenKind::LParen, "'('")?;
        let inner = self.type_expr()?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok(inner)
    }

    fn is_function_type(&self) -> bool {
        let mut depth = 0usize;
        let mut offset = 0;
        while let Some(kind) = self.peek_kind_at(offset) {
            match kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return self.peek_kind_at(offset + 1) == Some(&TokenKind::Arrow);
                    }
                }
                _ => {}
            }
            offset += 1;
        }
        false
    }
}
