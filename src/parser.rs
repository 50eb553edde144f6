use crate::ast::*;
use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind};

/// Recursive-descent parser over the token stream. One token of
/// lookahead; a single dispatch on the leading keyword routes to one of
/// the six statement parsers.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

pub fn parse(tokens: Vec<Token>) -> Result<Statement> {
    Parser::new(tokens).parse_statement()
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, current: 0 }
    }

    fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.current_token().cloned();
        self.current += 1;
        token
    }

    fn describe_current(&self) -> String {
        match self.current_token() {
            Some(token) => format!(
                "{:?} '{}' at offset {}",
                token.kind, token.value, token.position
            ),
            None => "end of input".to_string(),
        }
    }

    /// Asserts the current token's kind (and value, when given), then
    /// consumes it.
    fn expect(&mut self, kind: TokenKind, value: Option<&str>) -> Result<Token> {
        let matches = match (self.current_token(), value) {
            (Some(token), Some(value)) => token.kind == kind && token.value == value,
            (Some(token), None) => token.kind == kind,
            (None, _) => false,
        };
        if matches {
            Ok(self.advance().unwrap())
        } else {
            let wanted = match value {
                Some(value) => value.to_string(),
                None => format!("{:?}", kind),
            };
            Err(Error::Parse(format!(
                "expected {}, found {}",
                wanted,
                self.describe_current()
            )))
        }
    }

    fn expect_keyword(&mut self, word: &str) -> Result<Token> {
        self.expect(TokenKind::Keyword, Some(word))
    }

    fn peek_keyword(&self, word: &str) -> bool {
        matches!(
            self.current_token(),
            Some(token) if token.kind == TokenKind::Keyword && token.value == word
        )
    }

    fn peek_kind(&self, kind: TokenKind) -> bool {
        matches!(self.current_token(), Some(token) if token.kind == kind)
    }

    /// Consumes a trailing `;` when present. Every statement but INSERT
    /// treats the terminator as optional.
    fn optional_semicolon(&mut self) {
        if self.peek_kind(TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        let Some(token) = self.current_token() else {
            return Err(Error::Parse("no tokens found".to_string()));
        };

        if token.kind == TokenKind::Keyword {
            match token.value.as_str() {
                "SELECT" => return self.parse_select(),
                "INSERT" => return self.parse_insert(),
                "CREATE" => return self.parse_create(),
                "DROP" => return self.parse_drop(),
                "DELETE" => return self.parse_delete(),
                "UPDATE" => return self.parse_update(),
                _ => {}
            }
        }

        Err(Error::Parse(format!(
            "invalid SQL statement: {}",
            self.describe_current()
        )))
    }

    //                ================= statements =================

    fn parse_select(&mut self) -> Result<Statement> {
        self.expect_keyword("SELECT")?;
        let columns = self.parse_columns()?;

        if !self.peek_keyword("FROM") {
            return Err(Error::Parse(format!(
                "expected FROM in SELECT statement, found {}",
                self.describe_current()
            )));
        }
        self.advance();

        let tables = self.parse_tables()?;
        if tables.len() != 1 {
            return Err(Error::Parse(format!(
                "SELECT accepts exactly one table, found {}",
                tables.len()
            )));
        }
        let table_name = tables.into_iter().next().unwrap();

        let where_clause = self.parse_where_clause()?;
        self.optional_semicolon();

        Ok(Statement::Select(SelectStatement {
            columns,
            table_name,
            where_clause,
        }))
    }

    fn parse_insert(&mut self) -> Result<Statement> {
        self.expect_keyword("INSERT")?;
        self.expect_keyword("INTO")?;
        let table_name = self.table_name()?;

        self.expect(TokenKind::LParen, None)?;
        let columns = self.identifier_list("column")?;
        self.expect(TokenKind::RParen, None)?;

        if !self.peek_keyword("VALUES") {
            return Err(Error::Parse(format!(
                "expected VALUES after column list, found {}",
                self.describe_current()
            )));
        }
        self.advance();

        self.expect(TokenKind::LParen, None)?;
        let values = self.value_list()?;
        self.expect(TokenKind::RParen, None)?;

        // Additional rows parse but are discarded; only the first row of
        // a multi-row VALUES list is retained.
        while self.peek_kind(TokenKind::Comma) {
            self.advance();
            self.expect(TokenKind::LParen, None)?;
            self.value_list()?;
            self.expect(TokenKind::RParen, None)?;
        }

        self.expect(TokenKind::Semicolon, None)?;

        Ok(Statement::Insert(InsertStatement {
            table_name,
            columns,
            values,
        }))
    }

    fn parse_create(&mut self) -> Result<Statement> {
        self.expect_keyword("CREATE")?;
        self.expect_keyword("TABLE")?;
        let table_name = self.table_name()?;
        self.expect(TokenKind::LParen, None)?;

        let mut columns = Vec::new();
        loop {
            columns.push(self.column_definition()?);

            match self.current_token() {
                Some(token) if token.kind == TokenKind::Comma => {
                    self.advance();
                }
                Some(token) if token.kind == TokenKind::RParen => {
                    self.advance();
                    break;
                }
                _ => {
                    return Err(Error::Parse(format!(
                        "expected ',' or ')' in column list, found {}",
                        self.describe_current()
                    )));
                }
            }
        }

        self.optional_semicolon();

        Ok(Statement::CreateTable(CreateTableStatement {
            table_name,
            columns,
        }))
    }

    fn parse_update(&mut self) -> Result<Statement> {
        self.expect_keyword("UPDATE")?;
        let table_name = self.table_name()?;

        if !self.peek_keyword("SET") {
            return Err(Error::Parse(format!(
                "expected SET after table name, found {}",
                self.describe_current()
            )));
        }
        self.advance();

        let assignments = self.parse_set_clause()?;
        let where_clause = self.parse_where_clause()?;
        self.optional_semicolon();

        Ok(Statement::Update(UpdateStatement {
            table_name,
            assignments,
            where_clause,
        }))
    }

    fn parse_delete(&mut self) -> Result<Statement> {
        self.expect_keyword("DELETE")?;
        if !self.peek_keyword("FROM") {
            return Err(Error::Parse(format!(
                "expected FROM after DELETE, found {}",
                self.describe_current()
            )));
        }
        self.advance();

        let table_name = self.table_name()?;
        let where_clause = self.parse_where_clause()?;
        self.optional_semicolon();

        Ok(Statement::Delete(DeleteStatement {
            table_name,
            where_clause,
        }))
    }

    fn parse_drop(&mut self) -> Result<Statement> {
        self.expect_keyword("DROP")?;
        self.expect_keyword("TABLE")?;
        let table_name = self.table_name()?;
        self.optional_semicolon();

        Ok(Statement::DropTable(DropTableStatement { table_name }))
    }

    //                ================= helpers =================

    fn table_name(&mut self) -> Result<String> {
        match self.current_token() {
            Some(token) if token.kind == TokenKind::Identifier => {
                Ok(self.advance().unwrap().value)
            }
            _ => Err(Error::Parse(format!(
                "expected a table name, found {}",
                self.describe_current()
            ))),
        }
    }

    /// `*` or a non-empty comma-separated identifier list.
    fn parse_columns(&mut self) -> Result<Vec<Column>> {
        if self.peek_kind(TokenKind::Asterisk) {
            self.advance();
            return Ok(vec![Column::All]);
        }
        Ok(self
            .identifier_list("column")?
            .into_iter()
            .map(Column::Named)
            .collect())
    }

    fn parse_tables(&mut self) -> Result<Vec<String>> {
        self.identifier_list("table")
    }

    fn identifier_list(&mut self, what: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        while self.peek_kind(TokenKind::Identifier) {
            names.push(self.advance().unwrap().value);
            if self.peek_kind(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        if names.is_empty() {
            return Err(Error::Parse(format!(
                "expected at least one {}, found {}",
                what,
                self.describe_current()
            )));
        }
        Ok(names)
    }

    /// Non-empty comma-separated literal list (the payload of VALUES).
    fn value_list(&mut self) -> Result<Vec<Value>> {
        let mut values = Vec::new();
        while matches!(
            self.current_token(),
            Some(token) if matches!(token.kind, TokenKind::Number | TokenKind::String)
        ) {
            let token = self.advance().unwrap();
            values.push(literal_value(&token)?);
            if self.peek_kind(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        if values.is_empty() {
            return Err(Error::Parse(format!(
                "expected at least one value, found {}",
                self.describe_current()
            )));
        }
        Ok(values)
    }

    fn parse_where_clause(&mut self) -> Result<Option<Condition>> {
        if self.peek_keyword("WHERE") {
            self.advance();
            Ok(Some(self.condition()?))
        } else {
            Ok(None)
        }
    }

    /// `col OP value` where OP is one of the six comparison operators and
    /// the right-hand side is a number, string, or identifier.
    fn condition(&mut self) -> Result<Condition> {
        let column = match self.current_token() {
            Some(token) if token.kind == TokenKind::Identifier => self.advance().unwrap().value,
            _ => {
                return Err(Error::Parse(format!(
                    "expected column name in condition, found {}",
                    self.describe_current()
                )));
            }
        };

        let op = match self.current_token().map(|token| token.kind) {
            Some(TokenKind::Equals) => CompareOp::Eq,
            Some(TokenKind::NotEquals) => CompareOp::NotEq,
            Some(TokenKind::LessThan) => CompareOp::Lt,
            Some(TokenKind::LessEqual) => CompareOp::LtEq,
            Some(TokenKind::GreaterThan) => CompareOp::Gt,
            Some(TokenKind::GreaterEqual) => CompareOp::GtEq,
            _ => {
                return Err(Error::Parse(format!(
                    "expected comparison operator in condition, found {}",
                    self.describe_current()
                )));
            }
        };
        self.advance();

        let value = match self.current_token() {
            Some(token)
                if matches!(
                    token.kind,
                    TokenKind::Number | TokenKind::String | TokenKind::Identifier
                ) =>
            {
                let token = self.advance().unwrap();
                literal_value(&token)?
            }
            _ => {
                return Err(Error::Parse(format!(
                    "expected a value in condition, found {}",
                    self.describe_current()
                )));
            }
        };

        Ok(Condition { column, op, value })
    }

    /// One or more `col = value` assignments separated by commas.
    fn parse_set_clause(&mut self) -> Result<Vec<(String, Value)>> {
        let mut assignments = Vec::new();

        while self.peek_kind(TokenKind::Identifier) {
            let column = self.advance().unwrap().value;
            self.expect(TokenKind::Equals, None)?;

            let value = match self.current_token() {
                Some(token)
                    if matches!(
                        token.kind,
                        TokenKind::Number | TokenKind::String | TokenKind::Identifier
                    ) =>
                {
                    let token = self.advance().unwrap();
                    literal_value(&token)?
                }
                _ => {
                    return Err(Error::Parse(format!(
                        "expected a value in SET clause, found {}",
                        self.describe_current()
                    )));
                }
            };

            assignments.push((column, value));

            if self.peek_kind(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        if assignments.is_empty() {
            return Err(Error::Parse(format!(
                "expected at least one assignment in SET clause, found {}",
                self.describe_current()
            )));
        }
        Ok(assignments)
    }

    /// `name type [( size )] constraint*`
    fn column_definition(&mut self) -> Result<ColumnDefinition> {
        let name = match self.current_token() {
            Some(token) if token.kind == TokenKind::Identifier => self.advance().unwrap().value,
            _ => {
                return Err(Error::Parse(format!(
                    "expected column name, found {}",
                    self.describe_current()
                )));
            }
        };

        let data_type = match self.current_token() {
            Some(token) if token.kind == TokenKind::Keyword => match token.value.as_str() {
                "INT" => DataType::Integer,
                "TEXT" => DataType::Text,
                "REAL" => DataType::Real,
                "BOOLEAN" => DataType::Boolean,
                "VARCHAR" => DataType::Varchar,
                _ => {
                    return Err(Error::Parse(format!(
                        "expected column type, found {}",
                        self.describe_current()
                    )));
                }
            },
            _ => {
                return Err(Error::Parse(format!(
                    "expected column type, found {}",
                    self.describe_current()
                )));
            }
        };
        self.advance();

        let size = if self.peek_kind(TokenKind::LParen) {
            self.advance();
            let number = self.expect(TokenKind::Number, None)?;
            let size = number.value.parse::<usize>().map_err(|_| {
                Error::Parse(format!(
                    "invalid column size '{}' at offset {}",
                    number.value, number.position
                ))
            })?;
            self.expect(TokenKind::RParen, None)?;
            Some(size)
        } else {
            None
        };

        let mut constraints = Vec::new();
        loop {
            if self.peek_keyword("PRIMARY") {
                self.advance();
                self.expect_keyword("KEY")?;
                constraints.push(Constraint::PrimaryKey);
            } else if self.peek_keyword("NOT") {
                self.advance();
                self.expect_keyword("NULL")?;
                constraints.push(Constraint::NotNull);
            } else {
                break;
            }
        }

        Ok(ColumnDefinition {
            name,
            data_type,
            size,
            constraints,
        })
    }
}

/// Binds a literal token to a native value: integer lexemes parse to
/// `Integer`, dotted numbers to `Float`, strings and bare identifiers to
/// `Text`.
fn literal_value(token: &Token) -> Result<Value> {
    match token.kind {
        TokenKind::Number => {
            if token.value.contains('.') {
                token.value.parse::<f64>().map(Value::Float).map_err(|_| {
                    Error::Parse(format!(
                        "invalid number '{}' at offset {}",
                        token.value, token.position
                    ))
                })
            } else {
                token.value.parse::<i64>().map(Value::Integer).map_err(|_| {
                    Error::Parse(format!(
                        "invalid number '{}' at offset {}",
                        token.value, token.position
                    ))
                })
            }
        }
        TokenKind::String | TokenKind::Identifier => Ok(Value::Text(token.value.clone())),
        _ => Err(Error::Parse(format!(
            "expected a literal value, found {:?} '{}' at offset {}",
            token.kind, token.value, token.position
        ))),
    }
}
