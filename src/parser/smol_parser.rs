use super::ast::{
    BuiltinOp, CompareOp, DirectOp, MathOp, Operand, Program, Statement, SwitchCase,
};
use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind};

/// Recursive descent parser for smol statements
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    /// Creates a new parser over a token stream ending in `Eof`
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof) {
            let (line, column) = tokens.last().map_or((1, 1), |t| (t.line, t.column));
            tokens.push(Token::new(TokenKind::Eof, String::new(), line, column));
        }
        Parser { tokens, current: 0 }
    }

    /// Parses the tokens into an AST
    pub fn parse(&mut self) -> Result<Program> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        Ok(Program { statements })
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        let statement = match self.peek().kind.clone() {
            TokenKind::TypeName(var_type) => {
                self.advance();
                self.parse_variable_decl(var_type)?
            }
            TokenKind::Def => {
                self.advance();
                return self.parse_function();
            }
            TokenKind::Identifier(name) => {
                self.advance();
                self.parse_call_or_direct_operation(name)?
            }
            TokenKind::Set => {
                self.advance();
                let target = self.parse_operand()?;
                self.match_kind(&TokenKind::Comma);
                let value = self.parse_operand()?;
                Statement::Set { target, value }
            }
            TokenKind::Free => {
                self.advance();
                Statement::Free {
                    target: self.parse_operand()?,
                }
            }
            TokenKind::Plot => {
                self.advance();
                let (x, y) = self.parse_operand_pair()?;
                Statement::Plot { x, y }
            }
            TokenKind::Print => {
                self.advance();
                self.consume(TokenKind::LeftParen, "'(' after print")?;
                let operand = self.parse_operand()?;
                self.consume(TokenKind::RightParen, "')' after print argument")?;
                Statement::Builtin {
                    op: BuiltinOp::Print,
                    operand: Some(operand),
                }
            }
            TokenKind::Inc | TokenKind::Pri | TokenKind::Pru => {
                let op = match self.advance().kind {
                    TokenKind::Inc => BuiltinOp::Inc,
                    TokenKind::Pri => BuiltinOp::Print,
                    _ => BuiltinOp::PrintChar,
                };
                Statement::Builtin {
                    op,
                    operand: Some(self.parse_operand()?),
                }
            }
            TokenKind::Brk => {
                self.advance();
                Statement::Builtin {
                    op: BuiltinOp::Newline,
                    operand: None,
                }
            }
            TokenKind::Add | TokenKind::Sub | TokenKind::Mul | TokenKind::Div | TokenKind::Pow => {
                let op = match self.advance().kind {
                    TokenKind::Add => MathOp::Add,
                    TokenKind::Sub => MathOp::Sub,
                    TokenKind::Mul => MathOp::Mul,
                    TokenKind::Div => MathOp::Div,
                    _ => MathOp::Pow,
                };
                let receiver = self.parse_operand()?;
                self.match_kind(&TokenKind::Comma);
                let value = self.parse_operand()?;
                Statement::Math {
                    op,
                    receiver,
                    value,
                }
            }
            TokenKind::WhileNot => {
                self.advance();
                let (lhs, rhs) = self.parse_operand_pair()?;
                let body = self.parse_block("whileNot")?;
                return Ok(Statement::WhileNot { lhs, rhs, body });
            }
            TokenKind::Eq | TokenKind::Neq | TokenKind::Lt | TokenKind::Gt => {
                let op = match self.advance().kind {
                    TokenKind::Eq => CompareOp::Equal,
                    TokenKind::Neq => CompareOp::NotEqual,
                    TokenKind::Lt => CompareOp::LessThan,
                    _ => CompareOp::GreaterThan,
                };
                let (lhs, rhs) = self.parse_operand_pair()?;
                let body = self.parse_block(&op.to_string())?;
                return Ok(Statement::Comparison { op, lhs, rhs, body });
            }
            TokenKind::Switch => {
                self.advance();
                return self.parse_switch();
            }
            other => {
                return Err(self.syntax_error(format!(
                    "Unexpected token {} at start of statement",
                    other
                )))
            }
        };

        self.match_kind(&TokenKind::Semicolon);
        Ok(statement)
    }

    /// `<type> <name> = <operand>`
    fn parse_variable_decl(&mut self, var_type: String) -> Result<Statement> {
        let name = self.expect_identifier("variable name")?;
        self.consume(TokenKind::Assign, "'=' in variable declaration")?;
        let value = self.parse_operand()?;
        Ok(Statement::VariableDecl {
            var_type,
            name,
            value,
        })
    }

    fn parse_function(&mut self) -> Result<Statement> {
        let name = self.expect_identifier("function name")?;
        self.consume(TokenKind::LeftParen, "'(' after function name")?;

        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                params.push(self.expect_identifier("parameter name")?);
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "')' after parameters")?;

        let body = self.parse_block(&name)?;
        Ok(Statement::Function { name, params, body })
    }

    fn parse_call_or_direct_operation(&mut self, name: String) -> Result<Statement> {
        match self.peek().kind {
            TokenKind::LeftParen => {
                self.advance();
                let mut args = Vec::new();
                if !self.check(&TokenKind::RightParen) {
                    loop {
                        args.push(self.parse_operand()?);
                        if !self.match_kind(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.consume(TokenKind::RightParen, "')' after arguments")?;
                Ok(Statement::FunctionCall { name, args })
            }
            TokenKind::PlusPlus => {
                self.advance();
                Ok(Statement::DirectOperation {
                    target: Operand::Variable(name),
                    op: DirectOp::Increment,
                })
            }
            TokenKind::MinusMinus => {
                self.advance();
                Ok(Statement::DirectOperation {
                    target: Operand::Variable(name),
                    op: DirectOp::Decrement,
                })
            }
            _ => Err(self.expected_error("'(', '++' or '--'", &name)),
        }
    }

    fn parse_switch(&mut self) -> Result<Statement> {
        self.consume(TokenKind::LeftParen, "'(' after switch")?;
        let value = self.parse_operand()?;
        self.consume(TokenKind::RightParen, "')' after switch value")?;
        self.consume(TokenKind::Colon, "':' after switch")?;

        let mut cases = Vec::new();
        let mut default = None;

        loop {
            match self.peek().kind {
                TokenKind::Case => {
                    self.advance();
                    let value = self.parse_operand()?;
                    let body = self.parse_block("case")?;
                    cases.push(SwitchCase { value, body });
                }
                TokenKind::Default => {
                    if default.is_some() {
                        return Err(self.syntax_error("Switch has more than one default"));
                    }
                    self.advance();
                    default = Some(self.parse_block("default")?);
                }
                TokenKind::End => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    return Err(Error::UnexpectedEof {
                        context: "switch statement".to_string(),
                    })
                }
                _ => return Err(self.expected_error("'case', 'default' or 'end'", "switch")),
            }
        }

        Ok(Statement::Switch {
            value,
            cases,
            default,
        })
    }

    /// `':' statement* 'end'`
    fn parse_block(&mut self, owner: &str) -> Result<Vec<Statement>> {
        self.consume(TokenKind::Colon, "':' to open block")?;

        let mut body = Vec::new();
        while !self.check(&TokenKind::End) {
            if self.is_at_end() {
                return Err(Error::UnexpectedEof {
                    context: format!("block of {} is missing 'end'", owner),
                });
            }
            body.push(self.parse_statement()?);
        }
        self.advance();

        Ok(body)
    }

    /// `'(' operand ',' operand ')'`
    fn parse_operand_pair(&mut self) -> Result<(Operand, Operand)> {
        self.consume(TokenKind::LeftParen, "'('")?;
        let lhs = self.parse_operand()?;
        self.consume(TokenKind::Comma, "','")?;
        let rhs = self.parse_operand()?;
        self.consume(TokenKind::RightParen, "')'")?;
        Ok((lhs, rhs))
    }

    fn parse_operand(&mut self) -> Result<Operand> {
        let operand = match &self.peek().kind {
            TokenKind::Integer(n) => Operand::Number(*n),
            TokenKind::Identifier(name) => Operand::Variable(name.clone()),
            TokenKind::String(s) => Operand::Str(s.clone()),
            TokenKind::True => Operand::Bool(true),
            TokenKind::False => Operand::Bool(false),
            other => {
                return Err(self.syntax_error(format!(
                    "Expected number, variable, string or boolean, found {}",
                    other
                )))
            }
        };
        self.advance();
        Ok(operand)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.tokens[self.current - 1].clone()
    }

    fn check(&self, kind: &TokenKind) -> bool {
        if self.is_at_end() {
            return false;
        }
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn match_kind(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        if self.check(&kind) {
            return Ok(self.advance());
        }
        if self.is_at_end() {
            return Err(Error::UnexpectedEof {
                context: format!("expected {}", expected),
            });
        }
        Err(self.syntax_error(format!(
            "Expected {}, found {}",
            expected,
            self.peek().kind
        )))
    }

    fn expect_identifier(&mut self, what: &str) -> Result<String> {
        match &self.peek().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(self.syntax_error(format!("Expected {}, found {}", what, other))),
        }
    }

    fn syntax_error(&self, message: impl Into<String>) -> Error {
        let token = self.peek();
        Error::SyntaxError {
            line: token.line,
            col: token.column,
            message: message.into(),
        }
    }

    fn expected_error(&self, expected: &str, after: &str) -> Error {
        self.syntax_error(format!(
            "Expected {} after {}, found {}",
            expected,
            after,
            self.peek().kind
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;

    fn parse(source: &str) -> Result<Program> {
        let tokens = Scanner::new(source).scan_tokens()?;
        Parser::new(tokens).parse()
    }

    #[test]
    fn test_variable_declaration() {
        let program = parse("Uint8 A = 10;").unwrap();
        assert_eq!(
            program.statements,
            vec![Statement::VariableDecl {
                var_type: "Uint8".to_string(),
                name: "A".to_string(),
                value: Operand::Number(10),
            }]
        );
    }

    #[test]
    fn test_while_not_with_body() {
        let program = parse("Uint8 A = 0\nwhileNot(A, 3):\n  INC A\nend").unwrap();
        assert_eq!(
            program.statements[1],
            Statement::WhileNot {
                lhs: Operand::Variable("A".to_string()),
                rhs: Operand::Number(3),
                body: vec![Statement::Builtin {
                    op: BuiltinOp::Inc,
                    operand: Some(Operand::Variable("A".to_string())),
                }],
            }
        );
    }

    #[test]
    fn test_function_definition_and_call() {
        let program = parse("def blink(x, y):\n plot(x, y)\nend\nblink(1, 2);").unwrap();
        match &program.statements[0] {
            Statement::Function { name, params, body } => {
                assert_eq!(name, "blink");
                assert_eq!(params, &vec!["x".to_string(), "y".to_string()]);
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected function, got {:?}", other),
        }
        assert_eq!(
            program.statements[1],
            Statement::FunctionCall {
                name: "blink".to_string(),
                args: vec![Operand::Number(1), Operand::Number(2)],
            }
        );
    }

    #[test]
    fn test_switch_with_default() {
        let program =
            parse("switch(A):\n case 1:\n  BRK\n end\n default:\n  PRI A\n end\nend").unwrap();
        match &program.statements[0] {
            Statement::Switch { cases, default, .. } => {
                assert_eq!(cases.len(), 1);
                assert_eq!(cases[0].value, Operand::Number(1));
                assert!(default.is_some());
            }
            other => panic!("expected switch, got {:?}", other),
        }
    }

    #[test]
    fn test_literal_targets_parse() {
        // rejected later by the back ends
        let program = parse("set 5 A\nfree 3\nINC 4").unwrap();
        assert_eq!(program.statements.len(), 3);
    }

    #[test]
    fn test_math_and_direct_operations() {
        let program = parse("ADD A, 5\nSUB A B\nA++\nB--").unwrap();
        assert!(matches!(
            program.statements[0],
            Statement::Math { op: MathOp::Add, .. }
        ));
        assert!(matches!(
            program.statements[3],
            Statement::DirectOperation {
                op: DirectOp::Decrement,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_end_is_eof_error() {
        let err = parse("whileNot(A, 3):\n INC A").unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof { .. }));
    }

    #[test]
    fn test_bare_identifier_is_error() {
        let err = parse("A 5").unwrap_err();
        assert!(matches!(err, Error::SyntaxError { line: 1, .. }));
    }
}
