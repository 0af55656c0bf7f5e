use classcc::lexer::{Lexer, TokenKind};
use classcc::parser::*;

fn parse_expr(input: &str) -> Expr {
    let tokens = Lexer::tokenize(input).unwrap();
    Parser::new(tokens).parse_expr().unwrap()
}

#[test]
fn tokens_and_lines() {
    let tokens = Lexer::tokenize("class A {\n  int x; // field\n  x <= 10 != not\n}").unwrap();
    let kinds: Vec<_> = tokens.iter().map(|t| &t.kind).collect();
    assert_eq!(
        kinds,
        [
            &TokenKind::Class,
            &TokenKind::Ident("A".to_string()),
            &TokenKind::OpenCurlyBrace,
            &TokenKind::Int,
            &TokenKind::Ident("x".to_string()),
            &TokenKind::SemiColon,
            &TokenKind::Ident("x".to_string()),
            &TokenKind::LessEqual,
            &TokenKind::Num(10),
            &TokenKind::NotEqual,
            &TokenKind::Not,
            &TokenKind::CloseCurlyBrace,
        ]
    );
    let lines: Vec<_> = tokens.iter().map(|t| t.line).collect();
    assert_eq!(lines, [1, 1, 1, 2, 2, 2, 3, 3, 3, 3, 3, 4]);
}

#[test]
fn lexical_errors() {
    let err = Lexer::tokenize("int x;\nx = 1 @ 2;").unwrap_err();
    assert_eq!(err.line, 2);
    assert!(Lexer::tokenize("99999999999").is_err());
}

#[test]
fn precedence() {
    let expr = parse_expr("1 + 2 * 3 < 10 and not b");
    let ExprKind::Binary(BinOpKind::And, left, right) = &expr.kind else {
        panic!();
    };
    let ExprKind::Binary(BinOpKind::LessThan, sum, _) = &left.kind else {
        panic!();
    };
    let ExprKind::Binary(BinOpKind::Add, _, product) = &sum.kind else {
        panic!();
    };
    assert!(matches!(product.kind, ExprKind::Binary(BinOpKind::Mul, _, _)));
    assert!(matches!(right.kind, ExprKind::Unary(UnaryOpKind::Not, _)));
    assert!(expr.ty().is_none());
}

#[test]
fn calls_and_primaries() {
    let expr = parse_expr("p.move(1, -x)");
    let ExprKind::MethodCall(receiver, method, args) = &expr.kind else {
        panic!();
    };
    assert_eq!(receiver.kind, ExprKind::Variable("p".to_string()));
    assert_eq!(method, "move");
    assert_eq!(args.len(), 2);

    assert!(matches!(parse_expr("f()").kind, ExprKind::SelfCall(ref m, ref a) if m == "f" && a.is_empty()));
    assert_eq!(parse_expr("new Point").kind, ExprKind::New("Point".to_string()));
    assert_eq!(parse_expr("nothing").kind, ExprKind::Nothing);
    assert_eq!(parse_expr("(false)").kind, ExprKind::Bool(false));
}

#[test]
fn classes_fields_and_methods() {
    let input = "
class Point {
  int x, y;
  Point next;
  int sum(int scale) {
    int total;
    total = x + y;
    if (0 < scale) { total = total * scale; }
    print(total);
    return total;
  }
}
class Program : Point {
  nothing start() { return nothing; }
}
";
    let tokens = Lexer::tokenize(input).unwrap();
    let program = Parser::new(tokens).parse().unwrap();
    assert_eq!(program.classes.len(), 2);

    let point = &program.classes[0];
    assert_eq!(point.line, 2);
    assert_eq!(point.fields.len(), 2);
    assert_eq!(point.fields[0].names, ["x", "y"]);
    assert_eq!(point.fields[1].ty, TypeName::Class("Point".to_string()));

    let sum = &point.methods[0];
    assert_eq!(sum.return_type, TypeName::Int);
    assert_eq!(sum.params[0].name, "scale");
    assert_eq!(sum.body.locals.len(), 1);
    assert_eq!(sum.body.stmts.len(), 3);
    assert!(matches!(sum.body.stmts[1].kind, StmtKind::If(_, ref body) if body.len() == 1));
    assert_eq!(sum.body.stmts[2].line, 9);

    assert_eq!(program.classes[1].superclass.as_deref(), Some("Point"));
}

#[test]
fn syntax_errors() {
    let tokens = Lexer::tokenize("class A {\n int f() {\n return 1\n }\n}").unwrap();
    let err = Parser::new(tokens).parse().unwrap_err();
    assert_eq!(err.line, 4);

    let tokens = Lexer::tokenize("class A { int f() { x = ; return 1; } }").unwrap();
    assert!(Parser::new(tokens).parse().is_err());
}
