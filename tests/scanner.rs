#[cfg(test)]
mod scanner_tests {
    use rox::error::LoxError;
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_ten_punctuators() {
        let (tokens, errors) = Scanner::new("(){},.+-;*").scan_tokens();

        assert!(errors.is_empty());
        assert_eq!(tokens.len(), 10);
        assert!(tokens.iter().all(|t| t.literal.is_none()));
        assert!(tokens.iter().all(|t| t.lexeme.len() == 1));
    }

    #[test]
    fn test_scanner_03_operators_and_ternary() {
        assert_token_sequence(
            "! != = == < <= > >= ? :",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::QUESTION, "?"),
                (TokenType::COLON, ":"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_numbers() {
        let (tokens, errors) = Scanner::new("15.28").scan_tokens();

        assert!(errors.is_empty());
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].literal, Some(Literal::Number(15.28)));

        let (tokens, _) = Scanner::new("160.").scan_tokens();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].token_type, TokenType::NUMBER);
        assert_eq!(tokens[0].literal, Some(Literal::Number(160.0)));
        assert_eq!(tokens[1].token_type, TokenType::DOT);
    }

    #[test]
    fn test_scanner_05_keywords_and_identifiers() {
        assert_token_sequence(
            "class classy _under var1 this",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "classy"),
                (TokenType::IDENTIFIER, "_under"),
                (TokenType::IDENTIFIER, "var1"),
                (TokenType::THIS, "this"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_06_strings_keep_contents_and_lines() {
        let (tokens, errors) = Scanner::new("\"two\nlines\" x").scan_tokens();

        assert!(errors.is_empty());
        assert_eq!(tokens[0].literal, Some(Literal::Str("two\nlines".to_string())));
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_scanner_07_unterminated_string() {
        let (_, errors) = Scanner::new("var s = \"never closed;").scan_tokens();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Unterminated string"));
    }

    #[test]
    fn test_scanner_08_block_comments() {
        let (tokens, errors) = Scanner::new("/* one\ntwo\nthree */ a // trailing\nb").scan_tokens();

        assert!(errors.is_empty());
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].lexeme, "a");
        assert_eq!(tokens[0].line, 3);
        assert_eq!(tokens[1].line, 4);

        let (_, errors) = Scanner::new("a /* no end").scan_tokens();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Unterminated block comment"));
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source);

        let results: Vec<_> = scanner.collect();

        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '#'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                matches!(err, LoxError::Lex { line: 1, .. }),
                "Expected a lexical error on line 1, got: {}",
                err
            );
            assert!(
                err.to_string().contains("Unexpected character"),
                "Error message should contain 'Unexpected character', got: {}",
                err
            );
        }

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(
                        token.token_type, expected_type,
                        "Expected token type {:?}, got {:?}",
                        expected_type, token.token_type
                    );
                    assert_eq!(
                        token.lexeme, expected_lexeme,
                        "Expected lexeme '{}', got '{}'",
                        expected_lexeme, token.lexeme
                    );
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_token_display_and_json() {
        let (tokens, _) = Scanner::new("x = 3;").scan_tokens();

        assert_eq!(tokens[0].to_string(), "IDENTIFIER x null");
        assert_eq!(tokens[2].to_string(), "NUMBER 3 3.0");

        let json = serde_json::to_value(&tokens[2]).unwrap();
        assert_eq!(json["type"], "NUMBER");
        assert_eq!(json["lexeme"], "3");
        assert_eq!(json["literal"], 3.0);
    }
}
