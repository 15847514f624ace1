use proptest::prelude::*;
use vex::script::{ExError, ExParser, Interpreter, ScriptParser, Value, MAX_ALIAS_DEPTH};

/// Build `A1 → A2 → … → A{links}`, the last link setting `reached`.
fn chain(interp: &mut Interpreter, links: usize) {
    for i in 1..links {
        interp.define_alias(format!("A{i}"), 0, None, format!("A{}", i + 1));
    }
    interp.define_alias(format!("A{links}"), 0, None, "let reached = 1");
}

proptest! {
    /// The parser returns Ok or Err for any printable input; it never panics.
    #[test]
    fn parser_does_not_panic(s in "[ -~\n]*") {
        let _ = ExParser.parse_script(&s);
    }

    /// Same, biased towards block keywords and separators.
    #[test]
    fn parser_survives_block_soup(
        words in prop::collection::vec(
            prop::sample::select(vec![
                "while 1", "endwhile", "for x in [1]", "endfor", "if 0", "elseif 1",
                "else", "endif", "break", "continue", "|", "\\", "\"", "Foo", "%d",
                "command! Foo echo 1", "1,$", "let x = 1",
            ]),
            0..24,
        ),
        sep in prop::sample::select(vec!["\n", " | ", " "]),
    ) {
        let _ = ExParser.parse_script(&words.join(sep));
    }

    /// A while loop's body runs exactly once per true condition evaluation.
    #[test]
    fn while_body_runs_n_times(n in 0i64..200) {
        let mut interp = Interpreter::new();
        let src = format!(
            "let i = 0\nlet runs = 0\nwhile i < {n}\n  let i += 1\n  let runs += 1\nendwhile"
        );
        prop_assert!(interp.exec_script(&src).is_ok());
        prop_assert_eq!(interp.vars.get("runs"), Some(&Value::Int(n)));
    }

    /// `-nargs` accepts only 0, 1, *, ?, +.
    #[test]
    fn numeric_nargs_above_one_rejected(n in 2u32..10_000) {
        let mut interp = Interpreter::new();
        let err = interp
            .exec_script(&format!("command -nargs={n} Foo echo 1"))
            .unwrap_err();
        prop_assert!(matches!(err, ExError::InvalidArgumentCount));
        prop_assert!(!interp.aliases.has_alias("Foo"));
    }

    #[test]
    fn negative_nargs_rejected(n in 1u32..10_000) {
        let mut interp = Interpreter::new();
        let err = interp
            .exec_script(&format!("command -nargs=-{n} Foo echo 1"))
            .unwrap_err();
        prop_assert!(matches!(err, ExError::InvalidArgumentCount));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Alias chains resolve up to the depth limit and fail one past it.
    #[test]
    fn alias_chains_respect_depth_limit(links in 1usize..=MAX_ALIAS_DEPTH + 20) {
        let mut interp = Interpreter::new();
        chain(&mut interp, links);
        let result = interp.exec_script("A1");
        if links <= MAX_ALIAS_DEPTH {
            prop_assert!(result.is_ok());
            prop_assert!(interp.vars.contains("reached"));
        } else {
            prop_assert!(matches!(result, Err(ExError::AliasDepthExceeded)));
            prop_assert!(!interp.vars.contains("reached"));
        }
    }
}
