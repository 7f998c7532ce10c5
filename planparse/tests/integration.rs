use planparse::{Instruction, InstructionKind, ParseErrorKind, ParseOptions, Parser};

fn parse(source: &str) -> Vec<Instruction> {
    let parser = Parser::new(source.to_string(), 0);
    parser.parse().expect("parse failed").instructions
}

fn single(source: &str) -> Instruction {
    let mut plan = parse(source);
    assert_eq!(plan.len(), 1, "expected one instruction for {:?}", source);
    plan.remove(0)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn call_assignment() {
    let i = single(r#"result = getData("x")"#);
    assert_eq!(i.step(), 1);
    assert_eq!(i.kind(), InstructionKind::FunctionExecution);
    assert_eq!(i.function_name(), "getData");
    assert_eq!(i.inputs(), strings(&["x"]));
    assert_eq!(i.output_name(), Some("result"));
    assert_eq!(i.result_index(), None);
}

#[test]
fn indexed_call() {
    let i = single(r#"result = getData("x")[-1]"#);
    assert_eq!(i.kind(), InstructionKind::FunctionExecution);
    assert_eq!(i.function_name(), "getData");
    assert_eq!(i.inputs(), strings(&["x"]));
    assert_eq!(i.output_name(), Some("result"));
    assert_eq!(i.result_index(), Some(-1));
}

#[test]
fn array_access() {
    let i = single("latest = data[-1]");
    assert_eq!(i.kind(), InstructionKind::DataExtraction);
    assert_eq!(i.function_name(), "data");
    assert!(i.inputs().is_empty());
    assert_eq!(i.output_name(), Some("latest"));
    assert_eq!(i.result_index(), Some(-1));
}

#[test]
fn arithmetic_expression() {
    let i = single("total = a + b");
    assert_eq!(i.kind(), InstructionKind::FunctionExecution);
    assert_eq!(i.function_name(), "arithmetic_expression");
    assert_eq!(i.inputs(), strings(&["a + b"]));
    assert_eq!(i.output_name(), Some("total"));
}

#[test]
fn arithmetic_wins_over_call_assignment() {
    let i = single("r = f(x) + g(y)");
    assert_eq!(i.function_name(), "arithmetic_expression");
    assert_eq!(i.inputs(), strings(&["f(x) + g(y)"]));
}

#[test]
fn list_literal() {
    let i = single("mylist = [1, 2, 3]");
    assert_eq!(i.kind(), InstructionKind::FunctionExecution);
    assert_eq!(i.function_name(), "create_list");
    assert_eq!(i.inputs(), strings(&["1", "2", "3"]));
    assert_eq!(i.output_name(), Some("mylist"));
    assert_eq!(i.result_index(), None);
}

#[test]
fn dict_literal() {
    let i = single(r#"data3 = { "note": "世界" , data : result[0] }"#);
    assert_eq!(i.function_name(), "create_dict");
    assert_eq!(
        i.inputs(),
        strings(&[r#""note""#, r#""世界""#, "data", "result[0]"])
    );
}

#[test]
fn empty_collections() {
    let plan = parse("a = []\nb = {}");
    assert_eq!(plan[0].function_name(), "create_list");
    assert!(plan[0].inputs().is_empty());
    assert_eq!(plan[1].function_name(), "create_dict");
    assert!(plan[1].inputs().is_empty());
}

#[test]
fn string_and_default_values() {
    let plan = parse("name = \"value\"\ncount = 42\nlabel = f\"{name}!\"");
    assert_eq!(plan[0].kind(), InstructionKind::DefaultValue);
    assert_eq!(plan[0].function_name(), "value");
    assert_eq!(plan[1].kind(), InstructionKind::DefaultValue);
    assert_eq!(plan[1].function_name(), "42");
    assert_eq!(plan[2].function_name(), "f\"{name}!\"");
    assert!(plan.iter().all(|i| i.result_index().is_none()));
}

#[test]
fn quoted_comma_and_bare_call() {
    let plan = parse("a = f(\"x,y\")\ng(a)");
    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0].inputs(), strings(&["x,y"]));
    assert_eq!(plan[1].step(), 2);
    assert_eq!(plan[1].function_name(), "g");
    assert_eq!(plan[1].inputs(), strings(&["a"]));
    assert_eq!(plan[1].output_name(), None);
}

#[test]
fn brackets_inside_string_arguments() {
    let src = "revenue_data = ext_double_list_from_dataList(result_2, \"营业收入(元)\")\n\
               growth_rate_data = ext_double_list_from_dataList(result_2, \"营业收入增长率(%)\")";
    let plan = parse(src);
    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0].inputs(), strings(&["result_2", "营业收入(元)"]));
    assert_eq!(plan[1].inputs(), strings(&["result_2", "营业收入增长率(%)"]));
}

#[test]
fn mixed_argument_kinds() {
    let i = single(r#"complex_call(123, "text", get_data(), [1,2,3], {"key": get_value()})"#);
    assert_eq!(
        i.inputs(),
        strings(&["123", "text", "get_data()", "[1,2,3]", r#"{"key": get_value()}"#])
    );
}

#[test]
fn fenced_block_with_comments() {
    let src = "```python\n# fetch\nsql = gen_sql(\"revenue by year\")\n\nrows = exec_sql(sql)\n```";
    let plan = parse(src);
    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0].step(), 1);
    assert_eq!(plan[1].step(), 2);
    assert_eq!(plan[1].function_name(), "exec_sql");
}

#[test]
fn malformed_fences_never_drop_statements() {
    assert_eq!(parse("a = f(1)\nb = g(a)\n```").len(), 2);
    assert_eq!(parse("```python\na = f(1)\nb = g(a)").len(), 2);

    let plan = parse("Plan: ```python\na = f(1)\n```");
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].function_name(), "f");

    let plan = parse("    ```python\n    a = f(1)\n    ```");
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].output_name(), Some("a"));
}

#[test]
fn signed_literal_is_arithmetic() {
    for (line, expression) in [("x = -1", "-1"), ("x = -inf", "-inf"), ("x = -y", "-y")] {
        let i = single(line);
        assert_eq!(i.kind(), InstructionKind::FunctionExecution, "{}", line);
        assert_eq!(i.function_name(), "arithmetic_expression");
        assert_eq!(i.inputs(), strings(&[expression]));
    }
    assert_eq!(single("x = 7").kind(), InstructionKind::DefaultValue);
}

#[test]
fn empty_input_is_empty_plan() {
    assert!(parse("").is_empty());
    assert!(parse("\n   \n# only a comment\n").is_empty());
}

#[test]
fn unparseable_line_fails_whole_parse() {
    let src = "a = f(1)\nb = g(a)\nc = a[0]\nh(c)\nthis is not code\nz = 1";
    let err = Parser::new(src.to_string(), 3).parse().unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnparseableLine);
    assert_eq!(err.step, 5);
    assert_eq!(err.line, "this is not code");
    assert_eq!(&src[err.span.clone()], "this is not code");
    assert_eq!(err.file_id, 3);
}

#[test]
fn malformed_nesting() {
    let err = Parser::new("x = f(1, [2)".to_string(), 0)
        .parse()
        .unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::MalformedNesting(_)));
    assert_eq!(err.step, 1);

    let err = Parser::new("ok = 1\nx = \"open".to_string(), 0)
        .parse()
        .unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::MalformedNesting(_)));
    assert_eq!(err.step, 2);
    assert_eq!(err.line, "x = \"open");
}

#[test]
fn dict_without_colon() {
    let src = r#"d = {"a": 1, "b"}"#;
    let err = Parser::new(src.to_string(), 0).parse().unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::MalformedLiteral(_)));

    let options = ParseOptions {
        lenient_dicts: true,
    };
    let plan = Parser::with_options(src.to_string(), 0, options)
        .parse()
        .unwrap();
    assert_eq!(plan.instructions[0].inputs(), strings(&[r#""a""#, "1"]));
}

#[test]
fn steps_iterator_stops_after_error() {
    let parser = Parser::new("a = 1\n???\nb = 2".to_string(), 0);
    let results: Vec<_> = parser.steps().collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert_eq!(results[1].as_ref().unwrap_err().step, 2);
}

#[test]
fn error_display_names_step_and_line() {
    let err = Parser::new("x = 1\nnope".to_string(), 0)
        .parse()
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("step 2"), "{}", message);
    assert!(message.contains("nope"), "{}", message);
    assert_eq!(err.to_diagnostic().labels[0].range, err.span);
}

#[test]
fn instruction_serializes_to_flat_record() {
    let i = single(r#"result = getData("x")[-1]"#);
    let json = serde_json::to_value(&i).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "step": 1,
            "kind": "function",
            "function_name": "getData",
            "inputs": ["x"],
            "output_name": "result",
            "result_index": -1,
        })
    );

    let bare = single("show(x)");
    let json = serde_json::to_value(&bare).unwrap();
    assert!(json.get("output_name").is_none());
    assert_eq!(json["inputs"], serde_json::json!(["x"]));
}

#[test]
fn display_report() {
    let i = single("latest = data[-1]");
    let text = i.to_string();
    assert!(text.contains("function: data"));
    assert!(text.contains("inputs:   -"));
    assert!(text.contains("index:    -1"));
    assert!(text.contains("kind:     DataExtraction"));
}

#[test]
fn parsing_is_reentrant_across_threads() {
    let sources = ["a = f(1)", "b = [1, 2]", "c = x[0]", "d = p + q"];
    let parser = Parser::new("shared = g(1)".to_string(), 0);
    let parser = &parser;
    std::thread::scope(|scope| {
        let handles: Vec<_> = sources
            .iter()
            .map(|src| scope.spawn(move || (planparse::parse_plan(src), parser.parse())))
            .collect();
        for handle in handles {
            let (own, shared) = handle.join().unwrap();
            assert_eq!(own.unwrap().len(), 1);
            assert_eq!(shared.unwrap().instructions.len(), 1);
        }
    });
}
