use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use planparse::{InstructionRecord, ParseOptions, Parser};

const FIXTURE_SUFFIX: &str = ".test.plan";

#[derive(Debug, Default, Deserialize)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Parser options for this fixture.
    #[serde(default)]
    pub options: ParseOptions,

    /// If true, the test expects parsing to fail.
    #[serde(default)]
    pub expect_parse_error: bool,

    /// The error's Display string must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// The failing step number.
    #[serde(default)]
    pub expect_error_step: Option<usize>,

    /// Expected number of instructions.
    #[serde(default)]
    pub expect_count: Option<usize>,

    /// Expected instructions, compared exactly and in order.
    #[serde(default)]
    pub expect_instructions: Option<Vec<InstructionRecord>>,
}

impl TestConfig {
    fn expects_failure(&self) -> bool {
        self.expect_parse_error || self.expect_error.is_some() || self.expect_error_step.is_some()
    }
}

/// Split a fixture into its TOML frontmatter and pseudocode body.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close = if after_open.starts_with("---") {
        0
    } else {
        after_open
            .find("\n---")
            .map(|i| i + 1)
            .ok_or("missing closing --- frontmatter delimiter")?
    };
    let toml_str = after_open[..close].trim_end_matches(['\r', '\n']);
    let rest = &after_open[close + 3..];
    let body = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;
    Ok((config, body))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .map(|s| s.trim_end_matches(FIXTURE_SUFFIX))
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let (description, outcome) = match std::fs::read_to_string(path) {
        Err(e) => (None, Err(format!("cannot read file: {}", e))),
        Ok(content) => match parse_test_file(&content) {
            Err(e) => (None, Err(format!("frontmatter error: {}", e))),
            Ok((config, body)) => (config.description.clone(), check_fixture(&config, body)),
        },
    };
    TestResult {
        path: path.to_path_buf(),
        description,
        outcome: match outcome {
            Ok(()) => TestOutcome::Pass,
            Err(reason) => TestOutcome::Fail(reason),
        },
    }
}

/// Parse `body` and compare against the expectations in `config`.
fn check_fixture(config: &TestConfig, body: &str) -> Result<(), String> {
    let parser = Parser::with_options(body.to_string(), 0, config.options.clone());

    let plan = match (parser.parse(), config.expects_failure()) {
        (Err(error), true) => return check_error(config, &error),
        (Err(error), false) => return Err(format!("unexpected parse error: {}", error)),
        (Ok(plan), true) => {
            return Err(format!(
                "expected parse error, but parsing succeeded ({} steps)",
                plan.instructions.len()
            ));
        }
        (Ok(plan), false) => plan,
    };

    if let Some(expected) = config.expect_count {
        if plan.instructions.len() != expected {
            return Err(format!(
                "expected {} instruction(s), got {}",
                expected,
                plan.instructions.len()
            ));
        }
    }

    if let Some(expected) = &config.expect_instructions {
        let actual: Vec<InstructionRecord> =
            plan.instructions.iter().map(InstructionRecord::from).collect();
        if actual.len() != expected.len() {
            return Err(format!(
                "expected {} instruction(s), got {}",
                expected.len(),
                actual.len()
            ));
        }
        for (actual, expected) in actual.iter().zip(expected) {
            if actual != expected {
                return Err(format!(
                    "step {} mismatch\n  expected: {:?}\n  actual:   {:?}",
                    expected.step, expected, actual
                ));
            }
        }
    }

    Ok(())
}

fn check_error(config: &TestConfig, error: &planparse::ParseError) -> Result<(), String> {
    let message = error.to_string();
    if let Some(expected) = &config.expect_error {
        if !message.contains(expected.as_str()) {
            return Err(format!(
                "expected error containing \"{}\", got: {}",
                expected, message
            ));
        }
    }
    if let Some(step) = config.expect_error_step {
        if error.step != step {
            return Err(format!(
                "expected failure at step {}, got step {}: {}",
                step, error.step, message
            ));
        }
    }
    Ok(())
}

/// Discover fixture files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for path in entries.flatten().map(|entry| entry.path()) {
        if path.is_dir() {
            collect_tests(&path, root, out);
            continue;
        }
        let is_fixture = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(FIXTURE_SUFFIX));
        if is_fixture {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

/// Keep only the requested categories (and their subcategories).
fn select_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a [PathBuf]> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v.as_slice())).collect();
    }
    let mut selected = BTreeMap::new();
    for request in requested {
        let request = request.trim_matches('/');
        let prefix = format!("{}/", request);
        let before = selected.len();
        for (cat, files) in all {
            if cat == request || cat.starts_with(&prefix) {
                selected.insert(cat.as_str(), files.as_slice());
            }
        }
        if selected.len() == before {
            eprintln!("warning: category '{}' not found", request);
        }
    }
    selected
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(cat), files.len());
    }
}

fn paint(text: &str, code: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    }
}

/// Run every fixture under `path` (or a single file), optionally limited to
/// `categories`. Returns the process exit code: 0 when all pass.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let all = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        discover_categorized(path)
    };
    if all.is_empty() {
        eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
        return 1;
    }

    let selected = select_categories(&all, categories);
    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (cat, files) in &selected {
        eprintln!();
        eprintln!("{}", paint(category_label(cat), "1", no_color));

        for file in *files {
            let result = run_single_test(file);
            match result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", paint("PASS", "32", no_color), result.label());
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", paint("FAIL", "31", no_color), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for failure in &failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!("test result: {}. {} passed, 0 failed", paint("ok", "32", no_color), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            paint("FAILED", "31", no_color),
            passed,
            failures.len(),
            passed + failures.len()
        );
        1
    }
}
