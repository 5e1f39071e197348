use proptest::prelude::*;

use super::{Expectation, ExtractOptions, TestCase, extract_cases};

const TRUNCATE_FIXTURE: &str = r#"import { expect, test } from 'vitest'
import { compileCss, run } from './test-utils/run'

test('truncate', async () => {
  expect(await run(['truncate', '-truncate', 'truncate/foo'])).toMatchInlineSnapshot(`
    ".truncate {
      text-overflow: ellipsis;
      white-space: nowrap;
      overflow: hidden;
    }"
  `)
  expect(await run(['-truncate', 'truncate/foo'])).toEqual('')
})
"#;

const THEMED_FIXTURE: &str = r#"test('bg', async () => {
  expect(
    await compileCss(
      css`
        @theme {
          --color-red-500: #ef4444;
        }
        @tailwind utilities;
      `,
      ['bg-red-500'],
    ),
  ).toMatchInlineSnapshot(`
    ":root, :host {
      --color-red-500: #ef4444;
    }

    .bg-red-500 {
      background-color: var(--color-red-500);
    }"
  `)
  expect(await run(['bg-[#0088cc]'])).toMatchInlineSnapshot(`
    ".bg-\\[\\#0088cc\\] {
      background-color: #0088cc;
    }"
  `)
})
"#;

fn single_block(body: &str) -> String {
    format!("test('group', async () => {{\n{body}\n}})\n")
}

fn cases(source: &str) -> Vec<TestCase> {
    extract_cases(source, &ExtractOptions::default())
}

#[test]
fn truncate_fixture_yields_match_then_empty() {
    let cases = cases(TRUNCATE_FIXTURE);

    assert_eq!(cases.len(), 2);
    assert_eq!(cases[0].group_name, "truncate");
    assert_eq!(cases[0].ordinal, 0);
    assert_eq!(cases[0].line, 5);
    assert_eq!(
        cases[0].input_tokens,
        vec!["truncate", "-truncate", "truncate/foo"]
    );
    let Expectation::Match { expected_css } = &cases[0].expectation else {
        panic!("first case should be a match, got {:?}", cases[0].expectation);
    };
    assert!(expected_css.starts_with(".truncate {"));
    assert!(expected_css.contains("overflow: hidden;"));
    assert!(expected_css.ends_with('}'));

    assert_eq!(cases[1].ordinal, 1);
    assert_eq!(cases[1].line, 12);
    assert_eq!(cases[1].input_tokens, vec!["-truncate", "truncate/foo"]);
    assert_eq!(cases[1].expectation, Expectation::Empty);
}

#[test]
fn token_order_is_preserved() {
    let cases = cases(&single_block("  expect(run(['a','b','c'])).toEqual('')"));

    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].input_tokens, vec!["a", "b", "c"]);
}

#[test]
fn empty_token_array_is_dropped_without_consuming_an_ordinal() {
    let source = single_block(
        "  expect(await run([])).toEqual('')\n  expect(await run(['flex'])).toMatchInlineSnapshot(`\".flex { display: flex; }\"`)",
    );
    let cases = cases(&source);

    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].ordinal, 0);
    assert_eq!(cases[0].input_tokens, vec!["flex"]);
    assert_eq!(
        cases[0].expectation,
        Expectation::Match {
            expected_css: ".flex { display: flex; }".to_string()
        }
    );
}

#[test]
fn bracket_inside_token_does_not_end_array() {
    let cases = cases(&single_block("  expect(await run(['a[b]c'])).toEqual('')"));

    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].input_tokens, vec!["a[b]c"]);
}

#[test]
fn box_border_scenario_yields_empty_case() {
    let cases = cases(&single_block(
        "  expect(await run(['box', '-box-border'])).toEqual('')",
    ));

    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].input_tokens, vec!["box", "-box-border"]);
    assert_eq!(cases[0].expectation, Expectation::Empty);
}

#[test]
fn themed_compile_is_deferred_and_following_assertion_still_extracted() {
    let cases = cases(THEMED_FIXTURE);

    assert_eq!(cases.len(), 2);
    assert_eq!(cases[0].expectation, Expectation::Deferred);
    assert_eq!(cases[0].input_tokens, vec!["bg-red-500"]);
    assert_eq!(cases[1].ordinal, 1);
    assert_eq!(cases[1].input_tokens, vec!["bg-[#0088cc]"]);
    assert_eq!(
        cases[1].expectation,
        Expectation::Match {
            expected_css: ".bg-\\[\\#0088cc\\] {\n      background-color: #0088cc;\n    }"
                .to_string()
        }
    );
}

#[test]
fn anchor_beyond_proximity_window_is_skipped() {
    let padding = " ".repeat(60);
    let source = single_block(&format!("  expect(\n{padding}run(['a'])).toEqual('')"));

    assert!(cases(&source).is_empty());

    let widened = ExtractOptions {
        proximity_window: 100,
        ..ExtractOptions::default()
    };
    assert_eq!(extract_cases(&source, &widened).len(), 1);
}

#[test]
fn nearer_invocation_wins() {
    let themed_first = single_block(
        "  expect(compileCss(css`@tailwind utilities;`, ['a']), run(['b'])).toEqual('')",
    );
    let cases_themed = cases(&themed_first);
    assert_eq!(cases_themed.len(), 1);
    assert_eq!(cases_themed[0].expectation, Expectation::Deferred);

    let run_first = single_block("  expect(await run(['b'])).toEqual('') // compileCss(x)");
    let cases_run = cases(&run_first);
    assert_eq!(cases_run.len(), 1);
    assert_eq!(cases_run[0].expectation, Expectation::Empty);
    assert_eq!(cases_run[0].input_tokens, vec!["b"]);
}

#[test]
fn assertion_without_known_marker_is_skipped() {
    let source = single_block(
        "  expect(await run(['a'])).toContain('x')\n  expect(await run(['b'])).toBe(\"\")",
    );
    let cases = cases(&source);

    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].input_tokens, vec!["b"]);
    assert_eq!(cases[0].ordinal, 0);
}

#[test]
fn empty_inline_snapshot_is_an_empty_expectation() {
    let cases = cases(&single_block(
        "  expect(await run(['nope'])).toMatchInlineSnapshot(`\"\"`)",
    ));

    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].expectation, Expectation::Empty);
}

#[test]
fn snapshot_is_sanitized_before_storing() {
    let source = single_block(
        "  expect(await run(['border'])).toMatchInlineSnapshot(`\n    \".border {\n      border-style: var(--tw-border-style);\n    }\n\n    @property --tw-border-style {\n      syntax: \"*\";\n      initial-value: solid;\n    }\"\n  `)",
    );
    let cases = cases(&source);

    assert_eq!(
        cases[0].expectation,
        Expectation::Match {
            expected_css: ".border {\n      border-style: var(--tw-border-style);\n    }"
                .to_string()
        }
    );
}

#[test]
fn ordinals_restart_per_group() {
    let source = "test('a', () => {\n  expect(run(['x'])).toEqual('')\n  expect(run(['y'])).toEqual('')\n})\ntest('b', () => {\n  expect(run(['z'])).toEqual('')\n})\n";
    let summary = cases(source)
        .into_iter()
        .map(|case| (case.group_name, case.ordinal))
        .collect::<Vec<_>>();

    assert_eq!(
        summary,
        vec![
            ("a".to_string(), 0),
            ("a".to_string(), 1),
            ("b".to_string(), 0)
        ]
    );
}

#[test]
fn extraction_is_idempotent_on_fixture_text() {
    assert_eq!(cases(TRUNCATE_FIXTURE), cases(TRUNCATE_FIXTURE));
    assert_eq!(cases(THEMED_FIXTURE), cases(THEMED_FIXTURE));
}

fn render_fixture(groups: &[(String, Vec<Vec<String>>)]) -> String {
    let mut source = String::new();
    for (name, assertions) in groups {
        source.push_str(&format!("test('{name}', async () => {{\n"));
        for tokens in assertions {
            let literal = tokens
                .iter()
                .map(|token| format!("'{token}'"))
                .collect::<Vec<_>>()
                .join(", ");
            source.push_str(&format!("  expect(await run([{literal}])).toEqual('')\n"));
        }
        source.push_str("})\n\n");
    }
    source
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_generated_fixtures_extract_every_non_empty_assertion(
        groups in proptest::collection::vec(
            (
                "[a-z][a-z0-9-]{0,10}",
                proptest::collection::vec(
                    proptest::collection::vec("[a-z0-9:/\\[\\]-]{1,10}", 0..4),
                    0..4,
                ),
            ),
            0..4,
        )
    ) {
        let source = render_fixture(&groups);
        let first = extract_cases(&source, &ExtractOptions::default());
        let second = extract_cases(&source, &ExtractOptions::default());
        prop_assert_eq!(&first, &second);

        let expected = groups
            .iter()
            .flat_map(|(name, assertions)| {
                assertions
                    .iter()
                    .filter(|tokens| !tokens.is_empty())
                    .enumerate()
                    .map(move |(ordinal, tokens)| (name.clone(), ordinal, tokens.clone()))
            })
            .collect::<Vec<_>>();
        let actual = first
            .into_iter()
            .map(|case| (case.group_name, case.ordinal, case.input_tokens))
            .collect::<Vec<_>>();
        prop_assert_eq!(actual, expected);
    }
}
