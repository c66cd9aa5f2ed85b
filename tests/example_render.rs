#![cfg(unix)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use kitsch_docs::application::render::{
    ComrakRenderService, OutputFormat, RenderPipelineConfig, RenderRequest, RenderService,
};
use tempfile::TempDir;

const MODULES_FIXTURE: &str = include_str!("fixtures/modules.md");

/// Fake `kitsch` executable. It records the demo file next to itself, exposes
/// the config path as `$config`, and then runs `body`.
fn fake_kitsch(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("kitsch");
    let script = format!(
        r#"#!/bin/sh
config=""
while [ "$#" -gt 0 ]; do
  case "$1" in
    --config) shift; config="$1" ;;
    --demo) shift; cp "$1" "{demo_log}" ;;
  esac
  shift
done
{body}
"#,
        demo_log = dir.join("demo.log").display(),
    );
    fs::write(&path, script).expect("write fake kitsch");
    let mut perms = fs::metadata(&path).expect("metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("set perms");
    path
}

fn service(cli: PathBuf, docs_root: &Path, format: OutputFormat) -> ComrakRenderService {
    ComrakRenderService::new(RenderPipelineConfig {
        kitsch_cli_path: cli,
        docs_root: docs_root.to_path_buf(),
        format,
        ..RenderPipelineConfig::default()
    })
}

fn example(payload: &str) -> String {
    format!("# Example\n\n```kitsch\n{payload}\n```\n")
}

#[tokio::test]
async fn payload_without_delimiter_is_rendered_into_the_container() {
    let dir = TempDir::new().expect("temp dir");
    let cli = fake_kitsch(dir.path(), "printf 'hi'");
    let service = service(cli, dir.path(), OutputFormat::Mdx);

    let output = service
        .render(&RenderRequest::new("a.md", example("prompt: 'hi'")))
        .await
        .expect("render succeeds");

    assert_eq!(output.examples, 1);
    assert_eq!(output.failed_examples, 0);
    assert!(
        output.document.contains(
            "<ExamplePrompt>\n<span style={{color: \"#cccccc\"}}>hi</span>\u{258c}</ExamplePrompt>"
        ),
        "{}",
        output.document
    );
    assert!(!output.document.contains("```kitsch"));

    let demo = fs::read_to_string(dir.path().join("demo.log")).expect("demo recorded");
    assert_eq!(
        demo,
        "flexibleSpaceReplacement: \"\\uE000kitsch-flex\\uE000\"\n"
    );
}

#[tokio::test]
async fn delimiter_splits_demo_and_resolves_cwd() {
    let dir = TempDir::new().expect("temp dir");
    let cli = fake_kitsch(dir.path(), r#"cat "$config""#);
    let service = service(cli, dir.path(), OutputFormat::Mdx);

    let output = service
        .render(&RenderRequest::new(
            "b.md",
            example("cwd: /tmp\n---\nprompt: '${CWD}/x'"),
        ))
        .await
        .expect("render succeeds");

    let expected = format!("prompt:&nbsp;&#39;{}/x&#39;", dir.path().display());
    assert!(output.document.contains(&expected), "{}", output.document);
    assert!(!output.document.contains("${CWD}"));

    let demo = fs::read_to_string(dir.path().join("demo.log")).expect("demo recorded");
    assert!(demo.starts_with("cwd: /tmp\n"), "{demo}");
    assert!(demo.contains("flexibleSpaceReplacement"), "{demo}");
}

#[tokio::test]
async fn missing_executable_renders_inline_diagnostic() {
    let dir = TempDir::new().expect("temp dir");
    let service = service(
        dir.path().join("does-not-exist"),
        dir.path(),
        OutputFormat::Mdx,
    );

    let output = service
        .render(&RenderRequest::new("c.md", example("prompt: 'hi'")))
        .await
        .expect("example failures never fail the document");

    assert_eq!(output.examples, 1);
    assert_eq!(output.failed_examples, 1);
    assert!(
        output
            .document
            .contains("<ExamplePrompt>\nError&nbsp;running&nbsp;example:&nbsp;"),
        "{}",
        output.document
    );
    assert!(output.document.contains("does-not-exist"));
}

#[tokio::test]
async fn bold_red_output_becomes_a_styled_element() {
    let dir = TempDir::new().expect("temp dir");
    let cli = fake_kitsch(dir.path(), r"printf '\033[1;31mERROR\033[0m done'");
    let service = service(cli, dir.path(), OutputFormat::Mdx);

    let output = service
        .render(&RenderRequest::new("d.md", example("prompt: 'x'")))
        .await
        .expect("render succeeds");

    assert!(
        output.document.contains(
            "<span style={{color: \"#aa0000\", fontWeight: \"bold\"}}>ERROR</span><span style={{color: \"#cccccc\"}}>&nbsp;done</span>"
        ),
        "{}",
        output.document
    );
}

#[tokio::test]
async fn flexible_space_produces_flex_row_without_trailing_break() {
    let dir = TempDir::new().expect("temp dir");
    let cli = fake_kitsch(
        dir.path(),
        r"printf 'left\356\200\200kitsch-flex\356\200\200right\nnext'",
    );
    let service = service(cli, dir.path(), OutputFormat::Html);

    let output = service
        .render(&RenderRequest::new("e.md", example("prompt: 'x'")))
        .await
        .expect("render succeeds");

    let expected = concat!(
        "<div class=\"example-prompt\">\n",
        "<div class=\"kitsch-flex\">",
        "<div class=\"kitsch-flex-item\"><span style=\"color:#cccccc\">left</span></div>",
        "<div class=\"kitsch-flex-item\"><span style=\"color:#cccccc\">right</span></div>",
        "</div>",
        "<span style=\"color:#cccccc\">next</span>",
        "\u{258c}</div>",
    );
    assert!(output.document.contains(expected), "{}", output.document);
}

#[tokio::test]
async fn html_format_serialises_the_whole_document() {
    let dir = TempDir::new().expect("temp dir");
    let cli = fake_kitsch(dir.path(), "printf '{x} <y>'");
    let service = service(cli, dir.path(), OutputFormat::Html);

    let output = service
        .render(&RenderRequest::new("modules.md", MODULES_FIXTURE))
        .await
        .expect("render succeeds");

    assert!(output.document.contains("<h1>Modules</h1>"), "{}", output.document);
    assert!(
        output
            .document
            .contains("<span style=\"color:#cccccc\">{x}&nbsp;&lt;y&gt;</span>"),
        "{}",
        output.document
    );
    assert!(output.document.contains("<pre lang=\"yaml\">"));
}

#[tokio::test]
async fn mdx_format_escapes_braces_and_keeps_other_blocks() {
    let dir = TempDir::new().expect("temp dir");
    let cli = fake_kitsch(dir.path(), "printf '{x}'");
    let service = service(cli, dir.path(), OutputFormat::Mdx);

    let output = service
        .render(&RenderRequest::new("modules.md", MODULES_FIXTURE))
        .await
        .expect("render succeeds");

    assert!(output.document.starts_with("---\nid: modules\n"));
    assert!(
        output.document.contains("{'{'}x{'}'}"),
        "{}",
        output.document
    );
    assert!(output.document.contains("``` yaml") || output.document.contains("```yaml"));
    assert!(output.document.contains("prompt: '$ '"));
}
